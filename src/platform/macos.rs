use std::io;

use super::{FileLimits, PlatformExtensions, StackUsage, rlimit};
use crate::error::CollectError;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn descriptor_limits() -> io::Result<FileLimits> {
        rlimit::nofile()
    }

    #[allow(deprecated)]
    fn active_memory() -> Result<u64, CollectError> {
        // SAFETY: vm_statistics64 is plain old data; zeroed is a valid value.
        let mut stats: libc::vm_statistics64 = unsafe { std::mem::zeroed() };
        let mut count = libc::HOST_VM_INFO64_COUNT;
        // SAFETY: `stats` and `count` outlive the call and `count` matches
        // the size of `stats` in integer_t units.
        let ret = unsafe {
            libc::host_statistics64(
                libc::mach_host_self(),
                libc::HOST_VM_INFO64,
                &mut stats as *mut libc::vm_statistics64 as libc::host_info64_t,
                &mut count,
            )
        };
        if ret != libc::KERN_SUCCESS {
            return Err(CollectError::memory(format!(
                "host_statistics64 returned {ret}"
            )));
        }

        // SAFETY: sysconf has no preconditions.
        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if page_size <= 0 {
            return Err(CollectError::memory("sysconf(_SC_PAGESIZE) failed"));
        }
        Ok(u64::from(stats.active_count) * page_size as u64)
    }

    fn stack_usage() -> StackUsage {
        // SAFETY: the pthread_*_np getters only read the calling thread's
        // descriptor.
        let (base, size) = unsafe {
            let thread = libc::pthread_self();
            (
                libc::pthread_get_stackaddr_np(thread) as usize,
                libc::pthread_get_stacksize_np(thread) as u64,
            )
        };
        // The stack grows down from `base`.
        let marker = 0u8;
        let frame = std::ptr::addr_of!(marker) as usize;
        let in_use = base.saturating_sub(frame) as u64;
        StackUsage {
            reserved: size,
            in_use: in_use.min(size),
        }
    }

    fn affinity_cpu_count() -> Option<usize> {
        None
    }
}
