use std::io;

use super::{FileLimits, PlatformExtensions, StackUsage};
use crate::error::CollectError;

pub struct Platform;

impl PlatformExtensions for Platform {
    #[cfg(unix)]
    fn descriptor_limits() -> io::Result<FileLimits> {
        super::rlimit::nofile()
    }

    #[cfg(not(unix))]
    fn descriptor_limits() -> io::Result<FileLimits> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "no RLIMIT_NOFILE on this platform",
        ))
    }

    fn active_memory() -> Result<u64, CollectError> {
        Err(CollectError::memory(
            "active memory is not exposed on this platform",
        ))
    }

    fn stack_usage() -> StackUsage {
        StackUsage::default()
    }

    fn affinity_cpu_count() -> Option<usize> {
        None
    }
}
