use std::io;

use crate::error::CollectError;

/// Main-thread stack region, in bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StackUsage {
    pub reserved: u64,
    pub in_use: u64,
}

/// Current and maximum open-file limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileLimits {
    pub soft: u64,
    pub hard: u64,
}

pub trait PlatformExtensions {
    fn descriptor_limits() -> io::Result<FileLimits>;
    fn active_memory() -> Result<u64, CollectError>;
    fn stack_usage() -> StackUsage;
    /// CPUs in the affinity mask, where the OS has one.
    fn affinity_cpu_count() -> Option<usize>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod other;
#[cfg(unix)]
mod rlimit;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
use other as platform_impl;

pub fn descriptor_limits() -> io::Result<FileLimits> {
    platform_impl::Platform::descriptor_limits()
}

pub fn active_memory() -> Result<u64, CollectError> {
    platform_impl::Platform::active_memory()
}

pub fn stack_usage() -> StackUsage {
    platform_impl::Platform::stack_usage()
}

pub fn affinity_cpu_count() -> Option<usize> {
    platform_impl::Platform::affinity_cpu_count()
}

/// `current_exe` on Linux resolves `/proc/self/exe`, which carries a
/// ` (deleted)` marker once the binary has been unlinked.
pub fn clean_executable_path(raw: &str) -> &str {
    if cfg!(target_os = "linux") {
        raw.strip_suffix(" (deleted)").unwrap_or(raw)
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrappers_do_not_panic_for_current_process() {
        let _ = descriptor_limits();
        let _ = active_memory();
        let _ = stack_usage();
        let _ = affinity_cpu_count();
    }

    #[test]
    fn stack_in_use_never_exceeds_reserved() {
        let stack = stack_usage();
        assert!(stack.in_use <= stack.reserved);
    }

    #[cfg(unix)]
    #[test]
    fn soft_limit_is_within_hard_limit() {
        let limits = descriptor_limits().unwrap();
        assert!(limits.soft <= limits.hard);
        assert!(limits.soft > 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn deleted_marker_is_stripped() {
        assert_eq!(
            clean_executable_path("/usr/local/bin/procsnap (deleted)"),
            "/usr/local/bin/procsnap"
        );
        assert_eq!(clean_executable_path("/usr/bin/procsnap"), "/usr/bin/procsnap");
    }
}
