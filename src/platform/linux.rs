use std::io;

use super::{FileLimits, PlatformExtensions, StackUsage, rlimit};
use crate::error::CollectError;

const MEMINFO_PATH: &str = "/proc/meminfo";
const SMAPS_PATH: &str = "/proc/self/smaps";

pub struct Platform;

impl PlatformExtensions for Platform {
    fn descriptor_limits() -> io::Result<FileLimits> {
        rlimit::nofile()
    }

    fn active_memory() -> Result<u64, CollectError> {
        let contents = std::fs::read_to_string(MEMINFO_PATH)
            .map_err(|e| CollectError::memory(format!("failed to read {MEMINFO_PATH}: {e}")))?;
        parse_active_kb(&contents)
            .map(|kb| kb.saturating_mul(1024))
            .ok_or_else(|| CollectError::memory(format!("Active not found in {MEMINFO_PATH}")))
    }

    fn stack_usage() -> StackUsage {
        std::fs::read_to_string(SMAPS_PATH)
            .map(|contents| parse_stack_mapping(&contents))
            .unwrap_or_default()
    }

    fn affinity_cpu_count() -> Option<usize> {
        // SAFETY: cpu_set_t is a plain bitmask; zeroed is the empty set.
        let mut set: libc::cpu_set_t = unsafe { std::mem::zeroed() };
        // SAFETY: `set` is writable and its size is passed alongside it.
        let ret = unsafe {
            libc::sched_getaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mut set)
        };
        if ret != 0 {
            return None;
        }
        // SAFETY: `set` was filled in by the kernel above.
        let count = unsafe { libc::CPU_COUNT(&set) };
        usize::try_from(count).ok().filter(|&n| n > 0)
    }
}

/// Value of the `Active:` line in `/proc/meminfo`, in kB.
fn parse_active_kb(contents: &str) -> Option<u64> {
    contents.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("Active:") => parts.next()?.parse().ok(),
            _ => None,
        }
    })
}

/// Size and Rss of the `[stack]` mapping in `/proc/self/smaps`.
///
/// Mapping headers look like
/// `7ffd1c1e8000-7ffd1c209000 rw-p 00000000 00:00 0  [stack]`; the
/// attribute lines that follow belong to that mapping until the next
/// header.
fn parse_stack_mapping(contents: &str) -> StackUsage {
    let mut in_stack = false;
    let mut usage = StackUsage::default();

    for line in contents.lines() {
        if is_mapping_header(line) {
            if in_stack {
                break;
            }
            in_stack = line.trim_end().ends_with("[stack]");
            continue;
        }
        if !in_stack {
            continue;
        }

        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Ok(kb) = value.parse::<u64>() else {
            continue;
        };
        match key {
            "Size:" => usage.reserved = kb.saturating_mul(1024),
            "Rss:" => usage.in_use = kb.saturating_mul(1024),
            _ => {}
        }
    }

    usage.in_use = usage.in_use.min(usage.reserved);
    usage
}

// Attribute lines start with `Name:`; headers start with a hex address range.
fn is_mapping_header(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .is_some_and(|first| !first.ends_with(':') && first.contains('-'))
}
