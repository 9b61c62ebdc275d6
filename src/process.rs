use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::alloc::{self, HeapCounters};
use crate::error::CollectError;
use crate::platform::{self, FileLimits, StackUsage};

#[derive(Clone, Debug, Serialize)]
pub struct ProcessSnapshot {
    pub path: String,
    pub descriptor: DescriptorLimits,
    pub mem: ProcessMemory,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DescriptorLimits {
    pub soft_max: u64,
    pub hard_max: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProcessMemory {
    pub heap: HeapStats,
    pub stack: StackStats,
    /// Total memory obtained from the OS.
    pub sys: u64,
    /// Bytes allocated and still in use.
    pub alloc: u64,
    /// Bytes allocated since start, freed or not.
    pub total_alloc: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HeapStats {
    pub alloc: u64,
    pub sys: u64,
    pub inuse: u64,
    pub idle: u64,
    pub released: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StackStats {
    pub sys: u64,
    pub inuse: u64,
}

/// Absolute path of the running binary.
pub fn resolve_executable_path() -> Result<String, CollectError> {
    let exe = std::env::current_exe().map_err(CollectError::PathResolution)?;
    let exe = absolutize(exe)?;
    let raw = exe.to_string_lossy();
    let path = platform::clean_executable_path(&raw);
    if path.is_empty() {
        return Err(CollectError::PathResolution(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "empty executable path",
        )));
    }
    Ok(path.to_string())
}

fn absolutize(path: PathBuf) -> Result<PathBuf, CollectError> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().map_err(CollectError::PathResolution)?;
    Ok(join_relative(&cwd, &path))
}

fn join_relative(base: &Path, path: &Path) -> PathBuf {
    base.join(path.strip_prefix(".").unwrap_or(path))
}

pub fn read_descriptor_limits() -> Result<DescriptorLimits, CollectError> {
    let FileLimits { soft, hard } =
        platform::descriptor_limits().map_err(CollectError::ResourceLimitQuery)?;
    Ok(DescriptorLimits {
        soft_max: soft,
        hard_max: hard,
    })
}

pub fn read_allocator_stats() -> ProcessMemory {
    memory_from_counters(alloc::heap_counters(), platform::stack_usage())
}

fn memory_from_counters(counters: HeapCounters, stack: StackUsage) -> ProcessMemory {
    let heap_sys = counters.mapped.saturating_add(counters.retained);
    let heap = HeapStats {
        alloc: counters.live,
        sys: heap_sys,
        inuse: counters.active,
        idle: heap_sys.saturating_sub(counters.active),
        released: counters.retained,
    };

    ProcessMemory {
        heap,
        stack: StackStats {
            sys: stack.reserved,
            inuse: stack.in_use,
        },
        sys: heap_sys
            .saturating_add(stack.reserved)
            .saturating_add(counters.metadata),
        alloc: counters.live,
        total_alloc: counters.cumulative,
    }
}
