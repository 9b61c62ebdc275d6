use serde::Serialize;
use sysinfo::System;

use crate::error::CollectError;
use crate::platform;

#[derive(Clone, Debug, Serialize)]
pub struct SystemSnapshot {
    pub processor: ProcessorInfo,
    pub mem: SystemMemory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ProcessorInfo {
    pub num_cpu: usize,
}

/// Host-wide physical memory, in bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SystemMemory {
    pub active: u64,
    pub used: u64,
    pub total: u64,
}

impl SystemMemory {
    fn clamped(active: u64, used: u64, total: u64) -> Self {
        SystemMemory {
            active: active.min(total),
            used: used.min(total),
            total,
        }
    }
}

pub fn read_virtual_memory_info() -> Result<SystemMemory, CollectError> {
    if !sysinfo::IS_SUPPORTED_SYSTEM {
        return Err(CollectError::memory("sysinfo does not support this OS"));
    }

    let mut sys = System::new();
    sys.refresh_memory();
    let total = sys.total_memory();
    if total == 0 {
        return Err(CollectError::memory("host reported zero total memory"));
    }

    let active = platform::active_memory()?;
    Ok(SystemMemory::clamped(active, sys.used_memory(), total))
}

/// Logical processors this process may run on.
pub fn read_cpu_core_count() -> usize {
    platform::affinity_cpu_count()
        .unwrap_or_else(|| {
            let mut sys = System::new();
            sys.refresh_cpu_list(sysinfo::CpuRefreshKind::nothing());
            sys.cpus().len()
        })
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn figures_are_clamped_to_total() {
        let mem = SystemMemory::clamped(9_000, 12_000, 8_000);
        assert_eq!(mem.active, 8_000);
        assert_eq!(mem.used, 8_000);
        assert_eq!(mem.total, 8_000);

        let mem = SystemMemory::clamped(1_000, 2_000, 8_000);
        assert_eq!(
            mem,
            SystemMemory {
                active: 1_000,
                used: 2_000,
                total: 8_000
            }
        );
    }

    #[test]
    fn at_least_one_cpu() {
        assert!(read_cpu_core_count() >= 1);
    }

    #[test]
    fn cpu_count_follows_affinity_mask() {
        if let Some(mask) = platform::affinity_cpu_count() {
            assert_eq!(read_cpu_core_count(), mask);
        }
    }

    #[test]
    fn host_memory_is_readable() {
        if !std::path::Path::new("/proc/meminfo").exists() {
            return;
        }
        let mem = read_virtual_memory_info().unwrap();
        assert!(mem.total > 0);
        assert!(mem.used <= mem.total);
        assert!(mem.active <= mem.total);
    }
}
