use color_eyre::Result;
use color_eyre::eyre::WrapErr;

use crate::error::CollectError;
use crate::process::{self, DescriptorLimits, ProcessMemory, ProcessSnapshot};
use crate::system::{self, ProcessorInfo, SystemMemory, SystemSnapshot};

/// Sources for every collected figure.
///
/// The default methods query the running process and host; override one to
/// substitute a reading.
pub trait Probe {
    fn executable_path(&self) -> Result<String, CollectError> {
        process::resolve_executable_path()
    }

    fn descriptor_limits(&self) -> Result<DescriptorLimits, CollectError> {
        process::read_descriptor_limits()
    }

    fn allocator_stats(&self) -> ProcessMemory {
        process::read_allocator_stats()
    }

    fn virtual_memory(&self) -> Result<SystemMemory, CollectError> {
        system::read_virtual_memory_info()
    }

    fn cpu_core_count(&self) -> usize {
        system::read_cpu_core_count()
    }
}

/// The running process and the host it runs on.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostProbe;

impl Probe for HostProbe {}

pub fn collect_process(probe: &impl Probe) -> Result<ProcessSnapshot> {
    #[cfg(feature = "perf-tracing")]
    let _span = tracing::debug_span!("collector.process").entered();

    let path = probe
        .executable_path()
        .wrap_err("failed to get path to exec")?;
    let mem = probe.allocator_stats();
    let descriptor = probe
        .descriptor_limits()
        .wrap_err("failed to get descriptors")?;

    Ok(ProcessSnapshot {
        path,
        descriptor,
        mem,
    })
}

pub fn collect_system(probe: &impl Probe) -> Result<SystemSnapshot> {
    #[cfg(feature = "perf-tracing")]
    let _span = tracing::debug_span!("collector.system").entered();

    let mem = probe.virtual_memory().wrap_err("failed to get mem info")?;
    let num_cpu = probe.cpu_core_count();

    Ok(SystemSnapshot {
        processor: ProcessorInfo { num_cpu },
        mem,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[derive(Default)]
    struct Recording {
        limits_called: Cell<bool>,
    }

    impl Probe for Recording {
        fn executable_path(&self) -> Result<String, CollectError> {
            Err(CollectError::PathResolution(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "denied",
            )))
        }

        fn descriptor_limits(&self) -> Result<DescriptorLimits, CollectError> {
            self.limits_called.set(true);
            Ok(DescriptorLimits::default())
        }
    }

    #[test]
    fn path_failure_stops_before_descriptor_query() {
        let probe = Recording::default();
        let err = collect_process(&probe).unwrap_err();
        assert_eq!(err.to_string(), "failed to get path to exec");
        assert!(!probe.limits_called.get());
    }

    #[test]
    fn host_process_snapshot_respects_limit_order() {
        if cfg!(not(unix)) {
            return;
        }
        let snapshot = collect_process(&HostProbe).unwrap();
        assert!(snapshot.descriptor.soft_max <= snapshot.descriptor.hard_max);
    }
}
