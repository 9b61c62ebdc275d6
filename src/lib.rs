pub mod alloc;
pub mod collector;
pub mod error;
#[cfg(feature = "perf-tracing")]
pub mod perf;
pub mod platform;
pub mod process;
pub mod report;
pub mod system;
