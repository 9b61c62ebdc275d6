use std::io;

/// Platform facility failures. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("cannot resolve executable path")]
    PathResolution(#[source] io::Error),

    #[error("getrlimit(RLIMIT_NOFILE) failed")]
    ResourceLimitQuery(#[source] io::Error),

    #[error("virtual memory query failed: {detail}")]
    MemoryQuery { detail: String },
}

impl CollectError {
    pub fn memory(detail: impl Into<String>) -> Self {
        CollectError::MemoryQuery {
            detail: detail.into(),
        }
    }
}
