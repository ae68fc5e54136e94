//! Error taxonomy for test runs
//!
//! Only [`TestFailure`] is recovered locally; every [`TallyError`] aborts the
//! run and propagates to the caller.

use thiserror::Error;

/// Fatal run errors
#[derive(Error, Debug)]
pub enum TallyError {
    #[error("a test run is already in progress in this process")]
    RunInProgress,

    #[error("snapshot source failed: {0}")]
    Snapshot(String),

    #[error("result sink I/O failed: {0}")]
    Sink(#[from] std::io::Error),

    #[error("result sink rejected event: {0}")]
    SinkRejected(String),

    #[error("failed to spawn sampler thread: {0}")]
    SamplerSpawn(#[source] std::io::Error),

    #[error("sampler thread panicked")]
    SamplerPanicked,
}

/// Result type for run operations
pub type TallyResult<T> = Result<T, TallyError>;

/// A test body raised an error or panicked
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TestFailure {
    pub message: String,
}

impl TestFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Render an `anyhow` error with its full context chain
    pub fn from_error(error: &anyhow::Error) -> Self {
        Self::new(format!("{:#}", error))
    }

    /// Describe a caught panic payload
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        if let Some(s) = payload.downcast_ref::<&str>() {
            Self::new(*s)
        } else if let Some(s) = payload.downcast_ref::<String>() {
            Self::new(s.clone())
        } else {
            Self::new("test panicked")
        }
    }
}
