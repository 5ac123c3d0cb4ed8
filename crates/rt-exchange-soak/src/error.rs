//! Error types for rtx-soak

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SoakError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Scenario {scenario} observed {count} corrupted values")]
    Corruption { scenario: &'static str, count: u64 },

    #[error("Scenario {scenario} delivered more values than were pushed ({popped} > {pushed})")]
    Overdelivery {
        scenario: &'static str,
        pushed: u64,
        popped: u64,
    },

    #[error("Worker thread panicked: {0}")]
    WorkerPanicked(String),

    #[error("Exchange check failed: {0}")]
    Exchange(#[from] rt_exchange::ExchangeError),

    #[error("Histogram error: {0}")]
    Histogram(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl SoakError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            SoakError::Corruption { .. } | SoakError::Overdelivery { .. } => 2,
            SoakError::WorkerPanicked(_) => 3,
            SoakError::InvalidConfig(_) | SoakError::IoError(_) | SoakError::JsonError(_) => 4,
            SoakError::Exchange(_) => 5,
            SoakError::Histogram(_) => 1,
        }
    }
}

impl From<hdrhistogram::CreationError> for SoakError {
    fn from(err: hdrhistogram::CreationError) -> Self {
        SoakError::Histogram(err.to_string())
    }
}

impl From<hdrhistogram::AdditionError> for SoakError {
    fn from(err: hdrhistogram::AdditionError) -> Self {
        SoakError::Histogram(err.to_string())
    }
}
