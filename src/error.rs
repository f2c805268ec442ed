use std::ops::Range;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("worker {worker} failed on range {range:?}: {message}")]
    WorkerFailure {
        worker: usize,
        range: Range<usize>,
        message: String,
    },

    #[error("failed to build worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
}

pub type KernelResult<T> = std::result::Result<T, KernelError>;

pub(crate) fn invalid<T>(message: impl Into<String>) -> KernelResult<T> {
    Err(KernelError::InvalidArgument(message.into()))
}
