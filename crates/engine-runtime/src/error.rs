use engine_core::error::CheckpointError;
use engine_processing::error::{ConsumerError, ProducerError, WorkerError};
use thiserror::Error;

/// Errors that end a run. Row-level transform failures never show up here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Task source error: {0}")]
    Producer(#[from] ProducerError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Result sink error: {0}")]
    Consumer(#[from] ConsumerError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// A pipeline task panicked or was aborted.
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("The run was cancelled; the output stays at its checkpoint.")]
    NotCompleted,
}
