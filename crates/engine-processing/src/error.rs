use engine_core::error::CheckpointError;
use model::error::ModelError;
use thiserror::Error;

/// Why a single row could not be transformed. Never fatal to a run: the
/// worker turns it into sentinel cells.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("no choices in response")]
    EmptyChoices,

    #[error("no tool call in response")]
    NoToolCall,

    #[error("malformed response body: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("failed to parse tool arguments: {0}")]
    MalformedArguments(#[from] serde_json::Error),

    #[error("missing field '{0}' in response")]
    MissingField(String),

    #[error("cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl TransformError {
    /// Worth another attempt: transport trouble, throttling or server errors.
    pub fn is_transient(&self) -> bool {
        match self {
            TransformError::Transport(_) => true,
            TransformError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum ProducerError {
    #[error("The task channel was closed before all rows were offered.")]
    ChannelClosed,
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker {worker} could not deliver the result of row {row_index}: result channel closed")]
    ResultChannelClosed { worker: usize, row_index: usize },

    #[error("Worker task failed: {0}")]
    Join(String),
}

#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error("Failed to apply result: {0}")]
    Apply(#[from] ModelError),

    #[error("Final checkpoint failed: {0}")]
    Checkpoint(#[from] CheckpointError),
}
