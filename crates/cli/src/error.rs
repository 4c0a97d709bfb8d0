use connectors::file::error::FileError;
use engine_processing::error::TransformError;
use engine_runtime::error::PipelineError;
use model::error::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("OPENAI_API_KEY is not set (environment or .env file)")]
    MissingApiKey,

    #[error("Invalid columns: {0}")]
    Columns(#[from] ModelError),

    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("Failed to set up the API client: {0}")]
    Client(#[from] TransformError),

    #[error("Failed to run the enrichment: {0}")]
    Runner(#[from] PipelineError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),
}
