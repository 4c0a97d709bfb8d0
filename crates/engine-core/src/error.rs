use connectors::file::error::FileError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Failed to write checkpoint to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: FileError,
    },

    #[error("Failed to move {from} to {to}: {source}")]
    Promote {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
