use crate::file::error::FileError;
use model::records::table::Table;
use std::path::Path;

pub mod csv;
pub mod error;
pub mod format;
pub mod jsonl;
pub mod metadata;
pub mod xlsx;

/// Reads a source artifact into headers and rows.
pub trait TableLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Table, FileError>;
}

/// Serializes headers and rows into a durable artifact, replacing any
/// previous content at `path`.
pub trait TableWriter: Send + Sync {
    fn write(&self, path: &Path, headers: &[String], rows: &[Vec<String>])
    -> Result<(), FileError>;
}
