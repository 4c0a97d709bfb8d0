use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("{path} must have a header row and at least one data row")]
    NotEnoughRows { path: String },

    #[error("invalid sheet index {index} (file has {count} sheets)")]
    InvalidSheet { index: usize, count: usize },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Error reading CSV file: {0}")]
    ReadError(String),

    #[error("Excel read error: {0}")]
    XlsxRead(#[from] calamine::Error),

    #[error("Excel write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("Failed to serialize row: {0}")]
    Serialization(#[from] serde_json::Error),
}
