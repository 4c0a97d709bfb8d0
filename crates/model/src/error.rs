use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("No target columns were given")]
    NoColumns,

    #[error("Column name at position {position} is empty")]
    EmptyColumnName { position: usize },

    #[error("Column '{0}' is declared more than once")]
    DuplicateColumn(String),

    #[error("Column '{0}' already exists in the input table")]
    ColumnExists(String),

    #[error("Row index {index} is out of range for a table of {len} rows")]
    RowOutOfRange { index: usize, len: usize },
}
