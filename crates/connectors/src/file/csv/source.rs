use crate::file::{TableLoader, csv::settings::CsvSettings, error::FileError};
use model::records::table::Table;
use std::{fs::File, io::ErrorKind, path::Path, time::Instant};
use tracing::{debug, warn};

/// Loads a delimited text file whose first record is the header row.
pub struct CsvSource {
    settings: CsvSettings,
}

impl CsvSource {
    pub fn new(settings: CsvSettings) -> Self {
        CsvSource { settings }
    }

    fn delimiter(&self) -> Result<u8, FileError> {
        if !self.settings.delimiter.is_ascii() {
            return Err(FileError::InvalidFormat(format!(
                "delimiter '{}' is not a single-byte character",
                self.settings.delimiter
            )));
        }
        Ok(self.settings.delimiter as u8)
    }

    fn clean(&self, field: &str) -> String {
        if self.settings.trim_leading_space {
            field.trim_start().to_string()
        } else {
            field.to_string()
        }
    }
}

impl Default for CsvSource {
    fn default() -> Self {
        Self::new(CsvSettings::default())
    }
}

impl TableLoader for CsvSource {
    fn load(&self, path: &Path) -> Result<Table, FileError> {
        let start = Instant::now();
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FileError::NotFound(path.display().to_string()),
            _ => FileError::IoError(e),
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter()?)
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers: Vec<String> = reader.headers()?.iter().map(|h| self.clean(h)).collect();
        let width = headers.len();

        let mut records = Vec::new();
        let mut ragged = 0usize;
        for result in reader.records() {
            let record = result
                .map_err(|e| FileError::ReadError(format!("Error reading CSV record: {e}")))?;
            if record.len() != width {
                ragged += 1;
            }
            records.push(record.iter().map(|f| self.clean(f)).collect());
        }

        if headers.is_empty() || records.is_empty() {
            return Err(FileError::NotEnoughRows {
                path: path.display().to_string(),
            });
        }

        if ragged > 0 {
            warn!(
                path = %path.display(),
                rows = ragged,
                columns = width,
                "Some rows do not match the header width; padding or truncating them."
            );
        }

        debug!(
            path = %path.display(),
            rows = records.len(),
            columns = width,
            took_ms = start.elapsed().as_millis(),
            "Loaded CSV file"
        );

        Ok(Table::new(headers, records))
    }
}
