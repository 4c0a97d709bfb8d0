use crate::file::{TableWriter, csv::settings::CsvSettings, error::FileError};
use std::{fs::File, io::BufWriter, path::Path};

/// Writes the header row followed by every data row.
pub struct CsvDestination {
    settings: CsvSettings,
}

impl CsvDestination {
    pub fn new(settings: CsvSettings) -> Self {
        CsvDestination { settings }
    }
}

impl Default for CsvDestination {
    fn default() -> Self {
        Self::new(CsvSettings::default())
    }
}

impl TableWriter for CsvDestination {
    fn write(
        &self,
        path: &Path,
        headers: &[String],
        rows: &[Vec<String>],
    ) -> Result<(), FileError> {
        let file = File::create(path)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.settings.delimiter as u8)
            .flexible(true)
            .from_writer(BufWriter::new(file));

        writer.write_record(headers)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{TableLoader, csv::source::CsvSource};
    use tempfile::tempdir;

    #[test]
    fn round_trips_quoted_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let headers = vec!["id".to_string(), "note".to_string()];
        let rows = vec![
            vec!["1".to_string(), "plain".to_string()],
            vec!["2".to_string(), "has, comma and \"quotes\"".to_string()],
        ];

        CsvDestination::default()
            .write(&path, &headers, &rows)
            .unwrap();

        let table = CsvSource::default().load(&path).unwrap();
        assert_eq!(table.headers(), headers.as_slice());
        assert_eq!(
            table.row(1).unwrap().get("note"),
            Some("has, comma and \"quotes\"")
        );
    }

    #[test]
    fn rewriting_identical_content_is_byte_identical() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let headers = vec!["a".to_string()];
        let rows = vec![vec!["x".to_string()], vec![String::new()]];

        CsvDestination::default().write(&path, &headers, &rows).unwrap();
        let first = std::fs::read(&path).unwrap();
        CsvDestination::default().write(&path, &headers, &rows).unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
    }
}
