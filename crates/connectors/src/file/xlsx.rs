use crate::file::{TableLoader, TableWriter, error::FileError};
use calamine::{Data, Reader, open_workbook_auto};
use model::records::table::Table;
use rust_xlsxwriter::Workbook;
use std::{path::Path, time::Instant};
use tracing::debug;

/// Name of the only worksheet [`XlsxDestination`] produces.
pub const OUTPUT_SHEET: &str = "Sheet1";

/// Loads one worksheet of an Excel workbook; its first row is the header.
pub struct XlsxSource {
    /// 1-based position of the worksheet in the workbook.
    sheet: usize,
}

impl XlsxSource {
    pub fn new(sheet: usize) -> Self {
        XlsxSource { sheet }
    }
}

impl Default for XlsxSource {
    fn default() -> Self {
        Self::new(1)
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

impl TableLoader for XlsxSource {
    fn load(&self, path: &Path) -> Result<Table, FileError> {
        let start = Instant::now();
        if !path.exists() {
            return Err(FileError::NotFound(path.display().to_string()));
        }

        let mut workbook = open_workbook_auto(path)?;
        let count = workbook.sheet_names().len();
        if self.sheet == 0 || self.sheet > count {
            return Err(FileError::InvalidSheet {
                index: self.sheet,
                count,
            });
        }

        let range = workbook
            .worksheet_range_at(self.sheet - 1)
            .ok_or(FileError::InvalidSheet {
                index: self.sheet,
                count,
            })??;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .map(|r| r.iter().map(cell_text).collect())
            .unwrap_or_default();
        let records: Vec<Vec<String>> = rows.map(|r| r.iter().map(cell_text).collect()).collect();

        if headers.is_empty() || records.is_empty() {
            return Err(FileError::NotEnoughRows {
                path: path.display().to_string(),
            });
        }

        debug!(
            path = %path.display(),
            sheet = self.sheet,
            rows = records.len(),
            columns = headers.len(),
            took_ms = start.elapsed().as_millis(),
            "Loaded Excel sheet"
        );

        Ok(Table::new(headers, records))
    }
}

/// Writes every value as a string cell of a single worksheet.
#[derive(Default)]
pub struct XlsxDestination;

fn position(row: usize, col: usize) -> Result<(u32, u16), FileError> {
    let r = u32::try_from(row)
        .map_err(|_| FileError::InvalidFormat(format!("row {row} exceeds the sheet limit")))?;
    let c = u16::try_from(col)
        .map_err(|_| FileError::InvalidFormat(format!("column {col} exceeds the sheet limit")))?;
    Ok((r, c))
}

impl TableWriter for XlsxDestination {
    fn write(
        &self,
        path: &Path,
        headers: &[String],
        rows: &[Vec<String>],
    ) -> Result<(), FileError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(OUTPUT_SHEET)?;

        for (col, header) in headers.iter().enumerate() {
            let (r, c) = position(0, col)?;
            sheet.write_string(r, c, header)?;
        }

        for (idx, row) in rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                // Blank cells read back as empty strings.
                if value.is_empty() {
                    continue;
                }
                let (r, c) = position(idx + 1, col)?;
                sheet.write_string(r, c, value)?;
            }
        }

        workbook.save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn written_sheet_loads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("companies.xlsx");
        let headers = strings(&["id", "city", "country"]);
        let rows = vec![
            strings(&["1", "Lima, Peru", "PE"]),
            strings(&["2", "Oslo", ""]),
        ];

        XlsxDestination.write(&path, &headers, &rows).unwrap();
        let table = XlsxSource::default().load(&path).unwrap();

        assert_eq!(table.headers(), headers.as_slice());
        assert_eq!(table.len(), 2);
        assert_eq!(table.row(0).unwrap().get("city"), Some("Lima, Peru"));
        assert_eq!(table.row(1).unwrap().get("country"), Some(""));
    }

    #[test]
    fn checkpoint_path_without_xlsx_extension_is_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.xlsx.tmp");

        XlsxDestination
            .write(&path, &strings(&["a"]), &[strings(&["x"])])
            .unwrap();

        assert!(path.exists());
    }

    #[test]
    fn sheet_index_is_one_based_and_bounded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("one.xlsx");
        XlsxDestination
            .write(&path, &strings(&["a"]), &[strings(&["x"])])
            .unwrap();

        for index in [0, 2] {
            let err = XlsxSource::new(index).load(&path).unwrap_err();
            assert!(matches!(err, FileError::InvalidSheet { count: 1, .. }), "{err}");
        }
        assert_eq!(
            XlsxSource::new(2).load(&path).unwrap_err().to_string(),
            "invalid sheet index 2 (file has 1 sheets)"
        );
        assert!(XlsxSource::new(1).load(&path).is_ok());
    }

    #[test]
    fn header_only_sheet_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        XlsxDestination.write(&path, &strings(&["a", "b"]), &[]).unwrap();

        let err = XlsxSource::default().load(&path).unwrap_err();
        assert!(matches!(err, FileError::NotEnoughRows { .. }));
    }

    #[test]
    fn missing_workbook_is_reported() {
        let err = XlsxSource::default()
            .load(Path::new("/definitely/not/here.xlsx"))
            .unwrap_err();
        assert!(matches!(err, FileError::NotFound(_)));
    }
}
