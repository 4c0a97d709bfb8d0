use crate::file::{
    TableLoader, TableWriter,
    csv::{destination::CsvDestination, settings::CsvSettings, source::CsvSource},
    error::FileError,
    jsonl::JsonlDestination,
    xlsx::{XlsxDestination, XlsxSource},
};
use std::{
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

/// Suffix inserted before the extension of the default output file.
const ENRICHED_SUFFIX: &str = "_enriched";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Tsv,
    Jsonl,
    Xlsx,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(DataFormat::Csv),
            "tsv" | "tab" => Some(DataFormat::Tsv),
            "jsonl" | "ndjson" => Some(DataFormat::Jsonl),
            "xlsx" | "xlsm" | "xls" => Some(DataFormat::Xlsx),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DataFormat::Csv => "csv",
            DataFormat::Tsv => "tsv",
            DataFormat::Jsonl => "jsonl",
            DataFormat::Xlsx => "xlsx",
        }
    }

    pub fn writer(&self) -> Arc<dyn TableWriter> {
        match self {
            DataFormat::Csv => Arc::new(CsvDestination::default()),
            DataFormat::Tsv => Arc::new(CsvDestination::new(CsvSettings::tab_separated())),
            DataFormat::Jsonl => Arc::new(JsonlDestination),
            DataFormat::Xlsx => Arc::new(XlsxDestination),
        }
    }
}

impl Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataFormat::Csv => write!(f, "CSV"),
            DataFormat::Tsv => write!(f, "TSV"),
            DataFormat::Jsonl => write!(f, "JSON Lines"),
            DataFormat::Xlsx => write!(f, "Excel"),
        }
    }
}

impl FromStr for DataFormat {
    type Err = FileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(DataFormat::Csv),
            "tsv" => Ok(DataFormat::Tsv),
            "jsonl" | "ndjson" => Ok(DataFormat::Jsonl),
            "xlsx" | "excel" => Ok(DataFormat::Xlsx),
            other => Err(FileError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Output format requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatChoice {
    /// Follow the output path's extension, else the input's format.
    #[default]
    Same,
    Explicit(DataFormat),
}

impl FromStr for FormatChoice {
    type Err = FileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("same") {
            return Ok(FormatChoice::Same);
        }
        s.parse().map(FormatChoice::Explicit)
    }
}

/// How to read the input table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceOptions {
    /// Overrides the delimiter implied by a text file's extension.
    pub delimiter: Option<char>,
    /// 1-based worksheet of an Excel workbook.
    pub sheet: usize,
}

impl Default for SourceOptions {
    fn default() -> Self {
        SourceOptions {
            delimiter: None,
            sheet: 1,
        }
    }
}

/// Picks a loader from the input file's extension.
pub fn loader_for(path: &Path, options: SourceOptions) -> Result<Box<dyn TableLoader>, FileError> {
    let settings = match (DataFormat::from_path(path), options.delimiter) {
        (Some(DataFormat::Xlsx), _) => return Ok(Box::new(XlsxSource::new(options.sheet))),
        (_, Some(d)) => CsvSettings::new(d),
        (Some(DataFormat::Csv), None) => CsvSettings::default(),
        (Some(DataFormat::Tsv), None) => CsvSettings::tab_separated(),
        _ => {
            return Err(FileError::UnsupportedFormat(format!(
                "cannot read {}; supported inputs are .csv, .tsv and .xlsx",
                path.display()
            )));
        }
    };
    Ok(Box::new(CsvSource::new(settings)))
}

/// `data/trips.csv` -> `data/trips_enriched.<ext>`.
pub fn default_output_path(input: &Path, format: DataFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}{ENRICHED_SUFFIX}.{}", format.extension()))
}

/// Resolves the final output path and its format.
pub fn resolve_output(
    input: &Path,
    output: Option<&Path>,
    choice: FormatChoice,
) -> (PathBuf, DataFormat) {
    let input_format = DataFormat::from_path(input).unwrap_or(DataFormat::Csv);

    match (output, choice) {
        (Some(path), FormatChoice::Explicit(format)) => (path.to_path_buf(), format),
        (Some(path), FormatChoice::Same) => (
            path.to_path_buf(),
            DataFormat::from_path(path).unwrap_or(input_format),
        ),
        (None, FormatChoice::Explicit(format)) => (default_output_path(input, format), format),
        (None, FormatChoice::Same) => (default_output_path(input, input_format), input_format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_sits_next_to_input() {
        let path = default_output_path(Path::new("data/trips.csv"), DataFormat::Csv);
        assert_eq!(path, PathBuf::from("data/trips_enriched.csv"));

        let path = default_output_path(Path::new("trips.tsv"), DataFormat::Jsonl);
        assert_eq!(path, PathBuf::from("trips_enriched.jsonl"));
    }

    #[test]
    fn output_format_resolution() {
        let input = Path::new("in.csv");

        let (path, fmt) = resolve_output(input, None, FormatChoice::Same);
        assert_eq!((path.as_path(), fmt), (Path::new("in_enriched.csv"), DataFormat::Csv));

        let (_, fmt) = resolve_output(input, Some(Path::new("out.jsonl")), FormatChoice::Same);
        assert_eq!(fmt, DataFormat::Jsonl);

        let (_, fmt) = resolve_output(
            input,
            Some(Path::new("out.data")),
            FormatChoice::Explicit(DataFormat::Tsv),
        );
        assert_eq!(fmt, DataFormat::Tsv);
    }

    #[test]
    fn parses_format_choices() {
        assert_eq!("same".parse::<FormatChoice>().unwrap(), FormatChoice::Same);
        assert_eq!(
            "CSV".parse::<FormatChoice>().unwrap(),
            FormatChoice::Explicit(DataFormat::Csv)
        );
        assert_eq!(
            "excel".parse::<FormatChoice>().unwrap(),
            FormatChoice::Explicit(DataFormat::Xlsx)
        );
        assert!("parquet".parse::<FormatChoice>().is_err());
    }

    #[test]
    fn rejects_unknown_input_extension() {
        assert!(loader_for(Path::new("report.jsonl"), SourceOptions::default()).is_err());
        let piped = SourceOptions {
            delimiter: Some('|'),
            ..SourceOptions::default()
        };
        assert!(loader_for(Path::new("report.txt"), piped).is_ok());
    }

    #[test]
    fn excel_input_defaults_to_excel_output() {
        let input = Path::new("data/report.XLSX");
        assert_eq!(DataFormat::from_path(input), Some(DataFormat::Xlsx));

        let (path, fmt) = resolve_output(input, None, FormatChoice::Same);
        assert_eq!((path.as_path(), fmt), (Path::new("data/report_enriched.xlsx"), DataFormat::Xlsx));

        let (path, fmt) = resolve_output(input, None, FormatChoice::Explicit(DataFormat::Csv));
        assert_eq!((path.as_path(), fmt), (Path::new("data/report_enriched.csv"), DataFormat::Csv));
    }

    #[test]
    fn excel_input_ignores_delimiter_and_keeps_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two.xlsx");
        XlsxDestination
            .write(&path, &["a".to_string()], &[vec!["x".to_string()]])
            .unwrap();

        let options = SourceOptions {
            delimiter: Some(';'),
            sheet: 1,
        };
        let table = loader_for(&path, options).unwrap().load(&path).unwrap();
        assert_eq!(table.row(0).unwrap().get("a"), Some("x"));

        let wrong_sheet = SourceOptions { sheet: 3, ..options };
        let err = loader_for(&path, wrong_sheet).unwrap().load(&path).unwrap_err();
        assert!(matches!(err, FileError::InvalidSheet { index: 3, count: 1 }));
    }
}
