use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Share of non-empty values that must agree before a column gets a concrete type.
const MAJORITY: f64 = 0.8;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%b %d, %Y",
    "%d %b %Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"];

/// Type detected for an input column when profiling a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Number,
    Date,
    Boolean,
    Mixed,
    Empty,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Number => "number",
            DataType::Date => "date",
            DataType::Boolean => "boolean",
            DataType::Mixed => "mixed",
            DataType::Empty => "empty",
        }
    }

    /// Detects the dominant type of a column's values.
    pub fn detect<'a, I>(values: I) -> DataType
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut strings = 0usize;
        let mut numbers = 0usize;
        let mut dates = 0usize;
        let mut booleans = 0usize;
        let mut non_empty = 0usize;

        for value in values {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                continue;
            }
            non_empty += 1;

            if is_boolean_value(trimmed) {
                booleans += 1;
            } else if trimmed.parse::<f64>().is_ok() {
                numbers += 1;
            } else if is_date_value(trimmed) {
                dates += 1;
            } else {
                strings += 1;
            }
        }

        if non_empty == 0 {
            return DataType::Empty;
        }

        let threshold = non_empty as f64 * MAJORITY;
        [
            (numbers, DataType::Number),
            (dates, DataType::Date),
            (booleans, DataType::Boolean),
            (strings, DataType::String),
        ]
        .into_iter()
        .find(|(count, _)| *count as f64 >= threshold)
        .map(|(_, ty)| ty)
        .unwrap_or(DataType::Mixed)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_boolean_value(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "false" | "yes" | "no" | "1" | "0"
    )
}

/// Returns true when the value parses as one of the common date layouts or
/// starts with an ISO-8601 `YYYY-MM-DD` prefix.
pub fn is_date_value(value: &str) -> bool {
    let trimmed = value.trim();

    if DATE_FORMATS
        .iter()
        .any(|fmt| NaiveDate::parse_from_str(trimmed, fmt).is_ok())
    {
        return true;
    }

    if DATETIME_FORMATS
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).is_ok())
    {
        return true;
    }

    has_iso_date_prefix(trimmed)
}

fn has_iso_date_prefix(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() < 10 {
        return false;
    }

    bytes[..10].iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    })
}
