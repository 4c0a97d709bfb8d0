use model::{
    core::{
        data_type::DataType,
        utils::{is_null_like, truncate_ellipsis},
    },
    records::table::Table,
};
use rand::Rng;
use serde::Serialize;
use std::{collections::HashSet, fmt, str::FromStr};

const SAMPLE_VALUES: usize = 5;
const SAMPLE_VALUE_WIDTH: usize = 15;

#[derive(Debug, Clone, Serialize)]
pub struct ColumnMetadata {
    pub ordinal: usize,
    pub name: String,
    pub data_type: DataType,
    pub unique_count: usize,
    pub null_count: usize,
    pub total_count: usize,
    /// First few distinct values, shortened for display.
    pub samples: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleMode {
    First,
    Random,
}

impl FromStr for SampleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(SampleMode::First),
            "random" => Ok(SampleMode::Random),
            other => Err(format!("unknown sample mode '{other}' (expected first or random)")),
        }
    }
}

impl fmt::Display for SampleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleMode::First => f.write_str("first"),
            SampleMode::Random => f.write_str("random"),
        }
    }
}

/// Column analysis plus a handful of rows, used by the `inspect` command.
#[derive(Debug, Clone, Serialize)]
pub struct TableMetadata {
    pub name: String,
    pub format: String,
    pub total_rows: usize,
    pub total_columns: usize,
    pub sample_mode: SampleMode,
    pub columns: Vec<ColumnMetadata>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableMetadata {
    pub fn build<R: Rng>(
        name: &str,
        format: &str,
        table: &Table,
        rows: usize,
        mode: SampleMode,
        rng: &mut R,
    ) -> Self {
        let preview = select_rows(table.len(), rows, mode, rng)
            .into_iter()
            .filter_map(|idx| table.row(idx))
            .map(|row| row.values().to_vec())
            .collect();

        TableMetadata {
            name: name.to_string(),
            format: format.to_string(),
            total_rows: table.len(),
            total_columns: table.width(),
            sample_mode: mode,
            columns: profile_columns(table),
            headers: table.headers().to_vec(),
            rows: preview,
        }
    }
}

pub fn profile_columns(table: &Table) -> Vec<ColumnMetadata> {
    table
        .headers()
        .iter()
        .enumerate()
        .map(|(ordinal, name)| {
            let mut seen = HashSet::new();
            let mut distinct = Vec::new();
            let mut null_count = 0;

            for value in table.column(ordinal) {
                if is_null_like(value) {
                    null_count += 1;
                }
                if seen.insert(value) {
                    distinct.push(value);
                }
            }

            ColumnMetadata {
                ordinal,
                name: name.clone(),
                data_type: DataType::detect(table.column(ordinal)),
                unique_count: distinct.len(),
                null_count,
                total_count: table.len(),
                samples: distinct
                    .iter()
                    .take(SAMPLE_VALUES)
                    .map(|v| truncate_ellipsis(v, SAMPLE_VALUE_WIDTH))
                    .collect(),
            }
        })
        .collect()
}

/// Row indices to show: the first `count`, or `count` distinct random ones.
pub fn select_rows<R: Rng>(total: usize, count: usize, mode: SampleMode, rng: &mut R) -> Vec<usize> {
    if total <= count {
        return (0..total).collect();
    }

    match mode {
        SampleMode::First => (0..count).collect(),
        SampleMode::Random => rand::seq::index::sample(rng, total, count).into_vec(),
    }
}
