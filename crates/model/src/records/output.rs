use crate::{
    core::column::ColumnSpec,
    error::ModelError,
    records::table::Table,
};
use std::collections::HashMap;

/// Value held by a target cell before its row's result is applied.
pub const PLACEHOLDER: &str = "";

/// The input table widened with one column per target spec.
///
/// Cells live in a flat, index-addressed arena. The table has a single owner
/// during a run; results are applied by row index so arrival order does not
/// matter and each row's target range is written in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTable {
    headers: Vec<String>,
    targets: Vec<String>,
    base_width: usize,
    cells: Vec<Vec<String>>,
    writes: Vec<u32>,
}

impl OutputTable {
    pub fn new(input: &Table, columns: &[ColumnSpec]) -> Self {
        let base_width = input.width();
        let targets: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();

        let mut headers = input.headers().to_vec();
        headers.extend(targets.iter().cloned());

        let cells = input
            .rows()
            .iter()
            .map(|row| {
                let mut cells = Vec::with_capacity(base_width + targets.len());
                cells.extend(row.values().iter().cloned());
                cells.resize(base_width + targets.len(), PLACEHOLDER.to_string());
                cells
            })
            .collect();

        OutputTable {
            headers,
            targets,
            base_width,
            cells,
            writes: vec![0; input.len()],
        }
    }

    /// Writes `values` into the target range of row `row_index`.
    ///
    /// Target columns missing from `values` are set to an empty string.
    pub fn apply(
        &mut self,
        row_index: usize,
        values: &HashMap<String, String>,
    ) -> Result<(), ModelError> {
        let len = self.cells.len();
        let row = self
            .cells
            .get_mut(row_index)
            .ok_or(ModelError::RowOutOfRange {
                index: row_index,
                len,
            })?;

        for (offset, name) in self.targets.iter().enumerate() {
            row[self.base_width + offset] = values.get(name).cloned().unwrap_or_default();
        }
        self.writes[row_index] += 1;

        Ok(())
    }

    /// Full header row: input headers followed by target column names.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn target_columns(&self) -> &[String] {
        &self.targets
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.cells
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.cells.get(index).map(Vec::as_slice)
    }

    /// The generated cells of row `index`.
    pub fn target_cells(&self, index: usize) -> Option<&[String]> {
        self.cells.get(index).map(|row| &row[self.base_width..])
    }

    /// How many times a result has been applied to row `index`.
    pub fn write_count(&self, index: usize) -> u32 {
        self.writes.get(index).copied().unwrap_or(0)
    }

    /// Number of rows that received at least one result.
    pub fn rows_written(&self) -> usize {
        self.writes.iter().filter(|w| **w > 0).count()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
