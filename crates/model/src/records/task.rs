use crate::{core::column::ColumnSpec, records::row::Row};
use std::{collections::HashMap, fmt::Display};

/// Prefix of the value written into every target cell of a failed row.
pub const FAILURE_PREFIX: &str = "ERROR: ";

pub fn failure_sentinel(error: &str) -> String {
    format!("{FAILURE_PREFIX}{error}")
}

pub fn is_failure_sentinel(value: &str) -> bool {
    value.starts_with(FAILURE_PREFIX)
}

/// One row's unit of work. `row_index` is the row's position in the input
/// table and the only key used to route its result back.
#[derive(Debug, Clone)]
pub struct Task {
    pub row_index: usize,
    pub row: Row,
}

impl Task {
    pub fn new(row_index: usize, row: Row) -> Self {
        Task { row_index, row }
    }
}

/// Outcome of processing one [`Task`].
#[derive(Debug, Clone)]
pub struct RowResult {
    pub row_index: usize,
    pub row: Row,
    pub values: HashMap<String, String>,
    pub failure: Option<String>,
    pub cost: u64,
}

impl RowResult {
    pub fn success(task: Task, values: HashMap<String, String>, cost: u64) -> Self {
        RowResult {
            row_index: task.row_index,
            row: task.row,
            values,
            failure: None,
            cost,
        }
    }

    /// A failed result. Every target column carries the failure sentinel so
    /// the row never ends up half-filled.
    pub fn failure(task: Task, columns: &[ColumnSpec], error: impl Display, cost: u64) -> Self {
        let message = error.to_string();
        let sentinel = failure_sentinel(&message);
        let values = columns
            .iter()
            .map(|c| (c.name.clone(), sentinel.clone()))
            .collect();

        RowResult {
            row_index: task.row_index,
            row: task.row,
            values,
            failure: Some(message),
            cost,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}
