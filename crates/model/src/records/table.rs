use crate::records::row::Row;
use std::sync::Arc;

/// An input table as produced by a loader. Rows keep their file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    headers: Arc<[String]>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(headers: Vec<String>, records: Vec<Vec<String>>) -> Self {
        let headers: Arc<[String]> = headers.into();
        let rows = records
            .into_iter()
            .map(|values| Row::new(headers.clone(), values))
            .collect();
        Table { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// All values of the column at `ordinal`, top to bottom.
    pub fn column(&self, ordinal: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.values().get(ordinal).map(String::as_str).unwrap_or(""))
    }

    /// The first `n` rows, or all of them when the table is shorter.
    pub fn head(&self, n: usize) -> &[Row] {
        &self.rows[..n.min(self.rows.len())]
    }
}
