use engine_processing::transform::RowTransform;
use model::{
    core::column::ColumnSpec,
    records::{row::Row, table::Table},
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Outcome of transforming one row during the dry run.
#[derive(Debug)]
pub struct SampleRow {
    pub row_index: usize,
    pub row: Row,
    /// Target values in column order, or the error text.
    pub outcome: Result<Vec<(String, String)>, String>,
    pub cost: u64,
}

impl SampleRow {
    pub fn is_failure(&self) -> bool {
        self.outcome.is_err()
    }
}

/// Transforms the first `count` rows one after another.
///
/// Stops early once `cancel` fires; rows already done are returned.
pub async fn run_sample(
    transform: &dyn RowTransform,
    table: &Table,
    columns: &[ColumnSpec],
    instruction: &str,
    count: usize,
    cancel: &CancellationToken,
) -> Vec<SampleRow> {
    let mut sampled = Vec::with_capacity(count.min(table.len()));

    for (row_index, row) in table.head(count).iter().enumerate() {
        if cancel.is_cancelled() {
            break;
        }

        let outcome = transform.transform(row, columns, instruction, cancel).await;
        debug!(row_index, cost = outcome.cost, ok = outcome.values.is_ok(), "sample row done");

        let values = outcome
            .values
            .map(|mut values| {
                columns
                    .iter()
                    .map(|c| {
                        let value = values.remove(&c.name).unwrap_or_default();
                        (c.name.clone(), value)
                    })
                    .collect()
            })
            .map_err(|e| e.to_string());

        sampled.push(SampleRow {
            row_index,
            row: row.clone(),
            outcome: values,
            cost: outcome.cost,
        });
    }

    sampled
}
