use crate::error::TransformError;
use async_trait::async_trait;
use model::{core::column::ColumnSpec, records::row::Row};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

pub mod llm;
pub mod prompt;

/// What one transform call produced. `cost` is reported even on failure.
#[derive(Debug)]
pub struct TransformOutcome {
    pub values: Result<HashMap<String, String>, TransformError>,
    pub cost: u64,
}

impl TransformOutcome {
    pub fn success(values: HashMap<String, String>, cost: u64) -> Self {
        TransformOutcome {
            values: Ok(values),
            cost,
        }
    }

    pub fn failure(error: TransformError, cost: u64) -> Self {
        TransformOutcome {
            values: Err(error),
            cost,
        }
    }
}

/// Maps one input row plus an instruction to values for the target columns.
///
/// A successful outcome should cover every column in `columns`.
/// Implementations should return promptly once `cancel` fires.
#[async_trait]
pub trait RowTransform: Send + Sync {
    async fn transform(
        &self,
        row: &Row,
        columns: &[ColumnSpec],
        instruction: &str,
        cancel: &CancellationToken,
    ) -> TransformOutcome;
}
