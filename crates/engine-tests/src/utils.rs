use async_trait::async_trait;
use connectors::file::{TableWriter, error::FileError};
use engine_core::{metrics::StatsSnapshot, progress::ProgressSink};
use engine_processing::{
    config::PipelineConfig,
    error::TransformError,
    transform::{RowTransform, TransformOutcome},
};
use engine_runtime::execution::executor::EnrichmentJob;
use model::{
    core::column::ColumnSpec,
    records::{row::Row, table::Table},
};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio_util::sync::CancellationToken;

pub const ID_COLUMN: &str = "id";

/// `id,name` table where `id` is the row index.
pub fn numbered_table(rows: usize) -> Table {
    Table::new(
        vec![ID_COLUMN.to_string(), "name".to_string()],
        (0..rows)
            .map(|i| vec![i.to_string(), format!("name-{i}")])
            .collect(),
    )
}

/// The value [`ScriptedTransform`] produces for `column` of row `id`.
pub fn expected_value(column: &str, id: usize) -> String {
    format!("{column}-{id}")
}

pub fn columns(names: &[&str]) -> Vec<ColumnSpec> {
    names.iter().map(|n| ColumnSpec::text(*n)).collect()
}

struct Latency {
    rng: Mutex<SmallRng>,
    min_ms: u64,
    max_ms: u64,
}

impl Latency {
    fn next(&self) -> Duration {
        let mut rng = self.rng.lock().unwrap();
        Duration::from_millis(rng.gen_range(self.min_ms..=self.max_ms))
    }
}

/// Deterministic row transform keyed on the `id` column.
///
/// Succeeds with `expected_value` for every requested column unless the id
/// is a multiple of `fail_every`.
pub struct ScriptedTransform {
    cost: u64,
    fail_every: Option<usize>,
    fail_cost: u64,
    latency: Option<Latency>,
    calls: AtomicUsize,
}

impl ScriptedTransform {
    pub fn new(cost: u64) -> Self {
        ScriptedTransform {
            cost,
            fail_every: None,
            fail_cost: 0,
            latency: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_every(mut self, every: usize, cost: u64) -> Self {
        self.fail_every = Some(every);
        self.fail_cost = cost;
        self
    }

    /// Sleeps a uniformly random `min_ms..=max_ms` per call.
    pub fn with_latency(mut self, min_ms: u64, max_ms: u64, seed: u64) -> Self {
        self.latency = Some(Latency {
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
            min_ms,
            max_ms,
        });
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fails(&self, id: usize) -> bool {
        self.fail_every.is_some_and(|every| id % every == 0)
    }
}

#[async_trait]
impl RowTransform for ScriptedTransform {
    async fn transform(
        &self,
        row: &Row,
        columns: &[ColumnSpec],
        _instruction: &str,
        _cancel: &CancellationToken,
    ) -> TransformOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = &self.latency {
            tokio::time::sleep(latency.next()).await;
        }

        let Some(id) = row.get(ID_COLUMN).and_then(|v| v.parse::<usize>().ok()) else {
            return TransformOutcome::failure(TransformError::Other("row has no id".into()), 0);
        };

        if self.fails(id) {
            return TransformOutcome::failure(
                TransformError::Other(format!("row {id} rejected")),
                self.fail_cost,
            );
        }

        let values = columns
            .iter()
            .map(|c| (c.name.clone(), expected_value(&c.name, id)))
            .collect::<HashMap<_, _>>();
        TransformOutcome::success(values, self.cost)
    }
}

/// Keeps every table handed to it instead of touching the disk.
#[derive(Default)]
pub struct MemoryWriter {
    snapshots: Mutex<Vec<(PathBuf, Vec<Vec<String>>)>>,
}

impl MemoryWriter {
    pub fn snapshots(&self) -> Vec<Vec<Vec<String>>> {
        self.snapshots
            .lock()
            .unwrap()
            .iter()
            .map(|(_, rows)| rows.clone())
            .collect()
    }

    pub fn last(&self) -> Option<Vec<Vec<String>>> {
        self.snapshots.lock().unwrap().last().map(|(_, rows)| rows.clone())
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.snapshots
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }
}

impl TableWriter for MemoryWriter {
    fn write(&self, path: &Path, _headers: &[String], rows: &[Vec<String>]) -> Result<(), FileError> {
        self.snapshots
            .lock()
            .unwrap()
            .push((path.to_path_buf(), rows.to_vec()));
        Ok(())
    }
}

/// Fires `cancel` once `after` results have been reported.
pub struct CancelAfter {
    after: u64,
    cancel: CancellationToken,
    reports: Arc<AtomicUsize>,
}

impl CancelAfter {
    pub fn new(after: u64, cancel: CancellationToken) -> (Self, Arc<AtomicUsize>) {
        let reports = Arc::new(AtomicUsize::new(0));
        let sink = CancelAfter {
            after,
            cancel,
            reports: reports.clone(),
        };
        (sink, reports)
    }
}

impl ProgressSink for CancelAfter {
    fn report(&mut self, snapshot: &StatsSnapshot) {
        self.reports.fetch_add(1, Ordering::SeqCst);
        if snapshot.processed() == self.after {
            self.cancel.cancel();
        }
    }

    fn finish(&mut self, _snapshot: &StatsSnapshot) {}
}

pub fn job(
    table: Table,
    columns: Vec<ColumnSpec>,
    transform: Arc<dyn RowTransform>,
    writer: Arc<dyn TableWriter>,
    output: impl Into<PathBuf>,
    config: PipelineConfig,
) -> EnrichmentJob {
    EnrichmentJob {
        table: Arc::new(table),
        columns,
        instruction: "fill the columns".to_string(),
        transform,
        writer,
        output: output.into(),
        config,
    }
}
