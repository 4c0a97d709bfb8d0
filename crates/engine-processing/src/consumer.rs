use crate::error::ConsumerError;
use engine_core::{
    checkpoint::{CheckpointStatus, CheckpointWriter},
    metrics::RunStats,
    progress::ProgressSink,
};
use model::records::{output::OutputTable, task::RowResult};
use std::{num::NonZeroUsize, time::Duration};
use tokio::{
    sync::mpsc,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(100).unwrap();
const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// What the sink hands back once the result channel is closed.
pub struct SinkOutput {
    pub table: OutputTable,
    pub checkpoints: CheckpointWriter,
    /// Results applied to the table.
    pub applied: usize,
    /// Cancellation was observed before the channel closed.
    pub cancelled: bool,
}

/// Single writer of the output table and the run statistics.
///
/// Applies results by row index as they arrive, reports progress after each
/// one and checkpoints every `batch_size` results, on a wall-clock interval,
/// when cancellation is first observed and once more at the end. After
/// cancellation it keeps draining until every worker has dropped its sender.
pub struct ResultSink {
    table: OutputTable,
    stats: RunStats,
    checkpoints: CheckpointWriter,
    progress: Box<dyn ProgressSink>,
    batch_size: NonZeroUsize,
    interval: Duration,
    cancel: CancellationToken,
}

impl ResultSink {
    pub fn new(
        table: OutputTable,
        stats: RunStats,
        checkpoints: CheckpointWriter,
        progress: Box<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> Self {
        ResultSink {
            table,
            stats,
            checkpoints,
            progress,
            batch_size: DEFAULT_BATCH_SIZE,
            interval: DEFAULT_INTERVAL,
            cancel,
        }
    }

    pub fn with_batch_size(mut self, batch_size: NonZeroUsize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub async fn run(
        mut self,
        mut result_rx: mpsc::Receiver<RowResult>,
    ) -> Result<SinkOutput, ConsumerError> {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut applied = 0usize;
        let mut cancelled = false;

        loop {
            // Cancel and the ticker go first so a backlog of results cannot
            // starve them.
            tokio::select! {
                biased;
                _ = self.cancel.cancelled(), if !cancelled => {
                    cancelled = true;
                    info!(applied, "Cancellation observed. Draining in-flight results.");
                    self.checkpoint("cancel");
                }
                _ = ticker.tick() => {
                    self.checkpoint("interval");
                }
                received = result_rx.recv() => {
                    let Some(result) = received else {
                        break;
                    };
                    self.apply(result)?;
                    applied += 1;
                    if applied % self.batch_size.get() == 0 {
                        self.checkpoint("batch");
                    }
                }
            }
        }

        self.checkpoints.checkpoint(&self.table)?;

        let snapshot = self.stats.snapshot();
        self.progress.finish(&snapshot);
        info!(
            applied,
            completed = snapshot.completed,
            failed = snapshot.failed,
            cost_units = snapshot.cost_units,
            "Result sink finished."
        );

        Ok(SinkOutput {
            table: self.table,
            checkpoints: self.checkpoints,
            applied,
            cancelled,
        })
    }

    fn apply(&mut self, result: RowResult) -> Result<(), ConsumerError> {
        self.table.apply(result.row_index, &result.values)?;

        if result.is_failure() {
            self.stats.record_failure(result.cost);
        } else {
            self.stats.record_success(result.cost);
        }

        self.progress.report(&self.stats.snapshot());
        Ok(())
    }

    /// Mid-run checkpoints are best effort; the final one is not.
    fn checkpoint(&mut self, reason: &'static str) {
        match self.checkpoints.checkpoint(&self.table) {
            Ok(CheckpointStatus::Written) => {
                debug!(reason, rows_written = self.table.rows_written(), "Checkpoint written.")
            }
            Ok(CheckpointStatus::Unchanged) => {}
            Err(err) => warn!(reason, error = %err, "Checkpoint failed, continuing."),
        }
    }
}
