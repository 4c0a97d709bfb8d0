use crate::{error::PipelineError, execution::workers};
use connectors::file::TableWriter;
use engine_core::{
    checkpoint::CheckpointWriter,
    metrics::{RunStats, StatsSnapshot},
    progress::ProgressSink,
};
use engine_processing::{
    config::PipelineConfig, consumer::ResultSink, transform::RowTransform, worker::WorkerPool,
};
use model::{
    core::column::ColumnSpec,
    records::{output::OutputTable, table::Table},
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Everything one enrichment run needs.
pub struct EnrichmentJob {
    pub table: Arc<Table>,
    pub columns: Vec<ColumnSpec>,
    pub instruction: String,
    pub transform: Arc<dyn RowTransform>,
    pub writer: Arc<dyn TableWriter>,
    /// Final artifact; checkpoints go to a working file beside it.
    pub output: PathBuf,
    pub config: PipelineConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every row received a result.
    Completed,
    /// Dispatch was cut short; the table is partially filled.
    Cancelled,
}

pub struct RunReport {
    pub outcome: RunOutcome,
    pub stats: StatsSnapshot,
    /// Tasks put on the task channel.
    pub sent: usize,
    /// Tasks taken and answered by workers; equals applied results.
    pub dispatched: usize,
    pub table: OutputTable,
    checkpoints: CheckpointWriter,
}

impl RunReport {
    pub fn checkpoint_path(&self) -> &Path {
        self.checkpoints.working_path()
    }

    pub fn output_path(&self) -> &Path {
        self.checkpoints.final_path()
    }

    /// Promotes the last checkpoint to the final output. Only a completed run
    /// may be finalized; a cancelled one keeps its working file.
    pub fn finalize(self) -> Result<PathBuf, PipelineError> {
        match self.outcome {
            RunOutcome::Completed => Ok(self.checkpoints.finalize(&self.table)?),
            RunOutcome::Cancelled => Err(PipelineError::NotCompleted),
        }
    }
}

/// Drives `job` to completion or cancellation.
pub async fn run(
    job: EnrichmentJob,
    progress: Box<dyn ProgressSink>,
    cancel: CancellationToken,
) -> Result<RunReport, PipelineError> {
    let started = Instant::now();
    let EnrichmentJob {
        table,
        columns,
        instruction,
        transform,
        writer,
        output,
        config,
    } = job;

    let total = table.len();
    info!(
        rows = total,
        columns = columns.len(),
        workers = config.workers.get(),
        batch_size = config.batch_size.get(),
        output = %output.display(),
        "Starting enrichment run"
    );

    let stats = RunStats::new(total);
    let output_table = OutputTable::new(&table, &columns);
    let checkpoints = CheckpointWriter::new(writer, output);

    let pool = WorkerPool::new(
        transform,
        columns.into(),
        instruction,
        config.workers,
        cancel.clone(),
    );
    let sink = ResultSink::new(output_table, stats.clone(), checkpoints, progress, cancel.clone())
        .with_batch_size(config.batch_size)
        .with_interval(config.checkpoint_interval);

    let finished = workers::spawn(table, pool, sink, config.channel_capacity(), cancel).await?;

    let stats = stats.snapshot();
    debug_assert_eq!(stats.processed() as usize, finished.sink.applied);

    let outcome = if finished.sink.applied == total {
        RunOutcome::Completed
    } else {
        RunOutcome::Cancelled
    };

    match outcome {
        RunOutcome::Completed => info!(
            rows = total,
            failed = stats.failed,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Enrichment run completed"
        ),
        RunOutcome::Cancelled => warn!(
            processed = finished.sink.applied,
            rows = total,
            checkpoint = %finished.sink.checkpoints.working_path().display(),
            "Enrichment run cancelled"
        ),
    }

    Ok(RunReport {
        outcome,
        stats,
        sent: finished.sent,
        dispatched: finished.dispatched,
        table: finished.sink.table,
        checkpoints: finished.sink.checkpoints,
    })
}
