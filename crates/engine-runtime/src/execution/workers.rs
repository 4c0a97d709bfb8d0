use crate::error::PipelineError;
use engine_processing::{
    consumer::{ResultSink, SinkOutput},
    producer::TaskSource,
    worker::WorkerPool,
};
use model::records::{
    table::Table,
    task::{RowResult, Task},
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Counts and final state of one pipeline pass.
pub struct Finished {
    /// Tasks the source put on the channel.
    pub sent: usize,
    /// Tasks workers took off the channel and answered.
    pub dispatched: usize,
    pub sink: SinkOutput,
}

/// Launches source, pool and sink on their own tasks and waits for all three.
pub async fn spawn(
    table: Arc<Table>,
    pool: WorkerPool,
    sink: ResultSink,
    capacity: usize,
    cancel: CancellationToken,
) -> Result<Finished, PipelineError> {
    info!(capacity, rows = table.len(), "Launching workers");

    let (task_tx, task_rx) = mpsc::channel::<Task>(capacity);
    let (result_tx, result_rx) = mpsc::channel::<RowResult>(capacity);

    let source = TaskSource::new(table, task_tx, cancel);
    let producer_handle = tokio::spawn(source.run());
    let pool_handle = tokio::spawn(pool.run(task_rx, result_tx));
    let sink_handle = tokio::spawn(sink.run(result_rx));

    let (producer_result, pool_result, sink_result) =
        tokio::try_join!(producer_handle, pool_handle, sink_handle)?;

    // A failing sink closes the result channel, which then fails workers and
    // the source, so report downstream errors first.
    let sink = sink_result.inspect_err(|err| error!("Result sink error: {}", err))?;
    let dispatched = pool_result.inspect_err(|err| error!("Worker error: {}", err))?;
    let sent = producer_result.inspect_err(|err| error!("Task source error: {}", err))?;

    Ok(Finished {
        sent,
        dispatched,
        sink,
    })
}
