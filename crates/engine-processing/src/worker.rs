use crate::{
    error::{TransformError, WorkerError},
    transform::{RowTransform, TransformOutcome},
};
use futures::future::join_all;
use model::{
    core::column::ColumnSpec,
    records::task::{RowResult, Task},
};
use std::{collections::HashMap, num::NonZeroUsize, sync::Arc};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fixed set of executors sharing one task queue.
///
/// Each executor takes a task, invokes the row transform once and sends
/// exactly one result before taking the next. Transform failures become
/// sentinel-filled results; they never stop a worker.
pub struct WorkerPool {
    transform: Arc<dyn RowTransform>,
    columns: Arc<[ColumnSpec]>,
    instruction: Arc<str>,
    workers: NonZeroUsize,
    cancel: CancellationToken,
}

struct Worker {
    id: usize,
    transform: Arc<dyn RowTransform>,
    columns: Arc<[ColumnSpec]>,
    instruction: Arc<str>,
    task_rx: Arc<Mutex<mpsc::Receiver<Task>>>,
    result_tx: mpsc::Sender<RowResult>,
    cancel: CancellationToken,
}

impl WorkerPool {
    pub fn new(
        transform: Arc<dyn RowTransform>,
        columns: Arc<[ColumnSpec]>,
        instruction: impl Into<Arc<str>>,
        workers: NonZeroUsize,
        cancel: CancellationToken,
    ) -> Self {
        WorkerPool {
            transform,
            columns,
            instruction: instruction.into(),
            workers,
            cancel,
        }
    }

    /// Runs every worker to completion and returns how many tasks were taken
    /// off the queue. The result channel closes once all workers are done.
    pub async fn run(
        self,
        task_rx: mpsc::Receiver<Task>,
        result_tx: mpsc::Sender<RowResult>,
    ) -> Result<usize, WorkerError> {
        let task_rx = Arc::new(Mutex::new(task_rx));

        let handles: Vec<_> = (0..self.workers.get())
            .map(|id| {
                let worker = Worker {
                    id,
                    transform: Arc::clone(&self.transform),
                    columns: Arc::clone(&self.columns),
                    instruction: Arc::clone(&self.instruction),
                    task_rx: Arc::clone(&task_rx),
                    result_tx: result_tx.clone(),
                    cancel: self.cancel.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();
        drop(result_tx);

        let mut processed = 0;
        let mut first_error = None;
        for joined in join_all(handles).await {
            match joined {
                Ok(Ok(count)) => processed += count,
                Ok(Err(err)) => {
                    first_error.get_or_insert(err);
                }
                Err(join_err) => {
                    first_error.get_or_insert(WorkerError::Join(join_err.to_string()));
                }
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }

        info!(workers = self.workers.get(), processed, "Worker pool finished.");
        Ok(processed)
    }
}

impl Worker {
    async fn run(self) -> Result<usize, WorkerError> {
        let mut processed = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                task = async { self.task_rx.lock().await.recv().await } => task,
            };

            let Some(task) = next else {
                break;
            };

            let row_index = task.row_index;
            let outcome = self
                .transform
                .transform(&task.row, &self.columns, &self.instruction, &self.cancel)
                .await;
            let result = self.build_result(task, outcome);

            self.result_tx
                .send(result)
                .await
                .map_err(|_| WorkerError::ResultChannelClosed {
                    worker: self.id,
                    row_index,
                })?;
            processed += 1;
        }

        debug!(worker = self.id, processed, "Worker exiting.");
        Ok(processed)
    }

    fn build_result(&self, task: Task, outcome: TransformOutcome) -> RowResult {
        let TransformOutcome { values, cost } = outcome;
        match values.and_then(|values| covering(values, &self.columns)) {
            Ok(values) => RowResult::success(task, values, cost),
            Err(err) => {
                warn!(row = task.row_index, error = %err, "Row transform failed.");
                RowResult::failure(task, &self.columns, err, cost)
            }
        }
    }
}

/// A success must produce every target column, otherwise the row is failed
/// as a whole instead of being partially filled.
fn covering(
    values: HashMap<String, String>,
    columns: &[ColumnSpec],
) -> Result<HashMap<String, String>, TransformError> {
    match columns.iter().find(|c| !values.contains_key(&c.name)) {
        Some(missing) => Err(TransformError::MissingField(missing.name.clone())),
        None => Ok(values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use model::records::{row::Row, table::Table};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    /// Upper-cases the `name` field; fails on odd rows when asked to.
    struct Upper {
        calls: AtomicUsize,
        fail_odd: bool,
    }

    #[async_trait]
    impl RowTransform for Upper {
        async fn transform(
            &self,
            row: &Row,
            _columns: &[ColumnSpec],
            _instruction: &str,
            _cancel: &CancellationToken,
        ) -> TransformOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let id: usize = row.get("id").unwrap_or("0").parse().unwrap_or(0);
            if self.fail_odd && id % 2 == 1 {
                return TransformOutcome::failure(TransformError::Other("odd".into()), 1);
            }
            let name = row.get("name").unwrap_or_default().to_uppercase();
            TransformOutcome::success(HashMap::from([("upper".to_string(), name)]), 2)
        }
    }

    fn tasks(n: usize) -> Vec<Task> {
        let table = Table::new(
            vec!["id".into(), "name".into()],
            (0..n).map(|i| vec![i.to_string(), format!("n{i}")]).collect(),
        );
        table
            .rows()
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, row)| Task::new(i, row))
            .collect()
    }

    fn pool(transform: Arc<dyn RowTransform>, workers: usize, cancel: CancellationToken) -> WorkerPool {
        WorkerPool::new(
            transform,
            vec![ColumnSpec::text("upper")].into(),
            "upper-case the name",
            NonZeroUsize::new(workers).unwrap(),
            cancel,
        )
    }

    async fn run_all(
        transform: Arc<dyn RowTransform>,
        n: usize,
        workers: usize,
    ) -> (usize, Vec<RowResult>) {
        let (task_tx, task_rx) = mpsc::channel(n.max(1));
        let (result_tx, mut result_rx) = mpsc::channel(n.max(1));
        for task in tasks(n) {
            task_tx.send(task).await.unwrap();
        }
        drop(task_tx);

        let processed = pool(transform, workers, CancellationToken::new())
            .run(task_rx, result_tx)
            .await
            .unwrap();

        let mut results = Vec::new();
        while let Some(result) = result_rx.recv().await {
            results.push(result);
        }
        (processed, results)
    }

    #[tokio::test]
    async fn one_result_per_task() {
        let transform = Arc::new(Upper {
            calls: AtomicUsize::new(0),
            fail_odd: false,
        });
        let (processed, mut results) = run_all(transform.clone(), 25, 4).await;

        assert_eq!(processed, 25);
        assert_eq!(transform.calls.load(Ordering::SeqCst), 25);
        results.sort_by_key(|r| r.row_index);
        let indices: Vec<_> = results.iter().map(|r| r.row_index).collect();
        assert_eq!(indices, (0..25).collect::<Vec<_>>());
        assert_eq!(results[3].values["upper"], "N3");
        assert_eq!(results[3].cost, 2);
    }

    #[tokio::test]
    async fn failures_become_sentinel_results() {
        let transform = Arc::new(Upper {
            calls: AtomicUsize::new(0),
            fail_odd: true,
        });
        let (_, results) = run_all(transform, 6, 2).await;

        for result in results {
            if result.row_index % 2 == 1 {
                assert!(result.is_failure());
                assert_eq!(result.values["upper"], "ERROR: odd");
                assert_eq!(result.cost, 1);
            } else {
                assert!(!result.is_failure());
            }
        }
    }

    #[test]
    fn partial_success_is_a_failure() {
        let columns = vec![ColumnSpec::text("a"), ColumnSpec::text("b")];
        let values = HashMap::from([("a".to_string(), "1".to_string())]);
        let err = covering(values, &columns).unwrap_err();
        assert!(matches!(err, TransformError::MissingField(ref c) if c == "b"));
    }

    #[tokio::test]
    async fn cancelled_pool_takes_no_tasks() {
        let transform = Arc::new(Upper {
            calls: AtomicUsize::new(0),
            fail_odd: false,
        });
        let (task_tx, task_rx) = mpsc::channel(8);
        let (result_tx, mut result_rx) = mpsc::channel(8);
        for task in tasks(5) {
            task_tx.send(task).await.unwrap();
        }

        let cancel = CancellationToken::new();
        cancel.cancel();
        let processed = pool(transform.clone(), 3, cancel)
            .run(task_rx, result_tx)
            .await
            .unwrap();

        assert_eq!(processed, 0);
        assert_eq!(transform.calls.load(Ordering::SeqCst), 0);
        assert!(result_rx.recv().await.is_none());
    }
}
