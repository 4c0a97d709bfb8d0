use crate::error::ProducerError;
use model::records::{table::Table, task::Task};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Streams every row of the input table, in ascending index order, into the
/// task channel.
///
/// The channel closes when the source returns and drops its sender, which
/// happens exactly once: after the last row is offered or as soon as
/// cancellation is observed.
pub struct TaskSource {
    table: Arc<Table>,
    task_tx: mpsc::Sender<Task>,
    cancel: CancellationToken,
}

impl TaskSource {
    pub fn new(table: Arc<Table>, task_tx: mpsc::Sender<Task>, cancel: CancellationToken) -> Self {
        TaskSource {
            table,
            task_tx,
            cancel,
        }
    }

    /// Returns the number of tasks handed to the channel.
    pub async fn run(self) -> Result<usize, ProducerError> {
        let total = self.table.len();
        let mut sent = 0usize;

        for (row_index, row) in self.table.rows().iter().enumerate() {
            if self.cancel.is_cancelled() {
                break;
            }

            let task = Task::new(row_index, row.clone());
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(row_index, "send abandoned on cancellation");
                    break;
                }
                res = self.task_tx.send(task) => {
                    res.map_err(|_| ProducerError::ChannelClosed)?;
                    sent += 1;
                }
            }
        }

        if sent < total {
            info!(sent, total, "Cancellation requested. Task source stopped dispatching.");
        } else {
            info!(sent, "All rows dispatched.");
        }

        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn table(rows: usize) -> Arc<Table> {
        Arc::new(Table::new(
            vec!["id".into()],
            (0..rows).map(|i| vec![i.to_string()]).collect(),
        ))
    }

    #[tokio::test]
    async fn sends_rows_in_order_then_closes() {
        let (tx, mut rx) = mpsc::channel(4);
        let source = TaskSource::new(table(10), tx, CancellationToken::new());
        let handle = tokio::spawn(source.run());

        let mut seen = Vec::new();
        while let Some(task) = rx.recv().await {
            assert_eq!(task.row.get("id"), Some(task.row_index.to_string().as_str()));
            seen.push(task.row_index);
        }

        assert_eq!(seen, (0..10).collect::<Vec<_>>());
        assert_eq!(handle.await.unwrap().unwrap(), 10);
    }

    #[tokio::test]
    async fn pending_send_is_abandoned_on_cancel() {
        let (tx, mut rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(TaskSource::new(table(100), tx, cancel.clone()).run());

        // Nobody drains the channel, so the second send blocks.
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let sent = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("source must not hang")
            .unwrap()
            .unwrap();
        assert_eq!(sent, 1);

        assert_eq!(rx.recv().await.unwrap().row_index, 0);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn nothing_is_sent_after_early_cancel() {
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let sent = TaskSource::new(table(5), tx, cancel).run().await.unwrap();
        assert_eq!(sent, 0);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn closed_channel_is_an_error() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let err = TaskSource::new(table(3), tx, CancellationToken::new())
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, ProducerError::ChannelClosed));
    }
}
