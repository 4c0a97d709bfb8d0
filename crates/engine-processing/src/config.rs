use std::{num::NonZeroUsize, time::Duration};

const DEFAULT_WORKERS: usize = 10;
const DEFAULT_BATCH_SIZE: usize = 100;
const DEFAULT_CHECKPOINT_INTERVAL: Duration = Duration::from_secs(30);

/// Tuning knobs of one enrichment run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Concurrent row transforms.
    pub workers: NonZeroUsize,

    /// Checkpoint after every this many applied results.
    pub batch_size: NonZeroUsize,

    /// Checkpoint on this wall-clock period regardless of throughput.
    pub checkpoint_interval: Duration,

    /// Capacity of the task and result channels. Defaults to twice the
    /// worker count.
    channel_capacity: Option<NonZeroUsize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: NonZeroUsize::new(DEFAULT_WORKERS).unwrap_or(NonZeroUsize::MIN),
            batch_size: NonZeroUsize::new(DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN),
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            channel_capacity: None,
        }
    }
}

impl PipelineConfig {
    /// Zero is clamped to one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = NonZeroUsize::new(workers).unwrap_or(NonZeroUsize::MIN);
        self
    }

    /// Zero is clamped to one.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = NonZeroUsize::new(size).unwrap_or(NonZeroUsize::MIN);
        self
    }

    pub fn with_checkpoint_interval(mut self, interval: Duration) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = NonZeroUsize::new(capacity);
        self
    }

    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
            .map(NonZeroUsize::get)
            .unwrap_or_else(|| self.workers.get() * 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.workers.get(), 10);
        assert_eq!(config.batch_size.get(), 100);
        assert_eq!(config.checkpoint_interval, Duration::from_secs(30));
        assert_eq!(config.channel_capacity(), 20);
    }

    #[test]
    fn builder_clamps_zero_and_tracks_workers() {
        let config = PipelineConfig::default().with_workers(0).with_batch_size(0);
        assert_eq!(config.workers.get(), 1);
        assert_eq!(config.batch_size.get(), 1);
        assert_eq!(config.channel_capacity(), 2);

        let config = PipelineConfig::default().with_workers(4).with_channel_capacity(7);
        assert_eq!(config.channel_capacity(), 7);
    }
}
