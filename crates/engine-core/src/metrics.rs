use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

#[derive(Debug)]
struct InnerStats {
    total_rows: u64,
    completed: AtomicU64,
    failed: AtomicU64,
    cost_units: AtomicU64,
    started: Instant,
    started_at: DateTime<Utc>,
}

/// Running counters of one pipeline run.
///
/// Cheap to clone; every clone shares the same counters. Increments are
/// atomic and [`RunStats::snapshot`] can be taken from any thread while the
/// run is in progress.
#[derive(Debug, Clone)]
pub struct RunStats {
    inner: Arc<InnerStats>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatsSnapshot {
    pub total_rows: u64,
    pub completed: u64,
    pub failed: u64,
    pub cost_units: u64,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
    pub started_at: DateTime<Utc>,
}

impl RunStats {
    pub fn new(total_rows: usize) -> Self {
        RunStats {
            inner: Arc::new(InnerStats {
                total_rows: total_rows as u64,
                completed: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                cost_units: AtomicU64::new(0),
                started: Instant::now(),
                started_at: Utc::now(),
            }),
        }
    }

    pub fn record_success(&self, cost: u64) {
        self.inner.completed.fetch_add(1, Ordering::Relaxed);
        self.add_cost(cost);
    }

    /// Failed calls may still have consumed billable units, so cost is kept.
    pub fn record_failure(&self, cost: u64) {
        self.inner.failed.fetch_add(1, Ordering::Relaxed);
        self.add_cost(cost);
    }

    fn add_cost(&self, cost: u64) {
        self.inner.cost_units.fetch_add(cost, Ordering::Relaxed);
    }

    pub fn total_rows(&self) -> u64 {
        self.inner.total_rows
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_rows: self.inner.total_rows,
            completed: self.inner.completed.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
            cost_units: self.inner.cost_units.load(Ordering::Relaxed),
            elapsed: self.inner.started.elapsed(),
            started_at: self.inner.started_at,
        }
    }
}

impl StatsSnapshot {
    /// Rows whose result has been applied, successful or not.
    pub fn processed(&self) -> u64 {
        self.completed + self.failed
    }

    pub fn percent(&self) -> f64 {
        if self.total_rows == 0 {
            return 100.0;
        }
        self.processed() as f64 * 100.0 / self.total_rows as f64
    }

    /// Mean wall time per successful row.
    pub fn average_per_success(&self) -> Option<Duration> {
        (self.completed > 0).then(|| self.elapsed.div_f64(self.completed as f64))
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }
}
