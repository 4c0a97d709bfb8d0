use crate::metrics::StatsSnapshot;
use std::{
    fmt,
    io::{self, Write},
    time::Duration,
};

/// Average of the input and output list prices of the default model, per unit.
pub const DEFAULT_USD_PER_UNIT: f64 = (0.15 + 0.60) / 2.0 / 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub usd_per_unit: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        CostModel {
            usd_per_unit: DEFAULT_USD_PER_UNIT,
        }
    }
}

impl CostModel {
    pub fn new(usd_per_unit: f64) -> Self {
        CostModel { usd_per_unit }
    }

    pub fn estimate(&self, units: u64) -> f64 {
        units as f64 * self.usd_per_unit
    }
}

/// One rendering of the overwrite-style progress line.
#[derive(Debug, Clone, Copy)]
pub struct ProgressLine {
    pub snapshot: StatsSnapshot,
    pub cost: CostModel,
}

impl ProgressLine {
    pub fn new(snapshot: StatsSnapshot, cost: CostModel) -> Self {
        ProgressLine { snapshot, cost }
    }
}

impl fmt::Display for ProgressLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.snapshot;
        write!(
            f,
            "Progress: {}/{} ({:.1}%) | Failed: {} | Tokens: {} | Cost: ${:.4} | Elapsed: {}",
            s.processed(),
            s.total_rows,
            s.percent(),
            s.failed,
            s.cost_units,
            self.cost.estimate(s.cost_units),
            format_elapsed(s.elapsed),
        )
    }
}

/// `45s`, `3m07s`, `1h02m09s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    match (h, m) {
        (0, 0) => format!("{s}s"),
        (0, _) => format!("{m}m{s:02}s"),
        _ => format!("{h}h{m:02}m{s:02}s"),
    }
}

/// Receives a fresh snapshot after every applied result.
pub trait ProgressSink: Send {
    fn report(&mut self, snapshot: &StatsSnapshot);

    /// Called once after the last result; the line should be terminated.
    fn finish(&mut self, snapshot: &StatsSnapshot);
}

/// Rewrites a single line on stdout with `\r`. Logs stay on stderr.
pub struct ConsoleProgress<W = io::Stdout> {
    cost: CostModel,
    out: W,
}

impl ConsoleProgress {
    pub fn new(cost: CostModel) -> Self {
        Self::with_writer(cost, io::stdout())
    }
}

impl<W: Write> ConsoleProgress<W> {
    pub fn with_writer(cost: CostModel, out: W) -> Self {
        ConsoleProgress { cost, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, snapshot: &StatsSnapshot, end: &str) {
        let line = ProgressLine::new(*snapshot, self.cost);
        // Progress output is best effort; a closed stdout must not stop the run.
        let _ = write!(self.out, "\r\x1b[2K{line}{end}");
        let _ = self.out.flush();
    }
}

impl<W: Write + Send> ProgressSink for ConsoleProgress<W> {
    fn report(&mut self, snapshot: &StatsSnapshot) {
        self.draw(snapshot, "");
    }

    fn finish(&mut self, snapshot: &StatsSnapshot) {
        self.draw(snapshot, "\n");
    }
}

/// Emits progress through `tracing`, throttled to every `every`-th result.
pub struct LogProgress {
    cost: CostModel,
    every: u64,
}

impl LogProgress {
    pub fn new(cost: CostModel, every: u64) -> Self {
        LogProgress {
            cost,
            every: every.max(1),
        }
    }
}

impl ProgressSink for LogProgress {
    fn report(&mut self, snapshot: &StatsSnapshot) {
        if snapshot.processed() % self.every == 0 {
            tracing::info!("{}", ProgressLine::new(*snapshot, self.cost));
        }
    }

    fn finish(&mut self, snapshot: &StatsSnapshot) {
        tracing::info!("{}", ProgressLine::new(*snapshot, self.cost));
    }
}

#[derive(Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&mut self, _snapshot: &StatsSnapshot) {}
    fn finish(&mut self, _snapshot: &StatsSnapshot) {}
}
