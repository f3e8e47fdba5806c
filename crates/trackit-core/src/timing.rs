//! Per-command dispatch latency.
//!
//! The engine owns a [`Timings`] collector. When it is enabled, every
//! dispatched command adds one sample under its command name; the CLI turns
//! the samples into a [`TimingReport`] after the run.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde_json::json;

pub const TIMING_ENV: &str = "TRACKIT_TIMING";

/// Returns true when `TRACKIT_TIMING` is `1`, `true`, `yes`, or `on`
/// (case-insensitive).
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var(TIMING_ENV)
        .ok()
        .is_some_and(|value| is_truthy(&value))
}

fn is_truthy(value: &str) -> bool {
    ["1", "true", "yes", "on"]
        .iter()
        .any(|truthy| value.trim().eq_ignore_ascii_case(truthy))
}

/// Latency samples grouped by operation name.
#[derive(Debug, Clone, Default)]
pub struct Timings {
    enabled: bool,
    samples: BTreeMap<String, Vec<Duration>>,
}

impl Timings {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            samples: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start a measurement; `None` while disabled.
    #[must_use]
    pub fn start(&self) -> Option<Instant> {
        self.enabled.then(Instant::now)
    }

    /// Close a measurement opened by [`Timings::start`].
    pub fn finish(&mut self, name: &str, started: Option<Instant>) {
        if let Some(started) = started {
            self.record(name, started.elapsed());
        }
    }

    pub fn record(&mut self, name: &str, elapsed: Duration) {
        if !self.enabled {
            return;
        }
        self.samples.entry(name.to_string()).or_default().push(elapsed);
    }

    #[must_use]
    pub fn report(&self) -> TimingReport {
        let operations = self
            .samples
            .iter()
            .map(|(name, values)| {
                let mut sorted = values.clone();
                sorted.sort_unstable();
                OpTiming {
                    name: name.clone(),
                    count: sorted.len(),
                    total: sorted.iter().sum(),
                    p50: percentile(&sorted, 50),
                    p95: percentile(&sorted, 95),
                    p99: percentile(&sorted, 99),
                }
            })
            .collect();
        TimingReport { operations }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpTiming {
    pub name: String,
    pub count: usize,
    pub total: Duration,
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
}

/// Aggregated latency, one row per command name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimingReport {
    pub operations: Vec<OpTiming>,
}

impl TimingReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let operations: Vec<_> = self
            .operations
            .iter()
            .map(|op| {
                json!({
                    "name": op.name,
                    "count": op.count,
                    "total_us": op.total.as_micros(),
                    "p50_us": op.p50.as_micros(),
                    "p95_us": op.p95.as_micros(),
                    "p99_us": op.p99.as_micros(),
                })
            })
            .collect();
        json!({ "operations": operations })
    }

    /// Fixed-width table for stderr.
    #[must_use]
    pub fn display_table(&self) -> String {
        use std::fmt::Write as _;

        if self.operations.is_empty() {
            return "No timing samples recorded.".to_string();
        }

        let mut out = String::new();
        out.push_str("command                               count      p50      p95      p99\n");
        out.push_str("-----------------------------------------------------------------------\n");
        for op in &self.operations {
            let _ = writeln!(
                out,
                "{:<36} {:>6} {:>8} {:>8} {:>8}",
                op.name,
                op.count,
                format_duration(op.p50),
                format_duration(op.p95),
                format_duration(op.p99)
            );
        }
        out
    }
}

/// Nearest-rank percentile of an ascending slice.
fn percentile(sorted: &[Duration], pct: usize) -> Duration {
    let Some(last) = sorted.len().checked_sub(1) else {
        return Duration::ZERO;
    };
    let rank = (pct.min(100) * sorted.len()).div_ceil(100);
    sorted[rank.saturating_sub(1).min(last)]
}

fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();
    match micros {
        0..=999 => format!("{micros}µs"),
        1_000..=999_999 => format!("{}.{:03}ms", micros / 1_000, micros % 1_000),
        _ => format!("{}.{:03}s", micros / 1_000_000, (micros % 1_000_000) / 1_000),
    }
}
