// SPDX-License-Identifier: MIT OR Apache-2.0
//! Minimal start/end timing harness.
//!
//! A benchmark body receives a [`Stopwatch`], calls [`Stopwatch::start`]
//! right before the operation under test and [`Stopwatch::end`] right after
//! it.  [`run_bench`] runs the body a fixed number of times and sums the
//! timed regions into a [`BenchReport`].
#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Iterations used when none (or an unusable value) is given.
pub const DEFAULT_ITERATIONS: u64 = 200_000;

/// Parse the iteration-count argument.
///
/// Anything but a positive integer falls back to [`DEFAULT_ITERATIONS`].
pub fn parse_iterations(arg: Option<&str>) -> u64 {
    arg.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_ITERATIONS)
}

// ---------------------------------------------------------------------------
// Stopwatch
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Laps {
    started: Option<Instant>,
    total: Duration,
    count: u64,
}

/// Accumulating timer shared between the harness and a benchmark body.
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    laps: Arc<Mutex<Laps>>,
}

impl Stopwatch {
    /// Create a stopped stopwatch with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Laps> {
        self.laps.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin a timed region, discarding any region left open.
    pub fn start(&self) {
        self.lock().started = Some(Instant::now());
    }

    /// Close the open timed region and add it to the total.
    pub fn end(&self) {
        let mut laps = self.lock();
        match laps.started.take() {
            Some(started) => {
                laps.total += started.elapsed();
                laps.count += 1;
            }
            None => warn!(target: "rethrow.harness", "end() without start(), lap ignored"),
        }
    }

    /// Sum of all closed timed regions.
    pub fn elapsed(&self) -> Duration {
        self.lock().total
    }

    /// Number of closed timed regions.
    pub fn laps(&self) -> u64 {
        self.lock().count
    }
}

// ---------------------------------------------------------------------------
// BenchReport
// ---------------------------------------------------------------------------

/// Timing summary of one benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchReport {
    /// Benchmark label.
    pub label: String,
    /// Times the body was run.
    pub iterations: u64,
    /// Timed regions actually recorded.
    pub laps: u64,
    /// Total timed nanoseconds.
    pub total_ns: u64,
    /// Mean nanoseconds per recorded lap (0 when nothing was recorded).
    pub mean_ns: f64,
}

impl BenchReport {
    /// Build a report from raw totals.
    pub fn new(label: impl Into<String>, iterations: u64, laps: u64, total: Duration) -> Self {
        let total_ns = u64::try_from(total.as_nanos()).unwrap_or(u64::MAX);
        let mean_ns = if laps == 0 {
            0.0
        } else {
            total_ns as f64 / laps as f64
        };
        Self {
            label: label.into(),
            iterations,
            laps,
            total_ns,
            mean_ns,
        }
    }

    /// One human-readable line, e.g. `rethrow: 12.345 ms total, 61.7 ns/op (200000 ops)`.
    pub fn render_text(&self) -> String {
        format!(
            "{}: {:.3} ms total, {:.1} ns/op ({} ops)",
            self.label,
            self.total_ns as f64 / 1_000_000.0,
            self.mean_ns,
            self.laps
        )
    }

    /// One JSON object on a single line.
    pub fn render_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// run_bench
// ---------------------------------------------------------------------------

/// Run `body` `iterations` times, one after another, on the current task.
pub async fn run_bench<F, Fut>(label: &str, iterations: u64, mut body: F) -> BenchReport
where
    F: FnMut(Stopwatch) -> Fut,
    Fut: Future<Output = ()>,
{
    let stopwatch = Stopwatch::new();
    debug!(target: "rethrow.harness", label, iterations, "bench starting");
    for _ in 0..iterations {
        body(stopwatch.clone()).await;
    }
    let report = BenchReport::new(label, iterations, stopwatch.laps(), stopwatch.elapsed());
    debug!(
        target: "rethrow.harness",
        label,
        laps = report.laps,
        total_ns = report.total_ns,
        "bench finished"
    );
    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
