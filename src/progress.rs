//! Progress reporting over the model queries of a run.
//!
//! With the `progress` feature, [`QueryProgress`] renders an `indicatif` bar with the
//! last and smoothed query latency. Without it, the same API is a no-op, so the
//! pipeline does not need feature gates of its own.
//!
//! The smoothed latency is an exponential moving average:
//! `ema ← α·dt + (1–α)·ema`, initialized with the first sample.
use std::time::Duration;

/// Exponential moving average of query latencies.
#[derive(Debug, Clone)]
pub struct LatencyAverage {
    ema_ns: f64,
    alpha: f64,
    count: u64,
}

impl LatencyAverage {
    pub fn new(alpha: f64) -> Self {
        Self {
            ema_ns: 0.0,
            alpha,
            count: 0,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        let dt_ns = dt.as_nanos() as f64;
        self.count += 1;
        self.ema_ns = if self.count == 1 {
            dt_ns
        } else {
            self.alpha * dt_ns + (1.0 - self.alpha) * self.ema_ns
        };
    }

    pub fn avg(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.ema_ns as u64)
        }
    }
}

/// Human readable duration: `253µs`, `42ms` or `3.14s`.
pub fn fmt_dur(d: Duration) -> String {
    let us = d.as_micros();
    if us < 1_000 {
        format!("{us}µs")
    } else if d.as_millis() < 1_000 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.2}s", d.as_secs_f32())
    }
}

#[cfg(feature = "progress")]
pub struct QueryProgress {
    bar: indicatif::ProgressBar,
    latency: LatencyAverage,
}

#[cfg(feature = "progress")]
impl QueryProgress {
    pub fn new(total: usize) -> Self {
        use indicatif::{ProgressBar, ProgressStyle};

        let bar = ProgressBar::new(total.max(1) as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} ({percent:>3}%) | {per_sec} | ETA {eta_precise} | {msg}",
        ) {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(200));
        QueryProgress {
            bar,
            latency: LatencyAverage::new(0.2),
        }
    }

    /// One query answered (or failed) after `elapsed`.
    pub fn query_done(&mut self, elapsed: Duration) {
        self.latency.record(elapsed);
        self.bar.set_message(format!(
            "last: {}, avg: {}",
            fmt_dur(elapsed),
            fmt_dur(self.latency.avg())
        ));
        self.bar.inc(1);
    }

    pub fn finish(self) {
        self.bar.disable_steady_tick();
        self.bar.finish_and_clear();
    }
}

#[cfg(not(feature = "progress"))]
pub struct QueryProgress;

#[cfg(not(feature = "progress"))]
impl QueryProgress {
    pub fn new(_total: usize) -> Self {
        QueryProgress
    }

    pub fn query_done(&mut self, _elapsed: Duration) {}

    pub fn finish(self) {}
}
