use std::fmt::{self, Display, Formatter};

use super::mode::Mode;

/// Seconds of rendering after which a benchmark run is over.
pub const BENCHMARK_DEADLINE_SECS: i64 = 120;

/// Counters pulled from the engine on one poll tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawCounters {
    pub sample_count: f64,
    pub elapsed_secs: f64,
    pub ray_count: f64,
    pub triangle_count: f64,
}

/// Per-second rate of `count` over `elapsed` whole seconds, 0 before any time has passed.
pub fn rate_per_sec(count: f64, elapsed: i64) -> f64 {
    if elapsed > 0 {
        count / elapsed as f64
    } else {
        0.0
    }
}

pub fn samples_per_sec(sample_count: f64, elapsed: i64) -> f64 {
    rate_per_sec(sample_count, elapsed)
}

/// A run is complete strictly after the deadline, and only in modes that have one.
pub fn is_complete(mode: Mode, elapsed: i64) -> bool {
    elapsed > BENCHMARK_DEADLINE_SECS && mode.has_deadline()
}

/// Score reported for a run: thousands of samples per second, truncated.
pub fn score(samples_per_sec: f64) -> u64 {
    (samples_per_sec / 1000.0) as u64
}

/// Everything derived from one tick's counters. Recomputed every tick, never stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetricsSnapshot {
    pub mode: Mode,
    pub elapsed_secs: i64,
    pub sample_count: f64,
    pub samples_per_sec: f64,
    pub rays_per_sec: f64,
    pub triangle_count: f64,
    pub complete: bool,
}

impl MetricsSnapshot {
    pub fn new(mode: Mode, counters: RawCounters) -> Self {
        // The engine reports fractional seconds; the deadline works on whole ones.
        let elapsed_secs = counters.elapsed_secs as i64;
        Self {
            mode,
            elapsed_secs,
            sample_count: counters.sample_count,
            samples_per_sec: samples_per_sec(counters.sample_count, elapsed_secs),
            rays_per_sec: rate_per_sec(counters.ray_count, elapsed_secs),
            triangle_count: counters.triangle_count,
            complete: is_complete(mode, elapsed_secs),
        }
    }

    pub fn score(&self) -> u64 {
        score(self.samples_per_sec)
    }

    pub fn remaining_secs(&self) -> i64 {
        (BENCHMARK_DEADLINE_SECS - self.elapsed_secs).max(0)
    }
}

impl Display for MetricsSnapshot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let marker = if self.complete {
            " (OK)".to_string()
        } else {
            format!(" ({}secs remaining)", self.remaining_secs())
        };
        write!(
            f,
            "[Mode: {}][Time: {}secs{}][Samples/sec {:>6}K][Rays/sec {:>6}K on {:.1}K tris]",
            self.mode,
            self.elapsed_secs,
            marker,
            (self.samples_per_sec / 1000.0) as i64,
            (self.rays_per_sec / 1000.0) as i64,
            self.triangle_count / 1000.0
        )
    }
}
