use std::{
    fmt::{self, Display, Formatter},
    sync::{Mutex, PoisonError},
};

use log::{debug, info, warn};

use crate::core::{Mode, Scene};
use crate::engine::Frame;

/// Final outcome of a benchmark run.
#[derive(Clone, Debug, PartialEq)]
pub struct BenchmarkResult {
    pub score: u64,
    pub samples_per_sec: f64,
    pub mode: Mode,
    pub scene: Scene,
    /// Filled in by an external enrichment step; empty here.
    pub device_descriptions: Vec<String>,
}

impl Display for BenchmarkResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Score: {} ({:.0} samples/sec) [Mode: {}][Scene: {}]",
            self.score, self.samples_per_sec, self.mode, self.scene
        )?;
        for desc in &self.device_descriptions {
            write!(f, "\n    {}", desc)?;
        }
        Ok(())
    }
}

/// What single-run mode prints right before the process exits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExitReport {
    Score(u64),
    Error(String),
}

impl ExitReport {
    /// Both outcomes count as a completed run.
    pub fn exit_code(&self) -> i32 {
        0
    }
}

impl Display for ExitReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ExitReport::Score(score) => write!(f, "Score: {}", score),
            ExitReport::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

/// Outward-facing callbacks of the controller. All run on the synchronous line.
pub trait SessionListener: Send + Sync {
    fn on_frame_ready(&self, _frame: &Frame) {}
    fn on_status_update(&self, _text: &str, _is_complete: bool) {}
    fn on_benchmark_complete(&self, _result: &BenchmarkResult) {}
    fn on_fatal_error(&self, _message: &str) {}
}

/// Ignores everything.
pub struct NullListener;

impl SessionListener for NullListener {}

/// Headless listener: status lines go to the log, results to stdout.
#[derive(Default)]
pub struct ConsoleListener {
    frame_size: Mutex<(usize, usize)>,
}

impl SessionListener for ConsoleListener {
    fn on_frame_ready(&self, frame: &Frame) {
        let mut size = self
            .frame_size
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *size != (frame.width, frame.height) {
            *size = (frame.width, frame.height);
            debug!("frame buffer is now {}x{}", frame.width, frame.height);
        }
    }

    fn on_status_update(&self, text: &str, _is_complete: bool) {
        info!("{}", text);
    }

    fn on_benchmark_complete(&self, result: &BenchmarkResult) {
        println!("{}", result);
    }

    fn on_fatal_error(&self, message: &str) {
        warn!("rendering paused after engine error: {}", message);
    }
}
