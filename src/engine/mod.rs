//! Seams to the rendering engine and the hardware-selection collaborator.
//!
//! The session controller only ever talks to an engine through [`EngineFactory`]
//! and [`EngineSession`]; the built-in [`synthetic`] engine is one implementation.

use crate::core::{EngineError, Mode, RawCounters, Scene};
use crate::session::FatalReporter;

pub mod synthetic;
pub use synthetic::SyntheticEngineFactory;

/// Named counters an engine exposes for polling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Counter {
    SampleCount,
    /// Seconds spent rendering since `start`.
    ElapsedTime,
    RayCount,
    TriangleCount,
}

/// A snapshot of the film, RGB8, row-major.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub pixels: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height * 3],
            width,
            height,
        }
    }
}

/// Everything an engine needs to build a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRequest {
    pub scene: Scene,
    pub mode: Mode,
    /// Opaque, passed through untouched.
    pub device_selection: String,
}

/// A running render job. All queries must be cheap and non-blocking and are only
/// made after `start` succeeded.
pub trait EngineSession: Send {
    fn start(&mut self) -> Result<(), EngineError>;
    fn stop(&mut self);
    fn is_ready(&self) -> bool;
    fn pull_frame(&self) -> Frame;
    /// Engines return 0.0 for counters they do not track.
    fn pull_counter(&self, counter: Counter) -> f64;
}

pub trait EngineFactory: Send + Sync {
    fn create(
        &self,
        request: &SessionRequest,
        reporter: FatalReporter,
    ) -> Result<Box<dyn EngineSession>, EngineError>;
}

/// Source of the device-selection string, usually a hardware tree the user edits.
pub trait HardwareSelection: Send + Sync {
    fn selection_string(&self) -> String;
}

/// A selection fixed up front, e.g. from the command line.
#[derive(Clone, Debug, Default)]
pub struct StaticSelection(pub String);

impl HardwareSelection for StaticSelection {
    fn selection_string(&self) -> String {
        self.0.clone()
    }
}

pub fn pull_counters(engine: &dyn EngineSession) -> RawCounters {
    RawCounters {
        sample_count: engine.pull_counter(Counter::SampleCount),
        elapsed_secs: engine.pull_counter(Counter::ElapsedTime),
        ray_count: engine.pull_counter(Counter::RayCount),
        triangle_count: engine.pull_counter(Counter::TriangleCount),
    }
}
