//! The benchmark session state machine.
//!
//! ```text
//!            init_rendering(mode != Paused)
//!   Idle ─────────────────────────────────▶ Initializing
//!    ▲  ▲                                       │ init ok        │ init failed
//!    │  │                                       ▼                ▼
//!    │  │                  RunningInteractive / RunningBenchmark   Idle (timer still armed)
//!    │  │                                           │ elapsed > deadline
//!    │  └──────────── Completed ◀───────────────────┘
//!    └── stop(): mode change, fatal error, shutdown
//! ```
//!
//! The controller lives on the synchronous line. It never blocks inside a tick:
//! the init worker's result is picked up with a non-blocking receive, and engine
//! queries are non-blocking by contract.

use std::{
    sync::{mpsc::Sender, Arc},
    time::Duration,
};

use log::{debug, info, warn};

use super::{
    event::{ControllerEvent, FatalReporter},
    init_task::{InitTask, Session},
    listener::{BenchmarkResult, ExitReport, SessionListener},
    poll_loop::PollLoop,
};
use crate::core::{FatalRenderError, HarnessError, MetricsSnapshot, Mode, Result, Scene};
use crate::engine::{pull_counters, EngineFactory, HardwareSelection, SessionRequest};

/// Collaborators handed to the controller at construction.
#[derive(Clone)]
pub struct HarnessContext {
    pub factory: Arc<dyn EngineFactory>,
    pub listener: Arc<dyn SessionListener>,
    /// Unset until hardware discovery finished; sessions then get an empty selection.
    pub hardware: Option<Arc<dyn HardwareSelection>>,
    /// Exit the process on completion instead of going back to pause.
    pub single_run: bool,
}

impl HarnessContext {
    pub fn new(factory: Arc<dyn EngineFactory>, listener: Arc<dyn SessionListener>) -> Self {
        Self {
            factory,
            listener,
            hardware: None,
            single_run: false,
        }
    }

    pub fn with_hardware(mut self, hardware: Arc<dyn HardwareSelection>) -> Self {
        self.hardware = Some(hardware);
        self
    }

    pub fn single_run(mut self, single_run: bool) -> Self {
        self.single_run = single_run;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Initializing,
    RunningInteractive,
    RunningBenchmark,
    Completed,
}

/// What the caller has to do after an event was handled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Single-run mode is over: print the report and terminate.
    Exit(ExitReport),
}

pub struct SessionController {
    ctx: HarnessContext,
    events: Sender<ControllerEvent>,
    mode: Mode,
    scene: Scene,
    state: SessionState,
    generation: u64,
    poll: Option<PollLoop>,
    init: Option<InitTask>,
    session: Option<Session>,
    last_result: Option<BenchmarkResult>,
    last_error: Option<String>,
}

impl SessionController {
    /// `events` receives poll ticks and engine fatal errors; whoever owns the other
    /// end must feed them back through [`on_tick`](Self::on_tick) and
    /// [`on_fatal_error`](Self::on_fatal_error).
    pub fn new(ctx: HarnessContext, events: Sender<ControllerEvent>) -> Self {
        Self {
            ctx,
            events,
            mode: Mode::Paused,
            scene: Scene::default(),
            state: SessionState::Idle,
            generation: 0,
            poll: None,
            init: None,
            session: None,
            last_result: None,
            last_error: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn scene(&self) -> Scene {
        self.scene
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Bumped by every `init_rendering`; ticks and fatal errors from older
    /// generations are ignored.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_initializing(&self) -> bool {
        self.init.is_some()
    }

    /// Interval of the armed poll timer, if any.
    pub fn cadence(&self) -> Option<Duration> {
        self.poll.as_ref().map(PollLoop::cadence)
    }

    pub fn take_last_result(&mut self) -> Option<BenchmarkResult> {
        self.last_result.take()
    }

    /// Message of the engine error that last forced a pause, if any.
    pub fn take_last_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    /// Takes effect from the next `init_rendering`.
    pub fn set_hardware_selection(&mut self, hardware: Arc<dyn HardwareSelection>) {
        self.ctx.hardware = Some(hardware);
    }

    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        info!("Set mode: {}", mode.id());
        self.init_rendering(mode, self.scene)
    }

    pub fn set_scene(&mut self, scene: Scene) -> Result<()> {
        info!("Set {} scene", scene);
        self.init_rendering(self.mode, scene)
    }

    /// Tears down the current session and starts `mode` on `scene`.
    ///
    /// Always stops first, so the previous init worker has been joined and the
    /// previous engine released before the new worker is spawned.
    pub fn init_rendering(&mut self, mode: Mode, scene: Scene) -> Result<()> {
        if !scene.is_available() {
            return Err(HarnessError::SceneUnavailable {
                scene: scene.to_string(),
            });
        }

        self.stop();
        self.mode = mode;
        self.scene = scene;
        self.generation += 1;
        self.last_error = None;

        let Some(cadence) = mode.cadence() else {
            info!("Paused ({})", scene);
            return Ok(());
        };
        info!("{} mode on {} scene", mode, scene);

        self.poll = Some(PollLoop::arm(
            cadence,
            self.generation,
            self.events.clone(),
        )?);

        let request = SessionRequest {
            scene,
            mode,
            device_selection: self.device_selection(),
        };
        let reporter = FatalReporter::new(self.generation, self.events.clone());
        match InitTask::launch(self.ctx.factory.clone(), request, reporter) {
            Ok(task) => {
                self.init = Some(task);
                self.state = SessionState::Initializing;
                Ok(())
            }
            Err(err) => {
                self.stop();
                Err(err)
            }
        }
    }

    /// Idempotent. Cancels the poll timer, waits out a pending init (releasing what
    /// it built) and releases the current engine.
    pub fn stop(&mut self) {
        if let Some(poll) = self.poll.take() {
            poll.cancel();
        }
        if let Some(task) = self.init.take() {
            task.discard();
        }
        if let Some(session) = self.session.take() {
            session.release();
        }
        self.state = SessionState::Idle;
    }

    /// Picks up the init worker's outcome if it is ready. Never blocks.
    pub fn poll_init(&mut self) {
        let Some(task) = self.init.as_mut() else {
            return;
        };
        match task.try_complete() {
            None => {}
            Some(Ok(session)) => {
                self.init = None;
                self.session = Some(session);
                self.state = if self.mode.is_interactive() {
                    SessionState::RunningInteractive
                } else {
                    SessionState::RunningBenchmark
                };
                info!("rendering {} in {} mode", self.scene, self.mode);
            }
            Some(Err(_)) => {
                // Already logged by the worker.
                self.init = None;
                self.state = SessionState::Idle;
                info!("no session running, waiting for a new mode or scene");
            }
        }
    }

    /// Entry point for timer ticks. Ticks from a cancelled timer are dropped.
    pub fn on_tick(&mut self, generation: u64) -> Flow {
        if generation != self.generation || self.poll.is_none() {
            debug!("dropping stale tick from generation {}", generation);
            return Flow::Continue;
        }
        self.tick()
    }

    /// One poll step: forward the frame and status, then apply the completion policy.
    pub fn tick(&mut self) -> Flow {
        self.poll_init();
        let Some(session) = &self.session else {
            return Flow::Continue;
        };
        let engine = session.engine();

        if engine.is_ready() {
            let frame = engine.pull_frame();
            self.ctx.listener.on_frame_ready(&frame);
        }

        let snapshot = MetricsSnapshot::new(self.mode, pull_counters(engine));
        self.ctx
            .listener
            .on_status_update(&snapshot.to_string(), snapshot.complete);

        if snapshot.complete {
            self.complete(snapshot)
        } else {
            Flow::Continue
        }
    }

    fn complete(&mut self, snapshot: MetricsSnapshot) -> Flow {
        let score = snapshot.score();
        if self.ctx.single_run {
            self.stop();
            self.state = SessionState::Completed;
            info!("benchmark complete, score {}", score);
            return Flow::Exit(ExitReport::Score(score));
        }

        self.stop();
        self.state = SessionState::Completed;
        let result = BenchmarkResult {
            score,
            samples_per_sec: snapshot.samples_per_sec,
            mode: self.mode,
            scene: self.scene,
            device_descriptions: Vec::new(),
        };
        info!("benchmark complete: {}", result);
        self.ctx.listener.on_benchmark_complete(&result);
        self.last_result = Some(result);
        self.pause();
        Flow::Continue
    }

    /// Entry point for errors an engine raised while running.
    pub fn on_fatal_error(&mut self, generation: u64, error: FatalRenderError) -> Flow {
        if generation != self.generation {
            debug!("ignoring error from an earlier session: {}", error);
            return Flow::Continue;
        }
        self.fatal_error(error)
    }

    /// Forces pause mode; in single-run mode the process should exit with the error.
    pub fn fatal_error(&mut self, error: FatalRenderError) -> Flow {
        warn!("forcing pause mode: {}", error);
        self.ctx.listener.on_fatal_error(&error.message);
        self.pause();
        if self.ctx.single_run {
            Flow::Exit(ExitReport::Error(error.message))
        } else {
            self.last_error = Some(error.message);
            Flow::Continue
        }
    }

    fn pause(&mut self) {
        self.stop();
        self.mode = Mode::Paused;
        self.generation += 1;
        info!("Paused ({})", self.scene);
    }

    fn device_selection(&self) -> String {
        self.ctx
            .hardware
            .as_ref()
            .map(|hw| hw.selection_string())
            .unwrap_or_default()
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.stop();
    }
}
