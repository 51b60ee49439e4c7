//! The synchronous line: a single thread draining [`ControllerEvent`]s and
//! dispatching them to the [`SessionController`] one at a time.

use std::sync::mpsc::{self, Receiver, Sender};

use log::{debug, info, warn};

use super::{
    controller::{Flow, HarnessContext, SessionController, SessionState},
    event::ControllerEvent,
    listener::{BenchmarkResult, ExitReport},
};
use crate::core::{Mode, Result, Scene};

/// Why [`Harness::run`] returned.
#[derive(Debug, PartialEq)]
pub enum RunOutcome {
    /// Single-run mode finished; print the report and exit with its code.
    Exit(ExitReport),
    /// Nothing left to render. Only produced when `exit_when_idle` is set. `error` is
    /// the engine error that forced the pause, if that is how the run ended.
    Idle {
        result: Option<BenchmarkResult>,
        error: Option<String>,
    },
    /// A [`HarnessHandle::shutdown`] was received.
    Shutdown,
}

pub struct Harness {
    controller: SessionController,
    events: Receiver<ControllerEvent>,
    handle: HarnessHandle,
    exit_when_idle: bool,
}

impl Harness {
    pub fn new(ctx: HarnessContext) -> Self {
        let (tx, events) = mpsc::channel();
        Self {
            controller: SessionController::new(ctx, tx.clone()),
            events,
            handle: HarnessHandle { events: tx },
            exit_when_idle: false,
        }
    }

    /// Return from [`run`](Self::run) as soon as no session is running or starting,
    /// including after a failed init. Used by the headless binary, where nobody can
    /// pick another mode.
    pub fn exit_when_idle(mut self, exit_when_idle: bool) -> Self {
        self.exit_when_idle = exit_when_idle;
        self
    }

    pub fn handle(&self) -> HarnessHandle {
        self.handle.clone()
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    /// Starts `mode` on `scene` and processes events until there is a reason to stop.
    pub fn run(&mut self, mode: Mode, scene: Scene) -> Result<RunOutcome> {
        self.controller.init_rendering(mode, scene)?;

        loop {
            if self.exit_when_idle && self.is_idle() {
                debug!("harness idle, leaving event loop");
                return Ok(RunOutcome::Idle {
                    result: self.controller.take_last_result(),
                    error: self.controller.take_last_error(),
                });
            }

            // The harness holds a sender itself, so this never disconnects.
            let Ok(event) = self.events.recv() else {
                return Ok(RunOutcome::Shutdown);
            };

            match self.dispatch(event) {
                Some(outcome) => return Ok(outcome),
                None => continue,
            }
        }
    }

    fn is_idle(&self) -> bool {
        matches!(
            self.controller.state(),
            SessionState::Idle | SessionState::Completed
        ) && !self.controller.is_initializing()
            && !self.controller.has_session()
    }

    fn dispatch(&mut self, event: ControllerEvent) -> Option<RunOutcome> {
        let flow = match event {
            ControllerEvent::Tick { generation } => self.controller.on_tick(generation),
            ControllerEvent::Fatal { generation, error } => {
                self.controller.on_fatal_error(generation, error)
            }
            ControllerEvent::SetMode(mode) => {
                if let Err(err) = self.controller.set_mode(mode) {
                    warn!("cannot switch to {}: {}", mode, err);
                }
                Flow::Continue
            }
            ControllerEvent::SetScene(scene) => {
                if let Err(err) = self.controller.set_scene(scene) {
                    warn!("cannot load {}: {}", scene, err);
                }
                Flow::Continue
            }
            ControllerEvent::Pause => {
                if let Err(err) = self.controller.set_mode(Mode::Paused) {
                    warn!("cannot pause: {}", err);
                }
                Flow::Continue
            }
            ControllerEvent::Shutdown => {
                info!("shutting down");
                self.controller.stop();
                return Some(RunOutcome::Shutdown);
            }
        };

        match flow {
            Flow::Continue => None,
            Flow::Exit(report) => {
                self.controller.stop();
                Some(RunOutcome::Exit(report))
            }
        }
    }
}

/// Posts requests to a running [`Harness`] from any thread.
#[derive(Clone)]
pub struct HarnessHandle {
    events: Sender<ControllerEvent>,
}

impl HarnessHandle {
    /// Returns `false` once the harness is gone.
    pub fn set_mode(&self, mode: Mode) -> bool {
        self.send(ControllerEvent::SetMode(mode))
    }

    pub fn set_scene(&self, scene: Scene) -> bool {
        self.send(ControllerEvent::SetScene(scene))
    }

    pub fn pause(&self) -> bool {
        self.send(ControllerEvent::Pause)
    }

    pub fn shutdown(&self) -> bool {
        self.send(ControllerEvent::Shutdown)
    }

    fn send(&self, event: ControllerEvent) -> bool {
        self.events.send(event).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EngineError;
    use crate::engine::{Counter, EngineFactory, EngineSession, Frame, SessionRequest};
    use crate::session::{event::FatalReporter, listener::NullListener};
    use std::sync::Arc;

    struct Broken;

    impl EngineFactory for Broken {
        fn create(
            &self,
            _request: &SessionRequest,
            _reporter: FatalReporter,
        ) -> std::result::Result<Box<dyn EngineSession>, EngineError> {
            Err(EngineError::device("no device", -5))
        }
    }

    struct Spin;

    impl EngineSession for Spin {
        fn start(&mut self) -> std::result::Result<(), EngineError> {
            Ok(())
        }
        fn stop(&mut self) {}
        fn is_ready(&self) -> bool {
            true
        }
        fn pull_frame(&self) -> Frame {
            Frame::new(2, 2)
        }
        fn pull_counter(&self, _counter: Counter) -> f64 {
            1.0
        }
    }

    struct SpinFactory;

    impl EngineFactory for SpinFactory {
        fn create(
            &self,
            _request: &SessionRequest,
            _reporter: FatalReporter,
        ) -> std::result::Result<Box<dyn EngineSession>, EngineError> {
            Ok(Box::new(Spin))
        }
    }

    #[test]
    fn paused_start_is_idle_right_away() {
        let ctx = HarnessContext::new(Arc::new(SpinFactory), Arc::new(NullListener));
        let mut harness = Harness::new(ctx).exit_when_idle(true);
        let outcome = harness.run(Mode::Paused, Scene::LuxBall).unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Idle {
                result: None,
                error: None
            }
        );
    }

    #[test]
    fn shutdown_from_a_handle() {
        let ctx = HarnessContext::new(Arc::new(SpinFactory), Arc::new(NullListener));
        let mut harness = Harness::new(ctx);
        let handle = harness.handle();
        assert!(handle.shutdown());
        let outcome = harness.run(Mode::Interactive, Scene::LuxBall).unwrap();
        assert_eq!(outcome, RunOutcome::Shutdown);
        assert!(!harness.controller().has_session());
    }

    #[test]
    fn failed_init_leaves_a_headless_run() {
        let ctx = HarnessContext::new(Arc::new(Broken), Arc::new(NullListener));
        let mut harness = Harness::new(ctx).exit_when_idle(true);
        let outcome = harness.run(Mode::Interactive, Scene::LuxBall).unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Idle {
                result: None,
                error: None
            }
        );
        assert_eq!(harness.controller().mode(), Mode::Interactive);
        assert!(harness.controller().cadence().is_some());
    }
}
