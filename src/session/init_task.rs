use std::{
    sync::{
        mpsc::{self, Receiver, SendError, TryRecvError},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use log::{debug, error};

use super::event::FatalReporter;
use crate::core::{EngineError, HarnessError, Result};
use crate::engine::{EngineFactory, EngineSession, SessionRequest};

/// A started engine bound to one scene, mode and device selection.
pub struct Session {
    engine: Box<dyn EngineSession>,
    request: SessionRequest,
    started_at: Instant,
}

impl Session {
    pub fn engine(&self) -> &dyn EngineSession {
        self.engine.as_ref()
    }

    pub fn request(&self) -> &SessionRequest {
        &self.request
    }

    /// Stops the engine. Consuming `self` makes a second release impossible.
    pub fn release(mut self) {
        self.engine.stop();
        debug!(
            "released {} session after {:.1}s",
            self.request.scene,
            self.started_at.elapsed().as_secs_f64()
        );
    }
}

type Outcome = std::result::Result<Session, EngineError>;

/// One-shot background construction of a [`Session`].
///
/// The worker publishes its outcome through a single-slot channel; the controller
/// picks it up with [`InitTask::try_complete`] on its next tick. There is no way to
/// interrupt the worker: dropping the task waits for it and releases whatever it built.
pub struct InitTask {
    worker: Option<JoinHandle<()>>,
    handoff: Receiver<Outcome>,
}

impl InitTask {
    pub fn launch(
        factory: Arc<dyn EngineFactory>,
        request: SessionRequest,
        reporter: FatalReporter,
    ) -> Result<Self> {
        let (tx, handoff) = mpsc::sync_channel(1);
        let worker = thread::Builder::new()
            .name("engine-init".into())
            .spawn(move || {
                let outcome = Self::build(factory.as_ref(), request, reporter);
                if let Err(SendError(Ok(session))) = tx.send(outcome) {
                    session.release();
                }
            })
            .map_err(|e| HarnessError::spawn("engine init", e))?;

        Ok(Self {
            worker: Some(worker),
            handoff,
        })
    }

    fn build(
        factory: &dyn EngineFactory,
        request: SessionRequest,
        reporter: FatalReporter,
    ) -> Outcome {
        let started = factory.create(&request, reporter).and_then(|mut engine| {
            match engine.start() {
                Ok(()) => Ok(engine),
                Err(err) => {
                    engine.stop();
                    Err(err)
                }
            }
        });

        match started {
            Ok(engine) => {
                debug!("engine for {} / {} started", request.scene, request.mode);
                Ok(Session {
                    engine,
                    request,
                    started_at: Instant::now(),
                })
            }
            Err(err) => {
                error!(
                    "{}: {} [scene {}, mode {}]",
                    err.kind(),
                    err,
                    request.scene,
                    request.mode
                );
                Err(err)
            }
        }
    }

    /// Non-blocking. `None` while the worker is still running.
    pub fn try_complete(&mut self) -> Option<Outcome> {
        match self.handoff.try_recv() {
            Ok(outcome) => {
                self.join_worker();
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.join_worker();
                Some(Err(EngineError::Other(
                    "engine init worker exited without a result".into(),
                )))
            }
        }
    }

    /// Waits for the worker and releases any session it produced.
    pub fn discard(mut self) {
        self.drain();
    }

    fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("engine init worker panicked");
            }
        }
    }

    fn drain(&mut self) {
        self.join_worker();
        if let Ok(Ok(session)) = self.handoff.try_recv() {
            debug!("discarding session built by a cancelled init");
            session.release();
        }
    }
}

impl Drop for InitTask {
    fn drop(&mut self) {
        self.drain();
    }
}
