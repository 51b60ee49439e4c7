use std::sync::mpsc::Sender;

use log::{error, info, warn};

use crate::core::{FatalRenderError, Mode, Scene};

/// Everything the synchronous line reacts to. Handled one at a time by the harness.
#[derive(Debug)]
pub enum ControllerEvent {
    /// Poll timer fired for the session started by `init_rendering` number `generation`.
    Tick { generation: u64 },
    /// The engine of session `generation` hit an unrecoverable error.
    Fatal {
        generation: u64,
        error: FatalRenderError,
    },
    SetMode(Mode),
    SetScene(Scene),
    Pause,
    Shutdown,
}

/// Severity of an engine message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Severe,
}

/// Handed to an engine at construction so it can log, and escalate fatal errors,
/// from any of its threads.
#[derive(Clone, Debug)]
pub struct FatalReporter {
    generation: u64,
    events: Option<Sender<ControllerEvent>>,
}

impl FatalReporter {
    pub(crate) fn new(generation: u64, events: Sender<ControllerEvent>) -> Self {
        Self {
            generation,
            events: Some(events),
        }
    }

    /// A reporter that only logs. Handy for engines built outside a controller.
    pub fn detached() -> Self {
        Self {
            generation: 0,
            events: None,
        }
    }

    pub fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Debug | Severity::Info => info!("[engine] {}", message),
            Severity::Warning => warn!("[engine] {}", message),
            Severity::Error | Severity::Severe => {
                error!("[engine] {}", message);
                if let Some(events) = &self.events {
                    // Receiver gone means the harness already shut down.
                    let _ = events.send(ControllerEvent::Fatal {
                        generation: self.generation,
                        error: FatalRenderError::new(message),
                    });
                }
            }
        }
    }
}
