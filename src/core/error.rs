use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

/// Failure raised while constructing or starting an engine session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("device error: {message} ({code})")]
    Device { message: String, code: i32 },

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("error: {0}")]
    Other(String),
}

impl EngineError {
    pub fn device(message: impl Into<String>, code: i32) -> Self {
        Self::Device {
            message: message.into(),
            code,
        }
    }

    /// Short tag used when the failure is logged.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Device { .. } => "DEVICE ERROR",
            Self::Runtime(_) => "RUNTIME ERROR",
            Self::Other(_) => "ERROR",
        }
    }
}

/// Reported by a running engine; forces the controller back to pause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FatalRenderError {
    pub message: String,
}

impl FatalRenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("unknown scene: {name}")]
    InvalidScene { name: String },

    #[error("unknown mode: {name}")]
    InvalidMode { name: String },

    #[error("scene {scene} is not available on this platform")]
    SceneUnavailable { scene: String },

    #[error("failed to spawn {what} thread: {source}")]
    Spawn {
        what: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("failed to initialise logging: {0}")]
    Logger(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl HarnessError {
    pub fn spawn(what: &'static str, source: io::Error) -> Self {
        Self::Spawn { what, source }
    }

    /// True for errors caused by a bad scene or mode request.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            Self::InvalidScene { .. } | Self::InvalidMode { .. } | Self::SceneUnavailable { .. }
        )
    }
}
