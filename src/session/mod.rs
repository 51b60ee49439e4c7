pub mod controller;
pub mod event;
pub mod harness;
pub mod init_task;
pub mod listener;
pub mod poll_loop;

pub use controller::{Flow, HarnessContext, SessionController, SessionState};
pub use event::{ControllerEvent, FatalReporter, Severity};
pub use harness::{Harness, HarnessHandle, RunOutcome};
pub use init_task::{InitTask, Session};
pub use listener::{BenchmarkResult, ConsoleListener, ExitReport, NullListener, SessionListener};
pub use poll_loop::PollLoop;
