//! Periodic poll timer.
//!
//! The timer runs on its own thread and only posts [`ControllerEvent::Tick`]
//! messages; the ticks themselves are handled on the synchronous line, one at a
//! time. Cancelling is synchronous: once [`PollLoop::cancel`] returns the timer
//! thread has exited and no new tick will be produced.

use std::{
    sync::{mpsc::Sender, Arc, Condvar, Mutex, PoisonError},
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, error};

use super::event::ControllerEvent;
use crate::core::{HarnessError, Result};

#[derive(Clone)]
struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    fn trigger(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    /// Sleeps for `duration` unless triggered first. Returns `true` if stopped.
    fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let stopped = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (stopped, _) = cvar
            .wait_timeout_while(stopped, duration, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *stopped
    }
}

pub struct PollLoop {
    generation: u64,
    cadence: Duration,
    stop: StopSignal,
    thread: Option<JoinHandle<()>>,
}

impl PollLoop {
    /// Starts ticking every `cadence`. Every tick is tagged with `generation`.
    pub fn arm(
        cadence: Duration,
        generation: u64,
        events: Sender<ControllerEvent>,
    ) -> Result<Self> {
        let stop = StopSignal::new();
        let signal = stop.clone();
        let thread = thread::Builder::new()
            .name(format!("poll-loop-{}", generation))
            .spawn(move || loop {
                if signal.wait_timeout(cadence) {
                    break;
                }
                if events.send(ControllerEvent::Tick { generation }).is_err() {
                    break;
                }
            })
            .map_err(|e| HarnessError::spawn("poll loop", e))?;
        debug!("poll loop {} armed every {:?}", generation, cadence);

        Ok(Self {
            generation,
            cadence,
            stop,
            thread: Some(thread),
        })
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    /// Stops the timer and joins its thread.
    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.trigger();
        if let Some(thread) = self.thread.take() {
            if join_timer(self.generation, thread) {
                debug!("poll loop {} cancelled", self.generation);
            }
        }
    }
}

/// Joins a timer thread. A panic on it is logged and reported as `false`.
fn join_timer(generation: u64, thread: JoinHandle<()>) -> bool {
    if thread.join().is_err() {
        error!("poll loop {} panicked", generation);
        return false;
    }
    true
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::mpsc, time::Instant};

    #[test]
    fn ticks_carry_generation() {
        let (tx, rx) = mpsc::channel();
        let poll = PollLoop::arm(Duration::from_millis(5), 42, tx).unwrap();
        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        poll.cancel();
        for event in [first, second] {
            assert!(matches!(event, ControllerEvent::Tick { generation: 42 }));
        }
    }

    #[test]
    fn no_tick_after_cancel_returns() {
        let (tx, rx) = mpsc::channel();
        let poll = PollLoop::arm(Duration::from_millis(2), 1, tx).unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        poll.cancel();
        while rx.try_recv().is_ok() {}
        thread::sleep(Duration::from_millis(20));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn cancel_does_not_wait_for_the_cadence() {
        let (tx, _rx) = mpsc::channel();
        let poll = PollLoop::arm(Duration::from_secs(4), 1, tx).unwrap();
        assert_eq!(poll.cadence(), Duration::from_secs(4));
        let start = Instant::now();
        poll.cancel();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn panicking_timer_is_reported() {
        let thread = thread::spawn(|| panic!("timer blew up"));
        assert!(!join_timer(9, thread));
        assert!(join_timer(10, thread::spawn(|| {})));
    }

    #[test]
    fn timer_exits_when_receiver_is_gone() {
        let (tx, rx) = mpsc::channel();
        let mut poll = PollLoop::arm(Duration::from_millis(1), 1, tx).unwrap();
        drop(rx);
        let thread = poll.thread.take().unwrap();
        thread.join().unwrap();
    }
}
