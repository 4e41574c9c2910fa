//! Cancellable wait between polls.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Why [`Signal::wait`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitResult {
    TimedOut,
    /// [`Signal::wake`] cut the wait short.
    Woken,
    /// [`Signal::cancel`] was called; every later wait returns immediately.
    Cancelled,
}

#[derive(Debug, Default)]
struct Flags {
    cancelled: bool,
    woken: bool,
}

/// Wake-up and cancellation shared by the worker and its handle.
#[derive(Debug, Default)]
pub struct Signal {
    flags: Mutex<Flags>,
    condvar: Condvar,
}

impl Signal {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Requests shutdown. Sticky.
    pub fn cancel(&self) {
        self.flags.lock().cancelled = true;
        self.condvar.notify_all();
    }

    /// Ends the current (or next) wait early.
    pub fn wake(&self) {
        self.flags.lock().woken = true;
        self.condvar.notify_all();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool { self.flags.lock().cancelled }

    /// Blocks for up to `timeout`. A timeout past the end of `Instant`'s range
    /// waits until woken or cancelled.
    pub fn wait(&self, timeout: Duration) -> WaitResult {
        let deadline = Instant::now().checked_add(timeout);
        let mut flags = self.flags.lock();

        loop {
            if flags.cancelled {
                return WaitResult::Cancelled;
            }
            if flags.woken {
                flags.woken = false;
                return WaitResult::Woken;
            }
            let Some(deadline) = deadline else {
                self.condvar.wait(&mut flags);
                continue;
            };
            if self.condvar.wait_until(&mut flags, deadline).timed_out() {
                return if flags.cancelled {
                    WaitResult::Cancelled
                } else if std::mem::take(&mut flags.woken) {
                    WaitResult::Woken
                } else {
                    WaitResult::TimedOut
                };
            }
        }
    }
}
