//! Background thread running the rotation engine.

use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Mutex, RwLock};

use super::outcome::{CycleOutcome, WorkerState};
use super::signal::{Signal, WaitResult};
use super::{RotationConfig, RotationEngine};
use crate::constants::threads;
use crate::platform::spawn_named_thread;

#[derive(Debug, Default)]
struct Status {
    state: WorkerState,
    last_outcome: Option<CycleOutcome>,
}

#[derive(Debug, Default)]
struct Shared {
    status: RwLock<Status>,
    pending: Mutex<Option<RotationConfig>>,
}

/// Spawns the rotation loop.
pub struct RotationWorker;

impl RotationWorker {
    /// Moves `engine` onto the `quotewall-rotation` thread and starts polling.
    ///
    /// # Errors
    ///
    /// Returns the OS error when the thread cannot be created.
    pub fn spawn(engine: RotationEngine) -> io::Result<WorkerHandle> {
        let signal = engine.signal();
        let shared = Arc::new(Shared::default());

        let thread = {
            let shared = Arc::clone(&shared);
            let signal = Arc::clone(&signal);
            spawn_named_thread(threads::ROTATION, move || run(engine, &shared, &signal))?
        };

        Ok(WorkerHandle { signal, shared, thread: Some(thread) })
    }
}

fn run(mut engine: RotationEngine, shared: &Shared, signal: &Signal) {
    tracing::info!(poll_interval = ?engine.config().poll_interval, "rotation worker started");

    loop {
        if let Some(config) = shared.pending.lock().take() {
            engine.reload(config);
        }

        let outcome = engine.run_cycle();
        let stopped = outcome == CycleOutcome::Stopped;
        {
            let mut status = shared.status.write();
            status.state = engine.state();
            status.last_outcome = Some(outcome);
        }
        if stopped {
            break;
        }

        if signal.wait(engine.config().poll_interval) == WaitResult::Cancelled {
            break;
        }
    }

    shared.status.write().state = WorkerState::Stopped;
    tracing::info!("rotation worker stopped");
}

/// Control surface of a running worker. Dropping it shuts the worker down.
pub struct WorkerHandle {
    signal: Arc<Signal>,
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    #[must_use]
    pub fn state(&self) -> WorkerState { self.shared.status.read().state }

    #[must_use]
    pub fn last_outcome(&self) -> Option<CycleOutcome> {
        self.shared.status.read().last_outcome.clone()
    }

    /// Runs the next cycle now instead of at the end of the current wait.
    pub fn wake(&self) { self.signal.wake(); }

    /// Hands a new configuration to the worker and wakes it.
    pub fn reload(&self, config: RotationConfig) {
        *self.shared.pending.lock() = Some(config);
        self.signal.wake();
    }

    /// Cancels the worker and waits for the thread to finish. Idempotent.
    pub fn shutdown(&mut self) {
        self.signal.cancel();
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::error!("rotation worker panicked");
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|thread| !thread.is_finished())
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) { self.shutdown(); }
}
