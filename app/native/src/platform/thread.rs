use std::io;
use std::thread::{self, JoinHandle};

use crate::constants::APP_ID;

/// Spawns a thread named `quotewall-<name>`.
///
/// # Errors
///
/// Returns the OS error when the thread cannot be created.
pub fn spawn_named_thread<F>(name: &str, task: F) -> io::Result<JoinHandle<()>>
where F: FnOnce() + Send + 'static {
    let thread_name = format!("{APP_ID}-{name}");

    thread::Builder::new().name(thread_name.clone()).spawn(task).inspect_err(|err| {
        tracing::error!(thread = %thread_name, error = %err, "failed to spawn thread");
    })
}
