//! `quotewall run`: the foreground rotation daemon.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use clap::Args;

use super::Context;
use crate::config::{AppConfig, watch_config_file};
use crate::error::QuotewallError;
use crate::rotation::{Collaborators, RotationConfig, RotationEngine, RotationWorker};
use crate::store::{PlaylistStore, Settings};

/// How often the foreground checks for shutdown signals and config reloads.
const CONTROL_TICK: Duration = Duration::from_millis(250);

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Run a single cycle, print its outcome as JSON and exit.
    #[arg(long)]
    pub once: bool,

    /// Do not reload the configuration file when it changes.
    #[arg(long)]
    pub no_watch: bool,
}

/// Runs the rotation worker until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns an error if the worker or signal handlers cannot be set up.
pub fn execute(args: &RunArgs, ctx: &Context) -> Result<(), QuotewallError> {
    let store = Arc::new(ctx.store());
    let rotation = RotationConfig::from_parts(&ctx.config, &settings_or_default(&store));
    let collaborators = Collaborators::system(Arc::clone(&store), &ctx.config);
    let mut engine = RotationEngine::new(rotation, collaborators);

    if args.once {
        let outcome = engine.run_cycle();
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let shutdown = shutdown_flag()?;
    let mut handle = RotationWorker::spawn(engine)?;

    // The sender is kept here so the channel stays open without a watcher.
    let (reload_tx, reload_rx) = mpsc::channel::<AppConfig>();
    if !args.no_watch
        && let Some(path) = ctx.config_path.clone()
    {
        let tx = reload_tx.clone();
        let _watcher = watch_config_file(path, move |config| {
            let _ = tx.send(config);
        })?;
    }

    tracing::info!(data_dir = %store.dir().display(), "quotewall running, press Ctrl-C to stop");

    while !shutdown.load(Ordering::Relaxed) && handle.is_running() {
        match reload_rx.recv_timeout(CONTROL_TICK) {
            Ok(config) => {
                if config.data_dir() != ctx.config.data_dir() {
                    tracing::warn!("dataDir changed, restart quotewall to use the new directory");
                }
                handle.reload(RotationConfig::from_parts(&config, &settings_or_default(&store)));
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {}
        }
    }

    tracing::info!("shutting down");
    handle.shutdown();
    drop(reload_tx);
    Ok(())
}

fn settings_or_default(store: &PlaylistStore) -> Settings {
    store.settings().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "cannot read settings, using defaults");
        Settings::default()
    })
}

#[cfg(unix)]
fn shutdown_flag() -> io::Result<Arc<AtomicBool>> {
    use signal_hook::consts::{SIGINT, SIGTERM};

    let flag = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&flag))?;
    }
    Ok(flag)
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn shutdown_flag() -> io::Result<Arc<AtomicBool>> { Ok(Arc::new(AtomicBool::new(false))) }
