//! Command-line interface.
//!
//! `quotewall run` hosts the rotation worker; every other command edits the
//! playlist store or inspects the system and exits. A running worker notices
//! store edits on its next poll, so no IPC is needed.

mod commands;
mod output;

use clap::Parser;
pub use commands::{Cli, Context};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::error::QuotewallError;

/// Runs the CLI.
///
/// Parses command-line arguments and executes the appropriate command.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> Result<(), QuotewallError> {
    let cli = Cli::parse();
    cli.execute()
}

/// Installs the stderr log subscriber.
///
/// `RUST_LOG` wins over `default_level`; an unparsable level falls back to
/// `info`. Calling this twice is harmless.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}
