#![allow(clippy::multiple_crate_versions)]

//! Quotewall command-line entry point.
//!
//! `quotewall run` hosts the rotation worker in the foreground; the other
//! subcommands edit playlists and settings and exit.

fn main() {
    if let Err(err) = quotewall_lib::cli::run() {
        eprintln!("quotewall: {err}");
        std::process::exit(1);
    }
}
