//! CLI command definitions using Clap.
//!
//! Commands are organized into domain-specific submodules:
//!
//! - `cache` - Rendered wallpaper cache
//! - `config_cmd` - Configuration file management
//! - `playlist` - Playlist editing and activation
//! - `run` - The foreground rotation daemon
//! - `settings` - Multi-monitor and fullscreen settings

use std::io;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};
use colored::Colorize;
use tabled::Tabled;

use super::output;
use crate::clock::{Clock, SystemClock};
use crate::config::{self, AppConfig, ConfigError, LoadedConfig};
use crate::display::DisplayTopology;
use crate::error::QuotewallError;
use crate::store::PlaylistStore;

pub mod cache;
pub mod config_cmd;
pub mod playlist;
pub mod run;
pub mod settings;

pub use cache::CacheCommands;
pub use config_cmd::ConfigCommands;
pub use playlist::PlaylistCommands;
pub use run::RunArgs;
pub use settings::SettingsCommands;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Quotewall - scheduled quote wallpaper playlists.
#[derive(Parser, Debug)]
#[command(name = "quotewall")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file (JSONC).
    ///
    /// Overrides the default configuration file search paths.
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding playlists.json and settings.json.
    ///
    /// Overrides `dataDir` from the configuration file.
    #[arg(long, global = true, value_name = "DIR", env = "QUOTEWALL_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Run the rotation worker in the foreground until interrupted.
    Run(RunArgs),

    /// Create, edit and activate playlists.
    #[command(subcommand)]
    Playlist(PlaylistCommands),

    /// List the detected monitors.
    Monitors {
        /// Output as JSON.
        #[arg(long, short)]
        json: bool,
    },

    /// Show or change rotation settings.
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// Rendered wallpaper cache commands.
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Configuration file management commands.
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Output the configuration JSON Schema.
    ///
    /// Can be redirected to a file for use with editors that support JSON
    /// Schema validation.
    Schema,

    /// Generate shell completions.
    ///
    /// Usage:
    ///   eval "$(quotewall completions --shell zsh)"
    ///   quotewall completions --shell fish > ~/.config/fish/completions/quotewall.fish
    #[command(verbatim_doc_comment)]
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

/// What a command runs against: the loaded configuration and data directory.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: AppConfig,
    pub config_path: Option<PathBuf>,
    pub data_dir: PathBuf,
}

impl Context {
    #[must_use]
    pub fn store(&self) -> PlaylistStore { PlaylistStore::open(self.data_dir.clone()) }

    #[must_use]
    pub fn now(&self) -> DateTime<FixedOffset> { SystemClock.now() }
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> Result<(), QuotewallError> {
        match &self.command {
            Commands::Schema => {
                println!("{}", config::print_schema());
                return Ok(());
            }
            Commands::Completions { shell } => {
                Self::print_completions(*shell);
                return Ok(());
            }
            // Runs before loading so a missing file is not replaced by the template.
            Commands::Config(cmd) => {
                let loaded_from = self
                    .config
                    .clone()
                    .or_else(|| config::load_config().ok().map(|(_, path)| path));
                return config_cmd::execute(cmd, loaded_from.as_deref());
            }
            _ => {}
        }

        let ctx = self.context()?;

        match &self.command {
            Commands::Run(args) => run::execute(args, &ctx),
            Commands::Playlist(cmd) => playlist::execute(cmd, &ctx),
            Commands::Monitors { json } => print_monitors(&ctx, *json),
            Commands::Settings(cmd) => settings::execute(cmd, &ctx),
            Commands::Cache(cmd) => cache::execute(cmd, &ctx),
            Commands::Schema | Commands::Completions { .. } | Commands::Config(_) => Ok(()),
        }
    }

    /// Loads the configuration, starts logging and resolves the data directory.
    fn context(&self) -> Result<Context, QuotewallError> {
        let (loaded, load_error) = match config::load(self.config.as_deref()) {
            Ok(loaded) => (loaded, None),
            Err(err) => match self.config.as_deref() {
                Some(path) if matches!(err, ConfigError::NotFound) => {
                    return Err(QuotewallError::ConfigError(format!(
                        "configuration file not found: {}",
                        path.display()
                    )));
                }
                Some(_) => return Err(err.into()),
                None => (LoadedConfig { config: AppConfig::default(), path: None }, Some(err)),
            },
        };

        super::init_logging(&loaded.config.log_level);
        if let Some(err) = load_error {
            tracing::warn!(error = %err, "failed to load configuration, using defaults");
        }

        let data_dir = self.data_dir.clone().unwrap_or_else(|| loaded.config.data_dir());
        tracing::debug!(
            config = ?loaded.path,
            data_dir = %data_dir.display(),
            "configuration loaded"
        );

        Ok(Context { config: loaded.config, config_path: loaded.path, data_dir })
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, "quotewall", &mut io::stdout());
    }
}

#[derive(Tabled)]
struct MonitorRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Resolution")]
    resolution: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Primary")]
    primary: String,
}

fn print_monitors(ctx: &Context, json: bool) -> Result<(), QuotewallError> {
    let monitors = DisplayTopology::system(ctx.config.fallback_resolution).snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(&monitors)?);
        return Ok(());
    }

    if monitors.len() == 1 && monitors[0].name == "fallback" {
        println!("{}", "No monitors detected, using the fallback resolution.".dimmed());
    }

    let rows = monitors
        .iter()
        .map(|m| MonitorRow {
            index: m.index,
            name: m.name.clone(),
            resolution: format!("{}x{}", m.bounds.width, m.bounds.height),
            position: format!("{}, {}", m.bounds.x, m.bounds.y),
            primary: output::format_bool(m.primary),
        })
        .collect();
    output::print_table("Monitors", rows);
    Ok(())
}
