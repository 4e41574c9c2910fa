//! Config CLI commands.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use colored::Colorize;

use crate::config::config_paths;
use crate::config::template::{create_config_file, generate_config_template};
use crate::error::QuotewallError;

/// Config management commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum ConfigCommands {
    /// Write a configuration file with every option documented.
    #[command(after_long_help = r#"Examples:
  quotewall config init                          # Create config at the default location
  quotewall config init --force                  # Overwrite an existing config
  quotewall config init --path ~/quotewall.jsonc # Create at a custom path
  quotewall config init --stdout                 # Print the template"#)]
    Init {
        /// Overwrite an existing configuration file.
        #[arg(long, short)]
        force: bool,

        /// Where to write the file. Defaults to ~/.config/quotewall/config.jsonc.
        #[arg(long, short, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Print the template to stdout instead of writing a file.
        #[arg(long)]
        stdout: bool,
    },

    /// Show where configuration files are looked up and which one is used.
    Path,
}

/// Execute config subcommands.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn execute(cmd: &ConfigCommands, loaded_from: Option<&Path>) -> Result<(), QuotewallError> {
    match cmd {
        ConfigCommands::Init { force, path, stdout } => {
            if *stdout {
                println!("{}", generate_config_template());
                Ok(())
            } else {
                init_config(*force, path.clone())
            }
        }
        ConfigCommands::Path => {
            show_config_path(loaded_from);
            Ok(())
        }
    }
}

fn init_config(force: bool, custom_path: Option<PathBuf>) -> Result<(), QuotewallError> {
    let config_path = custom_path
        .or_else(|| config_paths().into_iter().next())
        .unwrap_or_else(|| PathBuf::from("config.jsonc"));

    if config_path.exists() && !force {
        return Err(QuotewallError::ConfigError(format!(
            "Configuration file already exists at: {}\nUse --force to overwrite.",
            config_path.display()
        )));
    }

    create_config_file(&config_path).map_err(|e| {
        QuotewallError::ConfigError(format!(
            "Failed to create config file {}: {e}",
            config_path.display()
        ))
    })?;

    println!("Configuration file created at: {}", config_path.display());
    Ok(())
}

fn show_config_path(loaded_from: Option<&Path>) {
    println!("Configuration file search paths (in priority order):\n");

    for (i, path) in config_paths().iter().enumerate() {
        let marker = if Some(path.as_path()) == loaded_from {
            " (active)".green().to_string()
        } else if path.exists() {
            " (exists)".dimmed().to_string()
        } else {
            String::new()
        };
        println!("  {}. {}{marker}", i + 1, path.display());
    }

    match loaded_from {
        Some(path) if !config_paths().iter().any(|p| p == path) => {
            println!("\nUsing custom configuration: {}", path.display());
        }
        Some(_) => {}
        None => {
            println!("\nNo configuration file found.");
            println!("Run 'quotewall config init' to create one.");
        }
    }
}
