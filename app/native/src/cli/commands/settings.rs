//! Settings CLI commands.

use clap::Subcommand;
use colored::Colorize;

use super::Context;
use crate::cli::output;
use crate::error::QuotewallError;
use crate::store::MultiMonitorMode;

/// Settings subcommands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum SettingsCommands {
    /// Show the rotation settings.
    Show {
        /// Output as JSON.
        #[arg(long, short)]
        json: bool,
    },

    /// Change rotation settings. A running worker applies them on its next poll.
    #[command(after_long_help = r#"Examples:
  quotewall settings set --mode per-monitor
  quotewall settings set --auto-pause false"#)]
    Set {
        /// How a change is spread over the monitors.
        #[arg(long, value_enum)]
        mode: Option<MultiMonitorMode>,

        /// Skip changes while a fullscreen application is in front.
        #[arg(long, value_name = "BOOL")]
        auto_pause: Option<bool>,
    },
}

/// Execute settings subcommands.
///
/// # Errors
///
/// Returns an error if the settings cannot be read or written.
pub fn execute(cmd: &SettingsCommands, ctx: &Context) -> Result<(), QuotewallError> {
    let store = ctx.store();

    match cmd {
        SettingsCommands::Show { json } => {
            let settings = store.settings()?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            } else {
                output::print_highlighted_json(&serde_json::to_value(&settings)?);
            }
            Ok(())
        }
        SettingsCommands::Set { mode, auto_pause } => {
            if mode.is_none() && auto_pause.is_none() {
                return Err(QuotewallError::InvalidArguments(
                    "pass --mode and/or --auto-pause".to_string(),
                ));
            }

            let settings = store.update_settings(|settings| {
                if let Some(mode) = mode {
                    settings.multi_monitor_mode = *mode;
                }
                if let Some(auto_pause) = auto_pause {
                    settings.auto_pause_on_fullscreen = *auto_pause;
                }
            })?;

            println!(
                "{} mode {}, auto-pause on fullscreen {}",
                "Settings saved:".bold(),
                settings.multi_monitor_mode,
                output::format_bool(settings.auto_pause_on_fullscreen)
            );
            Ok(())
        }
    }
}
