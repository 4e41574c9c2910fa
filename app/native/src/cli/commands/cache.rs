//! Cache CLI commands.

use clap::Subcommand;

use super::Context;
use crate::cache::clear_dir;
use crate::error::QuotewallError;

/// Cache subcommands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum CacheCommands {
    /// Delete every rendered wallpaper. They are re-rendered on the next change.
    Clear,

    /// Print the directory rendered wallpapers are cached in.
    Path,
}

/// Execute cache subcommands.
///
/// # Errors
///
/// Returns an error if the cache directory cannot be removed.
pub fn execute(cmd: &CacheCommands, ctx: &Context) -> Result<(), QuotewallError> {
    let dir = ctx.config.render_cache_dir();

    match cmd {
        CacheCommands::Clear => {
            let freed = clear_dir(&dir).map_err(|err| {
                QuotewallError::CacheError(format!("failed to clear {}: {err}", dir.display()))
            })?;
            println!("Cleared {} from {}", format_bytes(freed), dir.display());
        }
        CacheCommands::Path => println!("{}", dir.display()),
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}
