//! Error type returned by the command-line interface.
//!
//! Library modules keep their own `thiserror` enums; this one flattens them
//! into messages suitable for the terminal or JSON output.

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::playlist::ValidationError;
use crate::store::StoreError;

#[derive(Debug, Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum QuotewallError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Store error: {0}")]
    StoreError(String),
    #[error("Invalid playlist: {0}")]
    ValidationError(String),
    #[error("Wallpaper error: {0}")]
    WallpaperError(String),
    #[error("Cache error: {0}")]
    CacheError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("{0}")]
    CommandError(String),
}

impl From<std::io::Error> for QuotewallError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err.to_string()) }
}

impl From<serde_json::Error> for QuotewallError {
    fn from(err: serde_json::Error) -> Self { Self::CommandError(err.to_string()) }
}

impl From<ConfigError> for QuotewallError {
    fn from(err: ConfigError) -> Self { Self::ConfigError(err.to_string()) }
}

impl From<StoreError> for QuotewallError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Invalid { source, .. } => Self::ValidationError(source.to_string()),
            other => Self::StoreError(other.to_string()),
        }
    }
}

impl From<ValidationError> for QuotewallError {
    fn from(err: ValidationError) -> Self { Self::ValidationError(err.to_string()) }
}

impl From<String> for QuotewallError {
    fn from(msg: String) -> Self { Self::CommandError(msg) }
}

impl From<&str> for QuotewallError {
    fn from(msg: &str) -> Self { Self::CommandError(msg.to_string()) }
}
