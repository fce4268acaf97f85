// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchyError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Please specify a command.")]
    MissingCommand,

    #[error("Invalid signal name: {0}")]
    InvalidSignal(String),

    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to watch {root}: {message}")]
    WatchInstall { root: String, message: String },

    #[error("Spawn failed ({0})")]
    Spawn(#[source] std::io::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WatchyError>;
