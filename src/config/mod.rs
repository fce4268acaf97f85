// src/config/mod.rs

//! Configuration loading and validation for watchy.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and layer CLI flags on top (`loader.rs`).
//! - Validate it into a typed [`Config`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{apply_cli, load_config, load_from_path};
pub use model::{
    Config, ProcessSection, ProcessSettings, RawConfigFile, WatchSection, WatchSettings,
};
