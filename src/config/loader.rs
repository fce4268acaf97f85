// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::cli::CliArgs;
use crate::config::model::{Config, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_config`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Overlay command-line flags on top of a (possibly empty) file config.
///
/// Flags always win. Repeated `--watch` flags replace the file's pattern list
/// instead of extending it, and a command given on the command line replaces
/// the file's command entirely.
pub fn apply_cli(mut raw: RawConfigFile, args: &CliArgs) -> RawConfigFile {
    if !args.watch.is_empty() {
        raw.watch.patterns = args.watch.clone();
    }
    if args.debounce.is_some() {
        raw.watch.debounce = args.debounce;
    }
    if args.reconcile_interval.is_some() {
        raw.watch.reconcile_interval = args.reconcile_interval;
    }
    if args.use_polling {
        raw.watch.use_polling = Some(true);
    }

    let process = &mut raw.process;
    if !args.command.is_empty() {
        process.command = args.command.clone();
    }
    if args.keep_alive {
        process.keep_alive = Some(true);
    }
    if args.no_restart_after_signal {
        process.restart_after_signal = Some(false);
    }
    if args.no_init_spawn {
        process.init_spawn = Some(false);
    }
    if args.upgrade {
        process.upgrade = Some(true);
    }
    if let Some(sig) = &args.shutdown_signal {
        process.shutdown_signal = Some(sig.clone());
    }
    if let Some(sig) = &args.reload_signal {
        process.reload_signal = Some(sig.clone());
    }
    if args.wait.is_some() {
        process.kill_timeout = args.wait;
    }
    if let Some(trigger) = &args.restart {
        process.restart_trigger = Some(trigger.clone());
    }

    raw
}

/// Build the validated configuration for a run.
///
/// - Reads the TOML file named by `--config`, if any.
/// - Applies command-line overrides.
/// - Validates the result (command present, signals known, durations sane).
pub fn load_config(args: &CliArgs) -> Result<Config> {
    let raw = match &args.config {
        Some(path) => load_from_path(path)?,
        None => RawConfigFile::default(),
    };
    Config::try_from(apply_cli(raw, args))
}
