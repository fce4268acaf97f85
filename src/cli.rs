// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{CommandFactory, Parser, ValueEnum};

/// Command-line arguments for `watchy`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "watchy",
    version,
    about = "Run commands when paths change.",
    override_usage = "watchy [OPTIONS] -- <COMMAND> [ARGS]...",
    long_about = None
)]
pub struct CliArgs {
    /// Watch PATTERN for changes, can be specified multiple times.
    #[arg(short = 'w', long = "watch", value_name = "PATTERN")]
    pub watch: Vec<String>,

    /// Deliver a change at most every SECONDS seconds (trailing debounce).
    #[arg(short = 'd', long, value_name = "SECONDS")]
    pub debounce: Option<f64>,

    /// Restart the process if it exits.
    #[arg(short = 'k', long)]
    pub keep_alive: bool,

    /// Send STRING to STDIN to restart the process.
    #[arg(short = 'r', long = "restart", value_name = "STRING")]
    pub restart: Option<String>,

    /// Disable process restart after being signaled and exited.
    #[arg(short = 'R', long)]
    pub no_restart_after_signal: bool,

    /// Only output errors.
    #[arg(short = 's', long)]
    pub silent: bool,

    /// Disable colored log output.
    #[arg(short = 'n', long)]
    pub no_color: bool,

    /// Prevent spawn when the watcher is created.
    #[arg(short = 'S', long)]
    pub no_init_spawn: bool,

    /// Use SIGNAL to shut down the process (default SIGTERM).
    #[arg(short = 't', long, value_name = "SIGNAL")]
    pub shutdown_signal: Option<String>,

    /// Use SIGNAL to reload the process instead of restarting it.
    #[arg(short = 'T', long, value_name = "SIGNAL")]
    pub reload_signal: Option<String>,

    /// Always terminate and respawn on change, even with a reload signal.
    #[arg(short = 'u', long)]
    pub upgrade: bool,

    /// Send SIGKILL to the process after SECONDS if it hasn't exited.
    #[arg(short = 'W', long = "wait", value_name = "SECONDS")]
    pub wait: Option<f64>,

    /// Use file polling even if a native watcher is available.
    #[arg(short = 'p', long)]
    pub use_polling: bool,

    /// Interval between full reconciliation scans.
    #[arg(long, value_name = "SECONDS")]
    pub reconcile_interval: Option<f64>,

    /// Optional TOML config file; command-line flags take precedence.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHY_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Command to run, followed by its arguments.
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

/// Rendered help text, printed when no command was given.
pub fn usage() -> String {
    CliArgs::command().render_help().to_string()
}
