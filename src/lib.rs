// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod report;
pub mod supervisor;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::debug;

use crate::cli::CliArgs;
use crate::config::{load_config, ProcessSettings};
use crate::engine::runtime::run_label;
use crate::engine::triggers::{
    spawn_batch_forwarder, spawn_restart_listener, spawn_shutdown_listener,
};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, TriggerReason};
use crate::exec::RealProcessBackend;
use crate::fs::RealFileSystem;
use crate::watch::{ChangeDetector, DetectorOptions, NotifyWatchFactory, ResolvedPatterns};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + flags)
/// - the change detector, if any patterns were given
/// - the stdin restart trigger and SIGINT/SIGTERM handling
/// - the supervisor runtime around the real process backend
///
/// Returns once shutdown was requested and the child has exited.
pub async fn run(args: CliArgs) -> Result<()> {
    let config = load_config(&args)?;
    debug!(?config, "configuration loaded");

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let ProcessSettings {
        command,
        args: command_args,
        policy,
        init_spawn,
        restart_trigger,
    } = config.process;

    let label = run_label(&command, &command_args);
    let backend = RealProcessBackend::new(command, command_args, rt_tx.clone());
    let mut runtime = Runtime::new(
        CoreRuntime::new(policy),
        rt_rx,
        rt_tx.clone(),
        backend,
        label,
    );

    if !config.watch.patterns.is_empty() {
        let cwd = std::env::current_dir()?;
        let patterns = ResolvedPatterns::resolve(&config.watch.patterns, &cwd)?;
        let options = DetectorOptions {
            debounce: config.watch.debounce,
            reconcile_interval: config.watch.reconcile_interval,
        };
        let (batches, stopper) = ChangeDetector::start(
            patterns,
            options,
            Arc::new(RealFileSystem),
            Arc::new(NotifyWatchFactory::new(config.watch.use_polling)),
        )?;
        spawn_batch_forwarder(batches, rt_tx.clone());
        runtime = runtime.with_watch(stopper);
    }

    if let Some(trigger) = restart_trigger {
        spawn_restart_listener(trigger, rt_tx.clone());
    }
    spawn_shutdown_listener(rt_tx.clone());

    if init_spawn {
        rt_tx
            .send(RuntimeEvent::RunRequested {
                paths: Vec::new(),
                reason: TriggerReason::Startup,
            })
            .await?;
    }
    drop(rt_tx);

    runtime.run().await?;
    Ok(())
}
