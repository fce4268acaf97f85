// src/engine/triggers.rs

//! Tasks that feed external requests into the runtime channel.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::watch::ChangeBatch;

/// True if `line` (trimmed) is the configured restart trigger.
pub fn is_restart_line(line: &str, trigger: &str) -> bool {
    line.trim() == trigger
}

/// Read stdin line by line and request a run whenever the restart trigger
/// is entered.
pub fn spawn_restart_listener(
    trigger: String,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> JoinHandle<()> {
    spawn_restart_listener_on(BufReader::new(tokio::io::stdin()), trigger, runtime_tx)
}

/// Same as [`spawn_restart_listener`], reading from any buffered reader.
pub fn spawn_restart_listener_on<R>(
    reader: R,
    trigger: String,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> JoinHandle<()>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if !is_restart_line(&line, &trigger) {
                        continue;
                    }
                    debug!("manual restart requested");
                    let event = RuntimeEvent::RunRequested {
                        paths: Vec::new(),
                        reason: TriggerReason::Manual,
                    };
                    if runtime_tx.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    debug!("stdin closed; restart listener finished");
                    break;
                }
                Err(err) => {
                    warn!("failed reading stdin: {err}");
                    break;
                }
            }
        }
    })
}

/// Forward every debounced change batch as a run request carrying its paths.
pub fn spawn_batch_forwarder(
    mut batches: mpsc::Receiver<ChangeBatch>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(batch) = batches.recv().await {
            let event = RuntimeEvent::RunRequested {
                paths: batch.into_paths(),
                reason: TriggerReason::FileWatch,
            };
            if runtime_tx.send(event).await.is_err() {
                break;
            }
        }
        debug!("change stream ended");
    })
}

/// Turn SIGINT and SIGTERM into `ShutdownRequested`.
///
/// Every received signal is forwarded; the core ignores all but the first.
pub fn spawn_shutdown_listener(runtime_tx: mpsc::Sender<RuntimeEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        #[cfg(unix)]
        let mut terminate =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(stream) => Some(stream),
                Err(err) => {
                    warn!("failed to listen for SIGTERM: {err}");
                    None
                }
            };

        loop {
            #[cfg(unix)]
            let received = {
                let sigterm = async {
                    match terminate.as_mut() {
                        Some(stream) => stream.recv().await,
                        None => std::future::pending().await,
                    }
                };
                tokio::select! {
                    res = tokio::signal::ctrl_c() => res.map(|_| "SIGINT"),
                    _ = sigterm => Ok("SIGTERM"),
                }
            };
            #[cfg(not(unix))]
            let received = tokio::signal::ctrl_c().await.map(|_| "interrupt");

            match received {
                Ok(name) => {
                    debug!("received {name}; requesting shutdown");
                    if runtime_tx.send(RuntimeEvent::ShutdownRequested).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!("failed to listen for Ctrl+C: {err}");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn restart_line_is_trimmed() {
        assert!(is_restart_line("rs\n", "rs"));
        assert!(is_restart_line("  rs  ", "rs"));
        assert!(!is_restart_line("rsx", "rs"));
        assert!(!is_restart_line("", "rs"));
    }

    #[tokio::test]
    async fn listener_requests_manual_run_for_trigger_lines_only() {
        let input: &[u8] = b"hello\n rs \nrs\n";
        let (tx, mut rx) = mpsc::channel(8);
        let handle = spawn_restart_listener_on(input, "rs".to_string(), tx);

        for _ in 0..2 {
            let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert!(matches!(
                event,
                RuntimeEvent::RunRequested {
                    reason: TriggerReason::Manual,
                    ..
                }
            ));
        }
        handle.await.unwrap();
        assert!(rx.recv().await.is_none());
    }
}
