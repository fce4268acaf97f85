// crates/test-utils/src/fake_backend.rs

use std::future::Future;
use std::io;
use std::pin::Pin;

use tokio::sync::mpsc;
use tokio::time::Instant;
use watchy::errors::{Result, WatchyError};
use watchy::exec::ProcessBackend;
use watchy::types::SignalName;

/// What the runtime asked the backend to do.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendAction {
    Spawn { incarnation: u64, paths: Vec<String> },
    Signal { incarnation: u64, signal: SignalName },
    Kill { incarnation: u64 },
}

/// A fake process backend that:
/// - records every spawn, signal and kill with the (tokio) time it happened
/// - never starts a real process; the test decides when a "child" exits by
///   sending `RuntimeEvent::ChildExited` itself.
pub struct FakeProcessBackend {
    actions_tx: mpsc::UnboundedSender<(Instant, BackendAction)>,
    fail_spawns: bool,
}

impl FakeProcessBackend {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(Instant, BackendAction)>) {
        let (actions_tx, actions_rx) = mpsc::unbounded_channel();
        (
            Self {
                actions_tx,
                fail_spawns: false,
            },
            actions_rx,
        )
    }

    /// Make every spawn fail as if the executable did not exist.
    pub fn failing_spawns(mut self) -> Self {
        self.fail_spawns = true;
        self
    }

    fn record(&self, action: BackendAction) {
        let _ = self.actions_tx.send((Instant::now(), action));
    }
}

impl ProcessBackend for FakeProcessBackend {
    fn spawn(
        &mut self,
        incarnation: u64,
        paths: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.record(BackendAction::Spawn { incarnation, paths });
            if self.fail_spawns {
                return Err(WatchyError::Spawn(io::Error::new(
                    io::ErrorKind::NotFound,
                    "No such file or directory",
                )));
            }
            Ok(())
        })
    }

    fn signal(&mut self, incarnation: u64, signal: SignalName) {
        self.record(BackendAction::Signal {
            incarnation,
            signal,
        });
    }

    fn kill(&mut self, incarnation: u64) {
        self.record(BackendAction::Kill { incarnation });
    }
}
