#![allow(dead_code)]

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use watchy::engine::{CoreRuntime, Runtime, RuntimeEvent, TriggerReason};
use watchy::supervisor::{ExitOutcome, RestartPolicy};
use watchy::watch::WatchStopper;
pub use watchy_test_utils::{init_tracing, BackendAction, FakeProcessBackend};

/// A runtime driven by a fake backend.
///
/// The test plays the role of the child: it waits for backend actions and
/// reports exits through `tx`.
pub struct Harness {
    pub tx: mpsc::Sender<RuntimeEvent>,
    pub actions: mpsc::UnboundedReceiver<(Instant, BackendAction)>,
    pub handle: JoinHandle<watchy::errors::Result<()>>,
}

pub fn start_runtime(policy: RestartPolicy) -> Harness {
    start_runtime_with(policy, FakeProcessBackend::new(), None)
}

pub fn start_runtime_with(
    policy: RestartPolicy,
    (backend, actions): (
        FakeProcessBackend,
        mpsc::UnboundedReceiver<(Instant, BackendAction)>,
    ),
    watch: Option<WatchStopper>,
) -> Harness {
    let (tx, rx) = mpsc::channel(64);
    let mut runtime = Runtime::new(
        CoreRuntime::new(policy),
        rx,
        tx.clone(),
        backend,
        "test-child".to_string(),
    );
    if let Some(watch) = watch {
        runtime = runtime.with_watch(watch);
    }
    let handle = tokio::spawn(runtime.run());
    Harness {
        tx,
        actions,
        handle,
    }
}

impl Harness {
    pub async fn request_run(&self, paths: &[&str]) {
        self.tx
            .send(RuntimeEvent::RunRequested {
                paths: paths.iter().map(|p| p.to_string()).collect(),
                reason: TriggerReason::FileWatch,
            })
            .await
            .expect("runtime alive");
    }

    pub async fn child_exited(&self, incarnation: u64, exit: ExitOutcome) {
        self.tx
            .send(RuntimeEvent::ChildExited { incarnation, exit })
            .await
            .expect("runtime alive");
    }

    pub async fn shutdown(&self) {
        self.tx
            .send(RuntimeEvent::ShutdownRequested)
            .await
            .expect("runtime alive");
    }

    /// Next backend action, failing the test after 30 (virtual) seconds.
    pub async fn next_action(&mut self) -> (Instant, BackendAction) {
        tokio::time::timeout(Duration::from_secs(30), self.actions.recv())
            .await
            .expect("timed out waiting for a backend action")
            .expect("backend dropped")
    }

    /// Let everything settle, then assert the backend saw nothing new.
    pub async fn assert_quiet(&mut self) {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if let Ok((_, action)) = self.actions.try_recv() {
            panic!("unexpected backend action: {action:?}");
        }
    }
}
