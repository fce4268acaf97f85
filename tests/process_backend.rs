// tests/process_backend.rs
//
// The real backend against real processes.

#![cfg(unix)]

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::time::Duration;

use nix::sys::signal::Signal;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Instant};

use watchy::engine::{CoreRuntime, Runtime, RuntimeEvent, TriggerReason};
use watchy::errors::WatchyError;
use watchy::exec::{ProcessBackend, RealProcessBackend};
use watchy::supervisor::ExitOutcome;
use watchy::types::SignalName;
use watchy_test_utils::builders::PolicyBuilder;

type TestResult = Result<(), Box<dyn Error>>;

fn sh(script: &str, tx: mpsc::Sender<RuntimeEvent>) -> RealProcessBackend {
    RealProcessBackend::new("sh".to_string(), vec!["-c".to_string(), script.to_string()], tx)
}

async fn next_exit(rx: &mut mpsc::Receiver<RuntimeEvent>) -> Result<(u64, ExitOutcome), Box<dyn Error>> {
    loop {
        let event = timeout(Duration::from_secs(10), rx.recv())
            .await?
            .ok_or("runtime channel closed")?;
        if let RuntimeEvent::ChildExited { incarnation, exit } = event {
            return Ok((incarnation, exit));
        }
    }
}

#[tokio::test]
async fn child_sees_trigger_paths_and_reports_its_exit_code() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("paths.txt");
    let (tx, mut rx) = mpsc::channel(8);

    let script = format!("printf '%s' \"$WATCHY_PATHS\" > '{}'; exit 3", out.display());
    let mut backend = sh(&script, tx);
    backend
        .spawn(7, vec!["src/a.js".to_string(), "src/b.js".to_string()])
        .await?;

    assert_eq!(next_exit(&mut rx).await?, (7, ExitOutcome::Code(3)));
    assert_eq!(std::fs::read_to_string(&out)?, "src/a.js,src/b.js");
    Ok(())
}

#[tokio::test]
async fn empty_paths_give_an_empty_variable() -> TestResult {
    init_tracing();
    let (tx, mut rx) = mpsc::channel(8);
    let mut backend = sh("test -z \"$WATCHY_PATHS\" && test \"${WATCHY_PATHS+set}\" = set", tx);
    backend.spawn(1, Vec::new()).await?;

    assert_eq!(next_exit(&mut rx).await?, (1, ExitOutcome::Code(0)));
    Ok(())
}

#[tokio::test]
async fn signals_reach_the_child_and_kill_cannot_be_ignored() -> TestResult {
    init_tracing();
    let (tx, mut rx) = mpsc::channel(8);
    let mut backend = sh("trap '' TERM; while :; do sleep 0.05; done", tx);
    backend.spawn(1, Vec::new()).await?;
    sleep(Duration::from_millis(200)).await;

    backend.signal(1, SignalName::default());
    let ignored = timeout(Duration::from_millis(300), rx.recv()).await;
    assert!(ignored.is_err(), "child should ignore SIGTERM");

    // Requests for another incarnation go nowhere.
    backend.kill(99);
    let ignored = timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(ignored.is_err());

    backend.kill(1);
    assert_eq!(
        next_exit(&mut rx).await?,
        (1, ExitOutcome::Signal(Signal::SIGKILL as i32))
    );
    Ok(())
}

#[tokio::test]
async fn missing_executable_is_a_spawn_error() -> TestResult {
    init_tracing();
    let (tx, _rx) = mpsc::channel(8);
    let mut backend = RealProcessBackend::new("watchy-no-such-binary".to_string(), Vec::new(), tx);

    let result = backend.spawn(1, Vec::new()).await;
    assert!(matches!(result, Err(WatchyError::Spawn(_))));
    Ok(())
}

#[tokio::test]
async fn runtime_escalates_to_sigkill_after_the_wait() -> TestResult {
    init_tracing();
    let wait = Duration::from_millis(500);
    let (tx, rx) = mpsc::channel(64);
    let backend = sh("trap '' TERM; while :; do sleep 0.05; done", tx.clone());
    let policy = PolicyBuilder::new()
        .kill_timeout(wait)
        .restart_after_signal(false)
        .build();
    let runtime = Runtime::new(CoreRuntime::new(policy), rx, tx.clone(), backend, "sh".into());
    let handle = tokio::spawn(runtime.run());

    tx.send(RuntimeEvent::RunRequested {
        paths: Vec::new(),
        reason: TriggerReason::Startup,
    })
    .await?;
    sleep(Duration::from_millis(200)).await;

    let started = Instant::now();
    tx.send(RuntimeEvent::ShutdownRequested).await?;

    timeout(Duration::from_secs(10), handle).await???;
    assert!(started.elapsed() >= wait, "exited before the kill timeout");
    Ok(())
}
