// tests/change_detector.rs
//
// Native watching against a real temporary directory.

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Duration, Instant};

use watchy::fs::RealFileSystem;
use watchy::watch::{
    ChangeBatch, ChangeDetector, DetectorOptions, NotifyWatchFactory, ResolvedPatterns,
    WatchStopper,
};

type TestResult = Result<(), Box<dyn Error>>;

/// Time for the initial scan and the OS watch to settle.
const SETTLE: Duration = Duration::from_millis(300);

fn start(
    dir: &Path,
    patterns: &[&str],
    debounce: Duration,
) -> Result<(mpsc::Receiver<ChangeBatch>, WatchStopper), Box<dyn Error>> {
    let resolved = ResolvedPatterns::resolve(patterns, dir)?;
    let options = DetectorOptions {
        debounce,
        // Keep reconciliation out of the way; these tests exercise native events.
        reconcile_interval: Duration::from_secs(600),
    };
    Ok(ChangeDetector::start(
        resolved,
        options,
        Arc::new(RealFileSystem),
        Arc::new(NotifyWatchFactory::new(false)),
    )?)
}

async fn next_batch(rx: &mut mpsc::Receiver<ChangeBatch>) -> Result<ChangeBatch, Box<dyn Error>> {
    let batch = timeout(Duration::from_secs(5), rx.recv())
        .await?
        .ok_or("change stream closed")?;
    Ok(batch)
}

async fn assert_no_batch(rx: &mut mpsc::Receiver<ChangeBatch>, within: Duration) {
    if let Ok(Some(batch)) = timeout(within, rx.recv()).await {
        panic!("unexpected batch: {:?}", batch.paths());
    }
}

#[tokio::test]
async fn single_edit_yields_one_batch_with_the_path_once() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    fs::create_dir_all(dir.path().join("src"))?;
    fs::write(dir.path().join("src/a.js"), "1")?;

    let (mut rx, stopper) = start(dir.path(), &["src/**/*.js"], Duration::from_millis(100))?;
    sleep(SETTLE).await;

    fs::write(dir.path().join("src/a.js"), "2")?;

    let batch = next_batch(&mut rx).await?;
    assert_eq!(batch.paths(), ["src/a.js"]);
    assert_no_batch(&mut rx, Duration::from_millis(400)).await;

    stopper.stop();
    Ok(())
}

#[tokio::test]
async fn burst_of_edits_collapses_into_one_entry() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    fs::create_dir_all(dir.path().join("src"))?;

    let (mut rx, stopper) = start(dir.path(), &["src/**/*.js"], Duration::from_millis(150))?;
    sleep(SETTLE).await;

    let path = dir.path().join("src/a.js");
    let mut last_write = Instant::now();
    for i in 0..5 {
        fs::write(&path, format!("{i}"))?;
        last_write = Instant::now();
        sleep(Duration::from_millis(20)).await;
    }

    let batch = next_batch(&mut rx).await?;
    assert_eq!(batch.paths(), ["src/a.js"]);
    assert!(
        last_write.elapsed() >= Duration::from_millis(150),
        "batch delivered before the quiet period ended"
    );
    assert_no_batch(&mut rx, Duration::from_millis(400)).await;

    stopper.stop();
    Ok(())
}

#[tokio::test]
async fn deleting_a_seen_file_is_a_change() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    fs::create_dir_all(dir.path().join("src/deep"))?;
    fs::write(dir.path().join("src/deep/gone.js"), "x")?;

    let (mut rx, stopper) = start(dir.path(), &["src/**/*.js"], Duration::from_millis(50))?;
    sleep(SETTLE).await;

    fs::remove_file(dir.path().join("src/deep/gone.js"))?;

    let batch = next_batch(&mut rx).await?;
    assert_eq!(batch.paths(), ["src/deep/gone.js"]);

    stopper.stop();
    Ok(())
}

#[tokio::test]
async fn unmatched_files_and_directories_are_ignored() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    fs::create_dir_all(dir.path().join("src"))?;

    let (mut rx, stopper) = start(dir.path(), &["src/**/*.js"], Duration::from_millis(50))?;
    sleep(SETTLE).await;

    fs::write(dir.path().join("src/readme.md"), "docs")?;
    fs::create_dir_all(dir.path().join("src/new.js"))?;
    fs::write(dir.path().join("other.js"), "outside")?;

    assert_no_batch(&mut rx, Duration::from_millis(500)).await;

    stopper.stop();
    Ok(())
}

#[tokio::test]
async fn two_files_written_close_together_arrive_in_one_sorted_batch() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    fs::create_dir_all(dir.path().join("src"))?;

    let (mut rx, stopper) = start(dir.path(), &["src/**/*.js"], Duration::from_millis(100))?;
    sleep(SETTLE).await;

    fs::write(dir.path().join("src/b.js"), "b")?;
    sleep(Duration::from_millis(20)).await;
    fs::write(dir.path().join("src/a.js"), "a")?;
    let second_write = Instant::now();

    let batch = next_batch(&mut rx).await?;
    assert_eq!(batch.paths(), ["src/a.js", "src/b.js"]);
    assert!(second_write.elapsed() >= Duration::from_millis(100));

    stopper.stop();
    Ok(())
}

#[tokio::test]
async fn stopping_ends_the_stream_and_is_idempotent() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let (mut rx, stopper) = start(dir.path(), &["*.txt"], Duration::from_millis(50))?;
    stopper.stop();
    stopper.stop();

    let end = timeout(Duration::from_secs(5), rx.recv()).await?;
    assert!(end.is_none());
    Ok(())
}

#[tokio::test]
async fn watching_a_missing_directory_fails_synchronously() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("does/not/exist");

    let result = start(&missing, &["*.js"], Duration::from_millis(50));
    assert!(result.is_err());
    Ok(())
}
