// src/watch/watcher.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::errors::Result;
use crate::fs::{stat_file, FileSystem};
use crate::report::report_error;
use crate::watch::debounce::{ChangeBatch, DebounceAggregator};
use crate::watch::native::{NativeEvent, NativeWatch, NativeWatchFactory};
use crate::watch::path_utils::rebase_onto;
use crate::watch::record::FileRecord;
use crate::watch::patterns::ResolvedPatterns;
use crate::watch::scan::{scan_patterns, ScanSnapshot};

/// Capacity of the batch channel handed back by [`ChangeDetector::start`].
const BATCH_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct DetectorOptions {
    pub debounce: Duration,
    pub reconcile_interval: Duration,
}

/// Handle that stops a running change detector.
///
/// Cloneable; stopping is idempotent. Also exposes the generation of the
/// native watch currently installed, which increases each time the watch is
/// torn down and re-created after a reconciliation finds missed changes.
#[derive(Debug, Clone)]
pub struct WatchStopper {
    token: CancellationToken,
    generation: Arc<AtomicU64>,
}

impl WatchStopper {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// Turns native events and periodic rescans into debounced change batches.
pub struct ChangeDetector;

impl ChangeDetector {
    /// Install the native watch and start the detector task.
    ///
    /// Fails if the initial watch cannot be installed. The returned stream
    /// ends once the detector is stopped.
    pub fn start(
        patterns: ResolvedPatterns,
        options: DetectorOptions,
        fs: Arc<dyn FileSystem>,
        natives: Arc<dyn NativeWatchFactory>,
    ) -> Result<(mpsc::Receiver<ChangeBatch>, WatchStopper)> {
        let patterns = Arc::new(patterns);
        let (native_tx, native_rx) = mpsc::unbounded_channel();

        let native = natives.install(patterns.root(), 0, native_tx.clone())?;
        info!("watching {:?}", patterns.root());

        let canonical_root = fs.canonicalize(patterns.root()).ok();
        let (batch_tx, batch_rx) = mpsc::channel(BATCH_CHANNEL_CAPACITY);
        let stopper = WatchStopper::new();

        let actor = DetectorActor {
            debounce: DebounceAggregator::new(options.debounce),
            record: FileRecord::new(),
            reconcile_interval: options.reconcile_interval,
            patterns,
            canonical_root,
            fs,
            natives,
            native: Some(native),
            native_tx,
            generation: 0,
            stopper: stopper.clone(),
            batch_tx,
            scan_in_flight: false,
            touched: HashSet::new(),
            unseeded: HashSet::new(),
        };
        tokio::spawn(actor.run(native_rx));

        Ok((batch_rx, stopper))
    }
}

struct DetectorActor {
    debounce: DebounceAggregator,
    record: FileRecord,
    reconcile_interval: Duration,
    patterns: Arc<ResolvedPatterns>,
    canonical_root: Option<PathBuf>,
    fs: Arc<dyn FileSystem>,
    natives: Arc<dyn NativeWatchFactory>,
    native: Option<Box<dyn NativeWatch>>,
    native_tx: mpsc::UnboundedSender<NativeEvent>,
    generation: u64,
    stopper: WatchStopper,
    batch_tx: mpsc::Sender<ChangeBatch>,
    scan_in_flight: bool,
    /// Paths seen by native events while a scan was running.
    touched: HashSet<PathBuf>,
    /// Paths seen by native events before the record was seeded.
    unseeded: HashSet<PathBuf>,
}

impl DetectorActor {
    async fn run(mut self, mut native_rx: mpsc::UnboundedReceiver<NativeEvent>) {
        let token = self.stopper.token.clone();
        let (scan_tx, mut scan_rx) = mpsc::channel::<Option<ScanSnapshot>>(1);

        // The first tick completes immediately and seeds the record.
        let mut reconcile = time::interval(self.reconcile_interval);
        reconcile.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let deadline = self.debounce.deadline();

            tokio::select! {
                _ = token.cancelled() => break,
                Some(event) = native_rx.recv() => self.handle_native(event).await,
                Some(scanned) = scan_rx.recv() => self.finish_scan(scanned).await,
                _ = reconcile.tick(), if !self.scan_in_flight => self.start_scan(&scan_tx),
                _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(batch) = self.debounce.poll(Instant::now()) {
                        self.deliver(batch).await;
                    }
                }
            }
        }

        self.native = None;
        debug!("change detector stopped");
    }

    async fn handle_native(&mut self, event: NativeEvent) {
        if event.generation != self.generation {
            trace!(generation = event.generation, "dropping event from retired watch");
            return;
        }

        let paths = match event.payload {
            Ok(paths) => paths,
            Err(message) => {
                report_error(format!("Watch error ({message})"));
                return;
            }
        };

        for raw in paths {
            let path = rebase_onto(self.patterns.root(), self.canonical_root.as_deref(), &raw);
            if !self.patterns.matches(&path) {
                continue;
            }

            // Nothing to diff against yet; re-checked once the seed lands.
            if !self.record.is_seeded() {
                self.unseeded.insert(path);
                continue;
            }

            let Some(modified) = self.stat(path.clone()).await else {
                continue;
            };
            if self.scan_in_flight {
                self.touched.insert(path.clone());
            }
            self.observe(&path, modified);
        }
    }

    /// Stat one path on the blocking pool. `None` if the stat task failed.
    fn stat(
        &self,
        path: PathBuf,
    ) -> impl std::future::Future<Output = Option<Option<SystemTime>>> + Send + 'static {
        let fs = Arc::clone(&self.fs);
        async move {
            let target = path.clone();
            match tokio::task::spawn_blocking(move || stat_file(fs.as_ref(), &target)).await {
                Ok(modified) => Some(modified),
                Err(err) => {
                    report_error(format!("Failed to stat {} ({err})", path.display()));
                    None
                }
            }
        }
    }

    fn observe(&mut self, path: &Path, modified: Option<SystemTime>) {
        if self.record.observe(path, modified) {
            trace!(?path, "native change");
            self.debounce.add(self.patterns.display_path(path), Instant::now());
        }
    }

    fn start_scan(&mut self, scan_tx: &mpsc::Sender<Option<ScanSnapshot>>) {
        self.scan_in_flight = true;
        self.touched.clear();

        let fs = Arc::clone(&self.fs);
        let patterns = Arc::clone(&self.patterns);
        let cancel = self.stopper.token.clone();
        let scan_tx = scan_tx.clone();

        tokio::spawn(async move {
            let scanned = scan_patterns(fs, patterns, cancel).await;
            let _ = scan_tx.send(scanned).await;
        });
    }

    async fn finish_scan(&mut self, scanned: Option<ScanSnapshot>) {
        self.scan_in_flight = false;
        let touched = std::mem::take(&mut self.touched);
        let Some(snapshot) = scanned else {
            debug!("reconciliation scan produced no snapshot; retrying next interval");
            return;
        };

        let seeding = !self.record.is_seeded();
        let changed = self.record.reconcile(snapshot, &touched);
        if seeding {
            debug!(files = self.record.len(), "file record seeded");
            self.recheck_unseeded().await;
            return;
        }
        if changed.is_empty() {
            return;
        }

        debug!(count = changed.len(), "reconciliation found missed changes");
        let now = Instant::now();
        for path in &changed {
            self.debounce.add(self.patterns.display_path(path), now);
        }

        self.recreate_native_watch();

        if let Some(batch) = self.debounce.flush() {
            self.deliver(batch).await;
        }
    }

    /// Diff paths that had native events before seeding against the fresh
    /// baseline, so only real mtime deltas count.
    async fn recheck_unseeded(&mut self) {
        let pending: Vec<PathBuf> = self.unseeded.drain().collect();
        for path in pending {
            if let Some(modified) = self.stat(path.clone()).await {
                self.observe(&path, modified);
            }
        }
    }

    /// Tear down the current native watch and install a fresh one under the
    /// next generation. Events still queued from the old watch are dropped.
    fn recreate_native_watch(&mut self) {
        self.native = None;
        self.generation += 1;
        self.stopper.generation.store(self.generation, Ordering::SeqCst);

        match self
            .natives
            .install(self.patterns.root(), self.generation, self.native_tx.clone())
        {
            Ok(native) => {
                debug!(generation = self.generation, "native watch re-created");
                self.native = Some(native);
            }
            Err(err) => report_error(format!("Failed to re-create watch ({err})")),
        }
    }

    async fn deliver(&mut self, batch: ChangeBatch) {
        debug!(paths = ?batch.paths(), "delivering change batch");
        if self.batch_tx.send(batch).await.is_err() {
            // Nobody is listening any more.
            self.stopper.stop();
        }
    }
}
