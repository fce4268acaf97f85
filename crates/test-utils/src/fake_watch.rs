// crates/test-utils/src/fake_watch.rs

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use watchy::errors::{Result, WatchyError};
use watchy::watch::{NativeEvent, NativeSink, NativeWatch, NativeWatchFactory};

struct SilentWatch;

impl NativeWatch for SilentWatch {}

/// Native watch factory whose watches never fire on their own.
///
/// Changes are only discovered by reconciliation scans, unless the test
/// pushes an event through [`SilentWatchFactory::inject`]. Clones share
/// state.
#[derive(Clone, Default)]
pub struct SilentWatchFactory {
    installs: Arc<AtomicUsize>,
    sinks: Arc<Mutex<Vec<(u64, NativeSink)>>>,
    fail: Arc<AtomicBool>,
}

impl SilentWatchFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next install attempts fail.
    pub fn fail_installs(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// How many watches have been installed so far.
    pub fn installs(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }

    /// Deliver `paths` as if the watch of `generation` had reported them.
    /// Returns false if no watch of that generation was ever installed.
    pub fn inject(&self, generation: u64, paths: &[PathBuf]) -> bool {
        let sinks = self.sinks.lock().unwrap();
        match sinks.iter().find(|(g, _)| *g == generation) {
            Some((_, sink)) => sink
                .send(NativeEvent {
                    generation,
                    payload: Ok(paths.to_vec()),
                })
                .is_ok(),
            None => false,
        }
    }
}

impl NativeWatchFactory for SilentWatchFactory {
    fn install(
        &self,
        root: &Path,
        generation: u64,
        sink: NativeSink,
    ) -> Result<Box<dyn NativeWatch>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(WatchyError::WatchInstall {
                root: root.display().to_string(),
                message: "install refused".to_string(),
            });
        }
        self.installs.fetch_add(1, Ordering::SeqCst);
        self.sinks.lock().unwrap().push((generation, sink));
        Ok(Box::new(SilentWatch))
    }
}
