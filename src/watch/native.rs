// src/watch/native.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::errors::{Result, WatchyError};

/// Poll interval used when the polling backend is selected.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// One notification from a native watch, tagged with the generation of the
/// watch that produced it.
#[derive(Debug)]
pub struct NativeEvent {
    pub generation: u64,
    pub payload: std::result::Result<Vec<PathBuf>, String>,
}

pub type NativeSink = mpsc::UnboundedSender<NativeEvent>;

/// A live OS-level watch. Dropping it tears the watch down.
pub trait NativeWatch: Send {}

/// Installs recursive native watches on a directory.
///
/// The change detector goes through this seam so tests can substitute a
/// scripted source of events.
pub trait NativeWatchFactory: Send + Sync {
    fn install(&self, root: &Path, generation: u64, sink: NativeSink)
    -> Result<Box<dyn NativeWatch>>;
}

/// `notify`-backed watches: the platform's recommended backend, or a
/// stat-polling one for filesystems without change notifications.
#[derive(Debug, Clone)]
pub struct NotifyWatchFactory {
    use_polling: bool,
    poll_interval: Duration,
}

impl NotifyWatchFactory {
    pub fn new(use_polling: bool) -> Self {
        Self {
            use_polling,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

enum NotifyHandle {
    Recommended(RecommendedWatcher),
    Poll(PollWatcher),
}

impl fmt::Debug for NotifyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyHandle::Recommended(_) => f.write_str("NotifyHandle::Recommended"),
            NotifyHandle::Poll(_) => f.write_str("NotifyHandle::Poll"),
        }
    }
}

impl NativeWatch for NotifyHandle {}

impl NativeWatchFactory for NotifyWatchFactory {
    fn install(
        &self,
        root: &Path,
        generation: u64,
        sink: NativeSink,
    ) -> Result<Box<dyn NativeWatch>> {
        // Runs on notify's own thread. A send error only means the detector
        // has already shut down.
        let handler = move |res: notify::Result<Event>| {
            let payload = res.map(|event| event.paths).map_err(|err| err.to_string());
            let _ = sink.send(NativeEvent { generation, payload });
        };

        let install_error = |err: notify::Error| WatchyError::WatchInstall {
            root: root.display().to_string(),
            message: err.to_string(),
        };

        let handle = if self.use_polling {
            let config = Config::default().with_poll_interval(self.poll_interval);
            let mut watcher = PollWatcher::new(handler, config).map_err(install_error)?;
            watcher
                .watch(root, RecursiveMode::Recursive)
                .map_err(install_error)?;
            NotifyHandle::Poll(watcher)
        } else {
            let mut watcher =
                RecommendedWatcher::new(handler, Config::default()).map_err(install_error)?;
            watcher
                .watch(root, RecursiveMode::Recursive)
                .map_err(install_error)?;
            NotifyHandle::Recommended(watcher)
        };

        Ok(Box::new(handle))
    }
}
