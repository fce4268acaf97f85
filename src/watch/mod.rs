// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Resolving glob patterns against the working directory and choosing the
//!   single directory to watch.
//! - Wiring up a native recursive watch (`notify`) behind a factory seam.
//! - Keeping a record of file mtimes so only real changes are reported.
//! - Periodically rescanning the tree to recover changes the native watch
//!   missed, re-creating the watch when that happens.
//! - Debouncing everything into [`ChangeBatch`]es.
//!
//! It knows nothing about the supervised process.

pub mod debounce;
pub mod native;
pub mod path_utils;
pub mod patterns;
pub mod record;
pub mod scan;
pub mod watcher;

pub use debounce::{ChangeBatch, DebounceAggregator};
pub use native::{NativeEvent, NativeSink, NativeWatch, NativeWatchFactory, NotifyWatchFactory};
pub use patterns::{ResolvedPatterns, WatchPattern};
pub use record::FileRecord;
pub use watcher::{ChangeDetector, DetectorOptions, WatchStopper};
