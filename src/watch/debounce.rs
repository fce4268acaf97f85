// src/watch/debounce.rs

use std::collections::BTreeSet;
use std::time::Duration;

use tokio::time::Instant;

/// A set of changed paths delivered together.
///
/// Paths are relative to the working directory where possible, sorted, and
/// never repeated within one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    paths: Vec<String>,
}

impl ChangeBatch {
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn into_paths(self) -> Vec<String> {
        self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Trailing-edge debouncer.
///
/// Every added path pushes the deadline to `now + window`; once the clock
/// passes the deadline the accumulated set is released as one batch. The
/// aggregator itself has no timer: the owner sleeps until [`deadline`] and
/// then calls [`poll`].
///
/// [`deadline`]: DebounceAggregator::deadline
/// [`poll`]: DebounceAggregator::poll
#[derive(Debug)]
pub struct DebounceAggregator {
    window: Duration,
    pending: BTreeSet<String>,
    deadline: Option<Instant>,
}

impl DebounceAggregator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: BTreeSet::new(),
            deadline: None,
        }
    }

    pub fn add(&mut self, path: String, now: Instant) {
        self.pending.insert(path);
        self.deadline = Some(now + self.window);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Release the batch if the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<ChangeBatch> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.flush(),
            _ => None,
        }
    }

    /// Release whatever is pending right away.
    pub fn flush(&mut self) -> Option<ChangeBatch> {
        self.deadline = None;
        if self.pending.is_empty() {
            return None;
        }
        let paths = std::mem::take(&mut self.pending).into_iter().collect();
        Some(ChangeBatch { paths })
    }
}
