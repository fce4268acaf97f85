// src/watch/record.rs

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::trace;

/// Last known modification time of every matched file.
///
/// A path is in the record iff it was observed as an existing regular file
/// the last time it was looked at. Both the native event path and the
/// reconciliation scan update it, and both compare against it to decide
/// whether a path changed.
#[derive(Debug, Default)]
pub struct FileRecord {
    mtimes: HashMap<PathBuf, SystemTime>,
    seeded: bool,
}

impl FileRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.mtimes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mtimes.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<SystemTime> {
        self.mtimes.get(path).copied()
    }

    /// True once the first full scan has been absorbed.
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Record the current stat of `path` and report whether it changed.
    ///
    /// `None` means the path is not (or no longer) a regular file.
    pub fn observe(&mut self, path: &Path, modified: Option<SystemTime>) -> bool {
        match (modified, self.mtimes.get(path).copied()) {
            (Some(now), Some(before)) if now == before => false,
            (Some(now), _) => {
                trace!(?path, "mtime changed");
                self.mtimes.insert(path.to_path_buf(), now);
                true
            }
            (None, Some(_)) => {
                trace!(?path, "file disappeared");
                self.mtimes.remove(path);
                true
            }
            (None, None) => false,
        }
    }

    /// Diff a full scan against the record and adopt the scan as the new
    /// truth.
    ///
    /// Paths in `skip` were touched by native events while the scan was in
    /// flight; their record entries are fresher than the snapshot and are
    /// left alone. The first call only seeds the record and reports nothing.
    pub fn reconcile(
        &mut self,
        snapshot: BTreeMap<PathBuf, SystemTime>,
        skip: &HashSet<PathBuf>,
    ) -> Vec<PathBuf> {
        let seeding = !self.seeded;
        self.seeded = true;

        let mut changed = Vec::new();

        let vanished: Vec<PathBuf> = self
            .mtimes
            .keys()
            .filter(|p| !snapshot.contains_key(*p) && !skip.contains(*p))
            .cloned()
            .collect();
        for path in vanished {
            self.mtimes.remove(&path);
            changed.push(path);
        }

        for (path, modified) in snapshot {
            if skip.contains(&path) {
                continue;
            }
            if self.mtimes.insert(path.clone(), modified) != Some(modified) {
                changed.push(path);
            }
        }

        if seeding {
            return Vec::new();
        }
        changed.sort();
        changed
    }
}
