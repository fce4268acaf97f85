// src/watch/scan.rs

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::fs::{stat_file, FileSystem};
use crate::watch::patterns::ResolvedPatterns;

/// Every matched regular file under the watch root with its mtime.
pub type ScanSnapshot = BTreeMap<PathBuf, SystemTime>;

struct DirListing {
    subdirs: Vec<PathBuf>,
    files: Vec<(PathBuf, SystemTime)>,
}

/// Walk the watch root and stat every file that matches.
///
/// Each directory is listed on the blocking pool and the task yields between
/// directories, so a large tree never monopolises the runtime. Directories
/// that cannot hold matches are not descended into. Returns `None` if
/// `cancel` fires before the walk completes or a listing task fails.
pub async fn scan_patterns(
    fs: Arc<dyn FileSystem>,
    patterns: Arc<ResolvedPatterns>,
    cancel: CancellationToken,
) -> Option<ScanSnapshot> {
    let mut snapshot = ScanSnapshot::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut stack = vec![patterns.root().to_path_buf()];

    while let Some(dir) = stack.pop() {
        if cancel.is_cancelled() {
            debug!("reconciliation scan cancelled");
            return None;
        }

        let listing = {
            let fs = Arc::clone(&fs);
            let patterns = Arc::clone(&patterns);
            tokio::task::spawn_blocking(move || list_dir(fs.as_ref(), &patterns, dir)).await
        };

        match listing {
            Ok(Some((canonical, listing))) => {
                if !visited.insert(canonical) {
                    continue;
                }
                stack.extend(listing.subdirs);
                snapshot.extend(listing.files);
            }
            Ok(None) => {}
            Err(err) => {
                warn!("reconciliation scan aborted: {err}");
                return None;
            }
        }

        tokio::task::yield_now().await;
    }

    Some(snapshot)
}

fn list_dir(
    fs: &dyn FileSystem,
    patterns: &ResolvedPatterns,
    dir: PathBuf,
) -> Option<(PathBuf, DirListing)> {
    let entries = match fs.read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("skipping unreadable directory: {err:#}");
            return None;
        }
    };
    let canonical = fs.canonicalize(&dir).unwrap_or_else(|_| dir.clone());

    let mut listing = DirListing {
        subdirs: Vec::new(),
        files: Vec::new(),
    };
    for entry in entries {
        if fs.is_dir(&entry) {
            if patterns.could_contain(&entry) {
                listing.subdirs.push(entry);
            }
        } else if patterns.matches(&entry) {
            if let Some(modified) = stat_file(fs, &entry) {
                listing.files.push((entry, modified));
            }
        }
    }
    Some((canonical, listing))
}
