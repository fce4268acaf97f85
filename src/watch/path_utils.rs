// src/watch/path_utils.rs

//! Path helpers shared by the matcher and the change detector.

use std::path::{Path, PathBuf};

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Purely lexical: no filesystem access. Event paths are expected to have
/// been rebased with [`rebase_onto`] already. Returns `None` if `path` is not
/// below `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}

/// Re-express an event path under the configured watch `root`.
///
/// Native backends may report paths under the canonical form of the
/// directory that was watched. Those are rebased so glob matching sees the
/// same prefix the patterns were resolved against.
pub fn rebase_onto(root: &Path, canonical_root: Option<&Path>, path: &Path) -> PathBuf {
    if path.starts_with(root) {
        return path.to_path_buf();
    }
    match canonical_root.and_then(|canon| path.strip_prefix(canon).ok()) {
        Some(rel) if rel.as_os_str().is_empty() => root.to_path_buf(),
        Some(rel) => root.join(rel),
        None => path.to_path_buf(),
    }
}
