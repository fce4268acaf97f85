// src/watch/patterns.rs

use std::fmt;
use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::errors::{Result, WatchyError};
use crate::watch::path_utils::relative_str;

/// Characters that start a glob construct (`*`, `?`, `[...]`, `{...}`).
const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// An absolute glob pattern, fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchPattern {
    glob: String,
    literal_dir: PathBuf,
}

impl WatchPattern {
    pub fn as_str(&self) -> &str {
        &self.glob
    }

    /// Deepest directory of the pattern that contains no glob syntax.
    pub fn literal_dir(&self) -> &Path {
        &self.literal_dir
    }
}

impl fmt::Display for WatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.glob)
    }
}

/// Compiled patterns plus the single directory the native watch is installed on.
///
/// Matching is always done against absolute paths: `*` and `?` never cross a
/// `/`, while `**` spans any number of directories.
#[derive(Clone)]
pub struct ResolvedPatterns {
    patterns: Vec<WatchPattern>,
    matcher: GlobSet,
    root: PathBuf,
    base: PathBuf,
}

impl fmt::Debug for ResolvedPatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedPatterns")
            .field("patterns", &self.patterns)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl ResolvedPatterns {
    /// Resolve `patterns` against `base` (usually the working directory) and
    /// compute the watch root as their nearest common literal ancestor.
    pub fn resolve<S: AsRef<str>>(patterns: &[S], base: &Path) -> Result<Self> {
        if patterns.is_empty() {
            return Err(WatchyError::ConfigError(
                "at least one watch pattern is required".to_string(),
            ));
        }

        let base = normalize(base);
        let mut resolved = Vec::with_capacity(patterns.len());
        let mut builder = GlobSetBuilder::new();

        for raw in patterns {
            let raw = raw.as_ref();
            let glob = absolutize(raw, &base);
            let compiled = GlobBuilder::new(&glob)
                .literal_separator(true)
                .build()
                .map_err(|source| WatchyError::InvalidPattern {
                    pattern: raw.to_string(),
                    source,
                })?;
            builder.add(compiled);

            let literal_dir = literal_dir(&glob);
            resolved.push(WatchPattern { glob, literal_dir });
        }

        let matcher = builder.build().map_err(|source| WatchyError::InvalidPattern {
            pattern: patterns
                .iter()
                .map(|p| p.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
            source,
        })?;

        let root = common_ancestor(resolved.iter().map(|p| p.literal_dir()));

        Ok(Self {
            patterns: resolved,
            matcher,
            root,
            base,
        })
    }

    pub fn patterns(&self) -> &[WatchPattern] {
        &self.patterns
    }

    /// Directory the native recursive watch is installed on.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory that reported paths are made relative to.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Returns true if the absolute `path` matches any configured pattern.
    pub fn matches(&self, path: &Path) -> bool {
        self.matcher.is_match(path)
    }

    /// Whether a directory could hold matching files, i.e. it lies on the
    /// path to, or below, some pattern's literal directory.
    pub fn could_contain(&self, dir: &Path) -> bool {
        self.patterns
            .iter()
            .any(|p| dir.starts_with(p.literal_dir()) || p.literal_dir().starts_with(dir))
    }

    /// Path as reported to the child: relative to `base` when possible.
    pub fn display_path(&self, path: &Path) -> String {
        relative_str(&self.base, path).unwrap_or_else(|| path.to_string_lossy().into_owned())
    }
}

/// Make `pattern` absolute against `base` and fold `.`/`..` segments.
fn absolutize(pattern: &str, base: &Path) -> String {
    let path = Path::new(pattern);
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    normalize(&joined).to_string_lossy().replace('\\', "/")
}

/// Lexical normalisation: no filesystem access, symlinks are not resolved.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn has_glob_meta(segment: &str) -> bool {
    segment.contains(GLOB_META)
}

/// Directory portion of an absolute glob that precedes the first glob segment.
///
/// `/p/src/**/*.js` → `/p/src`, `/p/src/a.js` → `/p/src`, `/p/*/x` → `/p`.
fn literal_dir(glob: &str) -> PathBuf {
    let path = Path::new(glob);
    let mut dir = PathBuf::new();
    let mut saw_glob = false;

    for component in path.components() {
        let segment = component.as_os_str().to_string_lossy();
        if has_glob_meta(&segment) {
            saw_glob = true;
            break;
        }
        dir.push(component.as_os_str());
    }

    if !saw_glob {
        // A literal file path: watch its parent directory.
        dir.pop();
    }
    if dir.as_os_str().is_empty() {
        dir.push(Component::RootDir.as_os_str());
    }
    dir
}

/// Nearest common ancestor of a set of absolute directories.
fn common_ancestor<'a>(mut dirs: impl Iterator<Item = &'a Path>) -> PathBuf {
    let Some(first) = dirs.next() else {
        return PathBuf::from("/");
    };
    let mut common: Vec<Component<'a>> = first.components().collect();

    for dir in dirs {
        let shared = common
            .iter()
            .zip(dir.components())
            .take_while(|(a, b)| *a == b)
            .count();
        common.truncate(shared);
    }

    let root: PathBuf = common.iter().map(|c| c.as_os_str()).collect();
    if root.as_os_str().is_empty() {
        PathBuf::from("/")
    } else {
        root
    }
}
