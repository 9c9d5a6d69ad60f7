//! Change scanner: walks the project, fingerprints allow-listed files and
//! diffs them against the scan state.
//!
//! A file counts as changed when its fingerprint differs from the stored one,
//! which includes files seen for the first time. Every fingerprint is written
//! back, so a second scan without edits reports nothing.

use crate::config::ScanConfig;
use crate::fingerprint::{fingerprint_file, Fingerprint, ScanState};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Project-relative paths (`/`-separated) that changed in one scan, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedFileSet(Vec<String>);

impl ChangedFileSet {
    pub fn new(paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut paths: Vec<String> = paths.into_iter().map(Into::into).collect();
        paths.sort();
        paths.dedup();
        Self(paths)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub changed: ChangedFileSet,
    /// Files that matched the allow-list but could not be read
    pub unreadable: Vec<String>,
    /// Number of allow-listed files seen this scan
    pub observed: usize,
}

pub struct Scanner {
    root: PathBuf,
    extensions: HashSet<String>,
    manifests: HashSet<String>,
    exclude_dirs: HashSet<String>,
}

impl Scanner {
    pub fn new(root: impl Into<PathBuf>, config: &ScanConfig) -> Self {
        Self {
            root: root.into(),
            extensions: config
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect(),
            manifests: config.manifests.iter().cloned().collect(),
            exclude_dirs: config.exclude_dirs.iter().cloned().collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scans the project and updates `state` with every observed fingerprint.
    pub fn scan(&self, state: &mut ScanState) -> ScanReport {
        self.scan_with(state, fingerprint_file)
    }

    /// [`Scanner::scan`] with a custom content reader.
    fn scan_with(&self, state: &mut ScanState, read: impl Fn(&Path) -> Fingerprint) -> ScanReport {
        let mut changed = Vec::new();
        let mut unreadable = Vec::new();
        let mut observed = 0usize;

        for (relative, absolute) in self.candidates() {
            observed += 1;
            let fingerprint = read(&absolute);
            if fingerprint == Fingerprint::Unreadable {
                unreadable.push(relative.clone());
            }

            if state.get(&relative) != Some(fingerprint.as_str()) {
                changed.push(relative.clone());
            }
            state.put(&relative, fingerprint.as_str());
        }

        tracing::debug!(
            root = %self.root.display(),
            observed,
            changed = changed.len(),
            unreadable = unreadable.len(),
            "Scan complete"
        );

        ScanReport {
            changed: ChangedFileSet::new(changed),
            unreadable,
            observed,
        }
    }

    /// Allow-listed files under the root as (relative, absolute) pairs, in walk order.
    pub fn candidates(&self) -> Vec<(String, PathBuf)> {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_excluded_dir(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::debug!(error = %err, "Skipping unwalkable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| self.is_tracked(entry.path()))
            .filter_map(|entry| {
                let relative = relative_path(&self.root, entry.path())?;
                Some((relative, entry.into_path()))
            })
            .collect()
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.exclude_dirs.contains(name))
    }

    fn is_tracked(&self, path: &Path) -> bool {
        let by_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.manifests.contains(name));
        let by_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.contains(ext));
        by_name || by_extension
    }
}

/// Root-relative path with `/` separators, or `None` if `path` is outside `root`.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
