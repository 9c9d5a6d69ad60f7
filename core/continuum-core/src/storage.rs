//! Storage paths and document persistence.
//!
//! Two documents are persisted, both as pretty-printed JSON that is fully
//! overwritten on every save: the scan state and the memory document.
//! Components never open those files themselves; they receive a
//! [`DocumentStore`] so tests can hand them an [`InMemoryStore`] instead.
//!
//! ## Design Principles
//!
//! - **Graceful degradation**: Missing/corrupt files load as defaults, and the
//!   [`LoadOutcome`] says which of those happened.
//! - **Atomic writes**: temp file + rename, so a crash never leaves half a document.
//! - **Testable**: `StorageConfig::with_root()` injects temp directories.

use crate::config::{continuum_dir, FilesConfig};
use crate::error::{ContinuumError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// ═══════════════════════════════════════════════════════════════════════════════
// Paths
// ═══════════════════════════════════════════════════════════════════════════════

/// Central configuration for Continuum storage paths.
///
/// The memory and state documents live in the project root so other tools
/// can find them next to the code. Everything process-related (sockets,
/// logs, config) lives under `~/.continuum/`.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
    project_root: PathBuf,
    files: FilesConfig,
}

impl StorageConfig {
    /// Storage for `project_root` with the data root at `~/.continuum`.
    pub fn new(project_root: PathBuf, files: FilesConfig) -> Result<Self> {
        Ok(Self::with_root(continuum_dir()?, project_root, files))
    }

    /// Used for testing with temp directories.
    pub fn with_root(root: PathBuf, project_root: PathBuf, files: FilesConfig) -> Self {
        Self {
            root,
            project_root,
            files,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Path to the memory document (default `<project>/.claude-memory.json`).
    pub fn memory_file(&self) -> PathBuf {
        self.project_root.join(&self.files.memory_file)
    }

    /// Path to the scan state (default `<project>/.continuum-state.json`).
    pub fn state_file(&self) -> PathBuf {
        self.project_root.join(&self.files.state_file)
    }

    pub fn sockets_dir(&self) -> PathBuf {
        self.root.join("sockets")
    }

    /// Daemon socket for this project.
    /// Example: ~/.continuum/sockets/3f2a...c1.sock
    pub fn socket_path(&self) -> PathBuf {
        self.sockets_dir()
            .join(format!("{}.sock", project_key(&self.project_root)))
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}

/// Stable key for a project root: MD5 of the normalized path.
///
/// Socket paths have a small length limit, so the full path cannot be embedded.
pub fn project_key(project_root: &Path) -> String {
    let normalized = normalize_path(&project_root.to_string_lossy());
    format!("{:x}", md5::compute(normalized))
}

/// Strips trailing slashes except for root "/".
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Documents
// ═══════════════════════════════════════════════════════════════════════════════

/// A persisted JSON document.
pub trait StoredDocument: Serialize + DeserializeOwned + Default {
    /// Human-readable name used in logs and error contexts.
    const LABEL: &'static str;

    /// Rejects parsed content this build cannot interpret (e.g. a future version).
    fn check_supported(&self) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// How a document came out of [`DocumentStore::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Parsed from existing content.
    Loaded,
    /// Nothing stored yet; the value is a fresh default.
    Missing,
    /// Stored content was unreadable or unsupported; the value is a fresh default.
    Recovered { reason: String },
}

#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub value: T,
    pub outcome: LoadOutcome,
}

impl<T: StoredDocument> Loaded<T> {
    fn fresh(outcome: LoadOutcome) -> Self {
        Self {
            value: T::default(),
            outcome,
        }
    }

    fn decode(raw: &str) -> Self {
        match serde_json::from_str::<T>(raw) {
            Ok(value) => match value.check_supported() {
                Ok(()) => Self {
                    value,
                    outcome: LoadOutcome::Loaded,
                },
                Err(reason) => {
                    tracing::warn!(document = T::LABEL, %reason, "Unsupported document; starting fresh");
                    Self::fresh(LoadOutcome::Recovered { reason })
                }
            },
            Err(err) => {
                tracing::warn!(document = T::LABEL, error = %err, "Corrupt document; starting fresh");
                Self::fresh(LoadOutcome::Recovered {
                    reason: err.to_string(),
                })
            }
        }
    }
}

/// Load/save contract for a single persisted document.
///
/// `load` never fails. `save` replaces the whole document.
pub trait DocumentStore<T: StoredDocument> {
    fn load(&self) -> Loaded<T>;
    fn save(&self, value: &T) -> Result<()>;
    fn exists(&self) -> bool;
}

impl<T: StoredDocument, S: DocumentStore<T> + ?Sized> DocumentStore<T> for &S {
    fn load(&self) -> Loaded<T> {
        (**self).load()
    }

    fn save(&self, value: &T) -> Result<()> {
        (**self).save(value)
    }

    fn exists(&self) -> bool {
        (**self).exists()
    }
}

/// A document stored as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: StoredDocument> DocumentStore<T> for JsonFileStore<T> {
    fn load(&self) -> Loaded<T> {
        match fs_err::read_to_string(&self.path) {
            Ok(content) => Loaded::decode(&content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Loaded::fresh(LoadOutcome::Missing)
            }
            Err(err) => {
                tracing::warn!(document = T::LABEL, error = %err, "Unreadable document; starting fresh");
                Loaded::fresh(LoadOutcome::Recovered {
                    reason: err.to_string(),
                })
            }
        }
    }

    fn save(&self, value: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(value).map_err(|e| ContinuumError::Json {
            context: format!("Failed to serialize {}", T::LABEL),
            source: e,
        })?;
        write_atomically(&self.path, content.as_bytes())
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// Writes to a temp file in the same directory, then renames over `path`.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| ContinuumError::Io {
        context: format!("Failed to create temp file in {}", dir.display()),
        source: e,
    })?;

    tmp.write_all(bytes).map_err(|e| ContinuumError::Io {
        context: "Failed to write temp file".to_string(),
        source: e,
    })?;

    tmp.flush().map_err(|e| ContinuumError::Io {
        context: "Failed to flush temp file".to_string(),
        source: e,
    })?;

    tmp.persist(path).map_err(|e| ContinuumError::Io {
        context: format!("Failed to persist {}", path.display()),
        source: e.error,
    })?;

    Ok(())
}

/// In-process stand-in for [`JsonFileStore`].
///
/// Holds the serialized JSON rather than the value so loads go through the
/// same decode path as files (including corrupt-content recovery).
#[derive(Debug)]
pub struct InMemoryStore<T> {
    content: Mutex<Option<String>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> InMemoryStore<T> {
    pub fn new() -> Self {
        Self {
            content: Mutex::new(None),
            _marker: PhantomData,
        }
    }

    /// A store pre-seeded with raw content, valid or not.
    pub fn with_content(raw: impl Into<String>) -> Self {
        Self {
            content: Mutex::new(Some(raw.into())),
            _marker: PhantomData,
        }
    }

    /// The raw JSON last saved, if any.
    pub fn raw(&self) -> Option<String> {
        self.content
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl<T: StoredDocument> DocumentStore<T> for InMemoryStore<T> {
    fn load(&self) -> Loaded<T> {
        match self.raw() {
            Some(raw) => Loaded::decode(&raw),
            None => Loaded::fresh(LoadOutcome::Missing),
        }
    }

    fn save(&self, value: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(value).map_err(|e| ContinuumError::Json {
            context: format!("Failed to serialize {}", T::LABEL),
            source: e,
        })?;
        *self
            .content
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(content);
        Ok(())
    }

    fn exists(&self) -> bool {
        self.raw().is_some()
    }
}
