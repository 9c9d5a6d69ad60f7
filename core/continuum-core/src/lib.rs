//! # continuum-core
//!
//! Change detection, activity classification and project memory for
//! Continuum, shared by the CLI and the memory daemon.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency.
//! - **Not thread-safe**: Clients provide their own synchronization (`Mutex`).
//! - **Graceful degradation**: Missing or corrupt files load as empty documents,
//!   unreadable source files fingerprint as empty.
//! - **Injectable storage**: Components take a [`DocumentStore`], never a path.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use continuum_core::{Config, FileTracker, StorageConfig};
//!
//! let config = Config::load(None)?;
//! let storage = StorageConfig::new(project_root, config.files.clone())?;
//! let report = FileTracker::from_config(&config, &storage).tick()?;
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod memory;
pub mod patterns;
pub mod scanner;
pub mod session_log;
pub mod storage;
pub mod tracker;

pub use classifier::{classify, Activity, ChangeBuckets, Rule, RULES};
pub use config::{Config, FilesConfig, ScanConfig, SessionConfig};
pub use error::{ContinuumError, Result};
pub use fingerprint::{fingerprint_file, Fingerprint, ScanState};
pub use memory::{ActivityKind, ActivityRecord, MemoryDocument, MemorySummary};
pub use scanner::{ChangedFileSet, ScanReport, Scanner};
pub use session_log::{AppendOutcome, Heartbeat, SessionLog};
pub use storage::{
    DocumentStore, InMemoryStore, JsonFileStore, LoadOutcome, Loaded, StorageConfig,
    StoredDocument,
};
pub use tracker::{FileTracker, TickReport, Tracker};
