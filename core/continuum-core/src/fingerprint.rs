//! Content fingerprints and the persisted scan state.
//!
//! The scan state maps project-relative paths to the MD5 of their content
//! at the last scan. Entries for deleted files are kept; they cost a few
//! bytes each and reappear harmlessly if the file comes back.

use crate::storage::StoredDocument;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Current version of the scan state format.
pub const SCAN_STATE_VERSION: u32 = 1;

/// Fingerprint stored for files that could not be read.
pub const UNREADABLE_FINGERPRINT: &str = "";

/// Result of fingerprinting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fingerprint {
    /// Lowercase hex MD5 of the file bytes.
    Digest(String),
    /// The file could not be read; stored as [`UNREADABLE_FINGERPRINT`].
    Unreadable,
}

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        match self {
            Fingerprint::Digest(digest) => digest,
            Fingerprint::Unreadable => UNREADABLE_FINGERPRINT,
        }
    }

    pub fn of_bytes(bytes: &[u8]) -> Self {
        Fingerprint::Digest(format!("{:x}", md5::compute(bytes)))
    }
}

/// Fingerprints a file's content. Never fails: read errors become [`Fingerprint::Unreadable`].
pub fn fingerprint_file(path: &Path) -> Fingerprint {
    match fs_err::read(path) {
        Ok(bytes) => Fingerprint::of_bytes(&bytes),
        Err(err) => {
            tracing::debug!(error = %err, "File unreadable; using empty fingerprint");
            Fingerprint::Unreadable
        }
    }
}

/// Scan state persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanState {
    /// Format version for forward compatibility
    #[serde(default = "current_version")]
    pub version: u32,
    /// Last-known fingerprint by project-relative path
    #[serde(default)]
    pub file_hashes: BTreeMap<String, String>,
    /// When the last scan finished
    #[serde(default)]
    pub last_scan: Option<DateTime<Utc>>,
    /// Start of the current working session, reset by the extended-session heartbeat
    #[serde(default = "Utc::now")]
    pub session_start: DateTime<Utc>,
}

fn current_version() -> u32 {
    SCAN_STATE_VERSION
}

impl Default for ScanState {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl StoredDocument for ScanState {
    const LABEL: &'static str = "scan state";

    fn check_supported(&self) -> Result<(), String> {
        if self.version > SCAN_STATE_VERSION {
            return Err(format!(
                "scan state version {} is newer than supported version {}",
                self.version, SCAN_STATE_VERSION
            ));
        }
        Ok(())
    }
}

impl ScanState {
    /// Empty state whose session starts at `session_start`.
    pub fn new(session_start: DateTime<Utc>) -> Self {
        Self {
            version: SCAN_STATE_VERSION,
            file_hashes: BTreeMap::new(),
            last_scan: None,
            session_start,
        }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.file_hashes.get(path).map(String::as_str)
    }

    /// Records `fingerprint` for `path`, returning the previous value.
    pub fn put(&mut self, path: &str, fingerprint: &str) -> Option<String> {
        self.file_hashes
            .insert(path.to_string(), fingerprint.to_string())
    }

    pub fn snapshot(&self) -> &BTreeMap<String, String> {
        &self.file_hashes
    }

    /// Number of distinct files ever observed.
    pub fn tracked_files(&self) -> usize {
        self.file_hashes.len()
    }
}
