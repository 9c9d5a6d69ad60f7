//! Session memory log: deduplicating appends of detected activity, plus the
//! extended-session heartbeat.
//!
//! Every write is a full read-modify-write of the memory document. Nothing
//! coordinates with other processes writing the same file; the last writer
//! wins.

use crate::config::SessionConfig;
use crate::error::Result;
use crate::memory::{minute_stamp, ActivityKind, ActivityRecord, MemoryDocument};
use crate::storage::DocumentStore;
use chrono::{DateTime, Local, Utc};

pub const EXTENDED_SESSION_NOTE: &str = "Extended development session";

#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    Appended(ActivityRecord),
    /// A record from the same minute already contains the description.
    Duplicate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Heartbeat {
    /// Thresholds not reached; session start unchanged.
    NotDue,
    /// Thresholds reached; session start was reset to now.
    Emitted(AppendOutcome),
}

pub struct SessionLog<S> {
    store: S,
    session: SessionConfig,
}

impl<S: DocumentStore<MemoryDocument>> SessionLog<S> {
    pub fn new(store: S, session: SessionConfig) -> Self {
        Self { store, session }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Appends `description` stamped with the current local time.
    pub fn append(&self, description: &str, kind: ActivityKind) -> Result<AppendOutcome> {
        self.append_at(Local::now(), description, kind)
    }

    /// Appends `description` unless a record from the same minute already contains it.
    pub fn append_at(
        &self,
        at: DateTime<Local>,
        description: &str,
        kind: ActivityKind,
    ) -> Result<AppendOutcome> {
        let mut memory = self.store.load().value;
        let stamp = minute_stamp(at);

        if memory.has_duplicate_in_minute(&stamp, description) {
            tracing::debug!(%description, %stamp, "Skipping duplicate activity");
            return Ok(AppendOutcome::Duplicate);
        }

        let record = ActivityRecord::new(at, description, kind);
        memory.push(record.clone());
        self.store.save(&memory)?;

        tracing::info!(description = %record.notes, kind = %record.kind, "Activity logged");
        Ok(AppendOutcome::Appended(record))
    }

    /// Emits an extended-session record once the session has run past the
    /// heartbeat threshold with enough files tracked, then restarts the session.
    pub fn heartbeat(
        &self,
        now: DateTime<Local>,
        session_start: &mut DateTime<Utc>,
        observed_file_count: usize,
    ) -> Result<Heartbeat> {
        let now_utc = now.with_timezone(&Utc);
        let elapsed = now_utc.signed_duration_since(*session_start);
        let threshold = chrono::Duration::from_std(self.session.heartbeat_after())
            .unwrap_or(chrono::Duration::MAX);

        if elapsed <= threshold || observed_file_count <= self.session.min_tracked_files {
            return Ok(Heartbeat::NotDue);
        }

        let outcome = self.append_at(now, EXTENDED_SESSION_NOTE, ActivityKind::Session)?;
        *session_start = now_utc;
        tracing::debug!(
            elapsed_minutes = elapsed.num_minutes(),
            files = observed_file_count,
            "Session heartbeat emitted; session restarted"
        );
        Ok(Heartbeat::Emitted(outcome))
    }
}
