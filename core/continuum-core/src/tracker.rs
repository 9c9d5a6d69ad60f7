//! One scan tick: scan → classify → log → heartbeat → persist.
//!
//! The tracker owns the scan state store; the memory document is only
//! touched through the [`SessionLog`].

use crate::classifier::{classify, Activity};
use crate::config::Config;
use crate::error::Result;
use crate::fingerprint::ScanState;
use crate::memory::MemoryDocument;
use crate::scanner::{ScanReport, Scanner};
use crate::session_log::{AppendOutcome, Heartbeat, SessionLog};
use crate::storage::{DocumentStore, JsonFileStore, LoadOutcome, StorageConfig};
use chrono::{DateTime, Local, Utc};

/// What happened during one tick.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub scan: ScanReport,
    /// How the scan state was loaded at the start of the tick
    pub state_outcome: LoadOutcome,
    /// The classified activity and whether it was stored
    pub activity: Option<(Activity, AppendOutcome)>,
    pub heartbeat: Heartbeat,
}

impl TickReport {
    /// The activity record written this tick, if any.
    pub fn logged_activity(&self) -> Option<&str> {
        match &self.activity {
            Some((_, AppendOutcome::Appended(record))) => Some(record.notes.as_str()),
            _ => None,
        }
    }
}

pub struct Tracker<S, M> {
    scanner: Scanner,
    state_store: S,
    log: SessionLog<M>,
}

/// Tracker backed by the project's JSON files.
pub type FileTracker = Tracker<JsonFileStore<ScanState>, JsonFileStore<MemoryDocument>>;

impl FileTracker {
    pub fn from_config(config: &Config, storage: &StorageConfig) -> Self {
        Tracker::new(
            Scanner::new(storage.project_root(), &config.scan),
            JsonFileStore::new(storage.state_file()),
            SessionLog::new(
                JsonFileStore::new(storage.memory_file()),
                config.session.clone(),
            ),
        )
    }
}

impl<S, M> Tracker<S, M>
where
    S: DocumentStore<ScanState>,
    M: DocumentStore<MemoryDocument>,
{
    pub fn new(scanner: Scanner, state_store: S, log: SessionLog<M>) -> Self {
        Self {
            scanner,
            state_store,
            log,
        }
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    pub fn state_store(&self) -> &S {
        &self.state_store
    }

    pub fn log(&self) -> &SessionLog<M> {
        &self.log
    }

    pub fn tick(&self) -> Result<TickReport> {
        self.tick_at(Local::now())
    }

    pub fn tick_at(&self, now: DateTime<Local>) -> Result<TickReport> {
        let loaded = self.state_store.load();
        let mut state = loaded.value;
        if loaded.outcome != LoadOutcome::Loaded {
            state.session_start = now.with_timezone(&Utc);
        }

        let scan = self.scanner.scan(&mut state);

        let activity = match classify(scan.changed.iter()) {
            Some(activity) => {
                let outcome = self
                    .log
                    .append_at(now, &activity.description, activity.kind.clone())?;
                Some((activity, outcome))
            }
            None => None,
        };

        let tracked = state.tracked_files();
        let heartbeat = self.log.heartbeat(now, &mut state.session_start, tracked)?;

        state.last_scan = Some(now.with_timezone(&Utc));
        self.state_store.save(&state)?;

        tracing::debug!(
            changed = scan.changed.len(),
            tracked,
            activity = ?activity.as_ref().map(|(a, _)| a.rule),
            "Tick complete"
        );

        Ok(TickReport {
            scan,
            state_outcome: loaded.outcome,
            activity,
            heartbeat,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ScanConfig, SessionConfig};
    use crate::memory::ActivityKind;
    use crate::storage::InMemoryStore;
    use chrono::TimeZone;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    type MemTracker = Tracker<InMemoryStore<ScanState>, InMemoryStore<MemoryDocument>>;

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 10, 17, hour, minute, 0)
            .single()
            .expect("unambiguous local time")
    }

    fn tracker(root: &Path) -> MemTracker {
        Tracker::new(
            Scanner::new(root, &ScanConfig::default()),
            InMemoryStore::new(),
            SessionLog::new(InMemoryStore::new(), SessionConfig::default()),
        )
    }

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, content).expect("write file");
    }

    fn history(tracker: &MemTracker) -> Vec<String> {
        tracker
            .log()
            .store()
            .load()
            .value
            .session_history
            .into_iter()
            .map(|r| r.notes)
            .collect()
    }

    #[test]
    fn tick_logs_classified_activity() {
        let tmp = TempDir::new().expect("temp dir");
        write(tmp.path(), "contracts/Token.sol", "contract Token {}");
        write(tmp.path(), "test/Token.test.js", "it('works')");
        let tracker = tracker(tmp.path());

        let report = tracker.tick_at(at(9, 0)).expect("tick");

        assert_eq!(report.state_outcome, LoadOutcome::Missing);
        assert_eq!(
            report.logged_activity(),
            Some("Smart contract development with testing")
        );
        assert_eq!(history(&tracker).len(), 1);
    }

    #[test]
    fn second_tick_without_edits_logs_nothing() {
        let tmp = TempDir::new().expect("temp dir");
        write(tmp.path(), "a.py", "1");
        write(tmp.path(), "b.py", "2");
        let tracker = tracker(tmp.path());

        tracker.tick_at(at(9, 0)).expect("first tick");
        let second = tracker.tick_at(at(9, 5)).expect("second tick");

        assert_eq!(second.state_outcome, LoadOutcome::Loaded);
        assert!(second.scan.changed.is_empty());
        assert!(second.activity.is_none());
        assert_eq!(history(&tracker), vec!["Python development".to_string()]);
    }

    #[test]
    fn edits_within_same_minute_are_deduplicated() {
        let tmp = TempDir::new().expect("temp dir");
        write(tmp.path(), "a.py", "1");
        write(tmp.path(), "b.py", "1");
        let tracker = tracker(tmp.path());
        tracker.tick_at(at(9, 0)).expect("first tick");

        write(tmp.path(), "a.py", "2");
        write(tmp.path(), "b.py", "2");
        let report = tracker.tick_at(at(9, 0)).expect("second tick");

        assert!(matches!(report.activity, Some((_, AppendOutcome::Duplicate))));
        assert_eq!(history(&tracker).len(), 1);
    }

    #[test]
    fn tick_persists_last_scan_and_fingerprints() {
        let tmp = TempDir::new().expect("temp dir");
        write(tmp.path(), "main.go", "package main");
        let tracker = tracker(tmp.path());

        tracker.tick_at(at(9, 0)).expect("tick");

        let state = tracker.state_store().load().value;
        assert_eq!(state.last_scan, Some(at(9, 0).with_timezone(&Utc)));
        assert_eq!(state.session_start, at(9, 0).with_timezone(&Utc));
        assert!(state.get("main.go").is_some());
    }

    #[test]
    fn long_session_with_many_files_gets_heartbeat() {
        let tmp = TempDir::new().expect("temp dir");
        for i in 0..11 {
            write(tmp.path(), &format!("src/m{}.rs", i), "fn f() {}");
        }
        let tracker = tracker(tmp.path());
        tracker.tick_at(at(9, 0)).expect("first tick");

        let report = tracker.tick_at(at(9, 45)).expect("later tick");

        match report.heartbeat {
            Heartbeat::Emitted(AppendOutcome::Appended(record)) => {
                assert_eq!(record.kind, ActivityKind::Session)
            }
            other => panic!("expected heartbeat, got {:?}", other),
        }
        let state = tracker.state_store().load().value;
        assert_eq!(state.session_start, at(9, 45).with_timezone(&Utc));
    }
}
