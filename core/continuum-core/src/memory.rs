//! The project memory document and its read/write operations.
//!
//! One JSON document per project holds the current phase, pending tasks, a
//! chronological activity history and free-form decision notes. Both the
//! tracker and the daemon mutate it with a full read-modify-write.
//!
//! # File Format
//!
//! ```json
//! {
//!   "current_phase": "Auth rewrite",
//!   "next_tasks": ["write docs"],
//!   "session_history": [
//!     { "date": "2026-10-17 09:15", "notes": "Python development", "type": "development" }
//!   ],
//!   "decisions": []
//! }
//! ```
//!
//! Unknown fields (top-level and per record) are carried through saves so
//! other tools writing to the same file do not lose data.

use crate::storage::StoredDocument;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Minute-precision timestamp format used for record dates.
pub const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Records shown by [`MemoryDocument::summary`].
pub const SUMMARY_STEPS: usize = 3;
/// Records included in [`MemoryDocument::context`].
pub const CONTEXT_STEPS: usize = 2;
/// Default page size for [`MemoryDocument::history`].
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Category of an activity record.
///
/// Serialized as a plain string. Strings not listed here (written by other
/// tools) are kept verbatim in [`ActivityKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityKind {
    Development,
    Testing,
    Config,
    Session,
    Note,
    Completion,
    /// Legacy kind for automatically detected activity
    Auto,
    Other(String),
}

impl ActivityKind {
    pub fn as_str(&self) -> &str {
        match self {
            ActivityKind::Development => "development",
            ActivityKind::Testing => "testing",
            ActivityKind::Config => "config",
            ActivityKind::Session => "session",
            ActivityKind::Note => "note",
            ActivityKind::Completion => "completion",
            ActivityKind::Auto => "auto",
            ActivityKind::Other(value) => value,
        }
    }

    /// Kinds produced by file-change detection (as opposed to notes and completions).
    pub fn is_automatic(&self) -> bool {
        matches!(
            self,
            ActivityKind::Auto
                | ActivityKind::Development
                | ActivityKind::Testing
                | ActivityKind::Config
        )
    }
}

impl From<String> for ActivityKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "development" => ActivityKind::Development,
            "testing" => ActivityKind::Testing,
            "config" => ActivityKind::Config,
            "session" => ActivityKind::Session,
            "note" => ActivityKind::Note,
            "completion" => ActivityKind::Completion,
            "auto" => ActivityKind::Auto,
            _ => ActivityKind::Other(value),
        }
    }
}

impl From<&str> for ActivityKind {
    fn from(value: &str) -> Self {
        ActivityKind::from(value.to_string())
    }
}

impl From<ActivityKind> for String {
    fn from(kind: ActivityKind) -> String {
        match kind {
            ActivityKind::Other(value) => value,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_kind() -> ActivityKind {
    ActivityKind::Note
}

/// One immutable entry in the session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Local time, `YYYY-MM-DD HH:MM`
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub notes: String,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: ActivityKind,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ActivityRecord {
    pub fn new(at: DateTime<Local>, notes: impl Into<String>, kind: ActivityKind) -> Self {
        Self {
            date: minute_stamp(at),
            notes: notes.into(),
            kind,
            extra: Map::new(),
        }
    }
}

/// Formats `at` with [`MINUTE_FORMAT`].
pub fn minute_stamp(at: DateTime<Local>) -> String {
    at.format(MINUTE_FORMAT).to_string()
}

/// The persisted project memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryDocument {
    #[serde(default)]
    pub current_phase: String,
    #[serde(default)]
    pub next_tasks: Vec<String>,
    /// Insertion order is chronological order
    #[serde(default)]
    pub session_history: Vec<ActivityRecord>,
    #[serde(default)]
    pub decisions: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoredDocument for MemoryDocument {
    const LABEL: &'static str = "memory document";
}

/// Read view used by the summary endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemorySummary {
    pub current_phase: String,
    pub last_steps: Vec<ActivityRecord>,
    pub next_tasks: Vec<String>,
}

impl MemoryDocument {
    pub fn set_phase(&mut self, phase: impl Into<String>) {
        self.current_phase = phase.into();
    }

    pub fn add_task(&mut self, task: impl Into<String>) {
        self.next_tasks.push(task.into());
    }

    /// Appends a record as-is (no deduplication).
    pub fn push(&mut self, record: ActivityRecord) {
        self.session_history.push(record);
    }

    /// Appends a free-form note (no deduplication) and returns it.
    pub fn log_note(
        &mut self,
        at: DateTime<Local>,
        notes: impl Into<String>,
        kind: ActivityKind,
    ) -> ActivityRecord {
        let record = ActivityRecord::new(at, notes, kind);
        self.push(record.clone());
        record
    }

    /// Records `Completed: <task>` and drops the first exact match from the
    /// pending list. Returns whether a pending task was removed; completing an
    /// unknown task still records the completion.
    pub fn complete_task(&mut self, at: DateTime<Local>, task: &str) -> bool {
        self.push(ActivityRecord::new(
            at,
            format!("Completed: {}", task),
            ActivityKind::Completion,
        ));

        match self.next_tasks.iter().position(|t| t == task) {
            Some(index) => {
                self.next_tasks.remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether a record from the same minute already mentions `description`.
    pub fn has_duplicate_in_minute(&self, stamp: &str, description: &str) -> bool {
        self.session_history
            .iter()
            .filter(|record| record.date.starts_with(stamp))
            .any(|record| record.notes.contains(description))
    }

    /// History sorted by date, newest first. Records sharing a date keep insertion order.
    pub fn newest_first(&self) -> Vec<&ActivityRecord> {
        let mut records: Vec<&ActivityRecord> = self.session_history.iter().collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        records
    }

    pub fn summary(&self) -> MemorySummary {
        MemorySummary {
            current_phase: self.current_phase.clone(),
            last_steps: self
                .newest_first()
                .into_iter()
                .take(SUMMARY_STEPS)
                .cloned()
                .collect(),
            next_tasks: self.next_tasks.clone(),
        }
    }

    /// Condensed plain-text context for feeding to an agent.
    pub fn context(&self) -> String {
        let mut context = String::from("PROJECT CONTEXT:\n");
        context.push_str(&format!("Phase: {}\n", self.current_phase));
        context.push_str(&format!("Last {} activities:\n", CONTEXT_STEPS));
        for record in self.newest_first().into_iter().take(CONTEXT_STEPS) {
            context.push_str(&format!("- {}\n", record.notes));
        }
        context.push_str("Next tasks:\n");
        for task in &self.next_tasks {
            context.push_str(&format!("- {}\n", task));
        }
        context
    }

    /// History filtered by kind, newest first, at most `limit` records.
    pub fn history(&self, kind: Option<&ActivityKind>, limit: usize) -> Vec<ActivityRecord> {
        self.newest_first()
            .into_iter()
            .filter(|record| kind.map_or(true, |k| &record.kind == k))
            .take(limit)
            .cloned()
            .collect()
    }

    /// The last `count` automatically detected activities, oldest first.
    pub fn recent_auto_activities(&self, count: usize) -> Vec<&ActivityRecord> {
        let automatic: Vec<&ActivityRecord> = self
            .session_history
            .iter()
            .filter(|record| record.kind.is_automatic())
            .collect();
        let skip = automatic.len().saturating_sub(count);
        automatic.into_iter().skip(skip).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{DocumentStore, InMemoryStore, JsonFileStore, LoadOutcome};
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 10, 17, hour, minute, 0)
            .single()
            .expect("unambiguous local time")
    }

    fn record(date: &str, notes: &str, kind: &str) -> ActivityRecord {
        ActivityRecord {
            date: date.to_string(),
            notes: notes.to_string(),
            kind: ActivityKind::from(kind),
            extra: Map::new(),
        }
    }

    #[test]
    fn record_date_has_minute_precision() {
        let record = ActivityRecord::new(at(9, 5), "x", ActivityKind::Note);
        assert_eq!(record.date, "2026-10-17 09:05");
    }

    #[test]
    fn kinds_round_trip_as_strings() {
        let json = serde_json::to_string(&ActivityKind::Completion).expect("serialize");
        assert_eq!(json, "\"completion\"");

        let custom: ActivityKind = serde_json::from_str("\"deploy\"").expect("deserialize");
        assert_eq!(custom, ActivityKind::Other("deploy".to_string()));
        assert_eq!(serde_json::to_string(&custom).expect("serialize"), "\"deploy\"");
    }

    #[test]
    fn complete_task_removes_and_records() {
        let mut doc = MemoryDocument::default();
        doc.add_task("write docs");

        let removed = doc.complete_task(at(10, 0), "write docs");

        assert!(removed);
        assert!(doc.next_tasks.is_empty());
        assert_eq!(doc.session_history.len(), 1);
        let record = &doc.session_history[0];
        assert_eq!(record.kind, ActivityKind::Completion);
        assert_eq!(record.notes, "Completed: write docs");
    }

    #[test]
    fn complete_unknown_task_is_not_an_error() {
        let mut doc = MemoryDocument::default();
        doc.add_task("ship it");

        let removed = doc.complete_task(at(10, 0), "write docs");

        assert!(!removed);
        assert_eq!(doc.next_tasks, vec!["ship it".to_string()]);
        assert_eq!(doc.session_history.len(), 1);
    }

    #[test]
    fn complete_task_removes_only_first_match() {
        let mut doc = MemoryDocument::default();
        doc.add_task("review");
        doc.add_task("review");
        doc.complete_task(at(10, 0), "review");
        assert_eq!(doc.next_tasks, vec!["review".to_string()]);
    }

    #[test]
    fn summary_takes_three_newest() {
        let mut doc = MemoryDocument::default();
        doc.set_phase("MVP");
        doc.push(record("2026-10-17 09:00", "first", "note"));
        doc.push(record("2026-10-17 11:00", "third", "note"));
        doc.push(record("2026-10-17 10:00", "second", "note"));
        doc.push(record("2026-10-16 23:59", "zeroth", "note"));

        let summary = doc.summary();
        let notes: Vec<&str> = summary.last_steps.iter().map(|r| r.notes.as_str()).collect();
        assert_eq!(summary.current_phase, "MVP");
        assert_eq!(notes, vec!["third", "second", "first"]);
    }

    #[test]
    fn context_blob_layout() {
        let mut doc = MemoryDocument::default();
        doc.set_phase("Beta");
        doc.push(record("2026-10-17 09:00", "Python development", "development"));
        doc.push(record("2026-10-17 09:30", "Fixed login", "note"));
        doc.push(record("2026-10-17 08:00", "Old", "note"));
        doc.add_task("write docs");

        assert_eq!(
            doc.context(),
            "PROJECT CONTEXT:\n\
             Phase: Beta\n\
             Last 2 activities:\n\
             - Fixed login\n\
             - Python development\n\
             Next tasks:\n\
             - write docs\n"
        );
    }

    #[test]
    fn history_filters_and_limits() {
        let mut doc = MemoryDocument::default();
        for minute in 0..5 {
            doc.push(record(&format!("2026-10-17 09:0{}", minute), "note", "note"));
        }
        doc.push(record("2026-10-17 09:03", "done", "completion"));

        let notes = doc.history(Some(&ActivityKind::Note), 2);
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].date, "2026-10-17 09:04");
        assert_eq!(notes[1].date, "2026-10-17 09:03");

        let completions = doc.history(Some(&ActivityKind::Completion), 10);
        assert_eq!(completions.len(), 1);

        assert_eq!(doc.history(None, DEFAULT_HISTORY_LIMIT).len(), 6);
    }

    #[test]
    fn equal_dates_keep_insertion_order() {
        let mut doc = MemoryDocument::default();
        doc.push(record("2026-10-17 09:00", "a", "note"));
        doc.push(record("2026-10-17 09:00", "b", "note"));
        let notes: Vec<String> = doc.history(None, 10).into_iter().map(|r| r.notes).collect();
        assert_eq!(notes, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn recent_auto_activities_skip_notes() {
        let mut doc = MemoryDocument::default();
        for i in 0..6 {
            doc.push(record("2026-10-17 09:00", &format!("dev {}", i), "development"));
        }
        doc.push(record("2026-10-17 09:01", "manual", "note"));
        doc.push(record("2026-10-17 09:02", "legacy", "auto"));

        let recent: Vec<&str> = doc
            .recent_auto_activities(5)
            .into_iter()
            .map(|r| r.notes.as_str())
            .collect();
        assert_eq!(recent, vec!["dev 2", "dev 3", "dev 4", "dev 5", "legacy"]);
    }

    #[test]
    fn duplicate_check_is_scoped_to_minute() {
        let mut doc = MemoryDocument::default();
        doc.push(record("2026-10-17 09:00", "Python development", "development"));

        assert!(doc.has_duplicate_in_minute("2026-10-17 09:00", "Python development"));
        assert!(doc.has_duplicate_in_minute("2026-10-17 09:00", "Python"));
        assert!(!doc.has_duplicate_in_minute("2026-10-17 09:01", "Python development"));
    }

    #[test]
    fn save_load_round_trip_preserves_everything() {
        let raw = r#"{
  "current_phase": "Launch",
  "next_tasks": ["a", "b"],
  "session_history": [
    { "date": "2026-10-17 09:00", "notes": "second", "type": "deploy", "author": "ci" },
    { "date": "2026-10-17 08:00", "notes": "first", "type": "note" }
  ],
  "decisions": [{ "what": "use md5", "why": "fast" }, "plain string"],
  "archived": true
}"#;
        let original = InMemoryStore::<MemoryDocument>::with_content(raw).load();
        assert_eq!(original.outcome, LoadOutcome::Loaded);

        let tmp = tempfile::TempDir::new().expect("temp dir");
        let store = JsonFileStore::<MemoryDocument>::new(tmp.path().join(".claude-memory.json"));
        store.save(&original.value).expect("save");
        let reloaded = store.load();

        assert_eq!(reloaded.value, original.value);
        let history: Vec<&str> = reloaded
            .value
            .session_history
            .iter()
            .map(|r| r.notes.as_str())
            .collect();
        assert_eq!(history, vec!["second", "first"]);
        assert_eq!(
            reloaded.value.session_history[0].extra.get("author"),
            Some(&Value::String("ci".to_string()))
        );
        assert_eq!(reloaded.value.extra.get("archived"), Some(&Value::Bool(true)));
    }

    #[test]
    fn corrupt_memory_loads_empty() {
        let loaded = InMemoryStore::<MemoryDocument>::with_content("[1, 2").load();
        assert!(matches!(loaded.outcome, LoadOutcome::Recovered { .. }));
        assert_eq!(loaded.value, MemoryDocument::default());
    }
}
