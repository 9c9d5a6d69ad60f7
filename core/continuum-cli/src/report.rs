//! Plain-text rendering for terminal output.

use continuum_core::{ActivityRecord, AppendOutcome, Heartbeat, MemoryDocument, TickReport};
use std::fmt::Write;

/// Automatic activities shown by `summary`.
pub const SUMMARY_ACTIVITIES: usize = 5;

pub fn print_tick(tick: &TickReport) {
    print!("{}", render_tick(tick));
}

/// One line per record the tick wrote. Duplicates and quiet ticks print nothing.
pub fn render_tick(tick: &TickReport) -> String {
    let mut out = String::new();
    if let Some(notes) = tick.logged_activity() {
        let _ = writeln!(out, "Auto-logged: {}", notes);
    }
    if let Heartbeat::Emitted(AppendOutcome::Appended(record)) = &tick.heartbeat {
        let _ = writeln!(out, "Auto-logged: {}", record.notes);
    }
    out
}

pub fn render_session_summary(memory: &MemoryDocument) -> String {
    let recent = memory.recent_auto_activities(SUMMARY_ACTIVITIES);
    if recent.is_empty() {
        return "No automatic activities detected this session".to_string();
    }
    let mut out = String::from("Recent automated tracking:\n");
    for record in recent {
        let _ = writeln!(out, "  - {} ({})", record.notes, record.date);
    }
    out
}

pub fn render_history(records: &[ActivityRecord]) -> String {
    if records.is_empty() {
        return "No activity recorded\n".to_string();
    }
    let mut out = String::new();
    for record in records {
        let _ = writeln!(out, "{}  [{}]  {}", record.date, record.kind, record.notes);
    }
    out
}

pub fn render_tasks(tasks: &[String]) -> String {
    if tasks.is_empty() {
        return "No pending tasks\n".to_string();
    }
    tasks
        .iter()
        .enumerate()
        .map(|(i, task)| format!("{}. {}\n", i + 1, task))
        .collect()
}
