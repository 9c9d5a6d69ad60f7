//! Direct edits to the memory document from the command line.
//!
//! Each command is a full load → modify → save of the document. These share
//! no lock with the tracker or the daemon.

use chrono::{DateTime, Local};
use continuum_core::{ActivityKind, DocumentStore, MemoryDocument};

use crate::error::{CliError, CliResult};
use crate::report;

pub struct MemoryCommands<S> {
    store: S,
}

impl<S: DocumentStore<MemoryDocument>> MemoryCommands<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn load(&self) -> MemoryDocument {
        let loaded = self.store.load();
        tracing::debug!(outcome = ?loaded.outcome, "Memory document loaded");
        loaded.value
    }

    fn update<R>(&self, f: impl FnOnce(&mut MemoryDocument) -> R) -> CliResult<R> {
        let mut memory = self.load();
        let result = f(&mut memory);
        self.store.save(&memory)?;
        Ok(result)
    }

    pub fn log(&self, at: DateTime<Local>, notes: &str, kind: &str) -> CliResult<String> {
        let notes = non_empty("notes", notes)?;
        let kind = ActivityKind::from(non_empty("kind", kind)?);
        let record = self.update(|memory| memory.log_note(at, notes, kind))?;
        tracing::info!(notes = %record.notes, kind = %record.kind, "Note logged");
        Ok(format!("Logged: {}\n", record.notes))
    }

    /// An empty phase clears it.
    pub fn phase(&self, phase: &str) -> CliResult<String> {
        let phase = phase.trim();
        self.update(|memory| memory.set_phase(phase))?;
        tracing::info!(phase, "Phase set");
        if phase.is_empty() {
            Ok("Phase cleared\n".to_string())
        } else {
            Ok(format!("Phase: {}\n", phase))
        }
    }

    pub fn next(&self, task: &str) -> CliResult<String> {
        let task = non_empty("task", task)?;
        self.update(|memory| memory.add_task(task))?;
        tracing::info!(task, "Task added");
        Ok(format!("Added task: {}\n", task))
    }

    pub fn done(&self, at: DateTime<Local>, task: &str) -> CliResult<String> {
        let task = non_empty("task", task)?;
        let removed = self.update(|memory| memory.complete_task(at, task))?;
        tracing::info!(task, removed, "Task completed");
        if removed {
            Ok(format!("Completed: {}\n", task))
        } else {
            Ok(format!("Completed: {} (was not in the task list)\n", task))
        }
    }

    pub fn context(&self) -> String {
        self.load().context()
    }

    pub fn history(&self, kind: Option<&str>, limit: usize) -> String {
        let kind = kind
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(ActivityKind::from);
        report::render_history(&self.load().history(kind.as_ref(), limit))
    }

    pub fn tasks(&self) -> String {
        report::render_tasks(&self.load().next_tasks)
    }

    pub fn summary(&self) -> String {
        report::render_session_summary(&self.load())
    }
}

fn non_empty<'a>(name: &'static str, value: &'a str) -> CliResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CliError::EmptyArgument(name));
    }
    Ok(trimmed)
}
