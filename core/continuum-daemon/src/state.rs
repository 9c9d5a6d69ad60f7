//! Shared daemon state: the memory document store behind one lock.
//!
//! Connections are handled on separate threads, and every request does a
//! full load (and, for writes, a full save). Holding the lock across the
//! whole read-modify-write means two requests in this process can never
//! lose each other's update. Writers in other processes are not covered.

use continuum_core::{ContinuumError, DocumentStore, MemoryDocument};
use std::sync::Mutex;

pub struct SharedState<S> {
    store: S,
    write_lock: Mutex<()>,
}

impl<S: DocumentStore<MemoryDocument>> SharedState<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn memory_file_exists(&self) -> bool {
        self.store.exists()
    }

    /// Runs `f` against a freshly loaded document.
    pub fn read<R>(&self, f: impl FnOnce(&MemoryDocument) -> R) -> R {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let loaded = self.store.load();
        f(&loaded.value)
    }

    /// Loads, applies `f`, and saves the whole document.
    pub fn update<R>(&self, f: impl FnOnce(&mut MemoryDocument) -> R) -> Result<R, ContinuumError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut memory = self.store.load().value;
        let result = f(&mut memory);
        self.store.save(&memory)?;
        Ok(result)
    }
}
