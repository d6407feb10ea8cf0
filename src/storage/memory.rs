use std::sync::{Mutex, MutexGuard};

use crate::errors::StoreError;

use super::{RemoteTableStore, Result, Table};

#[derive(Debug, Default)]
struct MemoryState {
    table: Table,
    failing_reads: u32,
    failing_writes: u32,
    reads: u32,
    replaces: u32,
}

/// In-process table store with fault injection, for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    state: Mutex<MemoryState>,
}

impl MemoryTableStore {
    pub fn new(table: Table) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                table,
                ..MemoryState::default()
            }),
        }
    }

    /// Makes the next `count` reads fail with [`StoreError::Unavailable`].
    pub fn fail_next_reads(&self, count: u32) {
        if let Ok(mut state) = self.lock() {
            state.failing_reads = count;
        }
    }

    /// Makes the next `count` replaces fail with [`StoreError::Unavailable`].
    pub fn fail_next_writes(&self, count: u32) {
        if let Ok(mut state) = self.lock() {
            state.failing_writes = count;
        }
    }

    /// Number of read attempts seen, failed ones included.
    pub fn read_count(&self) -> u32 {
        self.lock().map(|state| state.reads).unwrap_or_default()
    }

    /// Number of successful replaces.
    pub fn replace_count(&self) -> u32 {
        self.lock().map(|state| state.replaces).unwrap_or_default()
    }

    /// Current table contents, bypassing fault injection and counters.
    pub fn contents(&self) -> Table {
        self.lock().map(|state| state.table.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

impl RemoteTableStore for MemoryTableStore {
    fn read(&self) -> Result<Table> {
        let mut state = self.lock()?;
        state.reads += 1;
        if state.failing_reads > 0 {
            state.failing_reads -= 1;
            return Err(StoreError::Unavailable("simulated read failure".into()));
        }
        Ok(state.table.clone())
    }

    fn replace(&self, table: &Table) -> Result<()> {
        let mut state = self.lock()?;
        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            return Err(StoreError::Unavailable("simulated write failure".into()));
        }
        state.table = table.clone();
        state.replaces += 1;
        Ok(())
    }
}
