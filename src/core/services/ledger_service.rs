//! Read-modify-write operations over the remote ledger table.

use crate::core::clock::Clock;
use crate::core::reader::LedgerReader;
use crate::domain::{EntryDraft, Rejection};
use crate::errors::LedgerError;
use crate::storage::{RemoteTableStore, Table};

/// Result of an append request.
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    /// The draft was written; carries the table as replaced in the store.
    Appended(Table),
    /// The draft failed validation and nothing was written.
    Rejected(Rejection),
}

impl AppendOutcome {
    pub fn is_appended(&self) -> bool {
        matches!(self, AppendOutcome::Appended(_))
    }
}

/// Table as last read, plus whether the reader gave up producing it.
struct Snapshot {
    table: Table,
    degraded: bool,
}

impl Snapshot {
    fn load(reader: &LedgerReader, store: &dyn RemoteTableStore) -> Self {
        match reader.fetch(store) {
            Some(table) => Self {
                table,
                degraded: false,
            },
            None => Self {
                table: Table::empty(),
                degraded: true,
            },
        }
    }
}

/// Owns the store handle and the cached snapshot that index-based operations
/// refer to. Every successful write drops the cache so the next access reads
/// fresh; a snapshot from an exhausted read is never reused.
pub struct LedgerService {
    store: Box<dyn RemoteTableStore>,
    reader: LedgerReader,
    clock: Box<dyn Clock>,
    track_stages: bool,
    snapshot: Option<Snapshot>,
}

impl LedgerService {
    pub fn new(
        store: Box<dyn RemoteTableStore>,
        reader: LedgerReader,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            store,
            reader,
            clock,
            track_stages: false,
            snapshot: None,
        }
    }

    /// Writes the `ETAPA` column on append.
    pub fn with_stage_tracking(mut self, enabled: bool) -> Self {
        self.track_stages = enabled;
        self
    }

    pub fn tracks_stages(&self) -> bool {
        self.track_stages
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Current snapshot, read through the retrying reader when not cached or
    /// when the cached one came from an exhausted read.
    pub fn snapshot(&mut self) -> &Table {
        &self.current().table
    }

    /// Snapshot plus whether it stands in for an unreachable store.
    pub fn snapshot_status(&mut self) -> (&Table, bool) {
        let current = self.current();
        (&current.table, current.degraded)
    }

    fn current(&mut self) -> &Snapshot {
        if self.is_degraded() {
            self.snapshot = None;
        }
        let reader = &self.reader;
        let store = self.store.as_ref();
        self.snapshot
            .get_or_insert_with(|| Snapshot::load(reader, store))
    }

    /// True when the last read gave up and the snapshot is a stand-in.
    pub fn is_degraded(&self) -> bool {
        self.snapshot.as_ref().is_some_and(|cached| cached.degraded)
    }

    /// Drops the cached snapshot and reads again.
    pub fn refresh(&mut self) -> &Table {
        self.invalidate();
        self.snapshot()
    }

    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }

    /// Validates `draft` and, when it passes, appends it to the snapshot and
    /// replaces the whole remote table.
    ///
    /// Invalid drafts are not errors: they come back as
    /// [`AppendOutcome::Rejected`] and the store is not touched.
    ///
    /// If the reader gave up and returned an empty table, the write replaces
    /// the remote table with this single row.
    pub fn append(&mut self, draft: &EntryDraft) -> Result<AppendOutcome, LedgerError> {
        let entry = match draft.validate() {
            Ok(entry) => entry,
            Err(reason) => {
                tracing::debug!(%reason, "entry rejected");
                return Ok(AppendOutcome::Rejected(reason));
            }
        };

        let record = entry.into_record(self.clock.now());
        let track_stages = self.track_stages;
        let mut next = self.snapshot().clone();
        next.push_record(record.to_cells(track_stages));

        let written = self.write(next)?;
        tracing::info!(
            concept = %record.concept,
            category = %record.category,
            amount = record.amount,
            rows = written.len(),
            "expense appended"
        );
        Ok(AppendOutcome::Appended(written))
    }

    /// Removes row `index` of the current snapshot and replaces the remote table.
    ///
    /// The index must come from the snapshot this service currently holds; if
    /// the remote table changed in between, a different row is removed.
    pub fn delete(&mut self, index: usize) -> Result<Table, LedgerError> {
        let mut next = self.snapshot().clone();
        let len = next.len();
        if next.remove_row(index).is_none() {
            return Err(LedgerError::RowOutOfRange { index, len });
        }
        let written = self.write(next)?;
        tracing::info!(index, rows = written.len(), "expense deleted");
        Ok(written)
    }

    /// Removes the newest row. Returns `None` when the ledger is empty.
    pub fn delete_last(&mut self) -> Result<Option<Table>, LedgerError> {
        let len = self.snapshot().len();
        if len == 0 {
            return Ok(None);
        }
        self.delete(len - 1).map(Some)
    }

    fn write(&mut self, next: Table) -> Result<Table, LedgerError> {
        self.store
            .replace(&next)
            .map_err(LedgerError::WriteFailure)?;
        self.invalidate();
        Ok(next)
    }
}
