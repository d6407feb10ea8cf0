pub mod json_backend;
pub mod memory;
pub mod table;

use std::sync::Arc;

use crate::errors::StoreError;

pub type Result<T> = std::result::Result<T, StoreError>;

/// A remote tabular store that can only be read whole and replaced whole.
///
/// There is no partial update and no versioning: two read-then-replace cycles
/// racing each other lose a write, last replace wins.
pub trait RemoteTableStore: Send + Sync {
    /// Fetches the current table. Implementations must not cache.
    fn read(&self) -> Result<Table>;

    /// Overwrites the entire table.
    fn replace(&self, table: &Table) -> Result<()>;
}

impl<T: RemoteTableStore + ?Sized> RemoteTableStore for Arc<T> {
    fn read(&self) -> Result<Table> {
        (**self).read()
    }

    fn replace(&self, table: &Table) -> Result<()> {
        (**self).replace(table)
    }
}

pub use json_backend::JsonTableStore;
pub use memory::MemoryTableStore;
pub use table::{Cell, Table};
