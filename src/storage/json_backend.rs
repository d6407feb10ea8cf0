use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use super::{Cell, RemoteTableStore, Result, Table};

const TMP_SUFFIX: &str = "tmp";

/// Table store persisted as a single JSON document on disk.
///
/// Every `replace` stages the full table next to the target and renames it
/// into place, so readers see either the old or the new table.
#[derive(Debug, Clone)]
pub struct JsonTableStore {
    path: PathBuf,
}

/// On-disk shape. Headers may have been written as numbers by other tools.
#[derive(Debug, Default, Deserialize)]
struct StoredTable {
    #[serde(default)]
    columns: Vec<Cell>,
    #[serde(default)]
    rows: Vec<Vec<Cell>>,
}

impl From<StoredTable> for Table {
    fn from(stored: StoredTable) -> Self {
        let columns = stored.columns.iter().map(Cell::to_text).collect();
        Table::new(columns, stored.rows)
    }
}

impl JsonTableStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RemoteTableStore for JsonTableStore {
    fn read(&self) -> Result<Table> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "table file missing, reading as empty");
            return Ok(Table::empty());
        }
        let data = fs::read_to_string(&self.path)?;
        let stored: StoredTable = serde_json::from_str(&data)?;
        Ok(stored.into())
    }

    fn replace(&self, table: &Table) -> Result<()> {
        let json = serde_json::to_string_pretty(table)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), rows = table.len(), "table replaced");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
