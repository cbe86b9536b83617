//! JSON persistence of table snapshots handed to the data-source configuration.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::io::write_atomically;
use crate::state::data_model::ImportedTable;

#[derive(Debug, Error)]
pub enum TableIoError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Table parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub fn load_table(path: &Path) -> Result<ImportedTable, TableIoError> {
    let content = fs::read_to_string(path)?;
    let table: ImportedTable = serde_json::from_str(&content)?;
    debug!(path = %path.display(), rows = table.row_count(), "table loaded");
    Ok(table)
}

pub fn save_table(path: &Path, table: &ImportedTable) -> Result<(), TableIoError> {
    let json = serde_json::to_string_pretty(table)?;
    write_atomically(path, json.as_bytes())?;
    debug!(path = %path.display(), rows = table.row_count(), "table saved");
    Ok(())
}
