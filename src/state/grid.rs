use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use crate::state::convert::{self, ConversionError};
use crate::state::data_model::{CellValue, ColumnDef, ImportedTable, Row, TableData, ValueKind};

/// Header label of the row-number column.
pub const ROW_NUMBER_HEADER: &str = "#";

/// Kind of change a grid reports to its listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridChange {
    /// Columns or shape changed; views rebuild their column widgets.
    Structure,
    /// Cell values changed; views repaint.
    Data,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridOperation {
    SetValue,
    Rename,
    Retype,
    Remove,
}

impl fmt::Display for GridOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SetValue => "write to",
            Self::Rename => "rename",
            Self::Retype => "retype",
            Self::Remove => "remove",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cannot {0} the row-number column")]
    RowNumberColumn(GridOperation),
    #[error("column {column} out of range ({count} columns)")]
    ColumnOutOfRange { column: usize, count: usize },
    #[error("row {row} out of range ({count} rows)")]
    RowOutOfRange { row: usize, count: usize },
}

/// Outcome of retyping a column: rows whose value could not be converted
/// keep their previous value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RetypeReport {
    pub converted: usize,
    pub failures: Vec<(usize, ConversionError)>,
}

impl RetypeReport {
    pub fn is_lossless(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_rows(&self) -> Vec<usize> {
        self.failures.iter().map(|(row, _)| *row).collect()
    }
}

type Listener = Box<dyn FnMut(GridChange)>;

/// Mutable, dynamically typed table behind the editor.
///
/// Column 0 is the synthetic row-number column. It is never stored: user
/// column `n` lives at `columns[n - 1]` and `row[n - 1]`.
#[derive(Default)]
pub struct Grid {
    columns: Vec<ColumnDef>,
    rows: TableData,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    suspended: bool,
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("columns", &self.columns)
            .field("rows", &self.rows)
            .field("listeners", &self.listeners.len())
            .field("suspended", &self.suspended)
            .finish()
    }
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(table: &ImportedTable) -> Self {
        let mut grid = Self::new();
        grid.copy_into(Some(table));
        grid
    }

    pub fn subscribe(&mut self, listener: impl FnMut(GridChange) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Zero when there are no user columns, otherwise user columns plus the
    /// row-number column.
    pub fn column_count(&self) -> usize {
        if self.columns.is_empty() {
            0
        } else {
            self.columns.len() + 1
        }
    }

    pub fn user_column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_defs(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn column_name(&self, column: usize) -> Option<&str> {
        if column == 0 {
            return (!self.columns.is_empty()).then_some(ROW_NUMBER_HEADER);
        }
        self.columns.get(column - 1).map(|def| def.name.as_str())
    }

    pub fn column_kind(&self, column: usize) -> Option<ValueKind> {
        if column == 0 {
            return (!self.columns.is_empty()).then_some(ValueKind::Integer);
        }
        self.columns.get(column - 1).map(|def| def.kind)
    }

    pub fn is_cell_editable(&self, column: usize) -> bool {
        column != 0 && column <= self.columns.len()
    }

    pub fn add_column(&mut self, name: impl Into<String>, kind: ValueKind) {
        self.columns.push(ColumnDef::new(name, kind));
        for row in &mut self.rows {
            row.push(CellValue::Null);
        }
        debug!(columns = self.columns.len(), "column added");
        self.notify(GridChange::Structure);
    }

    pub fn remove_column(&mut self, column: usize) -> Result<ColumnDef, GridError> {
        let index = self.user_index(column, GridOperation::Remove)?;
        let removed = self.columns.remove(index);
        for row in &mut self.rows {
            row.remove(index);
        }
        debug!(column, name = %removed.name, "column removed");
        self.notify(GridChange::Structure);
        Ok(removed)
    }

    pub fn add_row(&mut self) -> usize {
        self.rows.push(self.empty_row());
        self.notify(GridChange::Data);
        self.rows.len() - 1
    }

    /// Inserts an empty row at `index`; an index past the end appends.
    pub fn insert_row(&mut self, index: usize) -> usize {
        let index = index.min(self.rows.len());
        let row = self.empty_row();
        self.rows.insert(index, row);
        self.notify(GridChange::Data);
        index
    }

    pub fn remove_row(&mut self, row: usize) -> Result<Row, GridError> {
        if row >= self.rows.len() {
            return Err(GridError::RowOutOfRange {
                row,
                count: self.rows.len(),
            });
        }
        let removed = self.rows.remove(row);
        self.notify(GridChange::Data);
        Ok(removed)
    }

    pub fn value_at(&self, row: usize, column: usize) -> Option<CellValue> {
        if row >= self.rows.len() {
            return None;
        }
        if column == 0 {
            return Some(row_number(row));
        }
        self.rows[row].get(column - 1).cloned()
    }

    pub fn set_value_at(
        &mut self,
        value: CellValue,
        row: usize,
        column: usize,
    ) -> Result<(), GridError> {
        let index = self.user_index(column, GridOperation::SetValue)?;
        let count = self.rows.len();
        let Some(values) = self.rows.get_mut(row) else {
            return Err(GridError::RowOutOfRange { row, count });
        };
        values[index] = value;
        self.notify(GridChange::Data);
        Ok(())
    }

    pub fn set_column_name(
        &mut self,
        column: usize,
        name: impl Into<String>,
    ) -> Result<(), GridError> {
        let index = self.user_index(column, GridOperation::Rename)?;
        self.columns[index].name = name.into();
        self.notify(GridChange::Structure);
        Ok(())
    }

    /// Retypes a column and converts every existing value in it.
    ///
    /// The row-number column is silently ignored.
    pub fn set_column_class(
        &mut self,
        column: usize,
        kind: ValueKind,
    ) -> Result<RetypeReport, GridError> {
        if column == 0 {
            return Ok(RetypeReport::default());
        }
        let index = self.user_index(column, GridOperation::Retype)?;
        self.columns[index].kind = kind;

        let mut report = RetypeReport::default();
        for (row_index, row) in self.rows.iter_mut().enumerate() {
            match convert::convert(&row[index], kind) {
                Ok(converted) => {
                    row[index] = converted;
                    report.converted += 1;
                }
                Err(err) => {
                    warn!(row = row_index, column, %err, "value kept unconverted");
                    report.failures.push((row_index, err));
                }
            }
        }
        self.notify(GridChange::Structure);
        Ok(report)
    }

    /// Checks which rows would fail a retype to `kind` without mutating.
    pub fn dry_run_retype(
        &self,
        column: usize,
        kind: ValueKind,
    ) -> Result<Vec<usize>, GridError> {
        let index = self.user_index(column, GridOperation::Retype)?;
        Ok(self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !convert::can_convert(&row[index], kind))
            .map(|(row, _)| row)
            .collect())
    }

    pub fn clear(&mut self) {
        self.columns.clear();
        self.rows.clear();
        self.notify(GridChange::Structure);
    }

    /// Replaces the whole grid with `table`, or empties it for `None`.
    ///
    /// Listeners see exactly one structure notification.
    pub fn copy_into(&mut self, table: Option<&ImportedTable>) {
        self.suspended = true;
        self.clear();
        if let Some(table) = table {
            for def in table.columns() {
                self.add_column(def.name, def.kind);
            }
            for source in table.rows() {
                let row = self.add_row();
                self.rows[row].clone_from(source);
            }
            debug!(
                columns = table.column_count(),
                rows = table.row_count(),
                "grid replaced"
            );
        }
        self.suspended = false;
        self.notify(GridChange::Structure);
    }

    /// Immutable snapshot of the user columns and all rows.
    pub fn create_model(&self) -> ImportedTable {
        let names = self.columns.iter().map(|def| def.name.clone()).collect();
        let kinds = self.columns.iter().map(|def| def.kind).collect();
        ImportedTable::from_grid_parts(names, kinds, self.rows.clone())
    }

    fn empty_row(&self) -> Row {
        vec![CellValue::Null; self.columns.len()]
    }

    fn user_index(&self, column: usize, operation: GridOperation) -> Result<usize, GridError> {
        if column == 0 {
            return Err(GridError::RowNumberColumn(operation));
        }
        if column > self.columns.len() {
            return Err(GridError::ColumnOutOfRange {
                column,
                count: self.column_count(),
            });
        }
        Ok(column - 1)
    }

    fn notify(&mut self, change: GridChange) {
        if self.suspended {
            return;
        }
        for (_, listener) in &mut self.listeners {
            listener(change);
        }
    }
}

fn row_number(row: usize) -> CellValue {
    CellValue::Integer(i32::try_from(row + 1).unwrap_or(i32::MAX))
}
