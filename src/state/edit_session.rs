//! Header and cell edit sessions over a [`Grid`].
//!
//! Each region is a small state machine (`Idle -> Editing -> Idle`). The
//! [`EditCoordinator`] arbitrates between them: starting one session commits
//! whichever session is currently open.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::state::convert::{self, ConversionError};
use crate::state::data_model::{self, ColumnDef, ValueKind};
use crate::state::grid::{Grid, GridError, GridOperation, RetypeReport};

/// Width of the type-chooser button at the right edge of a header editor.
pub const TYPE_CHOOSER_WIDTH: f32 = 18.0;

/// Details shown to the user before a lossy retype is committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataLossWarning {
    pub column: usize,
    pub column_name: String,
    pub from: ValueKind,
    pub to: ValueKind,
    pub failed_rows: Vec<usize>,
}

/// Yes/no confirmation asked when a retype would leave values unconverted.
pub trait DataLossPrompt {
    fn confirm_data_loss(&mut self, warning: &DataLossWarning) -> bool;
}

impl<F> DataLossPrompt for F
where
    F: FnMut(&DataLossWarning) -> bool,
{
    fn confirm_data_loss(&mut self, warning: &DataLossWarning) -> bool {
        self(warning)
    }
}

/// Input widget used for a column's cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorKind {
    Text,
    Checkbox,
    Integral,
    Decimal,
    Date,
    DateTime,
    Time,
}

impl EditorKind {
    pub fn for_kind(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Text | ValueKind::Object => Self::Text,
            ValueKind::Bool => Self::Checkbox,
            ValueKind::Byte
            | ValueKind::Short
            | ValueKind::Integer
            | ValueKind::Long
            | ValueKind::BigInteger => Self::Integral,
            ValueKind::Number | ValueKind::Float | ValueKind::Double | ValueKind::Decimal => {
                Self::Decimal
            }
            ValueKind::SqlDate => Self::Date,
            ValueKind::Date | ValueKind::Timestamp => Self::DateTime,
            ValueKind::Time => Self::Time,
        }
    }
}

/// Sub-control of the header editor a forwarded click lands on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderControl {
    Name,
    TypeChooser,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeaderSession {
    column: usize,
    name: String,
    kind: ValueKind,
    popup_open: bool,
}

impl HeaderSession {
    fn start(column: usize, def: &ColumnDef) -> Self {
        Self {
            column,
            name: def.name.clone(),
            kind: def.kind,
            popup_open: false,
        }
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn is_type_popup_open(&self) -> bool {
        self.popup_open
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Records a working type without committing.
    pub fn set_kind(&mut self, kind: ValueKind) {
        self.kind = kind;
    }

    /// Picks the sub-control under `local_x` for a header cell `width` wide.
    pub fn route_click(&self, local_x: f32, width: f32) -> HeaderControl {
        if local_x >= width - TYPE_CHOOSER_WIDTH {
            HeaderControl::TypeChooser
        } else {
            HeaderControl::Name
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellSession {
    row: usize,
    column: usize,
    kind: ValueKind,
    editor: EditorKind,
    draft: String,
}

impl CellSession {
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn editor(&self) -> EditorKind {
        self.editor
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveSession {
    Idle,
    Header(usize),
    Cell { row: usize, column: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeaderCommit {
    Committed(Option<RetypeReport>),
    Declined,
    NotEditing,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EditError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Pixel widths of the rendered columns, row-number column first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnLayout {
    widths: Vec<f32>,
}

impl ColumnLayout {
    pub fn new(widths: Vec<f32>) -> Self {
        Self { widths }
    }

    pub fn uniform(columns: usize, width: f32) -> Self {
        Self::new(vec![width; columns])
    }

    /// Column under `x`, with the offset into that column and its width.
    pub fn column_at_x(&self, x: f32) -> Option<(usize, f32, f32)> {
        if x < 0.0 {
            return None;
        }
        let mut left = 0.0;
        for (column, width) in self.widths.iter().copied().enumerate() {
            if x < left + width {
                return Some((column, x - left, width));
            }
            left += width;
        }
        None
    }
}

/// Result of a header click that opened an editor. The caller forwards the
/// original click to `control` so one click both opens and engages it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeaderActivation {
    pub column: usize,
    pub control: HeaderControl,
    pub local_x: f32,
}

#[derive(Clone, Debug, Default)]
pub struct EditCoordinator {
    header: Option<HeaderSession>,
    cell: Option<CellSession>,
    locked_headers: BTreeSet<usize>,
}

impl EditCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column drag-reordering is permanently disabled for editable headers.
    pub fn reordering_allowed(&self) -> bool {
        false
    }

    pub fn active(&self) -> ActiveSession {
        if let Some(header) = &self.header {
            ActiveSession::Header(header.column)
        } else if let Some(cell) = &self.cell {
            ActiveSession::Cell {
                row: cell.row,
                column: cell.column,
            }
        } else {
            ActiveSession::Idle
        }
    }

    pub fn header_session(&self) -> Option<&HeaderSession> {
        self.header.as_ref()
    }

    pub fn header_session_mut(&mut self) -> Option<&mut HeaderSession> {
        self.header.as_mut()
    }

    pub fn cell_session(&self) -> Option<&CellSession> {
        self.cell.as_ref()
    }

    pub fn cell_session_mut(&mut self) -> Option<&mut CellSession> {
        self.cell.as_mut()
    }

    pub fn is_header_editable(&self, column: usize) -> bool {
        column != 0 && !self.locked_headers.contains(&column)
    }

    pub fn set_header_editable(&mut self, column: usize, editable: bool) {
        if column == 0 {
            return;
        }
        if editable {
            self.locked_headers.remove(&column);
        } else {
            self.locked_headers.insert(column);
        }
    }

    /// Opens a header editor on `column`, committing any open session first.
    ///
    /// Returns `false` when the column cannot be edited or when committing
    /// the previous header edit was declined.
    pub fn begin_header_edit(
        &mut self,
        grid: &mut Grid,
        column: usize,
        prompt: &mut dyn DataLossPrompt,
    ) -> Result<bool, GridError> {
        if self.reordering_allowed() || !self.is_header_editable(column) {
            return Ok(false);
        }
        let Some(def) = column
            .checked_sub(1)
            .and_then(|index| grid.column_defs().get(index))
            .cloned()
        else {
            return Ok(false);
        };

        if self.header.as_ref().is_some_and(|h| h.column == column) {
            return Ok(true);
        }
        if self.header.is_some() {
            match self.stop_header_edit(grid, prompt)? {
                HeaderCommit::Declined => return Ok(false),
                HeaderCommit::Committed(_) | HeaderCommit::NotEditing => {}
            }
        }
        self.abandon_cell_for_navigation(grid);

        debug!(column, "header edit started");
        self.header = Some(HeaderSession::start(column, &def));
        Ok(true)
    }

    /// Mouse entry point for the header row.
    ///
    /// Clicks during a column resize are ignored. When an editor opens, the
    /// returned activation says where to forward the click.
    pub fn header_click(
        &mut self,
        grid: &mut Grid,
        layout: &ColumnLayout,
        x: f32,
        resizing: bool,
        prompt: &mut dyn DataLossPrompt,
    ) -> Result<Option<HeaderActivation>, GridError> {
        if resizing {
            return Ok(None);
        }
        let Some((column, local_x, width)) = layout.column_at_x(x) else {
            return Ok(None);
        };
        if !self.begin_header_edit(grid, column, prompt)? {
            return Ok(None);
        }
        let control = self
            .header
            .as_ref()
            .map_or(HeaderControl::Name, |h| h.route_click(local_x, width));
        Ok(Some(HeaderActivation {
            column,
            control,
            local_x,
        }))
    }

    /// Delivers a forwarded click to the open header editor.
    pub fn forward_click(&mut self, activation: &HeaderActivation) {
        let Some(header) = self.header.as_mut() else {
            return;
        };
        if header.column != activation.column {
            return;
        }
        header.popup_open = activation.control == HeaderControl::TypeChooser;
    }

    pub fn open_type_popup(&mut self) {
        if let Some(header) = self.header.as_mut() {
            header.popup_open = true;
        }
    }

    /// Records the type picked from the popup and commits the header edit.
    pub fn choose_header_type(
        &mut self,
        grid: &mut Grid,
        kind: ValueKind,
        prompt: &mut dyn DataLossPrompt,
    ) -> Result<HeaderCommit, GridError> {
        let Some(header) = self.header.as_mut() else {
            return Ok(HeaderCommit::NotEditing);
        };
        header.kind = kind;
        header.popup_open = false;
        self.stop_header_edit(grid, prompt)
    }

    /// Commits the open header edit into the grid.
    ///
    /// A type change that would leave values unconverted asks `prompt`
    /// first; a declined prompt discards the session and leaves the grid
    /// untouched.
    pub fn stop_header_edit(
        &mut self,
        grid: &mut Grid,
        prompt: &mut dyn DataLossPrompt,
    ) -> Result<HeaderCommit, GridError> {
        let Some(session) = self.header.take() else {
            return Ok(HeaderCommit::NotEditing);
        };
        let column = session.column;
        let Some(current) = grid.column_kind(column) else {
            return Err(GridError::ColumnOutOfRange {
                column,
                count: grid.column_count(),
            });
        };

        let retype = session.kind != current;
        if retype {
            let failed_rows = grid.dry_run_retype(column, session.kind)?;
            if !failed_rows.is_empty() {
                let warning = DataLossWarning {
                    column,
                    column_name: grid.column_name(column).unwrap_or_default().to_string(),
                    from: current,
                    to: session.kind,
                    failed_rows,
                };
                if !prompt.confirm_data_loss(&warning) {
                    info!(column, to = %session.kind, "retype declined");
                    return Ok(HeaderCommit::Declined);
                }
            }
        }

        if grid.column_name(column) != Some(session.name.as_str()) {
            grid.set_column_name(column, session.name.clone())?;
        }
        let report = if retype {
            Some(grid.set_column_class(column, session.kind)?)
        } else {
            None
        };
        debug!(column, name = %session.name, kind = %session.kind, "header edit committed");
        Ok(HeaderCommit::Committed(report))
    }

    pub fn cancel_header_edit(&mut self) -> bool {
        self.header.take().is_some()
    }

    /// Opens a cell editor, committing an open header edit first.
    pub fn begin_cell_edit(
        &mut self,
        grid: &mut Grid,
        row: usize,
        column: usize,
        prompt: &mut dyn DataLossPrompt,
    ) -> Result<bool, GridError> {
        if !grid.is_cell_editable(column) || row >= grid.row_count() {
            if column == 0 {
                warn!(row, "row-number column is not editable");
            }
            return Ok(false);
        }
        if self.header.is_some() {
            self.stop_header_edit(grid, prompt)?;
        }
        if self
            .cell
            .as_ref()
            .is_some_and(|cell| cell.row == row && cell.column == column)
        {
            return Ok(true);
        }
        self.abandon_cell_for_navigation(grid);

        // The header commit may have removed or retyped the column.
        let (Some(kind), Some(value)) = (grid.column_kind(column), grid.value_at(row, column))
        else {
            return Ok(false);
        };
        self.cell = Some(CellSession {
            row,
            column,
            kind,
            editor: EditorKind::for_kind(kind),
            draft: data_model::display_value(&value),
        });
        Ok(true)
    }

    /// Parses the draft with the column's type and writes it to the grid.
    ///
    /// Unparseable input keeps the session open.
    pub fn stop_cell_edit(&mut self, grid: &mut Grid) -> Result<bool, EditError> {
        let Some(session) = self.cell.as_ref() else {
            return Ok(false);
        };
        let value = convert::parse_input(&session.draft, session.kind)?;
        let (row, column) = (session.row, session.column);
        self.cell = None;
        grid.set_value_at(value, row, column)?;
        Ok(true)
    }

    pub fn cancel_cell_edit(&mut self) -> bool {
        self.cell.take().is_some()
    }

    /// Removes a user column, closing any session that points into it.
    pub fn remove_column(
        &mut self,
        grid: &mut Grid,
        column: usize,
    ) -> Result<ColumnDef, GridError> {
        if column == 0 {
            return Err(GridError::RowNumberColumn(GridOperation::Remove));
        }
        let removed = grid.remove_column(column)?;
        self.header = None;
        self.cell = None;
        self.locked_headers = std::mem::take(&mut self.locked_headers)
            .into_iter()
            .filter(|locked| *locked != column)
            .map(|locked| if locked > column { locked - 1 } else { locked })
            .collect();
        Ok(removed)
    }

    /// Inserts an empty row, moving a cell session on or below it down.
    pub fn insert_row(&mut self, grid: &mut Grid, index: usize) -> usize {
        let inserted = grid.insert_row(index);
        if let Some(cell) = self.cell.as_mut().filter(|cell| cell.row >= inserted) {
            cell.row += 1;
        }
        inserted
    }

    /// Closes both sessions and drops header locks before the grid is replaced.
    pub fn reset(&mut self) {
        self.header = None;
        self.cell = None;
        self.locked_headers.clear();
    }

    /// Removes a row, closing a cell session on or below it.
    pub fn remove_row(&mut self, grid: &mut Grid, row: usize) -> Result<(), GridError> {
        grid.remove_row(row)?;
        if self.cell.as_ref().is_some_and(|cell| cell.row >= row) {
            self.cell = None;
        }
        Ok(())
    }

    fn abandon_cell_for_navigation(&mut self, grid: &mut Grid) {
        if self.cell.is_none() {
            return;
        }
        if let Err(err) = self.stop_cell_edit(grid) {
            warn!(%err, "discarding cell edit on navigation");
            self.cell = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_at_x_reports_offset() {
        let layout = ColumnLayout::new(vec![30.0, 100.0, 80.0]);
        assert_eq!(layout.column_at_x(10.0), Some((0, 10.0, 30.0)));
        assert_eq!(layout.column_at_x(30.0), Some((1, 0.0, 100.0)));
        assert_eq!(layout.column_at_x(150.0), Some((2, 20.0, 80.0)));
        assert_eq!(layout.column_at_x(210.0), None);
        assert_eq!(layout.column_at_x(-1.0), None);
    }

    #[test]
    fn test_route_click_splits_name_and_chooser() {
        let session = HeaderSession::start(1, &ColumnDef::new("a", ValueKind::Text));
        assert_eq!(session.route_click(5.0, 100.0), HeaderControl::Name);
        assert_eq!(session.route_click(90.0, 100.0), HeaderControl::TypeChooser);
    }

    #[test]
    fn test_editor_kind_mapping() {
        assert_eq!(EditorKind::for_kind(ValueKind::Long), EditorKind::Integral);
        assert_eq!(EditorKind::for_kind(ValueKind::Number), EditorKind::Decimal);
        assert_eq!(EditorKind::for_kind(ValueKind::SqlDate), EditorKind::Date);
        assert_eq!(EditorKind::for_kind(ValueKind::Bool), EditorKind::Checkbox);
    }
}
