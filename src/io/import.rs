//! Spreadsheet import: reads one sheet into an [`ImportedTable`], inferring a
//! type for every column.
//!
//! The importer runs on a worker thread and checks a [`CancelToken`] after
//! buffering the input, after every row, and after type inference. A
//! cancelled import produces [`ImportOutcome::Cancelled`] and reports nothing
//! to the error sink.

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::io::date_format;
use crate::io::workbook::{CalamineWorkbook, RawCell, RawRow, WorkbookSource};
use crate::state::data_model::{CellValue, ImportedTable, Row, TableShapeError, ValueKind};
use crate::state::grid::Grid;

pub type CancelToken = Arc<AtomicBool>;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to open workbook: {0}")]
    Workbook(String),
    #[error("Workbook contains no sheets")]
    NoSheets,
    #[error("Sheet {index} out of range ({count} sheets)")]
    SheetOutOfRange { index: usize, count: usize },
    #[error("Failed to read sheet '{0}': {1}")]
    Sheet(String, String),
    #[error("Malformed table: {0}")]
    Shape(#[from] TableShapeError),
}

#[derive(Debug)]
pub struct ImportFailure {
    pub message: String,
    pub cause: ImportError,
}

impl ImportFailure {
    fn new(cause: ImportError) -> Self {
        Self {
            message: "Unable to import the spreadsheet".to_string(),
            cause,
        }
    }
}

#[derive(Debug)]
pub enum ImportOutcome {
    Completed(ImportedTable),
    Cancelled,
    /// The user refused to pick a sheet.
    Declined,
    Failed(ImportFailure),
}

impl ImportOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Applies the outcome on the UI thread: a table replaces the grid
    /// contents, a failure goes to `sink`. Returns whether the grid changed.
    pub fn deliver(self, grid: &mut Grid, sink: &mut dyn ErrorSink) -> bool {
        match self {
            Self::Completed(table) => {
                grid.copy_into(Some(&table));
                true
            }
            Self::Failed(failure) => {
                sink.report(&failure.message, &failure.cause);
                false
            }
            Self::Cancelled | Self::Declined => false,
        }
    }
}

/// Receives import failures as message and cause.
pub trait ErrorSink {
    fn report(&mut self, message: &str, cause: &ImportError);
}

impl<F> ErrorSink for F
where
    F: FnMut(&str, &ImportError),
{
    fn report(&mut self, message: &str, cause: &ImportError) {
        self(message, cause)
    }
}

/// Asked to pick a sheet when a workbook has more than one.
pub trait SheetChooser {
    fn choose_sheet(&mut self, names: &[String]) -> Option<usize>;
}

impl<F> SheetChooser for F
where
    F: FnMut(&[String]) -> Option<usize>,
{
    fn choose_sheet(&mut self, names: &[String]) -> Option<usize> {
        self(names)
    }
}

/// A sheet choice the worker needs answered on the UI thread.
#[derive(Debug)]
pub struct SheetRequest {
    pub names: Vec<String>,
    pub reply: oneshot::Sender<Option<usize>>,
}

/// Forwards sheet choices from the import worker to whoever owns the
/// receiving end, blocking the worker until it answers.
///
/// Native dialogs must run on the UI thread on some platforms, so the worker
/// never shows one itself. Dropping the chooser closes the request channel.
#[derive(Debug, Clone)]
pub struct ChannelSheetChooser {
    requests: mpsc::UnboundedSender<SheetRequest>,
}

impl ChannelSheetChooser {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SheetRequest>) {
        let (requests, receiver) = mpsc::unbounded_channel();
        (Self { requests }, receiver)
    }
}

impl SheetChooser for ChannelSheetChooser {
    fn choose_sheet(&mut self, names: &[String]) -> Option<usize> {
        let (reply, answer) = oneshot::channel();
        let request = SheetRequest {
            names: names.to_vec(),
            reply,
        };
        if self.requests.send(request).is_err() {
            warn!("sheet chooser receiver is gone; declining import");
            return None;
        }
        answer.blocking_recv().ok().flatten()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub first_row_is_header: bool,
}

impl ImportOptions {
    pub fn with_header() -> Self {
        Self {
            first_row_is_header: true,
        }
    }
}

pub struct ImportTask<R> {
    input: R,
    options: ImportOptions,
    cancel: CancelToken,
}

impl<R: Read> ImportTask<R> {
    pub fn new(input: R, options: ImportOptions) -> Self {
        Self {
            input,
            options,
            cancel: CancelToken::default(),
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        Arc::clone(&self.cancel)
    }

    pub fn run(self, chooser: &mut dyn SheetChooser) -> ImportOutcome {
        info!(header = self.options.first_row_is_header, "spreadsheet import started");
        match self.execute(chooser) {
            Ok(outcome) => {
                match &outcome {
                    ImportOutcome::Completed(table) => info!(
                        columns = table.column_count(),
                        rows = table.row_count(),
                        "spreadsheet import finished"
                    ),
                    other => debug!(?other, "spreadsheet import stopped"),
                }
                outcome
            }
            Err(cause) => {
                let failure = ImportFailure::new(cause);
                error!(cause = %failure.cause, "{}", failure.message);
                ImportOutcome::Failed(failure)
            }
        }
    }

    fn execute(mut self, chooser: &mut dyn SheetChooser) -> Result<ImportOutcome, ImportError> {
        let mut buffer = Vec::new();
        self.input.read_to_end(&mut buffer)?;
        if is_cancelled(&self.cancel) {
            return Ok(ImportOutcome::Cancelled);
        }

        let mut workbook = CalamineWorkbook::from_bytes(buffer)?;
        read_table(&mut workbook, &self.options, chooser, &self.cancel)
    }
}

impl<R: Read + Send + 'static> ImportTask<R> {
    /// Runs the import on a dedicated worker thread.
    pub fn spawn<C>(self, mut chooser: C) -> io::Result<JoinHandle<ImportOutcome>>
    where
        C: SheetChooser + Send + 'static,
    {
        thread::Builder::new()
            .name("spreadsheet-import".to_string())
            .spawn(move || self.run(&mut chooser))
    }
}

/// Reads a sheet of `source` into a typed table.
pub fn read_table(
    source: &mut dyn WorkbookSource,
    options: &ImportOptions,
    chooser: &mut dyn SheetChooser,
    cancel: &AtomicBool,
) -> Result<ImportOutcome, ImportError> {
    let names = source.sheet_names();
    let sheet = match names.len() {
        0 => return Err(ImportError::NoSheets),
        1 => 0,
        count => match chooser.choose_sheet(&names) {
            Some(index) if index < count => index,
            Some(index) => return Err(ImportError::SheetOutOfRange { index, count }),
            None => return Ok(ImportOutcome::Declined),
        },
    };
    debug!(sheet = %names[sheet], "reading sheet");

    let mut rows = source.read_rows(sheet)?.into_iter();
    let mut builder = TableBuilder::default();
    if options.first_row_is_header {
        if let Some(header) = rows.next() {
            builder.read_header(&header);
        }
    }
    for raw in rows {
        builder.read_row(&raw);
        if is_cancelled(cancel) {
            return Ok(ImportOutcome::Cancelled);
        }
    }

    builder.infer_kinds();
    if is_cancelled(cancel) {
        return Ok(ImportOutcome::Cancelled);
    }
    Ok(ImportOutcome::Completed(builder.finish()?))
}

/// Decodes a raw cell into a typed value.
pub fn decode_cell(cell: &RawCell) -> CellValue {
    match cell {
        RawCell::Empty => CellValue::Null,
        RawCell::Text(s) => CellValue::Text(s.clone()),
        RawCell::Bool(b) => CellValue::Bool(*b),
        RawCell::Integer(n) => CellValue::Long(*n),
        RawCell::Numeric {
            value,
            format_index,
            format,
        } => {
            if date_format::is_date_format(*format_index, format) {
                date_format::excel_serial_to_datetime(*value)
                    .map(CellValue::Date)
                    .unwrap_or(CellValue::Double(*value))
            } else {
                CellValue::Double(*value)
            }
        }
        RawCell::Error(s) | RawCell::Other(s) => CellValue::Text(s.clone()),
    }
}

pub fn placeholder_name(index: usize) -> String {
    format!("Column {}", index + 1)
}

fn is_cancelled(cancel: &AtomicBool) -> bool {
    cancel.load(Ordering::Relaxed)
}

#[derive(Debug, Default)]
struct TableBuilder {
    names: Vec<String>,
    kinds: Vec<ValueKind>,
    rows: Vec<Row>,
}

impl TableBuilder {
    fn ensure_columns(&mut self, count: usize) {
        while self.names.len() < count {
            self.names.push(placeholder_name(self.names.len()));
            self.kinds.push(ValueKind::Object);
        }
    }

    fn read_header(&mut self, header: &RawRow) {
        for (column, cell) in header.iter().enumerate() {
            if matches!(cell, RawCell::Empty) {
                continue;
            }
            self.ensure_columns(column + 1);
            self.names[column] = match cell {
                RawCell::Text(s) if !s.is_empty() => s.clone(),
                _ => placeholder_name(column),
            };
        }
    }

    fn read_row(&mut self, raw: &RawRow) {
        let mut values = vec![CellValue::Null; self.names.len()];
        for (column, cell) in raw.iter().enumerate() {
            let value = decode_cell(cell);
            if value.is_blank() {
                continue;
            }
            self.ensure_columns(column + 1);
            if values.len() < self.names.len() {
                values.resize(self.names.len(), CellValue::Null);
            }
            values[column] = value;
        }
        self.rows.push(values);
    }

    /// Narrowest common kind per column; columns without values keep theirs.
    fn infer_kinds(&mut self) {
        for (column, declared) in self.kinds.iter_mut().enumerate() {
            let observed = self
                .rows
                .iter()
                .filter_map(|row| row.get(column).and_then(CellValue::kind))
                .reduce(ValueKind::widen);
            if let Some(kind) = observed {
                *declared = kind;
            }
        }
    }

    fn finish(mut self) -> Result<ImportedTable, TableShapeError> {
        let width = self.names.len();
        for row in &mut self.rows {
            row.resize(width, CellValue::Null);
        }
        ImportedTable::new(self.names, self.kinds, self.rows)
    }
}
