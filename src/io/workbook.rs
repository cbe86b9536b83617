//! Spreadsheet workbook sources for the importer.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};

use crate::io::import::ImportError;

/// Built-in format index for `m/d/yy h:mm`.
const DATETIME_FORMAT_INDEX: u16 = 0x16;
/// Built-in format index for `[h]:mm:ss`.
const ELAPSED_FORMAT_INDEX: u16 = 0x2e;

/// One cell as stored in the workbook, before type decoding.
#[derive(Clone, Debug, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Bool(bool),
    Integer(i64),
    Numeric {
        value: f64,
        format_index: u16,
        format: String,
    },
    Error(String),
    /// Any other stored kind, kept as its textual form.
    Other(String),
}

impl RawCell {
    /// A numeric cell with the `General` format.
    pub fn number(value: f64) -> Self {
        Self::Numeric {
            value,
            format_index: 0,
            format: "General".to_string(),
        }
    }

    pub fn formatted(value: f64, format_index: u16, format: impl Into<String>) -> Self {
        Self::Numeric {
            value,
            format_index,
            format: format.into(),
        }
    }
}

/// A row of raw cells indexed by absolute column; `Empty` marks absent cells.
pub type RawRow = Vec<RawCell>;

pub trait WorkbookSource {
    fn sheet_names(&self) -> Vec<String>;

    fn read_rows(&mut self, sheet: usize) -> Result<Vec<RawRow>, ImportError>;
}

/// Workbook opened from an in-memory buffer (xlsx, xlsm, xlsb, xls, ods).
pub struct CalamineWorkbook {
    sheets: Sheets<Cursor<Vec<u8>>>,
}

impl CalamineWorkbook {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ImportError> {
        let sheets = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| ImportError::Workbook(e.to_string()))?;
        Ok(Self { sheets })
    }
}

impl WorkbookSource for CalamineWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    fn read_rows(&mut self, sheet: usize) -> Result<Vec<RawRow>, ImportError> {
        let names = self.sheets.sheet_names();
        let Some(name) = names.get(sheet) else {
            return Err(ImportError::SheetOutOfRange {
                index: sheet,
                count: names.len(),
            });
        };
        let range = self
            .sheets
            .worksheet_range(name)
            .map_err(|e| ImportError::Sheet(name.clone(), e.to_string()))?;

        // Leading blank rows are dropped; leading blank columns keep their index.
        let (_, start_col) = range.start().unwrap_or((0, 0));
        let offset = start_col as usize;

        Ok(range
            .rows()
            .map(|cells| {
                let mut row = vec![RawCell::Empty; offset];
                row.extend(cells.iter().map(raw_cell));
                row
            })
            .collect())
    }
}

/// calamine resolves number formats itself; a date verdict is carried as the
/// matching built-in format index.
fn raw_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::Int(n) => RawCell::Integer(*n),
        Data::Float(f) => RawCell::number(*f),
        Data::DateTime(dt) => {
            let format_index = if dt.is_duration() {
                ELAPSED_FORMAT_INDEX
            } else {
                DATETIME_FORMAT_INDEX
            };
            RawCell::formatted(dt.as_f64(), format_index, "")
        }
        Data::Error(e) => RawCell::Error(format!("#{e:?}")),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Other(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_cell_mapping() {
        assert_eq!(raw_cell(&Data::Empty), RawCell::Empty);
        assert_eq!(raw_cell(&Data::Int(7)), RawCell::Integer(7));
        assert_eq!(raw_cell(&Data::Float(2.5)), RawCell::number(2.5));
        assert_eq!(
            raw_cell(&Data::String("x".to_string())),
            RawCell::Text("x".to_string())
        );
        assert_eq!(
            raw_cell(&Data::DateTimeIso("2024-01-01".to_string())),
            RawCell::Other("2024-01-01".to_string())
        );
    }
}
