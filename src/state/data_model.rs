use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Row = Vec<CellValue>;
pub type TableData = Vec<Row>;

/// A single runtime-typed cell.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    #[default]
    Null,
    Text(String),
    Bool(bool),
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    BigInteger(#[serde(with = "i128_string")] i128),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    Date(NaiveDateTime),
    SqlDate(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The kind tag of this value, or `None` for `Null`.
    pub fn kind(&self) -> Option<ValueKind> {
        let kind = match self {
            Self::Null => return None,
            Self::Text(_) => ValueKind::Text,
            Self::Bool(_) => ValueKind::Bool,
            Self::Byte(_) => ValueKind::Byte,
            Self::Short(_) => ValueKind::Short,
            Self::Integer(_) => ValueKind::Integer,
            Self::Long(_) => ValueKind::Long,
            Self::BigInteger(_) => ValueKind::BigInteger,
            Self::Float(_) => ValueKind::Float,
            Self::Double(_) => ValueKind::Double,
            Self::Decimal(_) => ValueKind::Decimal,
            Self::Date(_) => ValueKind::Date,
            Self::SqlDate(_) => ValueKind::SqlDate,
            Self::Time(_) => ValueKind::Time,
            Self::Timestamp(_) => ValueKind::Timestamp,
        };
        Some(kind)
    }

    /// True for empty text as well as `Null`.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&display_value(self))
    }
}

/// Column runtime type. The declaration order is the order of the type popup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Text,
    Bool,
    Number,
    Decimal,
    BigInteger,
    Double,
    Float,
    Integer,
    Long,
    Short,
    Byte,
    Date,
    SqlDate,
    Time,
    Timestamp,
    #[default]
    Object,
}

impl ValueKind {
    pub const ALL: [ValueKind; 16] = [
        Self::Text,
        Self::Bool,
        Self::Number,
        Self::Decimal,
        Self::BigInteger,
        Self::Double,
        Self::Float,
        Self::Integer,
        Self::Long,
        Self::Short,
        Self::Byte,
        Self::Date,
        Self::SqlDate,
        Self::Time,
        Self::Timestamp,
        Self::Object,
    ];

    pub fn all() -> &'static [Self] {
        &Self::ALL
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::Decimal => "decimal",
            Self::BigInteger => "big_integer",
            Self::Double => "double",
            Self::Float => "float",
            Self::Integer => "integer",
            Self::Long => "long",
            Self::Short => "short",
            Self::Byte => "byte",
            Self::Date => "date",
            Self::SqlDate => "sql_date",
            Self::Time => "time",
            Self::Timestamp => "timestamp",
            Self::Object => "object",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.code() == code)
    }

    pub fn label_key(self) -> &'static str {
        match self {
            Self::Text => "kind.text",
            Self::Bool => "kind.bool",
            Self::Number => "kind.number",
            Self::Decimal => "kind.decimal",
            Self::BigInteger => "kind.big_integer",
            Self::Double => "kind.double",
            Self::Float => "kind.float",
            Self::Integer => "kind.integer",
            Self::Long => "kind.long",
            Self::Short => "kind.short",
            Self::Byte => "kind.byte",
            Self::Date => "kind.date",
            Self::SqlDate => "kind.sql_date",
            Self::Time => "kind.time",
            Self::Timestamp => "kind.timestamp",
            Self::Object => "kind.object",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Number
                | Self::Decimal
                | Self::BigInteger
                | Self::Double
                | Self::Float
                | Self::Integer
                | Self::Long
                | Self::Short
                | Self::Byte
        )
    }

    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            Self::Date | Self::SqlDate | Self::Time | Self::Timestamp
        )
    }

    /// Whether a value of kind `other` is an instance of `self`.
    ///
    /// `Number` and `Date` are the two intermediate supertypes; everything
    /// else only accepts itself.
    pub fn accepts_kind(self, other: ValueKind) -> bool {
        match self {
            Self::Object => true,
            Self::Number => other.is_numeric(),
            Self::Date => other.is_temporal(),
            _ => self == other,
        }
    }

    pub fn accepts(self, value: &CellValue) -> bool {
        value.kind().map_or(true, |kind| self.accepts_kind(kind))
    }

    /// One step of the column type-inference fold.
    pub fn widen(self, observed: ValueKind) -> ValueKind {
        if self.accepts_kind(observed) {
            self
        } else {
            Self::Object
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ValueKind,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TableShapeError {
    #[error("{names} column names but {kinds} column types")]
    HeaderMismatch { names: usize, kinds: usize },
    #[error("row {row} has {width} values, expected {expected}")]
    RowWidth {
        row: usize,
        width: usize,
        expected: usize,
    },
}

/// Immutable snapshot exchanged between the importer, the grid and the
/// data-source configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct ImportedTable {
    column_names: Vec<String>,
    column_kinds: Vec<ValueKind>,
    rows: TableData,
}

impl ImportedTable {
    pub fn new(
        column_names: Vec<String>,
        column_kinds: Vec<ValueKind>,
        rows: TableData,
    ) -> Result<Self, TableShapeError> {
        if column_names.len() != column_kinds.len() {
            return Err(TableShapeError::HeaderMismatch {
                names: column_names.len(),
                kinds: column_kinds.len(),
            });
        }
        let expected = column_names.len();
        if let Some((row, values)) = rows
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != expected)
        {
            return Err(TableShapeError::RowWidth {
                row,
                width: values.len(),
                expected,
            });
        }
        Ok(Self {
            column_names,
            column_kinds,
            rows,
        })
    }

    /// Rows are kept in lockstep with the columns by the grid.
    pub(crate) fn from_grid_parts(
        column_names: Vec<String>,
        column_kinds: Vec<ValueKind>,
        rows: TableData,
    ) -> Self {
        Self {
            column_names,
            column_kinds,
            rows,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn column_kinds(&self) -> &[ValueKind] {
        &self.column_kinds
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn value(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|values| values.get(column))
    }

    pub fn columns(&self) -> impl Iterator<Item = ColumnDef> + '_ {
        self.column_names
            .iter()
            .zip(&self.column_kinds)
            .map(|(name, kind)| ColumnDef::new(name.clone(), *kind))
    }
}

#[derive(Deserialize)]
struct RawTable {
    column_names: Vec<String>,
    column_kinds: Vec<ValueKind>,
    rows: TableData,
}

impl TryFrom<RawTable> for ImportedTable {
    type Error = TableShapeError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        Self::new(raw.column_names, raw.column_kinds, raw.rows)
    }
}

/// Formats a cell value for display in a table cell or editor.
pub fn display_value(value: &CellValue) -> String {
    match value {
        CellValue::Null => String::new(),
        CellValue::Text(s) => s.clone(),
        CellValue::Bool(b) => b.to_string(),
        CellValue::Byte(n) => n.to_string(),
        CellValue::Short(n) => n.to_string(),
        CellValue::Integer(n) => n.to_string(),
        CellValue::Long(n) => n.to_string(),
        CellValue::BigInteger(n) => n.to_string(),
        CellValue::Float(n) => format_single(*n),
        CellValue::Double(n) => format_float(*n),
        CellValue::Decimal(d) => d.normalize().to_string(),
        CellValue::Date(dt) | CellValue::Timestamp(dt) => {
            dt.format("%Y-%m-%d %H:%M:%S").to_string()
        }
        CellValue::SqlDate(d) => d.format("%Y-%m-%d").to_string(),
        CellValue::Time(t) => t.format("%H:%M:%S").to_string(),
    }
}

fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

fn format_single(value: f32) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e7 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

mod i128_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &i128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i128, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
