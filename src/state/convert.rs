//! Best-effort conversion between cell value kinds.
//!
//! Used by column retyping, by the header dry-run check and by the cell
//! editors to turn typed input text into a correctly-typed value.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::state::data_model::{self, CellValue, ValueKind};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("cannot parse '{input}' as {target}")]
    Unparseable { input: String, target: ValueKind },
    #[error("{source_kind} value does not fit in {target}")]
    OutOfRange {
        source_kind: ValueKind,
        target: ValueKind,
    },
    #[error("{source_kind} value cannot be converted to {target}")]
    Incompatible {
        source_kind: ValueKind,
        target: ValueKind,
    },
}

pub type Result<T> = std::result::Result<T, ConversionError>;

/// Converts `value` to `target`. `Null` converts to `Null` for every target.
pub fn convert(value: &CellValue, target: ValueKind) -> Result<CellValue> {
    let Some(source) = value.kind() else {
        return Ok(CellValue::Null);
    };
    if source == target || target == ValueKind::Object {
        return Ok(value.clone());
    }

    match target {
        ValueKind::Text => Ok(CellValue::Text(data_model::display_value(value))),
        ValueKind::Bool => to_bool(value).map(CellValue::Bool),
        ValueKind::Number => to_number(value),
        ValueKind::Byte => integral(value, target)
            .and_then(|n| narrow(n, source, target))
            .map(CellValue::Byte),
        ValueKind::Short => integral(value, target)
            .and_then(|n| narrow(n, source, target))
            .map(CellValue::Short),
        ValueKind::Integer => integral(value, target)
            .and_then(|n| narrow(n, source, target))
            .map(CellValue::Integer),
        ValueKind::Long => integral(value, target)
            .and_then(|n| narrow(n, source, target))
            .map(CellValue::Long),
        ValueKind::BigInteger => integral(value, target).map(CellValue::BigInteger),
        ValueKind::Float => floating(value, target).map(|f| CellValue::Float(f as f32)),
        ValueKind::Double => floating(value, target).map(CellValue::Double),
        ValueKind::Decimal => to_decimal(value, target).map(CellValue::Decimal),
        ValueKind::Date => to_datetime(value, target).map(CellValue::Date),
        ValueKind::Timestamp => to_datetime(value, target).map(CellValue::Timestamp),
        ValueKind::SqlDate => to_datetime(value, target).map(|dt| CellValue::SqlDate(dt.date())),
        ValueKind::Time => to_time(value, target).map(CellValue::Time),
        ValueKind::Object => Ok(value.clone()),
    }
}

/// Parses editor text into a value of `kind`. Blank input yields `Null`.
pub fn parse_input(input: &str, kind: ValueKind) -> Result<CellValue> {
    if input.trim().is_empty() {
        return Ok(CellValue::Null);
    }
    match kind {
        ValueKind::Text | ValueKind::Object => Ok(CellValue::Text(input.to_string())),
        _ => convert(&CellValue::Text(input.to_string()), kind),
    }
}

/// Whether `value` would survive a retype to `target`.
pub fn can_convert(value: &CellValue, target: ValueKind) -> bool {
    convert(value, target).is_ok()
}

fn incompatible(value: &CellValue, target: ValueKind) -> ConversionError {
    ConversionError::Incompatible {
        source_kind: value.kind().unwrap_or_default(),
        target,
    }
}

fn unparseable(input: &str, target: ValueKind) -> ConversionError {
    ConversionError::Unparseable {
        input: input.to_string(),
        target,
    }
}

fn to_bool(value: &CellValue) -> Result<bool> {
    match value {
        CellValue::Bool(b) => Ok(*b),
        CellValue::Text(s) => parse_bool(s).ok_or_else(|| unparseable(s, ValueKind::Bool)),
        other if other.kind().is_some_and(ValueKind::is_numeric) => {
            floating(other, ValueKind::Bool).map(|f| f != 0.0)
        }
        other => Err(incompatible(other, ValueKind::Bool)),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
        Some(false)
    } else {
        None
    }
}

fn to_number(value: &CellValue) -> Result<CellValue> {
    match value {
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                return Ok(CellValue::Long(n));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(CellValue::Double)
                .ok_or_else(|| unparseable(s, ValueKind::Number))
        }
        CellValue::Bool(b) => Ok(CellValue::Integer(i32::from(*b))),
        other if other.kind().is_some_and(ValueKind::is_numeric) => Ok(other.clone()),
        other => Err(incompatible(other, ValueKind::Number)),
    }
}

/// Exact integral view of a value, or an error when it has a fraction.
fn integral(value: &CellValue, target: ValueKind) -> Result<i128> {
    let lossy = || ConversionError::OutOfRange {
        source_kind: value.kind().unwrap_or_default(),
        target,
    };
    match value {
        CellValue::Byte(n) => Ok(i128::from(*n)),
        CellValue::Short(n) => Ok(i128::from(*n)),
        CellValue::Integer(n) => Ok(i128::from(*n)),
        CellValue::Long(n) => Ok(i128::from(*n)),
        CellValue::BigInteger(n) => Ok(*n),
        CellValue::Bool(b) => Ok(i128::from(*b)),
        CellValue::Float(f) => float_to_integral(f64::from(*f)).ok_or_else(lossy),
        CellValue::Double(f) => float_to_integral(*f).ok_or_else(lossy),
        CellValue::Decimal(d) => {
            if d.fract().is_zero() {
                d.to_i128().ok_or_else(lossy)
            } else {
                Err(lossy())
            }
        }
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if let Ok(n) = trimmed.parse::<i128>() {
                return Ok(n);
            }
            Decimal::from_str(trimmed)
                .ok()
                .filter(|d| d.fract().is_zero())
                .and_then(|d| d.to_i128())
                .ok_or_else(|| unparseable(s, target))
        }
        CellValue::Date(dt) | CellValue::Timestamp(dt) => {
            Ok(i128::from(dt.and_utc().timestamp_millis()))
        }
        CellValue::SqlDate(d) => Ok(i128::from(
            d.and_time(NaiveTime::MIN).and_utc().timestamp_millis(),
        )),
        other => Err(incompatible(other, target)),
    }
}

fn float_to_integral(f: f64) -> Option<i128> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1.7e38 {
        Some(f as i128)
    } else {
        None
    }
}

fn narrow<T: TryFrom<i128>>(n: i128, source: ValueKind, target: ValueKind) -> Result<T> {
    T::try_from(n).map_err(|_| ConversionError::OutOfRange {
        source_kind: source,
        target,
    })
}

fn floating(value: &CellValue, target: ValueKind) -> Result<f64> {
    match value {
        CellValue::Float(f) => Ok(f64::from(*f)),
        CellValue::Double(f) => Ok(*f),
        CellValue::Decimal(d) => d.to_f64().ok_or_else(|| incompatible(value, target)),
        CellValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or_else(|| unparseable(s, target)),
        other => integral(other, target).map(|n| n as f64),
    }
}

fn to_decimal(value: &CellValue, target: ValueKind) -> Result<Decimal> {
    match value {
        CellValue::Decimal(d) => Ok(*d),
        CellValue::Text(s) => {
            let trimmed = s.trim();
            Decimal::from_str(trimmed)
                .or_else(|_| Decimal::from_scientific(trimmed))
                .map_err(|_| unparseable(s, target))
        }
        CellValue::Float(f) => {
            Decimal::from_f32(*f).ok_or_else(|| incompatible(value, target))
        }
        CellValue::Double(f) => {
            Decimal::from_f64(*f).ok_or_else(|| incompatible(value, target))
        }
        other => {
            let n = integral(other, target)?;
            Decimal::from_i128(n).ok_or(ConversionError::OutOfRange {
                source_kind: other.kind().unwrap_or_default(),
                target,
            })
        }
    }
}

const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .or_else(|| {
            DateTime::<FixedOffset>::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .ok()
        .or_else(|| parse_datetime(trimmed).map(|dt| dt.time()))
}

fn to_datetime(value: &CellValue, target: ValueKind) -> Result<NaiveDateTime> {
    match value {
        CellValue::Date(dt) | CellValue::Timestamp(dt) => Ok(*dt),
        CellValue::SqlDate(d) => Ok(d.and_time(NaiveTime::MIN)),
        CellValue::Time(t) => Ok(NaiveDate::default().and_time(*t)),
        CellValue::Text(s) => parse_datetime(s).ok_or_else(|| unparseable(s, target)),
        CellValue::Bool(_) => Err(incompatible(value, target)),
        other => {
            let millis = integral(other, target)?;
            let millis = i64::try_from(millis).map_err(|_| ConversionError::OutOfRange {
                source_kind: other.kind().unwrap_or_default(),
                target,
            })?;
            DateTime::<Utc>::from_timestamp_millis(millis)
                .map(|dt| dt.naive_utc())
                .ok_or(ConversionError::OutOfRange {
                    source_kind: other.kind().unwrap_or_default(),
                    target,
                })
        }
    }
}

fn to_time(value: &CellValue, target: ValueKind) -> Result<NaiveTime> {
    match value {
        CellValue::Text(s) => parse_time(s).ok_or_else(|| unparseable(s, target)),
        other => to_datetime(other, target).map(|dt| dt.time()),
    }
}
