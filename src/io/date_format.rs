//! Decides whether a numeric spreadsheet cell holds a date or time, from its
//! number-format index and format code.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Built-in number formats that always denote a date or time.
const BUILTIN_DATE_FORMATS: [std::ops::RangeInclusive<u16>; 2] = [0x0e..=0x16, 0x2d..=0x2f];

pub fn is_builtin_date_format(format_index: u16) -> bool {
    BUILTIN_DATE_FORMATS
        .iter()
        .any(|range| range.contains(&format_index))
}

pub fn is_date_format(format_index: u16, format: &str) -> bool {
    if format.eq_ignore_ascii_case("GENERAL") {
        return false;
    }
    if is_builtin_date_format(format_index) {
        return true;
    }

    let mut in_quote = false;
    let mut in_bracket = false;
    // Last character inside the current `[...]` section was h, m or s.
    let mut time_unit = false;

    for ch in format.chars() {
        if in_quote {
            if ch == '"' {
                in_quote = false;
            }
            continue;
        }
        if in_bracket {
            if ch == ']' {
                if time_unit {
                    return true;
                }
                in_bracket = false;
            } else {
                time_unit = matches!(ch, 'h' | 'H' | 'm' | 'M' | 's' | 'S');
            }
            continue;
        }
        match ch {
            '"' => in_quote = true,
            '[' => {
                in_bracket = true;
                time_unit = false;
            }
            'm' | 'd' | 'y' | 'h' | 's' | 'A' | 'a' | 'P' | 'p' => return true,
            _ => {}
        }
    }
    false
}

/// Converts an Excel serial (1900 date system) to a date-time.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    // Serials before 1900-03-01 are one day off because of the phantom 1900-02-29.
    let serial = if serial < 61.0 { serial + 1.0 } else { serial };
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::try_milliseconds(millis)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ranges() {
        assert!(is_builtin_date_format(0x0e));
        assert!(is_builtin_date_format(0x16));
        assert!(is_builtin_date_format(0x2f));
        assert!(!is_builtin_date_format(0x17));
        assert!(!is_builtin_date_format(0x00));
    }

    #[test]
    fn test_bracketed_color_is_not_a_date() {
        assert!(!is_date_format(0xa4, "[Red]0.00"));
        assert!(!is_date_format(0xa4, "[$-409]#,##0"));
    }

    #[test]
    fn test_excel_serial_conversion() {
        let dt = excel_serial_to_datetime(45_292.5).unwrap();
        assert_eq!(dt.to_string(), "2024-01-01 12:00:00");
        assert_eq!(
            excel_serial_to_datetime(1.0).unwrap().date(),
            NaiveDate::from_ymd_opt(1900, 1, 1).unwrap()
        );
        assert!(excel_serial_to_datetime(-1.0).is_none());
    }
}
