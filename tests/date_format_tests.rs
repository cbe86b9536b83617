use chrono::{NaiveDate, NaiveTime};

use tablegrid::io::date_format::{excel_serial_to_datetime, is_builtin_date_format, is_date_format};

/// Index of a user-defined format, outside every built-in range.
const CUSTOM: u16 = 0xa4;

#[test]
fn test_general_is_never_a_date() {
    assert!(!is_date_format(0x00, "GENERAL"));
    assert!(!is_date_format(0x00, "General"));
    // The format string wins over a built-in date index.
    assert!(!is_date_format(0x0e, "general"));
}

#[test]
fn test_builtin_date_indices_ignore_format_string() {
    for index in (0x0e..=0x16).chain(0x2d..=0x2f) {
        assert!(is_builtin_date_format(index), "index {index:#x}");
        assert!(is_date_format(index, "0.00"), "index {index:#x}");
    }
    assert!(!is_date_format(0x02, "0.00"));
    assert!(!is_date_format(0x30, "##0.0E+0"));
}

#[test]
fn test_elapsed_time_brackets() {
    assert!(is_date_format(CUSTOM, "[h]:mm:ss"));
    assert!(is_date_format(CUSTOM, "[mm]:ss"));
    assert!(is_date_format(CUSTOM, "[ss].00"));
}

#[test]
fn test_quoted_literals_are_skipped() {
    assert!(!is_date_format(CUSTOM, "\"text only\""));
    assert!(!is_date_format(CUSTOM, "0.00\" days\""));
    assert!(is_date_format(CUSTOM, "\"on \"yyyy"));
}

#[test]
fn test_bare_date_letters() {
    assert!(is_date_format(CUSTOM, "yyyy-mm-dd"));
    assert!(is_date_format(CUSTOM, "d-mmm"));
    assert!(is_date_format(CUSTOM, "h:mm AM/PM"));
    assert!(!is_date_format(CUSTOM, "#,##0.00"));
    assert!(!is_date_format(CUSTOM, "0%"));
}

#[test]
fn test_locale_and_color_sections_are_not_dates() {
    assert!(!is_date_format(CUSTOM, "[Red]#,##0"));
    assert!(!is_date_format(CUSTOM, "[$-409]0.00"));
    assert!(is_date_format(CUSTOM, "[$-409]mmmm d"));
}

#[test]
fn test_serial_conversion() {
    let noon = excel_serial_to_datetime(45_292.5).unwrap();
    assert_eq!(noon.date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(noon.time(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());

    assert_eq!(
        excel_serial_to_datetime(61.0).unwrap().date(),
        NaiveDate::from_ymd_opt(1900, 3, 1).unwrap()
    );
    assert!(excel_serial_to_datetime(f64::NAN).is_none());
}
