//! HL7 `TS` timestamps (`YYYY[MM[DD[HH[MM[SS[.fff]]]]]][+/-ZZZZ]`)

use chrono::{NaiveDate, NaiveDateTime};
use prefill_core::ast::IntervalPrecision;

/// Leading digits of a timestamp, without fraction or zone offset
fn digits(value: &str) -> &str {
    let value = value.trim();
    let end = value
        .char_indices()
        .find(|(i, c)| *c == '.' || *c == '+' || (*c == '-' && *i > 0))
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    &value[..end]
}

/// Parse a timestamp, filling missing components with their lowest value.
///
/// Zone offsets are dropped: comparisons between two values of one document
/// are made on the wall-clock time written in it.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let digits = digits(value);
    if !matches!(digits.len(), 4 | 6 | 8 | 10 | 12 | 14) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let part = |start: usize, len: usize, default: u32| -> Option<u32> {
        if digits.len() >= start + len {
            digits[start..start + len].parse().ok()
        } else {
            Some(default)
        }
    };

    let year: i32 = digits[..4].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, part(4, 2, 1)?, part(6, 2, 1)?)?;
    date.and_hms_opt(part(8, 2, 0)?, part(10, 2, 0)?, part(12, 2, 0)?)
}

/// Apply the precision of an interval field to an extracted timestamp.
///
/// `Date` keeps at most `YYYYMMDD`; `DateTime` keeps the value as written.
pub fn apply_precision(value: &str, precision: IntervalPrecision) -> String {
    let value = value.trim();
    match precision {
        IntervalPrecision::DateTime => value.to_string(),
        IntervalPrecision::Date => {
            let digits = digits(value);
            if digits.len() > 8 && digits.bytes().all(|b| b.is_ascii_digit()) {
                digits[..8].to_string()
            } else if digits.bytes().all(|b| b.is_ascii_digit()) {
                digits.to_string()
            } else {
                value.to_string()
            }
        }
    }
}
