// Utility helpers for parsing and display formatting.
//
// This module centralizes the "dirty" CSV/number/date handling so the rest of
// the code can assume clean, typed values.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports (commas, spaces).
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(",", "");
    s.parse::<f64>().ok()
}

/// Like [`parse_f64_safe`] but a blank cell counts as zero. `Err` carries the
/// offending text.
pub fn parse_metric(s: Option<&str>) -> Result<f64, String> {
    match s.map(str::trim) {
        None | Some("") => Ok(0.0),
        Some(text) => parse_f64_safe(Some(text)).ok_or_else(|| text.to_string()),
    }
}

pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    // Dates are expected in `YYYY-MM-DD` format.
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Trimmed text, empty when missing.
pub fn clean_text(s: Option<String>) -> String {
    s.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Inclusive date window. An open end on either side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateRange { start, end }
    }

    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether a record dated `date` falls in the window. Undated records
    /// are never excluded.
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        let Some(d) = date else {
            return true;
        };
        if let Some(start) = self.start {
            if d < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if d > end {
                return false;
            }
        }
        true
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - thousands separators (e.g., `1,234,567.89`).
    if !n.is_finite() {
        return n.to_string();
    }
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Used for counts in console messages (e.g., `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

/// Rupiah amount with Indonesian grouping, e.g. `Rp 1.250.000`.
pub fn format_currency(n: f64) -> String {
    if !n.is_finite() {
        return format!("Rp {}", n);
    }
    let rounded = n.round() as i64;
    let body = rounded.abs().to_formatted_string(&Locale::id);
    if rounded < 0 {
        format!("-Rp {}", body)
    } else {
        format!("Rp {}", body)
    }
}
