// Numeric parsing and display helpers.
//
// Cell coercion lives here so the engine only ever sees plain `f64`s, and
// two-decimal rounding lives here so it is applied in exactly one place.
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in ad-platform exports.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed, including
///   digit runs too long to be finite.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Round to two decimals for presentation. Non-finite values become 0 so
/// they never reach an export.
pub fn round2(n: f64) -> f64 {
    if !n.is_finite() {
        return 0.0;
    }
    let r = (n * 100.0).round() / 100.0;
    // avoid exporting "-0"
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

pub fn average(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// Ratio that yields 0 instead of NaN/inf when the denominator is not
/// positive.
pub fn ratio_or_zero(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals with locale-aware thousands separators (`1,234,567.89`).
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    // sign only when something non-zero survives rounding
    let neg = n < 0.0 && s.chars().any(|c| matches!(c, '1'..='9'));
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
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
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
    n.to_formatted_string(&Locale::en)
}
