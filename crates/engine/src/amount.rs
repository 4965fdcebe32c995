//! Fixed-point money. All engine arithmetic is integer öre (cents of SEK);
//! the 2-decimal tolerance of the source material collapses to exact
//! integer equality once amounts are converted at load.

/// Parse a statement/ledger amount cell into integer cents.
///
/// Accepts comma or dot as decimal separator. Thousands separators
/// (space, non-breaking space, narrow no-break space) are stripped.
/// Returns `None` for cells that do not parse as a number.
pub fn parse_amount(s: &str) -> Option<i64> {
    let cleaned: String = s
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let normalized = cleaned.replace(',', ".");
    let value: f64 = normalized.parse().ok()?;
    Some(cents_from_f64(value))
}

/// Convert a floating-point amount (e.g. a numeric spreadsheet cell) to
/// cents, rounding half away from zero.
pub fn cents_from_f64(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// Cents back to a display value with two decimals.
pub fn cents_to_f64(cents: i64) -> f64 {
    cents as f64 / 100.0
}
