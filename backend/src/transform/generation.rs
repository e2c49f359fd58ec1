//! Breeding generation arithmetic (`F2` -> `F3`).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::CellValue;

/// Label given to a lot with no recorded generation.
pub const FIRST_GENERATION: &str = "F1";

static GENERATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^F([0-9]+)$").expect("Invalid generation pattern"));

/// Successor of a generation label.
///
/// Blank becomes `F1`, `F<n>` becomes `F<n+1>` (case-insensitive, trimmed).
/// Anything else is returned unchanged.
pub fn next_generation(raw: &str) -> String {
    let normalized = raw.trim().to_uppercase();
    if normalized.is_empty() {
        return FIRST_GENERATION.to_string();
    }

    GENERATION_PATTERN
        .captures(&normalized)
        .and_then(|caps| caps[1].parse::<u64>().ok())
        .and_then(|n| n.checked_add(1))
        .map(|n| format!("F{}", n))
        .unwrap_or_else(|| raw.to_string())
}

/// [`next_generation`] lifted to cells; non-text values pass through.
pub fn next_generation_cell(value: &CellValue) -> CellValue {
    match value {
        CellValue::Empty => CellValue::from(FIRST_GENERATION),
        CellValue::Text(s) => CellValue::Text(next_generation(s)),
        other => other.clone(),
    }
}
