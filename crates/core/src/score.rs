//! Score draft parsing and normalization.
//!
//! A draft is whatever the coordinator typed into a score cell. It is
//! parsed when the debounce timer fires; the confirmed value is rendered
//! back into the cell.

use crate::error::CoreError;

/// Draft shown for a cell with no evidence, and for a confirmed `null`.
pub const EMPTY_SCORE: &str = "0";

/// Parse a draft into the value sent to the backend.
///
/// Blank input means "no score" (`Ok(None)`). A comma decimal separator is
/// accepted. Negative, non-finite and non-numeric input is rejected.
pub fn parse_score_draft(draft: &str) -> Result<Option<f64>, CoreError> {
    let trimmed = draft.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let normalized = trimmed.replace(',', ".");
    let value: f64 = normalized
        .parse()
        .map_err(|_| CoreError::Validation(format!("Skor '{trimmed}' bukan angka")))?;
    if !value.is_finite() {
        return Err(CoreError::Validation(format!(
            "Skor '{trimmed}' bukan angka"
        )));
    }
    if value < 0.0 {
        return Err(CoreError::Validation(format!(
            "Skor tidak boleh negatif: {trimmed}"
        )));
    }
    // `-0` passes the sign check; store it as plain zero.
    Ok(Some(if value == 0.0 { 0.0 } else { value }))
}

/// Render a confirmed score for the cell. `None` becomes `"0"`; whole
/// numbers lose their fraction (`3.0 -> "3"`).
pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(value) => value.to_string(),
        None => EMPTY_SCORE.to_string(),
    }
}
