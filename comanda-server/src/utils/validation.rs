//! Input validation helpers
//!
//! Centralized text length constants and validation functions. Limits are
//! chosen for 80mm receipt printing (48 chars/line) and reasonable UX
//! limits for names and notes.

use shared::{CoreError, CoreResult};

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: dishes, tables, ingredients
pub const MAX_NAME_LEN: usize = 200;

/// Notes, comments, cancellation reasons
pub const MAX_NOTE_LEN: usize = 500;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(CoreError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> CoreResult<()> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(CoreError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Mesa 4", "table_id", MAX_NAME_LEN).is_ok());
        assert!(validate_required_text("", "table_id", MAX_NAME_LEN).is_err());
        assert!(validate_required_text("   ", "table_id", MAX_NAME_LEN).is_err());
        assert!(validate_required_text(&"x".repeat(600), "reason", MAX_NOTE_LEN).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(&None, "note", MAX_NOTE_LEN).is_ok());
        assert!(validate_optional_text(&Some("ok".into()), "note", MAX_NOTE_LEN).is_ok());
        assert!(validate_optional_text(&Some("x".repeat(600)), "note", MAX_NOTE_LEN).is_err());
    }
}
