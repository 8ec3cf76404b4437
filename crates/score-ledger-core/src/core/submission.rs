// crates/score-ledger-core/src/core/submission.rs
// ============================================================================
// Module: Score Submission Validation
// Description: Turns an untrusted JSON body into a valid submission.
// Purpose: Enforce name and score constraints before any store access.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! Submissions arrive as arbitrary JSON. Validation accepts an object with a
//! non-blank string `name` and a non-negative numeric `score`, then trims and
//! truncates the name and coerces the score to an integer. Numeric strings are
//! accepted; fractional values truncate toward zero.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Number;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum player name length, in characters.
pub const DEFAULT_MAX_NAME_LENGTH: usize = 30;
/// Smallest `f64` that no longer fits in an `i64`.
const I64_UPPER_BOUND: f64 = 9_223_372_036_854_775_808.0;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    /// Trimmed name, truncated to the configured maximum.
    pub name: String,
    /// Non-negative integer score.
    pub score: i64,
}

/// Submission validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The body is not a JSON object.
    #[error("Request body must be a JSON object")]
    NotAnObject,
    /// The name is missing, not a string, or blank.
    #[error("Name is required")]
    NameRequired,
    /// The score is missing or not numeric.
    #[error("Valid score is required")]
    ScoreRequired,
    /// The score is below zero.
    #[error("Score must not be negative")]
    ScoreNegative,
    /// The score does not fit in a 64-bit integer.
    #[error("Score is out of range")]
    ScoreOutOfRange,
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates a raw submission body.
///
/// # Errors
///
/// Returns [`ValidationError`] describing the first failing field; `name` is
/// checked before `score`.
pub fn validate_submission(
    body: &Value,
    max_name_length: usize,
) -> Result<ValidSubmission, ValidationError> {
    let Value::Object(fields) = body else {
        return Err(ValidationError::NotAnObject);
    };
    let name = normalize_name(fields, max_name_length)?;
    let score = coerce_score(fields.get("score"))?;
    Ok(ValidSubmission {
        name,
        score,
    })
}

/// Trims and truncates the `name` field.
fn normalize_name(
    fields: &Map<String, Value>,
    max_name_length: usize,
) -> Result<String, ValidationError> {
    let Some(Value::String(raw)) = fields.get("name") else {
        return Err(ValidationError::NameRequired);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    Ok(trimmed.chars().take(max_name_length).collect())
}

/// Coerces the `score` field to a non-negative integer.
fn coerce_score(value: Option<&Value>) -> Result<i64, ValidationError> {
    match value {
        Some(Value::Number(number)) => coerce_number(number),
        Some(Value::String(text)) => coerce_text(text),
        _ => Err(ValidationError::ScoreRequired),
    }
}

/// Coerces a JSON number.
fn coerce_number(number: &Number) -> Result<i64, ValidationError> {
    if let Some(value) = number.as_i64() {
        return if value < 0 { Err(ValidationError::ScoreNegative) } else { Ok(value) };
    }
    if number.is_u64() {
        return Err(ValidationError::ScoreOutOfRange);
    }
    number.as_f64().map_or(Err(ValidationError::ScoreRequired), truncate_float)
}

/// Coerces a numeric string.
fn coerce_text(text: &str) -> Result<i64, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::ScoreRequired);
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return if value < 0 { Err(ValidationError::ScoreNegative) } else { Ok(value) };
    }
    trimmed.parse::<f64>().map_or(Err(ValidationError::ScoreRequired), truncate_float)
}

/// Truncates a finite, non-negative float toward zero.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Value is finite and bounds-checked against the i64 range first."
)]
fn truncate_float(value: f64) -> Result<i64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::ScoreRequired);
    }
    if value < 0.0 {
        return Err(ValidationError::ScoreNegative);
    }
    if value >= I64_UPPER_BOUND {
        return Err(ValidationError::ScoreOutOfRange);
    }
    Ok(value.trunc() as i64)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
