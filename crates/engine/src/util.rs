//! Internal helpers for input validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! text-field rules so every operation enforces them the same way.

use uuid::Uuid;

use crate::ValidationError;

/// Characters used in invite codes. No `0/O` or `1/I`.
const INVITE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub(crate) const INVITE_CODE_LEN: usize = 6;

/// Trim `value` and check that its length (in chars) lies in `min..=max`.
pub(crate) fn normalize_text(
    value: &str,
    field: &'static str,
    min: usize,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < min {
        return Err(if min == 1 {
            ValidationError::field(field, "must not be empty")
        } else {
            ValidationError::field(field, format!("must be at least {min} characters"))
        });
    }
    if len > max {
        return Err(ValidationError::field(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Like [`normalize_text`] for optional fields; blank becomes empty.
pub(crate) fn normalize_optional_text(
    value: Option<&str>,
    field: &'static str,
    max: usize,
) -> Result<String, ValidationError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => normalize_text(text, field, 1, max),
        None => Ok(String::new()),
    }
}

/// Derive an invite code from the random bytes of a fresh v4 UUID.
pub(crate) fn new_invite_code() -> String {
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(INVITE_CODE_LEN)
        .map(|b| char::from(INVITE_ALPHABET[usize::from(*b) % INVITE_ALPHABET.len()]))
        .collect()
}

/// Normalize a user supplied invite code (`abc123 ` -> `ABC123`).
pub(crate) fn normalize_invite_code(code: &str) -> Result<String, ValidationError> {
    let code = code.trim().to_ascii_uppercase();
    if code.chars().count() != INVITE_CODE_LEN || !code.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(ValidationError::field(
            "invite code",
            format!("must be {INVITE_CODE_LEN} letters or digits"),
        ));
    }
    Ok(code)
}
