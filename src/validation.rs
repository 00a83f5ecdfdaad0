//! Field checks shared by every request.
//!
//! Pure functions, no shared state.  Lengths are counted in characters,
//! not bytes.  Each failure names the offending field.

use crate::errors::{Result, VaultsError};
use crate::slug::is_valid_slug;

/// Maximum length of a secret label, entry title or vault title.
pub const MAX_LABEL_LEN: usize = 255;

/// Maximum plaintext length of a secret payload.
pub const MAX_PAYLOAD_LEN: usize = 1000;

/// Require `value` to be a well-formed slug.
pub fn require_slug(field: &'static str, value: &str) -> Result<()> {
    if is_valid_slug(value) {
        Ok(())
    } else {
        Err(VaultsError::validation(field, format!("'{value}' is not a valid slug")))
    }
}

fn require_bounded(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.is_empty() {
        return Err(VaultsError::validation(field, "cannot be empty"));
    }
    let len = value.chars().count();
    if len > max {
        return Err(VaultsError::validation(field, format!("too long ({len} > {max})")));
    }
    Ok(())
}

pub fn require_label(value: &str) -> Result<()> {
    require_bounded("secret_label", value, MAX_LABEL_LEN)
}

pub fn require_payload(value: &str) -> Result<()> {
    require_bounded("secret_string", value, MAX_PAYLOAD_LEN)
}

/// Titles share the label bounds; `field` is `entry_title` or `vault_title`.
pub fn require_title(field: &'static str, value: &str) -> Result<()> {
    require_bounded(field, value, MAX_LABEL_LEN)
}

/// Parse a move request's priority, sent as a string.
///
/// Negative and over-range values are accepted here; the ordering engine
/// clamps them.
pub fn parse_priority(value: &str) -> Result<i64> {
    if value.is_empty() {
        return Err(VaultsError::validation("secret_priority", "cannot be empty"));
    }
    value
        .trim()
        .parse::<i64>()
        .map_err(|e| VaultsError::validation("secret_priority", format!("'{value}': {e}")))
}
