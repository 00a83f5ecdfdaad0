//! JSON request bodies.
//!
//! Missing string fields deserialize as empty so validation can name the
//! field instead of failing inside serde.  Unknown fields (including any
//! client-supplied slug for the new row) are ignored.

use serde::{Deserialize, Serialize};

/// One secret supplied with a new entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSecret {
    #[serde(default)]
    pub secret_label: String,
    #[serde(default)]
    pub secret_string: String,
    #[serde(default)]
    pub secret_priority: u32,
}

/// Body of CreateEntry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateEntryRequest {
    #[serde(default)]
    pub user_slug: String,
    #[serde(default)]
    pub vault_slug: String,
    #[serde(default)]
    pub entry_title: String,
    #[serde(default)]
    pub secrets: Option<Vec<NewSecret>>,
}

/// Body of CreateSecret.  Priority is never taken from the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSecretRequest {
    #[serde(default)]
    pub user_slug: String,
    #[serde(default)]
    pub vault_slug: String,
    #[serde(default)]
    pub entry_slug: String,
    #[serde(default)]
    pub secret_label: String,
    #[serde(default)]
    pub secret_string: String,
}

/// Body of UpdateSecret.  At least one field must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSecretRequest {
    #[serde(default)]
    pub secret_label: Option<String>,
    #[serde(default)]
    pub secret_string: Option<String>,
}

/// Body of MoveSecret.  The priority travels as a string and may be
/// negative or past the end; it is clamped, not rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoveSecretRequest {
    #[serde(default)]
    pub entry_slug: String,
    #[serde(default)]
    pub secret_priority: String,
}
