//! JSON response shapes.  Secrets nest under their entry in priority order.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use zeroize::Zeroize;

use crate::store::{EntryRecord, VaultRecord};

/// A decrypted secret.  The plaintext is wiped when the view is dropped.
#[derive(Clone, Serialize)]
pub struct SecretView {
    pub secret_slug: String,
    pub secret_label: String,
    pub secret_string: String,
    pub secret_priority: u32,
    pub secret_created_at: DateTime<Utc>,
    pub secret_updated_at: DateTime<Utc>,
}

impl Drop for SecretView {
    fn drop(&mut self) {
        self.secret_string.zeroize();
    }
}

impl fmt::Debug for SecretView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretView")
            .field("secret_slug", &self.secret_slug)
            .field("secret_label", &self.secret_label)
            .field("secret_string", &"<redacted>")
            .field("secret_priority", &self.secret_priority)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    pub entry_slug: String,
    pub entry_title: String,
    pub entry_created_at: DateTime<Utc>,
    pub entry_updated_at: DateTime<Utc>,
    pub secrets: Vec<SecretView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary {
    pub entry_slug: String,
    pub entry_title: String,
    pub entry_created_at: DateTime<Utc>,
    pub entry_updated_at: DateTime<Utc>,
}

impl From<&EntryRecord> for EntrySummary {
    fn from(entry: &EntryRecord) -> Self {
        Self {
            entry_slug: entry.slug.clone(),
            entry_title: entry.title.clone(),
            entry_created_at: entry.created_at,
            entry_updated_at: entry.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VaultSummary {
    pub vault_slug: String,
    pub vault_title: String,
    pub vault_created_at: DateTime<Utc>,
    pub vault_updated_at: DateTime<Utc>,
}

impl From<&VaultRecord> for VaultSummary {
    fn from(vault: &VaultRecord) -> Self {
        Self {
            vault_slug: vault.slug.clone(),
            vault_title: vault.title.clone(),
            vault_created_at: vault.created_at,
            vault_updated_at: vault.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VaultView {
    #[serde(flatten)]
    pub vault: VaultSummary,
    pub entries: Vec<EntrySummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub user_slug: String,
    pub vaults: Vec<VaultSummary>,
}
