//! Row types for the four tables.

use chrono::{DateTime, Utc};

/// A row of `users`.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of `vaults`.
#[derive(Debug, Clone)]
pub struct VaultRecord {
    pub slug: String,
    pub user_slug: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of `entries`.
#[derive(Debug, Clone)]
pub struct EntryRecord {
    pub slug: String,
    pub user_slug: String,
    pub vault_slug: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of `secrets`.  `payload` is ciphertext (nonce || ct || tag).
#[derive(Debug, Clone)]
pub struct SecretRecord {
    pub slug: String,
    pub user_slug: String,
    pub vault_slug: String,
    pub entry_slug: String,
    pub label: String,
    pub payload: Vec<u8>,
    pub priority: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
