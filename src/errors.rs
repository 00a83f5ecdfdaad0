use std::fmt;

use thiserror::Error;

/// A uniqueness or referential rule enforced by the relational store.
///
/// Produced by the storage layer when SQLite rejects a write, so callers
/// can tell "already exists" apart from "storage unavailable".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// `(entry_slug, label)` on secrets.
    SecretLabel,
    /// `(entry_slug, priority)` on secrets.
    SecretPriority,
    /// `(vault_slug, title)` on entries.
    EntryTitle,
    /// `(user_slug, title)` on vaults.
    VaultTitle,
    /// Slug collision on the named table.
    PrimaryKey(String),
    /// A parent row referenced by the write does not exist.
    ForeignKey,
    /// Anything the classifier could not attribute.
    Other(String),
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SecretLabel => f.write_str("a secret with this label already exists in the entry"),
            Self::SecretPriority => {
                f.write_str("a secret with this priority already exists in the entry")
            }
            Self::EntryTitle => f.write_str("an entry with this title already exists in the vault"),
            Self::VaultTitle => f.write_str("a vault with this title already exists for the user"),
            Self::PrimaryKey(table) => write!(f, "slug already taken in '{table}'"),
            Self::ForeignKey => f.write_str("referenced parent record does not exist"),
            Self::Other(detail) => write!(f, "constraint violated: {detail}"),
        }
    }
}

/// All errors that can occur in SecretVaults.
#[derive(Debug, Error)]
pub enum VaultsError {
    // --- Request errors ---
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(Constraint),

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: wrong key or corrupted data")]
    DecryptionFailed,

    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    // --- Storage errors ---
    #[error("Storage error: {0}")]
    Storage(rusqlite::Error),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

impl VaultsError {
    /// Shorthand for a validation failure on `field`.
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Process exit code used by the CLI for this error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } | Self::InvalidKey(_) => 2,
            Self::NotFound(_) => 3,
            Self::Conflict(_) => 4,
            Self::DecryptionFailed => 5,
            _ => 1,
        }
    }
}

impl From<serde_json::Error> for VaultsError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

/// Convenience type alias for SecretVaults results.
pub type Result<T> = std::result::Result<T, VaultsError>;
