//! Connection handling, transactions, and storage error classification.

use std::path::Path;
use std::time::Duration;

use rusqlite::{ffi, Connection, ErrorCode, TransactionBehavior};

use super::schema;
use crate::errors::{Constraint, Result, VaultsError};

/// Handle to the relational store.
///
/// One `Database` serves one request at a time; concurrent workers each
/// open their own connection and rely on SQLite's write lock for
/// isolation.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file at `path` and apply the schema.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // The file holds ciphertext only, but keep it owner-only anyway.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(path, perms);
        }

        conn.busy_timeout(busy_timeout)?;
        Self::prepare(conn)
    }

    /// A private in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        schema::migrate(&conn)?;
        tracing::debug!("database schema ready");
        Ok(Self { conn })
    }

    /// Run `f` inside an `IMMEDIATE` transaction.
    ///
    /// The write lock is taken before `f` performs its first read, so a
    /// sibling count or snapshot cannot go stale before the writes land.
    /// Commits on `Ok`; on `Err` the transaction is dropped and rolled back.
    pub fn write<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let conn: &Connection = &tx;
        let value = f(conn)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run `f` inside a read transaction so multi-query reads see one snapshot.
    pub fn read<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let tx = self.conn.transaction()?;
        let conn: &Connection = &tx;
        f(conn)
    }
}

impl From<rusqlite::Error> for VaultsError {
    fn from(err: rusqlite::Error) -> Self {
        classify(err)
    }
}

/// Turn a SQLite failure into a typed error.
///
/// Constraint violations become `Conflict` with the rule that was hit;
/// everything else is a plain `Storage` error.
fn classify(err: rusqlite::Error) -> VaultsError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            let message = message.as_deref().unwrap_or_default();
            let constraint = match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Constraint::ForeignKey,
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    unique_constraint(message)
                }
                _ => Constraint::Other(message.to_string()),
            };
            return VaultsError::Conflict(constraint);
        }
    }
    VaultsError::Storage(err)
}

/// Map the column list SQLite reports ("UNIQUE constraint failed:
/// secrets.entry_slug, secrets.label") onto the schema's named rules.
fn unique_constraint(message: &str) -> Constraint {
    let columns: Vec<&str> = message
        .rsplit_once(": ")
        .map_or(message, |(_, cols)| cols)
        .split(',')
        .map(str::trim)
        .collect();

    match columns.as_slice() {
        ["secrets.entry_slug", "secrets.label"] => Constraint::SecretLabel,
        ["secrets.entry_slug", "secrets.priority"] => Constraint::SecretPriority,
        ["entries.vault_slug", "entries.title"] => Constraint::EntryTitle,
        ["vaults.user_slug", "vaults.title"] => Constraint::VaultTitle,
        [single] => match single.strip_suffix(".slug") {
            Some(table) => Constraint::PrimaryKey(table.to_string()),
            None => Constraint::Other(message.to_string()),
        },
        _ => Constraint::Other(message.to_string()),
    }
}
