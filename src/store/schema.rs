//! Table definitions.
//!
//! Ownership cascades User → Vault → Entry → Secret.  Secrets carry the
//! two per-entry uniqueness rules the ordering logic depends on.
//!
//! `priority` has no `CHECK (priority >= 0)`: reorders park the shifted
//! block at negative values inside the transaction (see `queries`).

use rusqlite::Connection;

use crate::errors::Result;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    slug        TEXT PRIMARY KEY NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS vaults (
    slug        TEXT PRIMARY KEY NOT NULL,
    user_slug   TEXT NOT NULL REFERENCES users (slug) ON DELETE CASCADE,
    title       TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    CONSTRAINT unique_title_user_slug UNIQUE (user_slug, title)
);

CREATE TABLE IF NOT EXISTS entries (
    slug        TEXT PRIMARY KEY NOT NULL,
    user_slug   TEXT NOT NULL REFERENCES users (slug) ON DELETE CASCADE,
    vault_slug  TEXT NOT NULL REFERENCES vaults (slug) ON DELETE CASCADE,
    title       TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    CONSTRAINT unique_title_vault_slug UNIQUE (vault_slug, title)
);

CREATE TABLE IF NOT EXISTS secrets (
    slug        TEXT PRIMARY KEY NOT NULL,
    user_slug   TEXT NOT NULL REFERENCES users (slug) ON DELETE CASCADE,
    vault_slug  TEXT NOT NULL REFERENCES vaults (slug) ON DELETE CASCADE,
    entry_slug  TEXT NOT NULL REFERENCES entries (slug) ON DELETE CASCADE,
    label       TEXT NOT NULL,
    payload     BLOB NOT NULL,
    priority    INTEGER NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    CONSTRAINT unique_label_entry_slug UNIQUE (entry_slug, label),
    CONSTRAINT unique_priority_entry_slug UNIQUE (entry_slug, priority)
);

CREATE INDEX IF NOT EXISTS idx_vaults_user_slug ON vaults (user_slug);
CREATE INDEX IF NOT EXISTS idx_entries_vault_slug ON entries (vault_slug);
CREATE INDEX IF NOT EXISTS idx_secrets_entry_slug ON secrets (entry_slug);
";

/// Create any missing tables and indexes.  Safe to run on every open.
pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
