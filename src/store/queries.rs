//! Row-level reads and writes.
//!
//! Every function takes a `&Connection` so it can run inside the
//! transaction opened by `Database::write`.  Functions that update or
//! delete by slug return the number of affected rows; callers turn 0
//! into `NotFound`.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::records::{EntryRecord, SecretRecord, UserRecord, VaultRecord};
use crate::errors::Result;
use crate::ordering::Sibling;

/// Fixed-width RFC 3339 with nanoseconds, so text order is time order.
pub fn encode_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn priority_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<u32> {
    let raw: i64 = row.get(idx)?;
    u32::try_from(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

// ---------------------------------------------------------------------------
// users
// ---------------------------------------------------------------------------

pub fn insert_user(conn: &Connection, user: &UserRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO users (slug, created_at, updated_at) VALUES (?1, ?2, ?3)",
        params![user.slug, encode_ts(&user.created_at), encode_ts(&user.updated_at)],
    )?;
    Ok(())
}

pub fn find_user(conn: &Connection, slug: &str) -> Result<Option<UserRecord>> {
    let user = conn
        .query_row(
            "SELECT slug, created_at, updated_at FROM users WHERE slug = ?1",
            params![slug],
            |row| {
                Ok(UserRecord {
                    slug: row.get(0)?,
                    created_at: ts_column(row, 1)?,
                    updated_at: ts_column(row, 2)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

pub fn delete_user(conn: &Connection, slug: &str) -> Result<usize> {
    Ok(conn.execute("DELETE FROM users WHERE slug = ?1", params![slug])?)
}

// ---------------------------------------------------------------------------
// vaults
// ---------------------------------------------------------------------------

const VAULT_COLUMNS: &str = "slug, user_slug, title, created_at, updated_at";

fn row_to_vault(row: &Row<'_>) -> rusqlite::Result<VaultRecord> {
    Ok(VaultRecord {
        slug: row.get(0)?,
        user_slug: row.get(1)?,
        title: row.get(2)?,
        created_at: ts_column(row, 3)?,
        updated_at: ts_column(row, 4)?,
    })
}

pub fn insert_vault(conn: &Connection, vault: &VaultRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO vaults (slug, user_slug, title, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            vault.slug,
            vault.user_slug,
            vault.title,
            encode_ts(&vault.created_at),
            encode_ts(&vault.updated_at)
        ],
    )?;
    Ok(())
}

pub fn find_vault(conn: &Connection, slug: &str) -> Result<Option<VaultRecord>> {
    let sql = format!("SELECT {VAULT_COLUMNS} FROM vaults WHERE slug = ?1");
    Ok(conn.query_row(&sql, params![slug], row_to_vault).optional()?)
}

/// Vaults owned by `user_slug`, oldest first.
pub fn list_user_vaults(conn: &Connection, user_slug: &str) -> Result<Vec<VaultRecord>> {
    let sql = format!(
        "SELECT {VAULT_COLUMNS} FROM vaults WHERE user_slug = ?1 ORDER BY created_at, title"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_slug], row_to_vault)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn rename_vault(conn: &Connection, slug: &str, title: &str, now: &DateTime<Utc>) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE vaults SET title = ?1, updated_at = ?2 WHERE slug = ?3",
        params![title, encode_ts(now), slug],
    )?)
}

pub fn delete_vault(conn: &Connection, slug: &str) -> Result<usize> {
    Ok(conn.execute("DELETE FROM vaults WHERE slug = ?1", params![slug])?)
}

// ---------------------------------------------------------------------------
// entries
// ---------------------------------------------------------------------------

const ENTRY_COLUMNS: &str = "slug, user_slug, vault_slug, title, created_at, updated_at";

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<EntryRecord> {
    Ok(EntryRecord {
        slug: row.get(0)?,
        user_slug: row.get(1)?,
        vault_slug: row.get(2)?,
        title: row.get(3)?,
        created_at: ts_column(row, 4)?,
        updated_at: ts_column(row, 5)?,
    })
}

pub fn insert_entry(conn: &Connection, entry: &EntryRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO entries (slug, user_slug, vault_slug, title, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.slug,
            entry.user_slug,
            entry.vault_slug,
            entry.title,
            encode_ts(&entry.created_at),
            encode_ts(&entry.updated_at)
        ],
    )?;
    Ok(())
}

pub fn find_entry(conn: &Connection, slug: &str) -> Result<Option<EntryRecord>> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE slug = ?1");
    Ok(conn.query_row(&sql, params![slug], row_to_entry).optional()?)
}

/// Entries of `vault_slug`, oldest first.
pub fn list_vault_entries(conn: &Connection, vault_slug: &str) -> Result<Vec<EntryRecord>> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM entries WHERE vault_slug = ?1 ORDER BY created_at, title"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![vault_slug], row_to_entry)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn rename_entry(conn: &Connection, slug: &str, title: &str, now: &DateTime<Utc>) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE entries SET title = ?1, updated_at = ?2 WHERE slug = ?3",
        params![title, encode_ts(now), slug],
    )?)
}

pub fn delete_entry(conn: &Connection, slug: &str) -> Result<usize> {
    Ok(conn.execute("DELETE FROM entries WHERE slug = ?1", params![slug])?)
}

// ---------------------------------------------------------------------------
// secrets
// ---------------------------------------------------------------------------

const SECRET_COLUMNS: &str =
    "slug, user_slug, vault_slug, entry_slug, label, payload, priority, created_at, updated_at";

fn row_to_secret(row: &Row<'_>) -> rusqlite::Result<SecretRecord> {
    Ok(SecretRecord {
        slug: row.get(0)?,
        user_slug: row.get(1)?,
        vault_slug: row.get(2)?,
        entry_slug: row.get(3)?,
        label: row.get(4)?,
        payload: row.get(5)?,
        priority: priority_column(row, 6)?,
        created_at: ts_column(row, 7)?,
        updated_at: ts_column(row, 8)?,
    })
}

pub fn insert_secret(conn: &Connection, secret: &SecretRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO secrets (slug, user_slug, vault_slug, entry_slug, label, payload,
                              priority, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            secret.slug,
            secret.user_slug,
            secret.vault_slug,
            secret.entry_slug,
            secret.label,
            secret.payload,
            i64::from(secret.priority),
            encode_ts(&secret.created_at),
            encode_ts(&secret.updated_at)
        ],
    )?;
    Ok(())
}

pub fn find_secret(conn: &Connection, slug: &str) -> Result<Option<SecretRecord>> {
    let sql = format!("SELECT {SECRET_COLUMNS} FROM secrets WHERE slug = ?1");
    Ok(conn.query_row(&sql, params![slug], row_to_secret).optional()?)
}

/// All secrets of an entry in display order.
pub fn list_entry_secrets(conn: &Connection, entry_slug: &str) -> Result<Vec<SecretRecord>> {
    let sql = format!(
        "SELECT {SECRET_COLUMNS} FROM secrets WHERE entry_slug = ?1
         ORDER BY priority ASC, created_at ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![entry_slug], row_to_secret)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// `(slug, priority)` of every secret in an entry, without payloads.
pub fn list_entry_siblings(conn: &Connection, entry_slug: &str) -> Result<Vec<Sibling>> {
    let mut stmt = conn.prepare(
        "SELECT slug, priority FROM secrets WHERE entry_slug = ?1 ORDER BY priority ASC",
    )?;
    let rows = stmt.query_map(params![entry_slug], |row| {
        Ok(Sibling {
            slug: row.get(0)?,
            priority: priority_column(row, 1)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn count_entry_secrets(conn: &Connection, entry_slug: &str) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM secrets WHERE entry_slug = ?1",
        params![entry_slug],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(count).unwrap_or_default())
}

/// Move `slugs` by `delta` into the negative parking range.
///
/// SQLite checks `UNIQUE (entry_slug, priority)` row by row during an
/// UPDATE, so shifting a block in place can collide with itself.  Parked
/// value `-1 - (priority + delta)` is unique and never clashes with a live
/// priority; `restore_parked` flips it back.  Both statements stamp the
/// same `now`.
pub fn park_priorities(
    conn: &Connection,
    entry_slug: &str,
    slugs: &[String],
    delta: i64,
    now: &DateTime<Utc>,
) -> Result<usize> {
    if slugs.is_empty() {
        return Ok(0);
    }

    let placeholders = (0..slugs.len())
        .map(|i| format!("?{}", i + 4))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE secrets SET priority = -1 - (priority + ?1), updated_at = ?2
         WHERE entry_slug = ?3 AND slug IN ({placeholders})"
    );

    let now = encode_ts(now);
    let mut values: Vec<&dyn ToSql> = Vec::with_capacity(slugs.len() + 3);
    values.push(&delta);
    values.push(&now);
    values.push(&entry_slug);
    values.extend(slugs.iter().map(|s| s as &dyn ToSql));

    Ok(conn.execute(&sql, values.as_slice())?)
}

/// Bring every parked row of an entry back to its shifted priority.
pub fn restore_parked(conn: &Connection, entry_slug: &str) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE secrets SET priority = -1 - priority WHERE entry_slug = ?1 AND priority < 0",
        params![entry_slug],
    )?)
}

pub fn set_priority(conn: &Connection, slug: &str, priority: u32, now: &DateTime<Utc>) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE secrets SET priority = ?1, updated_at = ?2 WHERE slug = ?3",
        params![i64::from(priority), encode_ts(now), slug],
    )?)
}

/// Update label and/or payload; priority is left alone.
pub fn update_secret_fields(
    conn: &Connection,
    slug: &str,
    label: Option<&str>,
    payload: Option<&[u8]>,
    now: &DateTime<Utc>,
) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE secrets
         SET label = COALESCE(?1, label), payload = COALESCE(?2, payload), updated_at = ?3
         WHERE slug = ?4",
        params![label, payload, encode_ts(now), slug],
    )?)
}

pub fn delete_secret(conn: &Connection, slug: &str) -> Result<usize> {
    Ok(conn.execute("DELETE FROM secrets WHERE slug = ?1", params![slug])?)
}
