//! Users, vaults and entries.  No ordering or cryptographic obligations;
//! deletes cascade through the schema's foreign keys.

use chrono::Utc;
use rusqlite::Connection;
use tracing::info;

use super::views::{EntrySummary, UserView, VaultSummary, VaultView};
use super::SecretLifecycle;
use crate::errors::{Result, VaultsError};
use crate::store::queries;
use crate::store::{UserRecord, VaultRecord};
use crate::validation::{require_slug, require_title};

fn require_user(conn: &Connection, user_slug: &str) -> Result<UserRecord> {
    queries::find_user(conn, user_slug)?
        .ok_or_else(|| VaultsError::NotFound(format!("user '{user_slug}'")))
}

/// The vault, provided it belongs to `user_slug`.
fn owned_vault(conn: &Connection, user_slug: &str, vault_slug: &str) -> Result<VaultRecord> {
    queries::find_vault(conn, vault_slug)?
        .filter(|vault| vault.user_slug == user_slug)
        .ok_or_else(|| {
            VaultsError::NotFound(format!("vault '{vault_slug}' for user '{user_slug}'"))
        })
}

fn affected(rows: usize, what: impl FnOnce() -> String) -> Result<()> {
    if rows == 0 {
        Err(VaultsError::NotFound(what()))
    } else {
        Ok(())
    }
}

impl SecretLifecycle {
    // --- users ---

    pub fn create_user(&mut self) -> Result<String> {
        let now = Utc::now();
        let user = UserRecord {
            slug: self.slugs.next_slug(),
            created_at: now,
            updated_at: now,
        };
        self.db.write(|conn| queries::insert_user(conn, &user))?;
        info!(user = %user.slug, "user created");
        Ok(user.slug)
    }

    pub fn retrieve_user(&mut self, slug: &str) -> Result<UserView> {
        require_slug("user_slug", slug)?;
        self.db.read(|conn| {
            let user = require_user(conn, slug)?;
            let vaults = queries::list_user_vaults(conn, slug)?;
            Ok(UserView {
                user_slug: user.slug,
                vaults: vaults.iter().map(VaultSummary::from).collect(),
            })
        })
    }

    /// Delete a user and everything beneath it.
    pub fn delete_user(&mut self, slug: &str) -> Result<()> {
        require_slug("user_slug", slug)?;
        let rows = self.db.write(|conn| queries::delete_user(conn, slug))?;
        affected(rows, || format!("user '{slug}'"))?;
        info!(user = %slug, "user deleted");
        Ok(())
    }

    // --- vaults ---

    pub fn create_vault(&mut self, user_slug: &str, title: &str) -> Result<String> {
        require_slug("user_slug", user_slug)?;
        require_title("vault_title", title)?;

        let now = Utc::now();
        let vault = VaultRecord {
            slug: self.slugs.next_slug(),
            user_slug: user_slug.to_string(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.db.write(|conn| {
            require_user(conn, user_slug)?;
            queries::insert_vault(conn, &vault)
        })?;

        info!(vault = %vault.slug, user = %user_slug, "vault created");
        Ok(vault.slug)
    }

    pub fn list_vaults(&mut self, user_slug: &str) -> Result<Vec<VaultSummary>> {
        require_slug("user_slug", user_slug)?;
        self.db.read(|conn| {
            require_user(conn, user_slug)?;
            let vaults = queries::list_user_vaults(conn, user_slug)?;
            Ok(vaults.iter().map(VaultSummary::from).collect())
        })
    }

    /// A vault with the titles of its entries (no secrets).
    pub fn retrieve_vault(&mut self, user_slug: &str, vault_slug: &str) -> Result<VaultView> {
        require_slug("user_slug", user_slug)?;
        require_slug("vault_slug", vault_slug)?;
        self.db.read(|conn| {
            let vault = owned_vault(conn, user_slug, vault_slug)?;
            let entries = queries::list_vault_entries(conn, vault_slug)?;
            Ok(VaultView {
                vault: VaultSummary::from(&vault),
                entries: entries.iter().map(EntrySummary::from).collect(),
            })
        })
    }

    pub fn rename_vault(&mut self, user_slug: &str, vault_slug: &str, title: &str) -> Result<()> {
        require_slug("user_slug", user_slug)?;
        require_slug("vault_slug", vault_slug)?;
        require_title("vault_title", title)?;
        let now = Utc::now();
        self.db.write(|conn| {
            owned_vault(conn, user_slug, vault_slug)?;
            queries::rename_vault(conn, vault_slug, title, &now)
        })?;
        info!(vault = %vault_slug, "vault renamed");
        Ok(())
    }

    pub fn delete_vault(&mut self, user_slug: &str, vault_slug: &str) -> Result<()> {
        require_slug("user_slug", user_slug)?;
        require_slug("vault_slug", vault_slug)?;
        self.db.write(|conn| {
            owned_vault(conn, user_slug, vault_slug)?;
            queries::delete_vault(conn, vault_slug)
        })?;
        info!(vault = %vault_slug, "vault deleted");
        Ok(())
    }

    // --- entries ---

    /// Retitle an entry.  Its secrets are untouched.
    pub fn rename_entry(&mut self, slug: &str, title: &str) -> Result<()> {
        require_slug("entry_slug", slug)?;
        require_title("entry_title", title)?;
        let now = Utc::now();
        let rows = self
            .db
            .write(|conn| queries::rename_entry(conn, slug, title, &now))?;
        affected(rows, || format!("entry '{slug}'"))?;
        info!(entry = %slug, "entry renamed");
        Ok(())
    }

    /// Delete an entry and all of its secrets.
    pub fn delete_entry(&mut self, slug: &str) -> Result<()> {
        require_slug("entry_slug", slug)?;
        let rows = self.db.write(|conn| queries::delete_entry(conn, slug))?;
        affected(rows, || format!("entry '{slug}'"))?;
        info!(entry = %slug, "entry deleted");
        Ok(())
    }
}
