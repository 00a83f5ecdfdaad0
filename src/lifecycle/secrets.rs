//! Ordered, encrypted secrets.

use chrono::Utc;
use tracing::{debug, info};

use super::requests::{CreateEntryRequest, CreateSecretRequest, MoveSecretRequest, UpdateSecretRequest};
use super::views::{EntryView, SecretView};
use super::SecretLifecycle;
use crate::crypto::{decrypt_payload, encrypt_payload, EncryptionKey};
use crate::errors::{Result, VaultsError};
use crate::ordering::{self, MovePlan};
use crate::store::queries;
use crate::store::{EntryRecord, SecretRecord};
use crate::validation::{parse_priority, require_label, require_payload, require_slug, require_title};

impl SecretLifecycle {
    /// Create an entry together with its secrets.
    ///
    /// The whole batch is validated and encrypted before the transaction
    /// opens; a collision on any row rolls back the entry as well.
    /// Returns the new entry's slug.
    pub fn create_entry(&mut self, req: &CreateEntryRequest, key: &EncryptionKey) -> Result<String> {
        require_slug("user_slug", &req.user_slug)?;
        require_slug("vault_slug", &req.vault_slug)?;
        require_title("entry_title", &req.entry_title)?;
        let secrets = req
            .secrets
            .as_deref()
            .ok_or_else(|| VaultsError::validation("secrets", "is required"))?;
        ordering::validate_batch(secrets)?;

        let now = Utc::now();
        let entry = EntryRecord {
            slug: self.slugs.next_slug(),
            user_slug: req.user_slug.clone(),
            vault_slug: req.vault_slug.clone(),
            title: req.entry_title.clone(),
            created_at: now,
            updated_at: now,
        };

        let mut records = Vec::with_capacity(secrets.len());
        for secret in secrets {
            records.push(SecretRecord {
                slug: self.slugs.next_slug(),
                user_slug: entry.user_slug.clone(),
                vault_slug: entry.vault_slug.clone(),
                entry_slug: entry.slug.clone(),
                label: secret.secret_label.clone(),
                payload: encrypt_payload(key, &secret.secret_string)?,
                priority: secret.secret_priority,
                created_at: now,
                updated_at: now,
            });
        }

        self.db.write(|conn| {
            match queries::find_vault(conn, &entry.vault_slug)? {
                Some(vault) if vault.user_slug == entry.user_slug => {}
                _ => {
                    return Err(VaultsError::NotFound(format!(
                        "vault '{}' for user '{}'",
                        entry.vault_slug, entry.user_slug
                    )))
                }
            }
            queries::insert_entry(conn, &entry)?;
            for record in &records {
                queries::insert_secret(conn, record)?;
            }
            Ok(())
        })?;

        info!(entry = %entry.slug, secrets = records.len(), "entry created");
        Ok(entry.slug)
    }

    /// Append a secret to an existing entry.  Its priority is the entry's
    /// current secret count, read under the write lock.
    pub fn create_secret(&mut self, req: &CreateSecretRequest, key: &EncryptionKey) -> Result<String> {
        require_slug("user_slug", &req.user_slug)?;
        require_slug("vault_slug", &req.vault_slug)?;
        require_slug("entry_slug", &req.entry_slug)?;
        require_label(&req.secret_label)?;
        require_payload(&req.secret_string)?;

        let payload = encrypt_payload(key, &req.secret_string)?;
        let slug = self.slugs.next_slug();
        let now = Utc::now();

        let priority = self.db.write(|conn| {
            match queries::find_entry(conn, &req.entry_slug)? {
                Some(entry) if entry.vault_slug == req.vault_slug && entry.user_slug == req.user_slug => {}
                _ => return Err(VaultsError::NotFound(format!("entry '{}'", req.entry_slug))),
            }

            let priority = ordering::append_priority(queries::count_entry_secrets(conn, &req.entry_slug)?)?;
            queries::insert_secret(
                conn,
                &SecretRecord {
                    slug: slug.clone(),
                    user_slug: req.user_slug.clone(),
                    vault_slug: req.vault_slug.clone(),
                    entry_slug: req.entry_slug.clone(),
                    label: req.secret_label.clone(),
                    payload,
                    priority,
                    created_at: now,
                    updated_at: now,
                },
            )?;
            Ok(priority)
        })?;

        info!(secret = %slug, entry = %req.entry_slug, priority, "secret appended");
        Ok(slug)
    }

    /// Delete a secret and close the gap it leaves.
    pub fn delete_secret(&mut self, slug: &str) -> Result<()> {
        require_slug("secret_slug", slug)?;
        let now = Utc::now();

        let (entry_slug, shifted) = self.db.write(|conn| {
            let secret = queries::find_secret(conn, slug)?
                .ok_or_else(|| VaultsError::NotFound(format!("secret '{slug}'")))?;
            let siblings = queries::list_entry_siblings(conn, &secret.entry_slug)?;
            let plan = ordering::delete_plan(&siblings, secret.priority);

            queries::delete_secret(conn, slug)?;
            if !plan.is_empty() {
                queries::park_priorities(conn, &secret.entry_slug, &plan.slugs, plan.delta, &now)?;
                queries::restore_parked(conn, &secret.entry_slug)?;
            }
            Ok((secret.entry_slug, plan.slugs.len()))
        })?;

        info!(secret = %slug, entry = %entry_slug, shifted, "secret deleted");
        Ok(())
    }

    /// Move a secret within its entry and return the priority it landed on.
    ///
    /// Out-of-range requests are clamped.  Moving to the current priority
    /// touches no row.
    pub fn move_secret(&mut self, slug: &str, req: &MoveSecretRequest) -> Result<u32> {
        require_slug("secret_slug", slug)?;
        let requested = parse_priority(&req.secret_priority)?;
        require_slug("entry_slug", &req.entry_slug)?;
        let now = Utc::now();

        let landed = self.db.write(|conn| {
            let siblings = queries::list_entry_siblings(conn, &req.entry_slug)?;
            if siblings.is_empty() {
                return Err(VaultsError::NotFound(format!(
                    "secrets for entry '{}'",
                    req.entry_slug
                )));
            }

            match ordering::move_plan(&siblings, slug, requested)? {
                MovePlan::Unchanged { priority } => Ok(priority),
                MovePlan::Reorder { shift, slug, from, to } => {
                    debug!(secret = %slug, from, to, shifted = shift.slugs.len(), "reordering");
                    queries::park_priorities(conn, &req.entry_slug, &shift.slugs, shift.delta, &now)?;
                    queries::set_priority(conn, &slug, to, &now)?;
                    queries::restore_parked(conn, &req.entry_slug)?;
                    Ok(to)
                }
            }
        })?;

        info!(secret = %slug, entry = %req.entry_slug, priority = landed, "secret moved");
        Ok(landed)
    }

    /// Load an entry with its secrets decrypted, in priority order.
    ///
    /// One undecryptable payload fails the whole read.
    pub fn retrieve_entry(&mut self, slug: &str, key: &EncryptionKey) -> Result<EntryView> {
        require_slug("entry_slug", slug)?;

        let (entry, records) = self.db.read(|conn| {
            let entry = queries::find_entry(conn, slug)?
                .ok_or_else(|| VaultsError::NotFound(format!("entry '{slug}'")))?;
            let records = queries::list_entry_secrets(conn, slug)?;
            Ok((entry, records))
        })?;

        let secrets = records
            .into_iter()
            .map(|record| -> Result<SecretView> {
                Ok(SecretView {
                    secret_string: decrypt_payload(key, &record.payload)?,
                    secret_slug: record.slug,
                    secret_label: record.label,
                    secret_priority: record.priority,
                    secret_created_at: record.created_at,
                    secret_updated_at: record.updated_at,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(entry = %slug, secrets = secrets.len(), "entry retrieved");
        Ok(EntryView {
            entry_slug: entry.slug,
            entry_title: entry.title,
            entry_created_at: entry.created_at,
            entry_updated_at: entry.updated_at,
            secrets,
        })
    }

    /// Change a secret's label and/or payload.  Priority is untouched.
    pub fn update_secret(
        &mut self,
        slug: &str,
        req: &UpdateSecretRequest,
        key: &EncryptionKey,
    ) -> Result<()> {
        require_slug("secret_slug", slug)?;
        if req.secret_label.is_none() && req.secret_string.is_none() {
            return Err(VaultsError::validation(
                "secret",
                "one of secret_label or secret_string is required",
            ));
        }
        if let Some(label) = &req.secret_label {
            require_label(label)?;
        }
        let payload = match &req.secret_string {
            Some(plaintext) => {
                require_payload(plaintext)?;
                Some(encrypt_payload(key, plaintext)?)
            }
            None => None,
        };
        let now = Utc::now();

        let updated = self.db.write(|conn| {
            queries::update_secret_fields(
                conn,
                slug,
                req.secret_label.as_deref(),
                payload.as_deref(),
                &now,
            )
        })?;
        if updated == 0 {
            return Err(VaultsError::NotFound(format!("secret '{slug}'")));
        }

        info!(secret = %slug, relabelled = req.secret_label.is_some(), "secret updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::requests::NewSecret;
    use crate::store::Database;

    struct Fixture {
        lifecycle: SecretLifecycle,
        key: EncryptionKey,
        user: String,
        vault: String,
    }

    fn fixture() -> Fixture {
        let mut lifecycle = SecretLifecycle::new(Database::open_in_memory().unwrap());
        let user = lifecycle.create_user().unwrap();
        let vault = lifecycle.create_vault(&user, "Personal").unwrap();
        Fixture {
            lifecycle,
            key: EncryptionKey::generate(),
            user,
            vault,
        }
    }

    fn entry_request(f: &Fixture, labels: &[&str]) -> CreateEntryRequest {
        CreateEntryRequest {
            user_slug: f.user.clone(),
            vault_slug: f.vault.clone(),
            entry_title: "Login".into(),
            secrets: Some(
                labels
                    .iter()
                    .enumerate()
                    .map(|(i, label)| NewSecret {
                        secret_label: label.to_string(),
                        secret_string: format!("value-{label}"),
                        secret_priority: i as u32,
                    })
                    .collect(),
            ),
        }
    }

    #[test]
    fn append_lands_at_count() {
        let mut f = fixture();
        let req = entry_request(&f, &["user", "pass"]);
        let entry = f.lifecycle.create_entry(&req, &f.key).unwrap();

        let add = CreateSecretRequest {
            user_slug: f.user.clone(),
            vault_slug: f.vault.clone(),
            entry_slug: entry.clone(),
            secret_label: "otp".into(),
            secret_string: "123456".into(),
        };
        let slug = f.lifecycle.create_secret(&add, &f.key).unwrap();

        let view = f.lifecycle.retrieve_entry(&entry, &f.key).unwrap();
        let appended = view.secrets.iter().find(|s| s.secret_slug == slug).unwrap();
        assert_eq!(appended.secret_priority, 2);
        assert_eq!(appended.secret_string, "123456");
    }

    #[test]
    fn append_checks_ancestry() {
        let mut f = fixture();
        let req = entry_request(&f, &["user"]);
        let entry = f.lifecycle.create_entry(&req, &f.key).unwrap();
        let other_vault = f.lifecycle.create_vault(&f.user, "Work").unwrap();

        let add = CreateSecretRequest {
            user_slug: f.user.clone(),
            vault_slug: other_vault,
            entry_slug: entry,
            secret_label: "otp".into(),
            secret_string: "1".into(),
        };
        let err = f.lifecycle.create_secret(&add, &f.key).unwrap_err();
        assert!(matches!(err, VaultsError::NotFound(_)));
    }

    #[test]
    fn entry_in_foreign_vault_is_not_found() {
        let mut f = fixture();
        let stranger = f.lifecycle.create_user().unwrap();
        let mut req = entry_request(&f, &["user"]);
        req.user_slug = stranger;
        let err = f.lifecycle.create_entry(&req, &f.key).unwrap_err();
        assert!(matches!(err, VaultsError::NotFound(_)));
    }

    #[test]
    fn missing_secrets_array_is_rejected() {
        let mut f = fixture();
        let mut req = entry_request(&f, &[]);
        req.secrets = None;
        let err = f.lifecycle.create_entry(&req, &f.key).unwrap_err();
        assert!(matches!(err, VaultsError::Validation { field: "secrets", .. }));
    }

    #[test]
    fn update_requires_a_field() {
        let mut f = fixture();
        let err = f
            .lifecycle
            .update_secret(&crate::slug::generate_slug(), &UpdateSecretRequest::default(), &f.key)
            .unwrap_err();
        assert!(matches!(err, VaultsError::Validation { field: "secret", .. }));
    }

    #[test]
    fn move_with_bad_priority_is_validation_error() {
        let mut f = fixture();
        let req = MoveSecretRequest {
            entry_slug: crate::slug::generate_slug(),
            secret_priority: "first".into(),
        };
        let err = f
            .lifecycle
            .move_secret(&crate::slug::generate_slug(), &req)
            .unwrap_err();
        assert!(matches!(err, VaultsError::Validation { field: "secret_priority", .. }));
    }

    #[test]
    fn move_in_empty_entry_is_not_found() {
        let mut f = fixture();
        let req = MoveSecretRequest {
            entry_slug: crate::slug::generate_slug(),
            secret_priority: "0".into(),
        };
        let err = f
            .lifecycle
            .move_secret(&crate::slug::generate_slug(), &req)
            .unwrap_err();
        assert!(matches!(err, VaultsError::NotFound(msg) if msg.starts_with("secrets for entry")));
    }
}
