//! End-to-end tests of the secret lifecycle against a SQLite file.
//!
//! Covers priority density across mixed operations, delete and move
//! shifting, clamping, transactional rollback, decryption failures and
//! cascading deletes.

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tempfile::TempDir;

use secretvaults::crypto::EncryptionKey;
use secretvaults::errors::{Constraint, VaultsError};
use secretvaults::lifecycle::{
    CreateEntryRequest, CreateSecretRequest, EntryView, MoveSecretRequest, NewSecret,
    SecretLifecycle, UpdateSecretRequest,
};
use secretvaults::ordering::is_dense;
use secretvaults::slug::{generate_slug, SlugGenerator};
use secretvaults::store::{queries, Database};

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    _dir: TempDir,
    path: std::path::PathBuf,
    lc: SecretLifecycle,
    key: EncryptionKey,
    user: String,
    vault: String,
}

fn open(path: &std::path::Path) -> Database {
    Database::open(path, Duration::from_secs(5)).expect("open database")
}

fn harness() -> Harness {
    harness_with(None)
}

fn harness_with(slugs: Option<Box<dyn SlugGenerator>>) -> Harness {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vaults.db");
    let db = open(&path);
    let mut lc = match slugs {
        Some(gen) => SecretLifecycle::with_slug_generator(db, gen),
        None => SecretLifecycle::new(db),
    };
    let user = lc.create_user().unwrap();
    let vault = lc.create_vault(&user, "Personal").unwrap();
    Harness {
        _dir: dir,
        path,
        lc,
        key: EncryptionKey::generate(),
        user,
        vault,
    }
}

impl Harness {
    /// Create an entry whose secrets are labelled `s0..s{n-1}` at priorities `0..n`.
    fn entry_with(&mut self, n: u32) -> String {
        let req = CreateEntryRequest {
            user_slug: self.user.clone(),
            vault_slug: self.vault.clone(),
            entry_title: format!("Entry {}", generate_slug()),
            secrets: Some(
                (0..n)
                    .map(|i| NewSecret {
                        secret_label: format!("s{i}"),
                        secret_string: format!("value {i}"),
                        secret_priority: i,
                    })
                    .collect(),
            ),
        };
        self.lc.create_entry(&req, &self.key).unwrap()
    }

    fn append(&mut self, entry: &str, label: &str) -> String {
        let req = CreateSecretRequest {
            user_slug: self.user.clone(),
            vault_slug: self.vault.clone(),
            entry_slug: entry.to_string(),
            secret_label: label.to_string(),
            secret_string: format!("value of {label}"),
        };
        self.lc.create_secret(&req, &self.key).unwrap()
    }

    fn view(&mut self, entry: &str) -> EntryView {
        self.lc.retrieve_entry(entry, &self.key).unwrap()
    }

    /// Slug of the secret currently at `priority`.
    fn slug_at(&mut self, entry: &str, priority: u32) -> String {
        self.view(entry)
            .secrets
            .iter()
            .find(|s| s.secret_priority == priority)
            .map(|s| s.secret_slug.clone())
            .unwrap()
    }

    fn move_to(&mut self, entry: &str, secret: &str, priority: &str) -> u32 {
        let req = MoveSecretRequest {
            entry_slug: entry.to_string(),
            secret_priority: priority.to_string(),
        };
        self.lc.move_secret(secret, &req).unwrap()
    }

    fn assert_dense(&mut self, entry: &str) {
        let view = self.view(entry);
        assert!(
            is_dense(view.secrets.iter().map(|s| s.secret_priority)),
            "priorities not dense: {:?}",
            view.secrets.iter().map(|s| s.secret_priority).collect::<Vec<_>>()
        );
    }
}

/// (priority, updated_at) keyed by label.
fn snapshot(view: &EntryView) -> Vec<(String, u32, DateTime<Utc>)> {
    let mut rows: Vec<_> = view
        .secrets
        .iter()
        .map(|s| (s.secret_label.clone(), s.secret_priority, s.secret_updated_at))
        .collect();
    rows.sort();
    rows
}

fn find<'a>(rows: &'a [(String, u32, DateTime<Utc>)], label: &str) -> &'a (String, u32, DateTime<Utc>) {
    rows.iter().find(|r| r.0 == label).unwrap()
}

fn pause() {
    thread::sleep(Duration::from_millis(10));
}

/// Hands out queued slugs first, then random ones.
struct ScriptedSlugs(VecDeque<String>);

impl SlugGenerator for ScriptedSlugs {
    fn next_slug(&mut self) -> String {
        self.0.pop_front().unwrap_or_else(generate_slug)
    }
}

// ---------------------------------------------------------------------------
// Density
// ---------------------------------------------------------------------------

#[test]
fn priorities_stay_dense_across_mixed_operations() {
    let mut h = harness();
    let entry = h.entry_with(3);
    h.assert_dense(&entry);

    for label in ["a", "b", "c"] {
        h.append(&entry, label);
        h.assert_dense(&entry);
    }
    assert_eq!(h.view(&entry).secrets.len(), 6);

    let middle = h.slug_at(&entry, 2);
    h.lc.delete_secret(&middle).unwrap();
    h.assert_dense(&entry);

    let last = h.slug_at(&entry, 4);
    assert_eq!(h.move_to(&entry, &last, "-1"), 0);
    h.assert_dense(&entry);

    let first = h.slug_at(&entry, 0);
    assert_eq!(h.move_to(&entry, &first, "100"), 4);
    h.assert_dense(&entry);

    let head = h.slug_at(&entry, 0);
    h.lc.delete_secret(&head).unwrap();
    h.append(&entry, "d");
    h.assert_dense(&entry);
    assert_eq!(h.view(&entry).secrets.len(), 5);
}

#[test]
fn appended_secret_lands_at_count() {
    let mut h = harness();
    let entry = h.entry_with(0);
    let first = h.append(&entry, "first");
    let second = h.append(&entry, "second");

    assert_eq!(h.slug_at(&entry, 0), first);
    assert_eq!(h.slug_at(&entry, 1), second);
}

#[test]
fn concurrent_appends_never_share_a_priority() {
    let mut h = harness();
    let entry = h.entry_with(1);

    let workers: Vec<_> = (0..4)
        .map(|w| {
            let path = h.path.clone();
            let key = h.key.clone();
            let req = CreateSecretRequest {
                user_slug: h.user.clone(),
                vault_slug: h.vault.clone(),
                entry_slug: entry.clone(),
                secret_label: String::new(),
                secret_string: "v".into(),
            };
            thread::spawn(move || {
                let mut lc = SecretLifecycle::new(open(&path));
                for i in 0..5 {
                    let req = CreateSecretRequest {
                        secret_label: format!("w{w}-{i}"),
                        ..req.clone()
                    };
                    lc.create_secret(&req, &key).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let view = h.view(&entry);
    assert_eq!(view.secrets.len(), 21);
    h.assert_dense(&entry);
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[test]
fn delete_shifts_later_secrets_down() {
    let mut h = harness();
    let entry = h.entry_with(4);
    let before = snapshot(&h.view(&entry));
    pause();

    let target = h.slug_at(&entry, 1);
    h.lc.delete_secret(&target).unwrap();

    let after = snapshot(&h.view(&entry));
    assert_eq!(after.len(), 3);
    assert_eq!(find(&after, "s0").1, 0);
    assert_eq!(find(&after, "s2").1, 1);
    assert_eq!(find(&after, "s3").1, 2);

    // Untouched row keeps its timestamp; shifted rows share a new one.
    assert_eq!(find(&after, "s0").2, find(&before, "s0").2);
    assert!(find(&after, "s2").2 > find(&before, "s2").2);
    assert!(find(&after, "s3").2 > find(&before, "s3").2);
    assert_eq!(find(&after, "s2").2, find(&after, "s3").2);
}

#[test]
fn delete_last_secret_touches_nothing_else() {
    let mut h = harness();
    let entry = h.entry_with(3);
    let before = snapshot(&h.view(&entry));
    pause();

    let last = h.slug_at(&entry, 2);
    h.lc.delete_secret(&last).unwrap();

    let after = snapshot(&h.view(&entry));
    assert_eq!(after, before[..2].to_vec());
}

#[test]
fn delete_missing_secret_is_not_found() {
    let mut h = harness();
    let err = h.lc.delete_secret(&generate_slug()).unwrap_err();
    assert!(matches!(err, VaultsError::NotFound(_)));
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

#[test]
fn move_to_current_priority_changes_nothing() {
    let mut h = harness();
    let entry = h.entry_with(3);
    let before = snapshot(&h.view(&entry));
    pause();

    let target = h.slug_at(&entry, 1);
    assert_eq!(h.move_to(&entry, &target, "1"), 1);

    assert_eq!(snapshot(&h.view(&entry)), before);
}

#[test]
fn move_up_shifts_exactly_the_block_in_between() {
    let mut h = harness();
    let entry = h.entry_with(5);
    let before = snapshot(&h.view(&entry));
    pause();

    let a = h.slug_at(&entry, 2);
    assert_eq!(h.move_to(&entry, &a, "0"), 0);

    let after = snapshot(&h.view(&entry));
    assert_eq!(find(&after, "s2").1, 0);
    assert_eq!(find(&after, "s0").1, 1);
    assert_eq!(find(&after, "s1").1, 2);
    assert_eq!(find(&after, "s3").1, 3);
    assert_eq!(find(&after, "s4").1, 4);

    for untouched in ["s3", "s4"] {
        assert_eq!(find(&after, untouched).2, find(&before, untouched).2);
    }
    let moved_at = find(&after, "s2").2;
    assert!(moved_at > find(&before, "s2").2);
    assert_eq!(find(&after, "s0").2, moved_at);
    assert_eq!(find(&after, "s1").2, moved_at);
}

#[test]
fn move_down_pulls_the_block_up() {
    let mut h = harness();
    let entry = h.entry_with(5);

    let a = h.slug_at(&entry, 1);
    assert_eq!(h.move_to(&entry, &a, "3"), 3);

    let after = snapshot(&h.view(&entry));
    let order: Vec<(&str, u32)> = ["s0", "s2", "s3", "s1", "s4"]
        .iter()
        .map(|l| (*l, find(&after, l).1))
        .collect();
    assert_eq!(order, vec![("s0", 0), ("s2", 1), ("s3", 2), ("s1", 3), ("s4", 4)]);
}

#[test]
fn out_of_range_moves_are_clamped() {
    let mut h = harness();
    let entry = h.entry_with(7);

    let a = h.slug_at(&entry, 3);
    assert_eq!(h.move_to(&entry, &a, "-5"), 0);
    assert_eq!(h.slug_at(&entry, 0), a);

    let b = h.slug_at(&entry, 2);
    assert_eq!(h.move_to(&entry, &b, "10"), 6);
    assert_eq!(h.slug_at(&entry, 6), b);

    h.assert_dense(&entry);
}

#[test]
fn single_secret_always_sits_at_zero() {
    let mut h = harness();
    let entry = h.entry_with(1);
    let only = h.slug_at(&entry, 0);
    assert_eq!(h.move_to(&entry, &only, "5"), 0);
    assert_eq!(h.move_to(&entry, &only, "-3"), 0);
}

#[test]
fn move_requires_secret_in_named_entry() {
    let mut h = harness();
    let entry = h.entry_with(2);
    let other = h.entry_with(2);
    let stranger = h.slug_at(&other, 0);

    let req = MoveSecretRequest {
        entry_slug: entry,
        secret_priority: "1".into(),
    };
    let err = h.lc.move_secret(&stranger, &req).unwrap_err();
    assert!(matches!(err, VaultsError::NotFound(_)));
}

#[test]
fn move_rejects_malformed_input() {
    let mut h = harness();
    let entry = h.entry_with(2);
    let target = h.slug_at(&entry, 0);

    for (entry_slug, priority, field) in [
        (entry.as_str(), "", "secret_priority"),
        (entry.as_str(), "1.5", "secret_priority"),
        ("not-a-slug", "1", "entry_slug"),
    ] {
        let req = MoveSecretRequest {
            entry_slug: entry_slug.to_string(),
            secret_priority: priority.to_string(),
        };
        match h.lc.move_secret(&target, &req) {
            Err(VaultsError::Validation { field: got, .. }) => assert_eq!(got, field),
            other => panic!("expected validation error on {field}, got {other:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Create / atomicity
// ---------------------------------------------------------------------------

#[test]
fn slug_collision_rolls_back_whole_entry() {
    let user = generate_slug();
    let vault = generate_slug();
    let entry = generate_slug();
    let secret = generate_slug();
    let slugs = ScriptedSlugs(VecDeque::from(vec![
        user,
        vault,
        entry.clone(),
        secret.clone(),
        secret,
    ]));
    let mut h = harness_with(Some(Box::new(slugs)));

    let req = CreateEntryRequest {
        user_slug: h.user.clone(),
        vault_slug: h.vault.clone(),
        entry_title: "Login".into(),
        secrets: Some(vec![
            NewSecret {
                secret_label: "user".into(),
                secret_string: "alice".into(),
                secret_priority: 0,
            },
            NewSecret {
                secret_label: "pass".into(),
                secret_string: "hunter2".into(),
                secret_priority: 1,
            },
        ]),
    };
    let err = h.lc.create_entry(&req, &h.key).unwrap_err();
    assert!(matches!(err, VaultsError::Conflict(Constraint::PrimaryKey(ref t)) if t == "secrets"));

    assert!(matches!(
        h.lc.retrieve_entry(&entry, &h.key),
        Err(VaultsError::NotFound(_))
    ));
    let stored: usize = h
        .lc
        .database()
        .read(|conn| queries::count_entry_secrets(conn, &entry))
        .unwrap();
    assert_eq!(stored, 0);
    assert!(h.lc.retrieve_vault(&h.user, &h.vault).unwrap().entries.is_empty());
}

#[test]
fn invalid_batches_write_nothing() {
    let mut h = harness();
    let secret = |label: &str, priority: u32| NewSecret {
        secret_label: label.into(),
        secret_string: "v".into(),
        secret_priority: priority,
    };

    for secrets in [
        vec![secret("a", 0), secret("a", 1)],
        vec![secret("a", 0), secret("b", 0)],
        vec![secret("a", 0), secret("b", 2)],
        vec![secret("", 0)],
        vec![secret(&"x".repeat(256), 0)],
    ] {
        let req = CreateEntryRequest {
            user_slug: h.user.clone(),
            vault_slug: h.vault.clone(),
            entry_title: "Login".into(),
            secrets: Some(secrets),
        };
        let err = h.lc.create_entry(&req, &h.key).unwrap_err();
        assert!(matches!(err, VaultsError::Validation { field: "secrets", .. }));
    }

    assert!(h.lc.retrieve_vault(&h.user, &h.vault).unwrap().entries.is_empty());
}

#[test]
fn duplicate_entry_title_is_conflict() {
    let mut h = harness();
    let req = CreateEntryRequest {
        user_slug: h.user.clone(),
        vault_slug: h.vault.clone(),
        entry_title: "Login".into(),
        secrets: Some(vec![]),
    };
    h.lc.create_entry(&req, &h.key).unwrap();
    let err = h.lc.create_entry(&req, &h.key).unwrap_err();
    assert!(matches!(err, VaultsError::Conflict(Constraint::EntryTitle)));
}

#[test]
fn duplicate_appended_label_is_conflict() {
    let mut h = harness();
    let entry = h.entry_with(2);
    let req = CreateSecretRequest {
        user_slug: h.user.clone(),
        vault_slug: h.vault.clone(),
        entry_slug: entry.clone(),
        secret_label: "s0".into(),
        secret_string: "again".into(),
    };
    let err = h.lc.create_secret(&req, &h.key).unwrap_err();
    assert!(matches!(err, VaultsError::Conflict(Constraint::SecretLabel)));
    assert_eq!(h.view(&entry).secrets.len(), 2);
}

// ---------------------------------------------------------------------------
// Retrieve / update
// ---------------------------------------------------------------------------

#[test]
fn retrieve_decrypts_in_priority_order() {
    let mut h = harness();
    let entry = h.entry_with(3);
    let last = h.slug_at(&entry, 2);
    h.move_to(&entry, &last, "0");

    let view = h.view(&entry);
    let labels: Vec<_> = view.secrets.iter().map(|s| s.secret_label.as_str()).collect();
    assert_eq!(labels, vec!["s2", "s0", "s1"]);
    assert_eq!(view.secrets[0].secret_string, "value 2");
}

#[test]
fn retrieve_with_wrong_key_fails_whole_entry() {
    let mut h = harness();
    let entry = h.entry_with(3);

    let wrong = EncryptionKey::generate();
    let err = h.lc.retrieve_entry(&entry, &wrong).unwrap_err();
    assert!(matches!(err, VaultsError::DecryptionFailed));
}

#[test]
fn one_foreign_payload_fails_whole_entry() {
    let mut h = harness();
    let entry = h.entry_with(2);

    // Append one secret under a different key.
    let other_key = EncryptionKey::generate();
    let req = CreateSecretRequest {
        user_slug: h.user.clone(),
        vault_slug: h.vault.clone(),
        entry_slug: entry.clone(),
        secret_label: "odd".into(),
        secret_string: "one".into(),
    };
    h.lc.create_secret(&req, &other_key).unwrap();

    assert!(matches!(
        h.lc.retrieve_entry(&entry, &h.key),
        Err(VaultsError::DecryptionFailed)
    ));
}

#[test]
fn update_keeps_priority_and_touches_only_target() {
    let mut h = harness();
    let entry = h.entry_with(3);
    let before = snapshot(&h.view(&entry));
    pause();

    let target = h.slug_at(&entry, 1);
    let req = UpdateSecretRequest {
        secret_label: Some("renamed".into()),
        secret_string: Some("new value".into()),
    };
    h.lc.update_secret(&target, &req, &h.key).unwrap();

    let view = h.view(&entry);
    let updated = view.secrets.iter().find(|s| s.secret_slug == target).unwrap();
    assert_eq!(updated.secret_priority, 1);
    assert_eq!(updated.secret_label, "renamed");
    assert_eq!(updated.secret_string, "new value");

    let after = snapshot(&view);
    assert_eq!(find(&after, "s0").2, find(&before, "s0").2);
    assert_eq!(find(&after, "s2").2, find(&before, "s2").2);
    assert!(find(&after, "renamed").2 > find(&before, "s1").2);
}

#[test]
fn update_to_existing_label_is_conflict() {
    let mut h = harness();
    let entry = h.entry_with(2);
    let target = h.slug_at(&entry, 1);

    let req = UpdateSecretRequest {
        secret_label: Some("s0".into()),
        secret_string: None,
    };
    let err = h.lc.update_secret(&target, &req, &h.key).unwrap_err();
    assert!(matches!(err, VaultsError::Conflict(Constraint::SecretLabel)));
}

#[test]
fn update_rejects_empty_fields() {
    let mut h = harness();
    let entry = h.entry_with(1);
    let target = h.slug_at(&entry, 0);

    let req = UpdateSecretRequest {
        secret_label: None,
        secret_string: Some(String::new()),
    };
    let err = h.lc.update_secret(&target, &req, &h.key).unwrap_err();
    assert!(matches!(err, VaultsError::Validation { field: "secret_string", .. }));
}

// ---------------------------------------------------------------------------
// Cascades
// ---------------------------------------------------------------------------

#[test]
fn deleting_vault_removes_entries_and_secrets() {
    let mut h = harness();
    let entry = h.entry_with(3);
    let secret = h.slug_at(&entry, 0);

    let (user, vault) = (h.user.clone(), h.vault.clone());
    h.lc.delete_vault(&user, &vault).unwrap();

    assert!(matches!(
        h.lc.retrieve_entry(&entry, &h.key),
        Err(VaultsError::NotFound(_))
    ));
    assert!(matches!(h.lc.delete_secret(&secret), Err(VaultsError::NotFound(_))));
}

#[test]
fn deleting_user_removes_everything() {
    let mut h = harness();
    let entry = h.entry_with(2);
    let user = h.user.clone();
    h.lc.delete_user(&user).unwrap();

    assert!(matches!(h.lc.retrieve_user(&user), Err(VaultsError::NotFound(_))));
    assert!(matches!(
        h.lc.retrieve_entry(&entry, &h.key),
        Err(VaultsError::NotFound(_))
    ));
}

#[test]
fn deleting_entry_removes_its_secrets() {
    let mut h = harness();
    let entry = h.entry_with(2);
    h.lc.delete_entry(&entry).unwrap();

    let stored: usize = h
        .lc
        .database()
        .read(|conn| queries::count_entry_secrets(conn, &entry))
        .unwrap();
    assert_eq!(stored, 0);
}
