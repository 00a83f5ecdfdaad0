//! Request-level operations over the store.
//!
//! `SecretLifecycle` combines validation, the ordering engine, payload
//! encryption and the transaction boundary.  Every mutating operation
//! runs its read-compute-write sequence inside one `Database::write`, so
//! a failure leaves the store exactly as it was.
//!
//! - `secrets`: entry creation, append, delete, move, retrieve, update
//! - `accounts`: plain CRUD for users, vaults and entries

pub mod accounts;
pub mod requests;
pub mod secrets;
pub mod views;

pub use requests::{
    CreateEntryRequest, CreateSecretRequest, MoveSecretRequest, NewSecret, UpdateSecretRequest,
};
pub use views::{EntrySummary, EntryView, SecretView, UserView, VaultSummary, VaultView};

use crate::slug::{RandomSlugs, SlugGenerator};
use crate::store::Database;

/// Entry point for every operation on users, vaults, entries and secrets.
pub struct SecretLifecycle {
    db: Database,
    slugs: Box<dyn SlugGenerator>,
}

impl SecretLifecycle {
    pub fn new(db: Database) -> Self {
        Self::with_slug_generator(db, Box::new(RandomSlugs))
    }

    /// Use a custom slug source (tests inject colliding slugs through this).
    pub fn with_slug_generator(db: Database, slugs: Box<dyn SlugGenerator>) -> Self {
        Self { db, slugs }
    }

    /// Direct access to the store, for inspection.
    pub fn database(&mut self) -> &mut Database {
        &mut self.db
    }
}
