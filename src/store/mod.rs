//! Relational store for users, vaults, entries and secrets (SQLite).
//!
//! This module provides:
//! - `Database`: connection setup and the transaction boundary (`database`)
//! - Table definitions (`schema`)
//! - Row types (`records`)
//! - Row-level reads and writes usable inside a transaction (`queries`)

pub mod database;
pub mod queries;
pub mod records;
pub mod schema;

pub use database::Database;
pub use records::{EntryRecord, SecretRecord, UserRecord, VaultRecord};
