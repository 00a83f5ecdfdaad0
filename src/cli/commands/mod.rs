//! One module per top-level subcommand.

pub mod entry;
pub mod keygen;
pub mod secret;
pub mod user;
pub mod vault;
