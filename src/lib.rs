pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod lifecycle;
pub mod logging;
pub mod ordering;
pub mod slug;
pub mod store;
pub mod validation;
