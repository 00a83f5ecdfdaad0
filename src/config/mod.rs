//! Project-level configuration (`.secretvaults.toml`).

pub mod settings;

pub use settings::Settings;
