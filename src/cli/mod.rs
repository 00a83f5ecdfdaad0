//! CLI module: Clap argument parser, shared helpers, and command implementations.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use serde::de::DeserializeOwned;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::crypto::EncryptionKey;
use crate::errors::{Result, VaultsError};
use crate::lifecycle::SecretLifecycle;
use crate::store::Database;

/// Environment variable carrying the base64 payload key.
pub const KEY_ENV: &str = "SECRETVAULTS_KEY";

/// SecretVaults CLI: ordered, encrypted secrets grouped into vaults.
#[derive(Parser)]
#[command(
    name = "secretvaults",
    about = "Ordered, encrypted secrets grouped into vaults and entries",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database file (default: .secretvaults/vaults.db, or database_path in .secretvaults.toml)
    #[arg(long, env = "SECRETVAULTS_DB", global = true)]
    pub database: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate a new random encryption key (printed as base64)
    Keygen,

    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage vaults
    Vault {
        #[command(subcommand)]
        action: VaultAction,
    },

    /// Manage entries (titled groups of secrets)
    Entry {
        #[command(subcommand)]
        action: EntryAction,
    },

    /// Manage individual secrets within an entry
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },
}

#[derive(clap::Subcommand)]
pub enum UserAction {
    /// Create a user and print its slug
    Create,

    /// Show a user and its vaults
    Show {
        /// User slug
        user: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Delete a user and everything it owns
    Delete {
        /// User slug
        user: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(clap::Subcommand)]
pub enum VaultAction {
    /// Create a vault and print its slug
    Create {
        /// Owning user slug
        #[arg(long)]
        user: String,
        /// Vault title (unique per user)
        title: String,
    },

    /// List a user's vaults
    List {
        /// Owning user slug
        #[arg(long)]
        user: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show a vault and the titles of its entries
    Show {
        /// Owning user slug
        #[arg(long)]
        user: String,
        /// Vault slug
        vault: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Change a vault's title
    Rename {
        /// Owning user slug
        #[arg(long)]
        user: String,
        /// Vault slug
        vault: String,
        /// New title
        title: String,
    },

    /// Delete a vault with all of its entries and secrets
    Delete {
        /// Owning user slug
        #[arg(long)]
        user: String,
        /// Vault slug
        vault: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(clap::Subcommand)]
pub enum EntryAction {
    /// Create an entry with its secrets from a JSON body
    Create {
        /// Path to the JSON body, or `-` for stdin
        #[arg(long)]
        body: String,
    },

    /// Show an entry with its secrets decrypted, in priority order
    Show {
        /// Entry slug
        entry: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Change an entry's title
    Rename {
        /// Entry slug
        entry: String,
        /// New title
        title: String,
    },

    /// Delete an entry and all of its secrets
    Delete {
        /// Entry slug
        entry: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(clap::Subcommand)]
pub enum SecretAction {
    /// Append a secret to the end of an entry
    Add {
        #[arg(long)]
        user: String,
        #[arg(long)]
        vault: String,
        #[arg(long)]
        entry: String,
        /// Label, unique within the entry
        label: String,
        /// Secret value (omit for piped stdin or an interactive prompt)
        value: Option<String>,
    },

    /// Change a secret's label and/or value
    Update {
        /// Secret slug
        secret: String,
        /// New label
        #[arg(long)]
        label: Option<String>,
        /// New value
        #[arg(long)]
        value: Option<String>,
    },

    /// Move a secret to another position within its entry
    Move {
        /// Secret slug
        secret: String,
        /// Entry slug the secret belongs to
        #[arg(long)]
        entry: String,
        /// Target priority; out-of-range values snap to the nearest end
        #[arg(long, allow_hyphen_values = true)]
        priority: String,
    },

    /// Delete a secret; the ones after it move up
    Delete {
        /// Secret slug
        secret: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Open the database selected by `--database`, `SECRETVAULTS_DB` or the
/// settings file, relative to the current directory.
pub fn open_lifecycle(cli: &Cli, settings: &Settings) -> Result<SecretLifecycle> {
    let cwd = std::env::current_dir()?;
    let path = settings.database_path(&cwd, cli.database.as_deref());
    tracing::debug!(path = %path.display(), "opening database");
    let db = Database::open(&path, settings.busy_timeout())?;
    Ok(SecretLifecycle::new(db))
}

/// Get the payload key, trying in order:
/// 1. `SECRETVAULTS_KEY` env var (scripts/CI)
/// 2. Interactive prompt
///
/// The key is never stored; it lives for one command.
pub fn request_key() -> Result<EncryptionKey> {
    if let Ok(encoded) = std::env::var(KEY_ENV) {
        let encoded = Zeroizing::new(encoded);
        if !encoded.is_empty() {
            return EncryptionKey::from_base64(&encoded);
        }
    }

    if !io::stdin().is_terminal() {
        return Err(VaultsError::InvalidKey(format!(
            "{KEY_ENV} is not set and no terminal is available to prompt"
        )));
    }

    let encoded = dialoguer::Password::new()
        .with_prompt("Enter encryption key (base64)")
        .interact()
        .map_err(|e| VaultsError::CommandFailed(format!("key prompt: {e}")))?;
    EncryptionKey::from_base64(&Zeroizing::new(encoded))
}

/// Read and parse a JSON request body from a file, or stdin for `-`.
pub fn read_body<T: DeserializeOwned>(path: &str) -> Result<T> {
    let raw = if path == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    let raw = Zeroizing::new(raw);
    Ok(serde_json::from_str(&raw)?)
}

/// Ask before a destructive operation unless `force` is set.
///
/// Returns `false` if the user declined.
pub fn confirm(force: bool, prompt: &str) -> Result<bool> {
    if force {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| VaultsError::CommandFailed(format!("confirm prompt: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::CreateEntryRequest;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn move_accepts_negative_priority() {
        let cli = Cli::try_parse_from([
            "secretvaults", "secret", "move", "abc", "--entry", "def", "--priority", "-5",
        ])
        .unwrap();
        match cli.command {
            Commands::Secret {
                action: SecretAction::Move { priority, .. },
            } => assert_eq!(priority, "-5"),
            _ => panic!("parsed the wrong command"),
        }
    }

    #[test]
    fn read_body_parses_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"entry_title": "Login", "secrets": []}}"#).unwrap();

        let req: CreateEntryRequest = read_body(file.path().to_str().unwrap()).unwrap();
        assert_eq!(req.entry_title, "Login");
        assert_eq!(req.secrets.map(|s| s.len()), Some(0));
    }

    #[test]
    fn read_body_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = read_body::<CreateEntryRequest>(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, VaultsError::SerializationError(_)));
    }
}
