//! `secretvaults secret`: append, update, move and delete secrets.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::{confirm, open_lifecycle, output, request_key, Cli, SecretAction};
use crate::config::Settings;
use crate::errors::{Result, VaultsError};
use crate::lifecycle::{CreateSecretRequest, MoveSecretRequest, UpdateSecretRequest};

/// Execute a `secret` subcommand.
pub fn execute(cli: &Cli, settings: &Settings, action: &SecretAction) -> Result<()> {
    match action {
        SecretAction::Add {
            user,
            vault,
            entry,
            label,
            value,
        } => {
            let secret_value = read_value(label, value.as_deref())?;
            let key = request_key()?;
            let req = CreateSecretRequest {
                user_slug: user.clone(),
                vault_slug: vault.clone(),
                entry_slug: entry.clone(),
                secret_label: label.clone(),
                secret_string: secret_value.as_str().to_string(),
            };
            let slug = open_lifecycle(cli, settings)?.create_secret(&req, &key)?;
            output::success(&format!("Added secret '{label}' ({slug})"));
        }
        SecretAction::Update {
            secret,
            label,
            value,
        } => {
            if value.is_some() {
                output::warning("Value provided on command line; it may appear in shell history.");
            }
            let key = request_key()?;
            let req = UpdateSecretRequest {
                secret_label: label.clone(),
                secret_string: value.clone(),
            };
            open_lifecycle(cli, settings)?.update_secret(secret, &req, &key)?;
            output::success(&format!("Updated secret {secret}"));
        }
        SecretAction::Move {
            secret,
            entry,
            priority,
        } => {
            let req = MoveSecretRequest {
                entry_slug: entry.clone(),
                secret_priority: priority.clone(),
            };
            let landed = open_lifecycle(cli, settings)?.move_secret(secret, &req)?;
            output::success(&format!("Secret {secret} is at priority {landed}"));
        }
        SecretAction::Delete { secret, force } => {
            if !confirm(*force, &format!("Delete secret '{secret}'?"))? {
                output::info("Cancelled.");
                return Ok(());
            }
            open_lifecycle(cli, settings)?.delete_secret(secret)?;
            output::success(&format!("Deleted secret {secret}"));
        }
    }

    Ok(())
}

/// Determine the secret value from one of three sources.
fn read_value(label: &str, inline: Option<&str>) -> Result<Zeroizing<String>> {
    if let Some(v) = inline {
        // Source 1: Inline value on the command line.
        output::warning("Value provided on command line; it may appear in shell history.");
        return Ok(Zeroizing::new(v.to_string()));
    }

    if !io::stdin().is_terminal() {
        // Source 2: Piped input (stdin is not a terminal).
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        return Ok(Zeroizing::new(buf.trim_end().to_string()));
    }

    // Source 3: Interactive secure prompt.
    let value = dialoguer::Password::new()
        .with_prompt(format!("Enter value for {label}"))
        .interact()
        .map_err(|e| VaultsError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(value))
}
