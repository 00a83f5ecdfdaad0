//! `secretvaults vault`: create, list, show, rename and delete vaults.

use crate::cli::{confirm, open_lifecycle, output, Cli, VaultAction};
use crate::config::Settings;
use crate::errors::Result;

/// Execute a `vault` subcommand.
pub fn execute(cli: &Cli, settings: &Settings, action: &VaultAction) -> Result<()> {
    let mut lifecycle = open_lifecycle(cli, settings)?;

    match action {
        VaultAction::Create { user, title } => {
            let slug = lifecycle.create_vault(user, title)?;
            output::success(&format!("Created vault '{title}' ({slug})"));
        }
        VaultAction::List { user, json } => {
            let vaults = lifecycle.list_vaults(user)?;
            if *json {
                output::print_json(&vaults)?;
            } else {
                output::print_vaults_table(&vaults);
            }
        }
        VaultAction::Show { user, vault, json } => {
            let view = lifecycle.retrieve_vault(user, vault)?;
            if *json {
                output::print_json(&view)?;
            } else {
                output::print_vault_table(&view);
            }
        }
        VaultAction::Rename { user, vault, title } => {
            lifecycle.rename_vault(user, vault, title)?;
            output::success(&format!("Renamed vault {vault} to '{title}'"));
        }
        VaultAction::Delete { user, vault, force } => {
            if !confirm(*force, &format!("Delete vault '{vault}' and all of its entries?"))? {
                output::info("Cancelled.");
                return Ok(());
            }
            lifecycle.delete_vault(user, vault)?;
            output::success(&format!("Deleted vault {vault}"));
        }
    }

    Ok(())
}
