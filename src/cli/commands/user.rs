//! `secretvaults user`: create, show and delete users.

use crate::cli::{confirm, open_lifecycle, output, Cli, UserAction};
use crate::config::Settings;
use crate::errors::Result;

/// Execute a `user` subcommand.
pub fn execute(cli: &Cli, settings: &Settings, action: &UserAction) -> Result<()> {
    let mut lifecycle = open_lifecycle(cli, settings)?;

    match action {
        UserAction::Create => {
            let slug = lifecycle.create_user()?;
            output::success(&format!("Created user {slug}"));
        }
        UserAction::Show { user, json } => {
            let view = lifecycle.retrieve_user(user)?;
            if *json {
                output::print_json(&view)?;
            } else {
                output::print_user(&view);
            }
        }
        UserAction::Delete { user, force } => {
            if !confirm(*force, &format!("Delete user '{user}' and all of its vaults?"))? {
                output::info("Cancelled.");
                return Ok(());
            }
            lifecycle.delete_user(user)?;
            output::success(&format!("Deleted user {user}"));
        }
    }

    Ok(())
}
