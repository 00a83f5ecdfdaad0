//! `secretvaults entry`: create entries from a JSON body, show them
//! decrypted, rename and delete.

use crate::cli::{confirm, open_lifecycle, output, read_body, request_key, Cli, EntryAction};
use crate::config::Settings;
use crate::errors::Result;
use crate::lifecycle::CreateEntryRequest;

/// Execute an `entry` subcommand.
pub fn execute(cli: &Cli, settings: &Settings, action: &EntryAction) -> Result<()> {
    match action {
        EntryAction::Create { body } => {
            // Parse and key up before touching the database.
            let req: CreateEntryRequest = read_body(body)?;
            let key = request_key()?;
            let mut lifecycle = open_lifecycle(cli, settings)?;

            let slug = lifecycle.create_entry(&req, &key)?;
            let count = req.secrets.as_ref().map_or(0, Vec::len);
            output::success(&format!(
                "Created entry '{}' ({slug}) with {count} secret(s)",
                req.entry_title
            ));
        }
        EntryAction::Show { entry, json } => {
            let key = request_key()?;
            let mut lifecycle = open_lifecycle(cli, settings)?;
            let view = lifecycle.retrieve_entry(entry, &key)?;
            if *json {
                output::print_json(&view)?;
            } else {
                output::print_entry_table(&view);
            }
        }
        EntryAction::Rename { entry, title } => {
            open_lifecycle(cli, settings)?.rename_entry(entry, title)?;
            output::success(&format!("Renamed entry {entry} to '{title}'"));
        }
        EntryAction::Delete { entry, force } => {
            if !confirm(*force, &format!("Delete entry '{entry}' and all of its secrets?"))? {
                output::info("Cancelled.");
                return Ok(());
            }
            open_lifecycle(cli, settings)?.delete_entry(entry)?;
            output::success(&format!("Deleted entry {entry}"));
        }
    }

    Ok(())
}
