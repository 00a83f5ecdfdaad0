//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use chrono::{DateTime, Utc};
use comfy_table::{ContentArrangement, Table};
use console::style;
use serde::Serialize;

use crate::errors::Result;
use crate::lifecycle::{EntryView, UserView, VaultSummary, VaultView};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Pretty-print any response view as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn when(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

/// Print an entry's secrets (Priority, Label, Value, Slug, Updated).
pub fn print_entry_table(entry: &EntryView) {
    println!(
        "{} {}",
        style(&entry.entry_title).bold(),
        style(format!("({})", entry.entry_slug)).dim()
    );

    if entry.secrets.is_empty() {
        info("No secrets in this entry yet.");
        tip("Run `secretvaults secret add` to append one.");
        return;
    }

    let mut table = new_table(vec!["Priority", "Label", "Value", "Slug", "Updated"]);
    for s in &entry.secrets {
        table.add_row(vec![
            s.secret_priority.to_string(),
            s.secret_label.clone(),
            s.secret_string.clone(),
            s.secret_slug.clone(),
            when(&s.secret_updated_at),
        ]);
    }
    println!("{table}");
}

/// Print a list of vaults (Title, Slug, Created, Updated).
pub fn print_vaults_table(vaults: &[VaultSummary]) {
    if vaults.is_empty() {
        info("No vaults yet.");
        tip("Run `secretvaults vault create --user <USER> <TITLE>` to add one.");
        return;
    }

    let mut table = new_table(vec!["Title", "Slug", "Created", "Updated"]);
    for v in vaults {
        table.add_row(vec![
            v.vault_title.clone(),
            v.vault_slug.clone(),
            when(&v.vault_created_at),
            when(&v.vault_updated_at),
        ]);
    }
    println!("{table}");
}

/// Print a vault header followed by its entries (Title, Slug, Updated).
pub fn print_vault_table(vault: &VaultView) {
    println!(
        "{} {}",
        style(&vault.vault.vault_title).bold(),
        style(format!("({})", vault.vault.vault_slug)).dim()
    );

    if vault.entries.is_empty() {
        info("No entries in this vault yet.");
        tip("Run `secretvaults entry create --body <FILE>` to add one.");
        return;
    }

    let mut table = new_table(vec!["Title", "Slug", "Updated"]);
    for e in &vault.entries {
        table.add_row(vec![
            e.entry_title.clone(),
            e.entry_slug.clone(),
            when(&e.entry_updated_at),
        ]);
    }
    println!("{table}");
}

pub fn print_user(user: &UserView) {
    println!("{} {}", style("User").bold(), user.user_slug);
    print_vaults_table(&user.vaults);
}
