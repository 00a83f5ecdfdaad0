//! `secretvaults keygen`: print a fresh random payload key.

use crate::cli::{output, KEY_ENV};
use crate::crypto::EncryptionKey;
use crate::errors::Result;

/// Execute the `keygen` command.
///
/// Only the key goes to stdout so it can be captured by a script.
pub fn execute() -> Result<()> {
    let key = EncryptionKey::generate();
    println!("{}", key.to_base64().as_str());
    output::warning(&format!(
        "This key is not stored anywhere. Keep it safe and export it as {KEY_ENV}."
    ));
    Ok(())
}
