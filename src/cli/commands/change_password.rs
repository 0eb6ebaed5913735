//! `notevault change-password` — re-key the vault under a new password.
//!
//! Validates the current password, derives a new master key from a fresh
//! salt, re-wraps every note's `.key` file, and replaces the artifact
//! set.  Note ciphertext is untouched; only key wrappings change.

use crate::cli::{notes_dir, output, prompt_new_password, prompt_password, Cli};
use crate::errors::Result;
use crate::vault::VaultService;

/// Execute the `change-password` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let dir = notes_dir(cli)?;
    let service = VaultService::open(&dir)?;

    output::info("Enter your current vault password.");
    let current = prompt_password("Current vault password")?;

    output::info("Choose your new vault password.");
    let new_password = prompt_new_password()?;

    let secret = service.change_password(current.as_bytes(), new_password.as_bytes())?;

    output::success("Vault password changed; all note keys re-wrapped.");
    output::warning("The previous recovery secret no longer works.");
    output::print_recovery_secret(&secret);

    Ok(())
}
