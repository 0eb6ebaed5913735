//! `notevault recover` — reset the password using the recovery secret.

use crate::cli::{notes_dir, output, prompt_new_password, prompt_recovery_secret, Cli};
use crate::errors::Result;
use crate::vault::VaultService;

/// Execute the `recover` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let dir = notes_dir(cli)?;
    let service = VaultService::open(&dir)?;

    let secret_input = prompt_recovery_secret()?;

    output::info("Choose your new vault password.");
    let new_password = prompt_new_password()?;

    let new_secret = service.recover(&secret_input, new_password.as_bytes())?;

    output::success("Vault recovered; all note keys re-wrapped under the new password.");
    output::warning("The recovery secret you just used is now spent.");
    output::print_recovery_secret(&new_secret);

    Ok(())
}
