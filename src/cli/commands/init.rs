//! `notevault init` — set up a new vault.

use crate::cli::{notes_dir, output, prompt_new_password, Cli};
use crate::errors::Result;
use crate::vault::VaultService;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let dir = notes_dir(cli)?;
    std::fs::create_dir_all(&dir)?;

    let service = VaultService::open(&dir)?;

    if service.is_setup() {
        output::tip("Use `notevault change-password` to change the password of an existing vault.");
        return Err(crate::errors::VaultError::Config(format!(
            "vault already exists at {}",
            dir.join(".vault").display()
        )));
    }

    let password = prompt_new_password()?;
    let secret = service.setup(password.as_bytes())?;

    output::success(&format!(
        "Vault created at {}",
        dir.join(".vault").display()
    ));
    output::print_recovery_secret(&secret);

    Ok(())
}
