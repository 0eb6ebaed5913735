//! `notevault status` — show the vault's externally-visible state.

use crate::cli::{notes_dir, output, Cli};
use crate::errors::Result;
use crate::vault::VaultService;

/// Execute the `status` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let dir = notes_dir(cli)?;
    let service = VaultService::open(&dir)?;
    let status = service.status();

    if !status.initialized {
        output::info("Vault is not set up.");
        output::tip("Run `notevault init` to create one.");
        return Ok(());
    }

    output::info(&format!(
        "Vault at {} — {}",
        dir.join(".vault").display(),
        if status.locked { "locked" } else { "unlocked" }
    ));

    if !status.locked {
        output::info(&format!(
            "Auto-lock in {} seconds without activity.",
            status.timeout_remaining_secs
        ));
    }

    Ok(())
}
