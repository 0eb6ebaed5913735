//! `notevault unlock` — verify the vault password.
//!
//! The CLI is one-shot, so the unlocked key lives only until the process
//! exits (it is zeroized on drop).  The command exists to validate a
//! password and to finish any interrupted re-key; long-lived unlocks are
//! the embedding application's job.

use crate::cli::{notes_dir, output, prompt_password, Cli};
use crate::errors::Result;
use crate::vault::VaultService;

/// Execute the `unlock` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let dir = notes_dir(cli)?;
    let service = VaultService::open(&dir)?;

    let password = prompt_password("Enter vault password")?;
    service.unlock(password.as_bytes())?;

    output::success("Password verified.");
    Ok(())
}
