//! CLI module — Clap argument parser, output helpers, and command
//! implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::errors::{Result, VaultError};

/// Minimum password length to prevent trivially weak passwords.
const MIN_PASSWORD_LEN: usize = 8;

/// NoteVault CLI: encrypted vault for a local note-taking app.
#[derive(Parser)]
#[command(
    name = "notevault",
    about = "Encryption-at-rest vault for local notes",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Notes directory the vault protects (default: current directory)
    #[arg(long, default_value = ".", global = true)]
    pub notes_dir: String,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Set up a new vault and print its recovery secret
    Init,

    /// Show vault status (initialized, locked, auto-lock countdown)
    Status,

    /// Verify the vault password against the stored artifacts
    Unlock,

    /// Change the vault password (re-wraps every note key)
    ChangePassword,

    /// Reset the password using the recovery secret
    Recover,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Get the vault password, trying in order:
/// 1. `NOTEVAULT_PASSWORD` env var (scripting/CI)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on
/// drop.
pub fn prompt_password(prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var("NOTEVAULT_PASSWORD") {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new password with confirmation (used during `init`,
/// `change-password`, and `recover`).
///
/// Also respects `NOTEVAULT_NEW_PASSWORD` for scripted usage.  Enforces
/// a minimum password length.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var("NOTEVAULT_NEW_PASSWORD") {
        if !pw.is_empty() {
            if pw.len() < MIN_PASSWORD_LEN {
                return Err(VaultError::CommandFailed(format!(
                    "password must be at least {MIN_PASSWORD_LEN} characters"
                )));
            }
            return Ok(Zeroizing::new(pw));
        }
    }

    loop {
        let password = dialoguer::Password::new()
            .with_prompt("Choose vault password")
            .with_confirmation(
                "Confirm vault password",
                "Passwords do not match, try again",
            )
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;

        if password.len() < MIN_PASSWORD_LEN {
            output::warning(&format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(password));
    }
}

/// Prompt for the recovery secret.  Respects `NOTEVAULT_RECOVERY_SECRET`
/// for scripted usage.  Input is dash- and whitespace-insensitive.
pub fn prompt_recovery_secret() -> Result<Zeroizing<String>> {
    if let Ok(secret) = std::env::var("NOTEVAULT_RECOVERY_SECRET") {
        if !secret.is_empty() {
            return Ok(Zeroizing::new(secret));
        }
    }

    let secret = dialoguer::Password::new()
        .with_prompt("Enter recovery secret")
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("recovery prompt: {e}")))?;
    Ok(Zeroizing::new(secret))
}

/// Resolve the notes directory from the CLI arguments.
pub fn notes_dir(cli: &Cli) -> Result<PathBuf> {
    let path = PathBuf::from(&cli.notes_dir);
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
