//! Configuration: the on-disk path layout and the user-editable settings.

pub mod settings;

use std::path::{Path, PathBuf};

pub use settings::Settings;

/// Immutable path layout for one vault, built once at process start.
///
/// All vault artifacts live in a `.vault` directory inside the notes
/// directory; per-document `.key` files live next to their documents
/// anywhere under `notes_dir`.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Root of the note tree this vault protects.
    pub notes_dir: PathBuf,
    /// `<notes_dir>/.vault` — artifact directory.
    pub vault_dir: PathBuf,
    /// Raw 32-byte salt.
    pub salt_path: PathBuf,
    /// Verification blob (nonce + AEAD of a fixed marker).
    pub verify_path: PathBuf,
    /// Recovery record (JSON).
    pub recovery_path: PathBuf,
    /// Staging directory for in-flight re-keying.
    pub rekey_dir: PathBuf,
}

impl VaultConfig {
    pub fn new(notes_dir: &Path) -> Self {
        let vault_dir = notes_dir.join(".vault");
        Self {
            notes_dir: notes_dir.to_path_buf(),
            salt_path: vault_dir.join("salt"),
            verify_path: vault_dir.join("verify"),
            recovery_path: vault_dir.join("recovery.key"),
            rekey_dir: vault_dir.join("rekey"),
            vault_dir,
        }
    }
}
