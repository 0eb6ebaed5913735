use thiserror::Error;

/// All errors that can occur in NoteVault.
///
/// `Authentication` is intentionally a unit variant with a generic message:
/// a wrong password, a wrong recovery secret, and a tampered ciphertext all
/// look the same to the caller, so a failed attempt leaks nothing about
/// which part of the check failed.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Configuration errors ---
    #[error("Vault configuration error: {0}")]
    Config(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Crypto errors ---
    #[error("Authentication failed — wrong password, wrong recovery secret, or corrupted data")]
    Authentication,

    #[error("Malformed vault data: {0}")]
    Format(String),

    #[error("Invalid key derivation parameters: {0}")]
    Parameter(String),

    // --- State errors ---
    #[error("Vault is locked")]
    Locked,

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Password mismatch — passwords do not match")]
    PasswordMismatch,
}

/// Convenience type alias for NoteVault results.
pub type Result<T> = std::result::Result<T, VaultError>;
