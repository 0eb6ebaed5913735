//! Key types for the two-tier hierarchy.
//!
//! `MasterKey` (the KEK) is derived from the user's password and wraps
//! every document key.  `DocumentKey` (a DEK) is generated once per
//! document and encrypts that document's content directly.
//!
//! Both types own their 32 bytes exclusively: no `Clone`, no `Copy`, and
//! the buffer is overwritten when the value is dropped.  Cryptographic
//! calls borrow the bytes via `as_bytes`; nothing ever duplicates them.

use rand::RngCore;
use zeroize::Zeroize;

use super::kdf::KEY_LEN;

/// Key encryption key, derived from the user's password.
///
/// Exists only in process memory while the vault is unlocked and is
/// never persisted in raw form.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    /// Create a new `MasterKey` from raw bytes.
    ///
    /// The caller keeps a stack copy of `bytes` and should zeroize it
    /// immediately after this call.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes (e.g. to pass to AES or key wrapping).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

/// Data encryption key, unique per document.
///
/// Persisted only in wrapped (encrypted) form next to its document.
/// Generated once at document creation; re-keying changes its wrapping,
/// never the key itself.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct DocumentKey {
    bytes: [u8; KEY_LEN],
}

impl DocumentKey {
    /// Generate a new random document key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Reconstruct a document key from raw bytes (after unwrapping).
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}
