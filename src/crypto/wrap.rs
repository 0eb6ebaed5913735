//! Wrapping and unwrapping of document keys under the master key.
//!
//! A wrapped key is an opaque blob with the same layout as any other
//! ciphertext in this crate: [ nonce | AEAD(key bytes) + tag ].

use zeroize::Zeroize;

use super::encryption::{decrypt, encrypt};
use super::kdf::KEY_LEN;
use super::keys::{DocumentKey, MasterKey};
use crate::errors::{Result, VaultError};

/// Wrap a document key under the master key (encrypt the key bytes).
pub fn wrap_key(master: &MasterKey, document_key: &DocumentKey) -> Result<Vec<u8>> {
    encrypt(master.as_bytes(), document_key.as_bytes())
}

/// Unwrap a document key that was wrapped with [`wrap_key`].
///
/// Unwrapping under the wrong master key fails with
/// [`VaultError::Authentication`]; a payload that is not exactly 32 bytes
/// fails with [`VaultError::Format`].  It can never silently yield a key.
pub fn unwrap_key(master: &MasterKey, wrapped: &[u8]) -> Result<DocumentKey> {
    let mut key_bytes = decrypt(master.as_bytes(), wrapped)?;

    if key_bytes.len() != KEY_LEN {
        let got = key_bytes.len();
        key_bytes.zeroize();
        return Err(VaultError::Format(format!(
            "unwrapped key is {got} bytes, expected {KEY_LEN}"
        )));
    }

    let mut arr = [0u8; KEY_LEN];
    arr.copy_from_slice(&key_bytes);
    key_bytes.zeroize();

    let key = DocumentKey::from_bytes(arr);
    arr.zeroize();
    Ok(key)
}
