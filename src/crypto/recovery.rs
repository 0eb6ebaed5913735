//! Recovery escrow: a high-entropy secret that can stand in for the
//! password if it is lost.
//!
//! `RecoverySecret` is 18 random bytes (144 bits) rendered as 24 base64
//! characters in dash-separated groups of four, e.g.
//! `Ab3x-9QzT-krW2-...`.  It is shown to the user exactly once and never
//! persisted.  `RecoveryRecord` is the master key wrapped under a key
//! derived from the secret; only the record touches disk.
//!
//! The recovery-path derivation reuses the vault's own salt.  The two
//! inputs (password and escrow secret) are independent secrets, so the
//! shared salt is a documented trade-off carried over from the original
//! design rather than a new decision.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::encryption::{decrypt, encrypt};
use super::kdf::{derive_master_key, KEY_LEN, SALT_LEN};
use super::keys::MasterKey;
use crate::errors::{Result, VaultError};

/// Raw entropy behind a recovery secret: 18 bytes = 24 base64 chars.
const SECRET_ENTROPY_LEN: usize = 18;

/// Characters per display group.
const GROUP_LEN: usize = 4;

/// A user-transcribable recovery secret.
///
/// Stored in its display form; comparison and derivation always go
/// through [`RecoverySecret::normalized`], so re-entry is insensitive to
/// dashes and whitespace.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct RecoverySecret(String);

impl std::fmt::Debug for RecoverySecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RecoverySecret").field(&"<redacted>").finish()
    }
}

impl RecoverySecret {
    /// Generate a fresh random recovery secret.
    pub fn generate() -> Self {
        use rand::RngCore;

        let mut bytes = [0u8; SECRET_ENTROPY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let encoded = BASE64.encode(bytes);
        bytes.zeroize();

        // Group as XXXX-XXXX-XXXX-XXXX-XXXX-XXXX for transcription.
        let formatted = encoded
            .chars()
            .collect::<Vec<_>>()
            .chunks(GROUP_LEN)
            .map(|chunk| chunk.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("-");

        RecoverySecret(formatted)
    }

    /// Build a secret from user input, as typed.
    ///
    /// Dashes and whitespace are ignored when the secret is used, so the
    /// user may re-enter it with or without the display grouping.
    pub fn from_input(input: &str) -> Self {
        RecoverySecret(input.to_string())
    }

    /// The display string (dash-grouped for generated secrets).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical form used for key derivation: dashes and whitespace
    /// stripped.
    fn normalized(&self) -> zeroize::Zeroizing<String> {
        zeroize::Zeroizing::new(
            self.0
                .chars()
                .filter(|c| *c != '-' && !c.is_whitespace())
                .collect(),
        )
    }
}

/// The master key, wrapped under a key derived from the recovery secret.
///
/// Serialized as JSON with the wrapped bytes in base64; this is the only
/// recovery artifact that is persisted.
#[derive(Serialize, Deserialize)]
pub struct RecoveryRecord {
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub wrapped_master_key: Vec<u8>,
}

impl RecoveryRecord {
    /// Escrow `master` under a key derived from `secret` and `salt`.
    pub fn create(
        master: &MasterKey,
        secret: &RecoverySecret,
        salt: &[u8; SALT_LEN],
    ) -> Result<Self> {
        let normalized = secret.normalized();
        let mut recovery_key = derive_master_key(normalized.as_bytes(), salt)?;

        let wrapped = encrypt(&recovery_key, master.as_bytes());
        recovery_key.zeroize();

        Ok(RecoveryRecord {
            wrapped_master_key: wrapped?,
        })
    }

    /// Recover the master key using the secret the user supplied.
    ///
    /// A wrong secret fails with [`VaultError::Authentication`]; a record
    /// whose payload is not exactly 32 bytes fails with
    /// [`VaultError::Format`].
    pub fn recover(&self, secret: &RecoverySecret, salt: &[u8; SALT_LEN]) -> Result<MasterKey> {
        let normalized = secret.normalized();
        let mut recovery_key = derive_master_key(normalized.as_bytes(), salt)?;

        let result = decrypt(&recovery_key, &self.wrapped_master_key);
        recovery_key.zeroize();
        let mut master_bytes = result?;

        if master_bytes.len() != KEY_LEN {
            let got = master_bytes.len();
            master_bytes.zeroize();
            return Err(VaultError::Format(format!(
                "recovered master key is {got} bytes, expected {KEY_LEN}"
            )));
        }

        let mut arr = [0u8; KEY_LEN];
        arr.copy_from_slice(&master_bytes);
        master_bytes.zeroize();

        let master = MasterKey::new(arr);
        arr.zeroize();
        Ok(master)
    }
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
