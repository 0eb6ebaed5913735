//! Persisted vault artifacts and their fixed binary layout.
//!
//! A vault directory holds exactly one of each:
//!
//! - `salt` — raw 32 bytes, regenerated on password change or recovery.
//! - `verify` — `[ nonce | AEAD(marker) + tag ]` under the master key.
//!   Lets `unlock` validate a password without ever comparing key bytes.
//! - `recovery.key` — JSON [`RecoveryRecord`].
//!
//! The three are always replaced together as a set.  Every write goes
//! through a temp file in the same directory followed by a rename, so
//! readers never see a half-written artifact.

use std::fs;
use std::path::Path;

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::config::VaultConfig;
use crate::crypto::{self, MasterKey, RecoveryRecord, SALT_LEN};
use crate::errors::{Result, VaultError};

/// Fixed plaintext the verification blob must decrypt to.
const VERIFY_MARKER: &[u8] = b"notevault-verify-v1";

/// Check whether the vault has been set up (salt artifact present).
pub fn is_initialized(config: &VaultConfig) -> bool {
    config.salt_path.exists()
}

/// Read and validate the salt artifact.
///
/// A salt file of any length other than exactly 32 bytes is a
/// [`VaultError::Format`]; it is never truncated or padded.
pub fn read_salt(config: &VaultConfig) -> Result<[u8; SALT_LEN]> {
    let data = fs::read(&config.salt_path)?;

    if data.len() != SALT_LEN {
        return Err(VaultError::Format(format!(
            "salt file {} is {} bytes, expected {SALT_LEN}",
            config.salt_path.display(),
            data.len()
        )));
    }

    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&data);
    Ok(salt)
}

/// Build a fresh verification blob for `master`.
pub fn create_verify_blob(master: &MasterKey) -> Result<Vec<u8>> {
    crypto::encrypt(master.as_bytes(), VERIFY_MARKER)
}

/// Validate a candidate master key against a verification blob.
///
/// Fails closed with [`VaultError::Authentication`] on a tag mismatch or
/// a marker mismatch; the comparison is constant-time.
pub fn check_verify_blob(master: &MasterKey, blob: &[u8]) -> Result<()> {
    let mut plaintext = crypto::decrypt(master.as_bytes(), blob)?;

    let matches: bool = plaintext.ct_eq(VERIFY_MARKER).into();
    plaintext.zeroize();

    if matches {
        Ok(())
    } else {
        Err(VaultError::Authentication)
    }
}

/// Read the verification blob.
pub fn read_verify(config: &VaultConfig) -> Result<Vec<u8>> {
    Ok(fs::read(&config.verify_path)?)
}

/// Read and parse the recovery record.
pub fn read_recovery(config: &VaultConfig) -> Result<RecoveryRecord> {
    let data = fs::read(&config.recovery_path)?;
    parse_recovery(&data)
}

/// Parse a serialized recovery record.
pub fn parse_recovery(data: &[u8]) -> Result<RecoveryRecord> {
    serde_json::from_slice(data)
        .map_err(|e| VaultError::Format(format!("recovery record: {e}")))
}

/// Serialize a recovery record.
pub fn encode_recovery(record: &RecoveryRecord) -> Result<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| VaultError::Format(format!("recovery record: {e}")))
}

/// Write the full artifact set for a brand-new vault.
///
/// Only valid at setup time; re-keying goes through the staged protocol
/// in `vault::rekey` instead.
pub fn write_artifact_set(
    config: &VaultConfig,
    salt: &[u8; SALT_LEN],
    verify_blob: &[u8],
    record: &RecoveryRecord,
) -> Result<()> {
    fs::create_dir_all(&config.vault_dir)?;

    atomic_write(&config.salt_path, salt)?;
    atomic_write(&config.verify_path, verify_blob)?;
    atomic_write(&config.recovery_path, &encode_recovery(record)?)?;

    Ok(())
}

/// Write `bytes` to `path` atomically: write to a temp file in the same
/// directory, then rename.  The rename ensures readers never see a
/// half-written file.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, path)?;

    Ok(())
}
