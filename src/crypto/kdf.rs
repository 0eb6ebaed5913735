//! Password-based key derivation using Argon2id.
//!
//! Argon2id is a memory-hard KDF that protects against brute-force and
//! GPU-based attacks.  The cost parameters are fixed for the life of a
//! vault: the on-disk artifact layout stores only the salt, so every
//! derivation (password path and recovery path alike) must use the same
//! settings.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;

use crate::errors::{Result, VaultError};

/// Length of the salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Memory cost in KiB (64 MB).
const ARGON2_M_COST: u32 = 65_536;

/// Number of iterations.
const ARGON2_T_COST: u32 = 3;

/// Parallelism lanes.
const ARGON2_P_COST: u32 = 4;

/// Derive a 32-byte master key from a password and salt using Argon2id.
///
/// Deterministic: the same password + salt always produce the same key.
/// Takes on the order of 100 ms by design; callers must run it to
/// completion before taking the vault state lock.
///
/// Fails only with [`VaultError::Parameter`] if the compiled-in cost
/// parameters are rejected by the backend, which is a build bug rather
/// than a runtime condition.
pub fn derive_master_key(password: &[u8], salt: &[u8; SALT_LEN]) -> Result<[u8; KEY_LEN]> {
    let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(KEY_LEN))
        .map_err(|e| VaultError::Parameter(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password, salt, &mut key)
        .map_err(|e| VaultError::Parameter(format!("Argon2id hashing failed: {e}")))?;

    Ok(key)
}

/// Generate a cryptographically random 32-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}
