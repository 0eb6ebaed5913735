//! Cryptographic primitives for NoteVault.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - Argon2id password-based key derivation (`kdf`)
//! - The `MasterKey`/`DocumentKey` types with zeroize-on-drop (`keys`)
//! - Document-key wrapping under the master key (`wrap`)
//! - The recovery escrow secret and record (`recovery`)

pub mod encryption;
pub mod kdf;
pub mod keys;
pub mod recovery;
pub mod wrap;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_master_key, ...};
pub use encryption::{decrypt, encrypt, NONCE_LEN};
pub use kdf::{derive_master_key, generate_salt, KEY_LEN, SALT_LEN};
pub use keys::{DocumentKey, MasterKey};
pub use recovery::{RecoveryRecord, RecoverySecret};
pub use wrap::{unwrap_key, wrap_key};
