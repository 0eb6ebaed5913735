//! High-level vault operations used by the CLI and the note-storage
//! subsystem.
//!
//! `VaultService` is thin orchestration: it translates persisted-artifact
//! IO and state transitions into the external contract and owns no
//! cryptographic logic itself.  Key derivation always runs to completion
//! before the state lock is taken, so a slow Argon2 pass never blocks
//! status or activity reads.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use zeroize::Zeroize;

use super::artifacts;
use super::rekey;
use super::state::VaultState;
use crate::config::{Settings, VaultConfig};
use crate::crypto::{self, DocumentKey, MasterKey, RecoverySecret};
use crate::errors::{Result, VaultError};

/// Snapshot of the externally-visible vault state.
#[derive(Debug, Clone, Serialize)]
pub struct VaultStatus {
    pub initialized: bool,
    pub locked: bool,
    pub timeout_remaining_secs: u64,
}

/// The vault's command surface.
pub struct VaultService {
    state: Arc<VaultState>,
}

impl VaultService {
    /// Build a service over an explicit configuration.
    ///
    /// Rolls forward any committed re-key a crashed process left behind.
    pub fn new(config: VaultConfig, settings: &Settings) -> Result<Self> {
        rekey::resume_pending(&config)?;
        Ok(Self {
            state: VaultState::new(config, settings.lock_timeout()),
        })
    }

    /// Build a service for `notes_dir`, loading `notevault.toml` from it.
    pub fn open(notes_dir: &Path) -> Result<Self> {
        let settings = Settings::load(notes_dir)?;
        Self::new(VaultConfig::new(notes_dir), &settings)
    }

    /// The shared runtime state, for the auto-lock scheduler and other
    /// collaborators.
    pub fn state(&self) -> Arc<VaultState> {
        Arc::clone(&self.state)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Whether the vault has been set up (persisted artifacts present).
    pub fn is_setup(&self) -> bool {
        artifacts::is_initialized(&self.state.config())
    }

    /// Create a brand-new vault: salt, verification blob, and recovery
    /// record, then install the derived master key (Unlocked).
    ///
    /// Returns the recovery secret.  It is shown to the user exactly
    /// once and never persisted; losing both it and the password makes
    /// the vault unrecoverable.
    pub fn setup(&self, password: &[u8]) -> Result<RecoverySecret> {
        let config = self.state.config();

        if artifacts::is_initialized(&config) {
            return Err(VaultError::Config(
                "vault is already initialized".into(),
            ));
        }

        let salt = crypto::generate_salt();
        let mut master_bytes = crypto::derive_master_key(password, &salt)?;
        let master = MasterKey::new(master_bytes);
        master_bytes.zeroize();

        let verify_blob = artifacts::create_verify_blob(&master)?;
        let secret = RecoverySecret::generate();
        let record = crypto::RecoveryRecord::create(&master, &secret, &salt)?;

        artifacts::write_artifact_set(&config, &salt, &verify_blob, &record)?;

        self.audit("setup", None);
        self.state.install(master);
        Ok(secret)
    }

    /// Validate `password` against the stored artifacts and, on success,
    /// install the master key (Locked -> Unlocked).
    ///
    /// A wrong password fails with [`VaultError::Authentication`] and
    /// leaves the state unchanged.
    pub fn unlock(&self, password: &[u8]) -> Result<()> {
        let config = self.state.config();
        rekey::resume_pending(&config)?;
        require_initialized(&config)?;

        let salt = artifacts::read_salt(&config)?;

        // The expensive part, done without holding the state lock.
        let mut candidate_bytes = crypto::derive_master_key(password, &salt)?;
        let candidate = MasterKey::new(candidate_bytes);
        candidate_bytes.zeroize();

        let verify_blob = artifacts::read_verify(&config)?;
        if let Err(e) = artifacts::check_verify_blob(&candidate, &verify_blob) {
            self.audit("unlock-failed", None);
            return Err(e);
        }

        // The password checks out, so this key can also undo any
        // interrupted re-key before it becomes visible to callers.
        rekey::roll_back_pending(&config, &candidate)?;

        self.state.install(candidate);
        self.audit("unlock", None);
        Ok(())
    }

    /// Transition to Locked unconditionally, zeroizing the master key.
    pub fn lock(&self) {
        if self.state.lock() {
            self.audit("lock", None);
        }
    }

    /// Reset the inactivity clock.
    pub fn touch(&self) {
        self.state.touch();
    }

    /// The externally-visible state snapshot.
    pub fn status(&self) -> VaultStatus {
        VaultStatus {
            initialized: self.is_setup(),
            locked: self.state.is_locked(),
            timeout_remaining_secs: self.state.remaining_secs(),
        }
    }

    // ------------------------------------------------------------------
    // Re-keying
    // ------------------------------------------------------------------

    /// Recover the master key with the escrow secret, then re-key the
    /// vault under `new_password`.  Ends Unlocked under the new key.
    ///
    /// Returns the *new* recovery secret; the one just used is spent.
    pub fn recover(&self, secret_input: &str, new_password: &[u8]) -> Result<RecoverySecret> {
        let config = self.state.config();
        rekey::resume_pending(&config)?;
        require_initialized(&config)?;

        let salt = artifacts::read_salt(&config)?;
        let record = artifacts::read_recovery(&config)?;

        let secret = RecoverySecret::from_input(secret_input);
        let old_master = record.recover(&secret, &salt)?;

        rekey::roll_back_pending(&config, &old_master)?;

        // Clear the key for the duration of the re-wrap so no concurrent
        // operation can write a document key under the outgoing master.
        self.state.lock();
        let (new_master, new_secret) = rekey::rekey_vault(&config, &old_master, new_password)?;

        self.state.install(new_master);
        self.audit("recover", None);
        Ok(new_secret)
    }

    /// Change the vault password.  Validates the current password first;
    /// a wrong current password leaves every persisted artifact
    /// byte-for-byte unchanged.  Ends Unlocked under the new key.
    ///
    /// Returns a fresh recovery secret (the old one no longer works).
    pub fn change_password(&self, current: &[u8], new_password: &[u8]) -> Result<RecoverySecret> {
        let config = self.state.config();
        rekey::resume_pending(&config)?;
        require_initialized(&config)?;

        let salt = artifacts::read_salt(&config)?;

        let mut candidate_bytes = crypto::derive_master_key(current, &salt)?;
        let candidate = MasterKey::new(candidate_bytes);
        candidate_bytes.zeroize();

        let verify_blob = artifacts::read_verify(&config)?;
        artifacts::check_verify_blob(&candidate, &verify_blob)?;

        rekey::roll_back_pending(&config, &candidate)?;

        self.state.lock();
        let (new_master, new_secret) = rekey::rekey_vault(&config, &candidate, new_password)?;

        self.state.install(new_master);
        self.audit("change-password", None);
        Ok(new_secret)
    }

    // ------------------------------------------------------------------
    // Document-storage collaborator surface
    // ------------------------------------------------------------------

    /// Generate a fresh per-document key.  The document subsystem owns
    /// when this happens and where the wrapped key is stored.
    pub fn generate_document_key(&self) -> DocumentKey {
        DocumentKey::generate()
    }

    /// Wrap a document key under the master key for persistence.
    /// Fails with [`VaultError::Locked`] while the vault is locked.
    pub fn wrap_for_storage(&self, document_key: &DocumentKey) -> Result<Vec<u8>> {
        self.state
            .with_master_key(|master| crypto::wrap_key(master, document_key))
    }

    /// Unwrap a stored document key.
    /// Fails with [`VaultError::Locked`] while the vault is locked.
    pub fn unwrap_from_storage(&self, wrapped: &[u8]) -> Result<DocumentKey> {
        self.state
            .with_master_key(|master| crypto::unwrap_key(master, wrapped))
    }

    /// Encrypt document content directly under its document key.
    /// Needs no master key, so it works in either lock state.
    pub fn encrypt_document(&self, document_key: &DocumentKey, plaintext: &[u8]) -> Result<Vec<u8>> {
        crypto::encrypt(document_key.as_bytes(), plaintext)
    }

    /// Decrypt document content directly under its document key.
    pub fn decrypt_document(&self, document_key: &DocumentKey, blob: &[u8]) -> Result<Vec<u8>> {
        crypto::decrypt(document_key.as_bytes(), blob)
    }

    // ------------------------------------------------------------------
    // Audit
    // ------------------------------------------------------------------

    #[cfg(feature = "audit-log")]
    fn audit(&self, operation: &str, details: Option<&str>) {
        crate::audit::log_audit(&self.state.config(), operation, details);
    }

    #[cfg(not(feature = "audit-log"))]
    fn audit(&self, _operation: &str, _details: Option<&str>) {}
}

fn require_initialized(config: &VaultConfig) -> Result<()> {
    if artifacts::is_initialized(config) {
        Ok(())
    } else {
        Err(VaultError::Config("vault is not set up".into()))
    }
}
