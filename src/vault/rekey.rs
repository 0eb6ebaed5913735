//! Crash-safe re-keying for password change and recovery.
//!
//! Replacing the master key means replacing the salt/verify/recovery
//! artifact set *and* re-wrapping every document `.key` file from the old
//! master key to the new one.  Documents themselves are never touched:
//! their ciphertext stays under the same per-document key.
//!
//! The protocol stages everything in `<vault_dir>/rekey/`:
//!
//! 1. Stage `salt.new`, `verify.new`, `recovery.key.new`, and `kek.new`
//!    (the new master key wrapped under the old one).
//! 2. Re-wrap each document key, one at a time, via write-temp-then-
//!    rename.  A `.key` file is readable under exactly one of the two
//!    master keys at every instant.
//! 3. Write the `commit` marker, rename the staged artifacts into place,
//!    and remove the staging directory.
//!
//! Until `commit` exists, `unlock` keeps validating against the old
//! artifacts; a crash before that point is rolled back at the next
//! successful unlock (the old master key unwraps `kek.new`, which lets
//! us move already-re-wrapped documents back).  A crash after `commit`
//! is rolled forward by finishing the renames, which needs no secrets.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zeroize::Zeroize;

use super::artifacts::{self, atomic_write};
use crate::config::VaultConfig;
use crate::crypto::{self, MasterKey, RecoveryRecord, RecoverySecret, KEY_LEN};
use crate::errors::{Result, VaultError};

const STAGED_SALT: &str = "salt.new";
const STAGED_VERIFY: &str = "verify.new";
const STAGED_RECOVERY: &str = "recovery.key.new";
const STAGED_KEK: &str = "kek.new";
const COMMIT_MARKER: &str = "commit";

/// Extension of per-document wrapped-key files.
const KEY_FILE_EXT: &str = "key";

/// Re-key the vault from `old_master` to a key derived from
/// `new_password`, replacing the artifact set and re-wrapping every
/// document key.  Returns the new master key and the new recovery
/// secret.
pub(crate) fn rekey_vault(
    config: &VaultConfig,
    old_master: &MasterKey,
    new_password: &[u8],
) -> Result<(MasterKey, RecoverySecret)> {
    // Everything expensive happens before any file is touched.
    let new_salt = crypto::generate_salt();
    let mut new_bytes = crypto::derive_master_key(new_password, &new_salt)?;
    let new_master = MasterKey::new(new_bytes);
    new_bytes.zeroize();

    let secret = RecoverySecret::generate();
    let record = RecoveryRecord::create(&new_master, &secret, &new_salt)?;
    let verify_blob = artifacts::create_verify_blob(&new_master)?;

    // Stage the new artifact set.  `kek.new` goes last: once it is
    // durable, a rollback can always reach the new key through the old
    // one, so re-wrapping may begin.
    fs::create_dir_all(&config.rekey_dir)?;
    atomic_write(&config.rekey_dir.join(STAGED_SALT), &new_salt)?;
    atomic_write(&config.rekey_dir.join(STAGED_VERIFY), &verify_blob)?;
    atomic_write(
        &config.rekey_dir.join(STAGED_RECOVERY),
        &artifacts::encode_recovery(&record)?,
    )?;
    let escrow = crypto::encrypt(old_master.as_bytes(), new_master.as_bytes())?;
    atomic_write(&config.rekey_dir.join(STAGED_KEK), &escrow)?;

    rewrap_all(config, old_master, &new_master)?;

    // Commit point: from here on the vault belongs to the new key.
    atomic_write(&config.rekey_dir.join(COMMIT_MARKER), b"1")?;
    finish_commit(config)?;

    Ok((new_master, secret))
}

/// Re-wrap every document `.key` file under `new_master`.
///
/// Idempotent: a key file already wrapped under the new master key (left
/// by an interrupted earlier attempt) is skipped.  A key file readable
/// under neither master key aborts the re-key, leaving the staging
/// directory in place for rollback.
fn rewrap_all(config: &VaultConfig, old_master: &MasterKey, new_master: &MasterKey) -> Result<()> {
    for path in document_key_files(config)? {
        let wrapped = fs::read(&path)?;

        match crypto::unwrap_key(old_master, &wrapped) {
            Ok(dek) => {
                let rewrapped = crypto::wrap_key(new_master, &dek)?;
                atomic_write(&path, &rewrapped)?;
            }
            Err(VaultError::Authentication) => {
                // Already moved by an interrupted run, or foreign data.
                if crypto::unwrap_key(new_master, &wrapped).is_err() {
                    return Err(VaultError::Format(format!(
                        "document key {} is not readable under either master key",
                        path.display()
                    )));
                }
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

/// Collect every per-document `.key` file under the notes directory,
/// skipping the vault artifact directory itself.
fn document_key_files(config: &VaultConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(&config.notes_dir)
        .into_iter()
        .filter_entry(|e| e.path() != config.vault_dir);

    for entry in walker {
        let entry = entry.map_err(|e| match e.into_io_error() {
            Some(io) => VaultError::Io(io),
            None => VaultError::Format("unreadable entry in notes directory".into()),
        })?;

        let path = entry.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(KEY_FILE_EXT) {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

/// Whether an interrupted, uncommitted re-key is pending rollback.
pub(crate) fn has_pending_rollback(config: &VaultConfig) -> bool {
    config.rekey_dir.exists() && !config.rekey_dir.join(COMMIT_MARKER).exists()
}

/// Roll forward a committed re-key left behind by a crash.
///
/// No-op when there is no staging directory or the commit marker is
/// absent (that case waits for rollback at the next unlock instead).
pub(crate) fn resume_pending(config: &VaultConfig) -> Result<()> {
    if config.rekey_dir.join(COMMIT_MARKER).exists() {
        finish_commit(config)?;
    }
    Ok(())
}

/// Roll back an uncommitted re-key using the freshly-validated old
/// master key: any document key already moved to the new master key is
/// re-wrapped back, then the staging directory is removed.
pub(crate) fn roll_back_pending(config: &VaultConfig, old_master: &MasterKey) -> Result<()> {
    if !has_pending_rollback(config) {
        return Ok(());
    }

    let escrow_path = config.rekey_dir.join(STAGED_KEK);
    if escrow_path.exists() {
        let escrow = fs::read(&escrow_path)?;
        let mut new_bytes_vec = crypto::decrypt(old_master.as_bytes(), &escrow)?;
        if new_bytes_vec.len() != KEY_LEN {
            new_bytes_vec.zeroize();
            return Err(VaultError::Format(
                "staged re-key escrow has the wrong length".into(),
            ));
        }
        let mut new_bytes = [0u8; KEY_LEN];
        new_bytes.copy_from_slice(&new_bytes_vec);
        new_bytes_vec.zeroize();
        let new_master = MasterKey::new(new_bytes);
        new_bytes.zeroize();

        // Reverse direction: anything the interrupted run moved to the
        // new key goes back under the old one.
        rewrap_all(config, &new_master, old_master)?;
    }
    // Without kek.new the interrupted run never started re-wrapping, so
    // the staged artifacts can simply be discarded.

    fs::remove_dir_all(&config.rekey_dir)?;
    Ok(())
}

/// Rename the staged artifacts over the live ones and remove the staging
/// directory.  Idempotent: artifacts already renamed by an interrupted
/// earlier call are skipped.
fn finish_commit(config: &VaultConfig) -> Result<()> {
    rename_if_present(&config.rekey_dir.join(STAGED_SALT), &config.salt_path)?;
    rename_if_present(&config.rekey_dir.join(STAGED_VERIFY), &config.verify_path)?;
    rename_if_present(&config.rekey_dir.join(STAGED_RECOVERY), &config.recovery_path)?;

    fs::remove_dir_all(&config.rekey_dir)?;
    Ok(())
}

fn rename_if_present(from: &Path, to: &Path) -> Result<()> {
    if from.exists() {
        fs::rename(from, to)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::DocumentKey;
    use tempfile::TempDir;

    fn test_config() -> (TempDir, VaultConfig) {
        let dir = TempDir::new().unwrap();
        let config = VaultConfig::new(dir.path());
        fs::create_dir_all(&config.vault_dir).unwrap();
        (dir, config)
    }

    fn write_wrapped(config: &VaultConfig, name: &str, master: &MasterKey) -> DocumentKey {
        let dek = DocumentKey::generate();
        let wrapped = crypto::wrap_key(master, &dek).unwrap();
        fs::write(config.notes_dir.join(name), wrapped).unwrap();
        dek
    }

    #[test]
    fn resume_rolls_forward_a_committed_rekey() {
        let (_dir, config) = test_config();

        // Live artifacts from the "old" vault.
        fs::write(&config.salt_path, [1u8; 32]).unwrap();
        fs::write(&config.verify_path, b"old-verify").unwrap();
        fs::write(&config.recovery_path, b"old-recovery").unwrap();

        // Staged replacements plus the commit marker, as left by a crash
        // between commit and cleanup.
        fs::create_dir_all(&config.rekey_dir).unwrap();
        fs::write(config.rekey_dir.join(STAGED_SALT), [2u8; 32]).unwrap();
        fs::write(config.rekey_dir.join(STAGED_VERIFY), b"new-verify").unwrap();
        fs::write(config.rekey_dir.join(STAGED_RECOVERY), b"new-recovery").unwrap();
        fs::write(config.rekey_dir.join(COMMIT_MARKER), b"1").unwrap();

        resume_pending(&config).unwrap();

        assert_eq!(fs::read(&config.salt_path).unwrap(), [2u8; 32]);
        assert_eq!(fs::read(&config.verify_path).unwrap(), b"new-verify");
        assert_eq!(fs::read(&config.recovery_path).unwrap(), b"new-recovery");
        assert!(!config.rekey_dir.exists());
    }

    #[test]
    fn resume_leaves_an_uncommitted_rekey_alone() {
        let (_dir, config) = test_config();

        fs::create_dir_all(&config.rekey_dir).unwrap();
        fs::write(config.rekey_dir.join(STAGED_SALT), [2u8; 32]).unwrap();

        resume_pending(&config).unwrap();

        assert!(has_pending_rollback(&config));
    }

    #[test]
    fn rollback_restores_half_moved_document_keys() {
        let (_dir, config) = test_config();

        let old_master = MasterKey::new([0x11u8; 32]);
        let new_master = MasterKey::new([0x22u8; 32]);

        // One document still under the old key, one already moved by the
        // interrupted run.
        let dek_a = write_wrapped(&config, "a.key", &old_master);
        let dek_b = write_wrapped(&config, "b.key", &new_master);

        fs::create_dir_all(&config.rekey_dir).unwrap();
        let escrow = crypto::encrypt(old_master.as_bytes(), new_master.as_bytes()).unwrap();
        fs::write(config.rekey_dir.join(STAGED_KEK), escrow).unwrap();

        roll_back_pending(&config, &old_master).unwrap();

        // Both documents are readable under the old key again.
        let a = fs::read(config.notes_dir.join("a.key")).unwrap();
        let b = fs::read(config.notes_dir.join("b.key")).unwrap();
        assert_eq!(
            crypto::unwrap_key(&old_master, &a).unwrap().as_bytes(),
            dek_a.as_bytes()
        );
        assert_eq!(
            crypto::unwrap_key(&old_master, &b).unwrap().as_bytes(),
            dek_b.as_bytes()
        );
        assert!(!config.rekey_dir.exists());
    }

    #[test]
    fn rollback_without_escrow_just_discards_staging() {
        let (_dir, config) = test_config();

        let old_master = MasterKey::new([0x11u8; 32]);
        let dek = write_wrapped(&config, "a.key", &old_master);

        // Crash before kek.new was written: no document was touched.
        fs::create_dir_all(&config.rekey_dir).unwrap();
        fs::write(config.rekey_dir.join(STAGED_SALT), [9u8; 32]).unwrap();

        roll_back_pending(&config, &old_master).unwrap();

        let a = fs::read(config.notes_dir.join("a.key")).unwrap();
        assert_eq!(
            crypto::unwrap_key(&old_master, &a).unwrap().as_bytes(),
            dek.as_bytes()
        );
        assert!(!config.rekey_dir.exists());
    }

    #[test]
    fn key_files_inside_the_artifact_dir_are_not_rewrapped() {
        let (_dir, config) = test_config();

        let old_master = MasterKey::new([0x11u8; 32]);
        let new_master = MasterKey::new([0x22u8; 32]);
        write_wrapped(&config, "a.key", &old_master);

        // recovery.key lives in the artifact dir and must be skipped by
        // the walk even though it has the .key extension.
        fs::write(&config.recovery_path, b"not a wrapped key").unwrap();

        rewrap_all(&config, &old_master, &new_master).unwrap();

        let a = fs::read(config.notes_dir.join("a.key")).unwrap();
        assert!(crypto::unwrap_key(&new_master, &a).is_ok());
        assert_eq!(
            fs::read(&config.recovery_path).unwrap(),
            b"not a wrapped key"
        );
    }
}
