//! Integration tests for the NoteVault vault service.

use std::fs;

use notevault::config::{Settings, VaultConfig};
use notevault::errors::VaultError;
use notevault::vault::VaultService;
use tempfile::TempDir;

/// Helper: build a service over a fresh temp notes directory.
fn test_service() -> (TempDir, VaultService) {
    let dir = TempDir::new().expect("create temp dir");
    let settings = Settings {
        lock_timeout_secs: 300,
    };
    let service =
        VaultService::new(VaultConfig::new(dir.path()), &settings).expect("build service");
    (dir, service)
}

// ---------------------------------------------------------------------------
// Setup / unlock / lock cycle
// ---------------------------------------------------------------------------

#[test]
fn fresh_vault_is_uninitialized_and_locked() {
    let (_dir, service) = test_service();
    let status = service.status();

    assert!(!status.initialized);
    assert!(status.locked);
    assert_eq!(status.timeout_remaining_secs, 0);
}

#[test]
fn setup_unlock_lock_cycle() {
    let (_dir, service) = test_service();

    service.setup(b"hunter2-hunter2").expect("setup");
    assert!(service.is_setup());
    assert!(!service.status().locked, "setup leaves the vault unlocked");

    service.lock();
    assert!(service.status().locked);

    // Wrong password: state stays locked.
    let err = service.unlock(b"wrong-password").unwrap_err();
    assert!(matches!(err, VaultError::Authentication));
    assert!(service.status().locked);

    // Correct password unlocks.
    service.unlock(b"hunter2-hunter2").expect("unlock");
    assert!(!service.status().locked);
}

#[test]
fn setup_twice_is_a_config_error() {
    let (_dir, service) = test_service();

    service.setup(b"first-password").expect("setup");
    let err = service.setup(b"second-password").unwrap_err();
    assert!(matches!(err, VaultError::Config(_)));
}

#[test]
fn locked_vault_refuses_key_operations() {
    let (_dir, service) = test_service();
    service.setup(b"some-password").expect("setup");

    let dek = service.generate_document_key();
    let wrapped = service.wrap_for_storage(&dek).expect("wrap while unlocked");

    service.lock();

    assert!(matches!(
        service.wrap_for_storage(&dek),
        Err(VaultError::Locked)
    ));
    assert!(matches!(
        service.unwrap_from_storage(&wrapped),
        Err(VaultError::Locked)
    ));

    // Document-content crypto needs no master key, so it still works.
    let ct = service.encrypt_document(&dek, b"note body").expect("encrypt");
    assert_eq!(
        service.decrypt_document(&dek, &ct).expect("decrypt"),
        b"note body"
    );
}

#[test]
fn touch_restores_the_full_countdown() {
    let dir = TempDir::new().unwrap();
    let settings = Settings {
        lock_timeout_secs: 2,
    };
    let service = VaultService::new(VaultConfig::new(dir.path()), &settings).unwrap();

    service.setup(b"countdown-pass").expect("setup");
    std::thread::sleep(std::time::Duration::from_millis(2100));

    // The timeout has elapsed; without the scheduler the state is still
    // unlocked, but the countdown has hit zero.
    assert_eq!(service.status().timeout_remaining_secs, 0);

    service.touch();
    assert!(service.status().timeout_remaining_secs >= 1);
}

// ---------------------------------------------------------------------------
// Document keys across re-keying
// ---------------------------------------------------------------------------

#[test]
fn document_key_and_ciphertext_survive_password_change() {
    let (dir, service) = test_service();
    service.setup(b"old-password").expect("setup");

    // Simulate the document subsystem: one note with its wrapped key.
    let dek = service.generate_document_key();
    let wrapped = service.wrap_for_storage(&dek).expect("wrap");
    let note_ct = service
        .encrypt_document(&dek, b"# Groceries\n\nmilk, eggs")
        .expect("encrypt note");

    let key_path = dir.path().join("groceries.key");
    let note_path = dir.path().join("groceries.enc");
    fs::write(&key_path, &wrapped).unwrap();
    fs::write(&note_path, &note_ct).unwrap();

    let new_secret = service
        .change_password(b"old-password", b"new-password")
        .expect("change password");
    assert!(!new_secret.as_str().is_empty());
    assert!(!service.status().locked, "ends unlocked under the new key");

    // The old password is dead, the new one works (fresh service, as a
    // restarted process would see it).
    let settings = Settings {
        lock_timeout_secs: 300,
    };
    let reopened = VaultService::new(VaultConfig::new(dir.path()), &settings).unwrap();
    assert!(matches!(
        reopened.unlock(b"old-password"),
        Err(VaultError::Authentication)
    ));
    reopened.unlock(b"new-password").expect("unlock with new");

    // The stored wrapped key now unwraps under the new master key to the
    // exact same document key.
    let rewrapped = fs::read(&key_path).unwrap();
    assert_ne!(rewrapped, wrapped, "the wrapping must have changed");
    let dek_after = reopened
        .unwrap_from_storage(&rewrapped)
        .expect("unwrap under new master");
    assert_eq!(dek_after.as_bytes(), dek.as_bytes());

    // The note ciphertext was never re-encrypted.
    assert_eq!(fs::read(&note_path).unwrap(), note_ct);
    assert_eq!(
        reopened
            .decrypt_document(&dek_after, &fs::read(&note_path).unwrap())
            .expect("decrypt note"),
        b"# Groceries\n\nmilk, eggs"
    );
}

#[test]
fn change_password_with_wrong_current_leaves_artifacts_untouched() {
    let (dir, service) = test_service();
    service.setup(b"real-password").expect("setup");

    let vault_dir = dir.path().join(".vault");
    let salt_before = fs::read(vault_dir.join("salt")).unwrap();
    let verify_before = fs::read(vault_dir.join("verify")).unwrap();
    let recovery_before = fs::read(vault_dir.join("recovery.key")).unwrap();

    let err = service
        .change_password(b"wrong-password", b"whatever-new")
        .unwrap_err();
    assert!(matches!(err, VaultError::Authentication));

    assert_eq!(fs::read(vault_dir.join("salt")).unwrap(), salt_before);
    assert_eq!(fs::read(vault_dir.join("verify")).unwrap(), verify_before);
    assert_eq!(
        fs::read(vault_dir.join("recovery.key")).unwrap(),
        recovery_before
    );
}

// ---------------------------------------------------------------------------
// Recovery
// ---------------------------------------------------------------------------

#[test]
fn recover_replaces_the_password_and_spends_the_secret() {
    let (dir, service) = test_service();

    let first_secret = service.setup(b"password-one").expect("setup");

    // A document that must survive the recovery re-key.
    let dek = service.generate_document_key();
    let wrapped = service.wrap_for_storage(&dek).expect("wrap");
    fs::write(dir.path().join("journal.key"), &wrapped).unwrap();

    service.lock();

    let second_secret = service
        .recover(first_secret.as_str(), b"password-two")
        .expect("recover");
    assert!(!service.status().locked, "recover ends unlocked");

    assert!(matches!(
        service.unlock(b"password-one"),
        Err(VaultError::Authentication)
    ));
    service.unlock(b"password-two").expect("unlock with new");

    // The document key is unchanged underneath its new wrapping.
    let rewrapped = fs::read(dir.path().join("journal.key")).unwrap();
    let dek_after = service.unwrap_from_storage(&rewrapped).expect("unwrap");
    assert_eq!(dek_after.as_bytes(), dek.as_bytes());

    // The first secret is spent; only the new one recovers now.
    assert!(matches!(
        service.recover(first_secret.as_str(), b"password-three"),
        Err(VaultError::Authentication)
    ));
    service
        .recover(second_secret.as_str(), b"password-three")
        .expect("recover with the new secret");
}

// ---------------------------------------------------------------------------
// Malformed artifacts
// ---------------------------------------------------------------------------

#[test]
fn unlock_before_setup_is_a_config_error() {
    let (_dir, service) = test_service();

    assert!(matches!(
        service.unlock(b"any-password"),
        Err(VaultError::Config(_))
    ));
}

#[test]
fn wrong_length_salt_is_a_format_error_not_truncated() {
    let (dir, service) = test_service();

    let vault_dir = dir.path().join(".vault");
    fs::create_dir_all(&vault_dir).unwrap();
    fs::write(vault_dir.join("salt"), [7u8; 16]).unwrap();

    let err = service.unlock(b"any-password").unwrap_err();
    assert!(matches!(err, VaultError::Format(_)));
}

#[test]
fn garbage_recovery_record_is_a_format_error() {
    let (dir, service) = test_service();
    service.setup(b"some-password").expect("setup");

    fs::write(dir.path().join(".vault").join("recovery.key"), b"not json").unwrap();

    let err = service.recover("AAAA-BBBB-CCCC", b"new-password").unwrap_err();
    assert!(matches!(err, VaultError::Format(_)));
}
