//! The single shared runtime record of a running vault.
//!
//! One exclusive lock guards the master key, the path configuration, the
//! activity clock, and the inactivity timeout as a unit.  Every accessor
//! that needs the master key holds that lock for the entire duration of
//! its cryptographic operation, so a concurrent `lock()` can never clear
//! the key out from under an in-flight encrypt or decrypt.
//!
//! Key derivation never happens while the lock is held: callers derive a
//! candidate key first, then lock briefly to validate and install it.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::VaultConfig;
use crate::crypto::MasterKey;
use crate::errors::{Result, VaultError};

struct RuntimeState {
    /// Present while Unlocked, `None` while Locked.  Dropping the key
    /// (on lock or auto-lock) overwrites its bytes before release.
    master_key: Option<MasterKey>,
    config: VaultConfig,
    last_activity: Instant,
    lock_timeout: Duration,
}

/// Shared, lock-guarded vault runtime state.  Clone the `Arc` to share
/// with the auto-lock scheduler and collaborator subsystems.
pub struct VaultState {
    inner: Mutex<RuntimeState>,
}

impl VaultState {
    /// Create a new state record in the Locked state.
    pub fn new(config: VaultConfig, lock_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(RuntimeState {
                master_key: None,
                config,
                last_activity: Instant::now(),
                lock_timeout,
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, RuntimeState> {
        // A poisoned lock means a panic elsewhere; the record itself is
        // still consistent, so recover the guard rather than propagate.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot the immutable path configuration.
    pub fn config(&self) -> VaultConfig {
        self.state().config.clone()
    }

    /// Install a master key: transition to Unlocked and reset the
    /// activity clock.  Replaces (and thereby zeroizes) any previous key.
    pub fn install(&self, master: MasterKey) {
        let mut state = self.state();
        state.master_key = Some(master);
        state.last_activity = Instant::now();
    }

    /// Transition to Locked unconditionally.
    ///
    /// Returns `true` if a key was actually cleared.  Safe to call at any
    /// time; it blocks briefly on the state lock but never preempts an
    /// operation that already holds it.
    pub fn lock(&self) -> bool {
        let mut state = self.state();
        state.master_key.take().is_some()
    }

    pub fn is_locked(&self) -> bool {
        self.state().master_key.is_none()
    }

    /// Reset the activity clock.  Valid in either state.
    pub fn touch(&self) {
        self.state().last_activity = Instant::now();
    }

    pub fn lock_timeout(&self) -> Duration {
        self.state().lock_timeout
    }

    /// True once the vault is Unlocked and the inactivity timeout has
    /// fully elapsed.
    pub fn should_auto_lock(&self) -> bool {
        let state = self.state();
        state.master_key.is_some() && state.last_activity.elapsed() >= state.lock_timeout
    }

    /// Atomically check the auto-lock predicate and, if due, clear the
    /// key.  Returns `true` when this call performed the transition.
    ///
    /// Used by the scheduler so that a `touch()` arriving between the
    /// check and the lock cannot be lost.
    pub fn try_auto_lock(&self) -> bool {
        let mut state = self.state();
        if state.master_key.is_some() && state.last_activity.elapsed() >= state.lock_timeout {
            state.master_key = None;
            true
        } else {
            false
        }
    }

    /// Seconds until auto-lock: the full timeout right after activity,
    /// zero when Locked or already due.
    pub fn remaining_secs(&self) -> u64 {
        let state = self.state();
        match state.master_key {
            Some(_) => state
                .lock_timeout
                .saturating_sub(state.last_activity.elapsed())
                .as_secs(),
            None => 0,
        }
    }

    /// Run `f` with a borrow of the master key, holding the state lock
    /// for the whole call.  Records activity.  Fails with
    /// [`VaultError::Locked`] when no key is installed.
    pub fn with_master_key<R>(&self, f: impl FnOnce(&MasterKey) -> Result<R>) -> Result<R> {
        let mut state = self.state();
        state.last_activity = Instant::now();
        match state.master_key.as_ref() {
            Some(master) => f(master),
            None => Err(VaultError::Locked),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_state(timeout: Duration) -> (TempDir, Arc<VaultState>) {
        let dir = TempDir::new().unwrap();
        let config = VaultConfig::new(dir.path());
        (dir, VaultState::new(config, timeout))
    }

    #[test]
    fn starts_locked() {
        let (_dir, state) = test_state(Duration::from_secs(300));
        assert!(state.is_locked());
        assert_eq!(state.remaining_secs(), 0);
    }

    #[test]
    fn install_then_lock() {
        let (_dir, state) = test_state(Duration::from_secs(300));

        state.install(MasterKey::new([7u8; 32]));
        assert!(!state.is_locked());

        assert!(state.lock());
        assert!(state.is_locked());
        // A second lock() is a no-op.
        assert!(!state.lock());
    }

    #[test]
    fn with_master_key_fails_when_locked() {
        let (_dir, state) = test_state(Duration::from_secs(300));
        let result = state.with_master_key(|_| Ok(()));
        assert!(matches!(result, Err(VaultError::Locked)));
    }

    #[test]
    fn should_auto_lock_only_after_timeout() {
        let (_dir, state) = test_state(Duration::from_millis(50));

        state.install(MasterKey::new([7u8; 32]));
        assert!(!state.should_auto_lock());

        std::thread::sleep(Duration::from_millis(80));
        assert!(state.should_auto_lock());
        assert!(state.try_auto_lock());
        assert!(state.is_locked());
    }

    #[test]
    fn touch_resets_the_clock() {
        let (_dir, state) = test_state(Duration::from_millis(80));

        state.install(MasterKey::new([7u8; 32]));
        std::thread::sleep(Duration::from_millis(50));
        state.touch();
        std::thread::sleep(Duration::from_millis(50));

        // 100 ms since install but only 50 ms since the touch.
        assert!(!state.should_auto_lock());
    }

    #[test]
    fn locked_state_never_auto_locks() {
        let (_dir, state) = test_state(Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(10));
        assert!(!state.should_auto_lock());
        assert!(!state.try_auto_lock());
    }
}
