//! Background auto-lock scheduler.
//!
//! A single periodic task on a fixed tick (1 second by default) that
//! checks the vault state's auto-lock predicate and performs the lock
//! transition when the inactivity timeout has elapsed.  On each
//! transition it sends a one-way `Locked` notification so observers (the
//! UI layer, typically) can react.
//!
//! The scheduler performs no cryptography and holds the state lock only
//! for the predicate-check-plus-lock call.  It is cancelled cleanly by
//! `stop()` or by dropping the handle; cancellation mid-tick has no
//! persistent side effects.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::state::VaultState;

/// One-way notifications emitted by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoLockEvent {
    /// The vault was just locked due to inactivity.
    Locked,
}

/// Handle to the running scheduler thread.
pub struct AutoLockScheduler {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl AutoLockScheduler {
    /// Default polling interval.
    pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

    /// Spawn the scheduler thread.
    ///
    /// Returns the handle and the receiving end of the notification
    /// channel.  Dropping the receiver is fine; notifications are then
    /// discarded.
    pub fn spawn(state: Arc<VaultState>, tick: Duration) -> (Self, Receiver<AutoLockEvent>) {
        let (event_tx, event_rx) = mpsc::channel();
        let (stop_tx, stop_rx) = mpsc::channel();

        let handle = thread::spawn(move || loop {
            match stop_rx.recv_timeout(tick) {
                // Stop requested, or the handle was dropped.
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    if state.try_auto_lock() {
                        let _ = event_tx.send(AutoLockEvent::Locked);
                    }
                }
            }
        });

        (
            Self {
                stop_tx,
                handle: Some(handle),
            },
            event_rx,
        )
    }

    /// Stop the scheduler and wait for its thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AutoLockScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
