//! Vault module — key lifecycle, persisted artifacts, and the runtime
//! state machine.
//!
//! This module provides:
//! - Persisted artifact IO with strict validation (`artifacts`)
//! - The lock-guarded runtime state record (`state`)
//! - The command surface and collaborator API (`service`)
//! - Crash-safe re-keying for password change and recovery (`rekey`)
//! - The background inactivity auto-lock (`autolock`)

pub mod artifacts;
pub mod autolock;
mod rekey;
pub mod service;
pub mod state;

// Re-export the most commonly used items.
pub use autolock::{AutoLockEvent, AutoLockScheduler};
pub use service::{VaultService, VaultStatus};
pub use state::VaultState;
