//! Vault module — encrypted credential storage.
//!
//! This module provides:
//! - The in-memory credential ledger and its payload codec (`ledger`)
//! - The length-prefixed binary file format and atomic writes (`format`)
//! - `VaultHandle` for creating, opening and saving a vault (`store`)
//! - The bounded-attempt unlock state machine (`session`)

pub mod format;
pub mod ledger;
pub mod session;
pub mod store;

// Re-export the most commonly used items.
pub use format::{StoredArgon2Params, VaultHeader};
pub use ledger::{CredentialRecord, Ledger, LedgerEntry};
pub use session::{
    create_vault, open_vault, quarantine_corrupt, Unlocker, DEFAULT_MAX_ATTEMPTS,
};
pub use store::VaultHandle;
