//! Cryptographic primitives for CredVault.
//!
//! This module provides:
//! - AES-256-GCM sealing and opening with associated data (`encryption`)
//! - Argon2id password-based key derivation (`kdf`)
//! - The zeroizing `VaultKey` and its HKDF ledger sub-key (`keys`)

pub mod encryption;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{seal, open, derive_master_key_with_params, ...};
pub use encryption::{generate_nonce, open, seal, NONCE_LEN, TAG_LEN};
pub use kdf::{derive_master_key_with_params, generate_salt, Argon2Params};
pub use keys::{derive_ledger_key, VaultKey};
