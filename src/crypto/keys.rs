//! Vault key material.
//!
//! The Argon2id output is held in a `VaultKey`, which zeroes itself on
//! drop.  The AES-256-GCM key that actually seals the ledger is expanded
//! from it with HKDF-SHA256 under a fixed context string, so the raw KDF
//! output never touches the cipher directly.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{CredVaultError, Result};

/// Length of derived sub-keys (256 bits).
const KEY_LEN: usize = 32;

/// HKDF context for the ledger cipher key.
const LEDGER_KEY_INFO: &[u8] = b"credvault-ledger-aead-v1";

/// Derive the ledger encryption key from the vault key.
pub fn derive_ledger_key(vault_key: &[u8]) -> Result<[u8; KEY_LEN]> {
    hkdf_derive(vault_key, LEDGER_KEY_INFO)
}

/// Run HKDF-SHA256 with no salt and the given `info`.
///
/// The input already came out of Argon2id, so the per-vault salt is not
/// needed a second time here.
fn hkdf_derive(ikm: &[u8], info: &[u8]) -> Result<[u8; KEY_LEN]> {
    let hk = Hkdf::<Sha256>::new(None, ikm);

    let mut okm = [0u8; KEY_LEN];
    hk.expand(info, &mut okm)
        .map_err(|e| CredVaultError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;

    Ok(okm)
}

/// A 32-byte vault key that zeroes its memory when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
    bytes: [u8; KEY_LEN],
}

impl VaultKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Derive the ledger cipher key from this vault key.
    pub fn derive_ledger_key(&self) -> Result<[u8; KEY_LEN]> {
        derive_ledger_key(&self.bytes)
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VaultKey([REDACTED])")
    }
}
