//! AES-256-GCM authenticated encryption.
//!
//! Unlike a nonce-prefixed blob, the vault format stores the nonce as its
//! own fixed-length field, so `seal` and `open` take it explicitly.  The
//! returned buffer is `ciphertext || 16-byte tag`.
//!
//! `open` fails closed: on any tag mismatch it returns
//! `IntegrityCheckFailed` and no plaintext at all.

use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use zeroize::Zeroizing;

use crate::errors::{CredVaultError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Generate a fresh random nonce.  Must be called for every seal.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    Aes256Gcm::generate_nonce(&mut OsRng).into()
}

/// Encrypt and authenticate `plaintext`, binding `aad` into the tag.
pub fn seal(key: &[u8], nonce: &[u8; NONCE_LEN], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CredVaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    cipher
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| CredVaultError::EncryptionFailed(format!("encryption error: {e}")))
}

/// Verify and decrypt data produced by `seal`.
///
/// The plaintext is wrapped in `Zeroizing` so it is wiped when dropped.
pub fn open(
    key: &[u8],
    nonce: &[u8; NONCE_LEN],
    ciphertext_and_tag: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    if ciphertext_and_tag.len() < TAG_LEN {
        return Err(CredVaultError::IntegrityCheckFailed);
    }

    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|_| CredVaultError::IntegrityCheckFailed)?;

    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext_and_tag,
                aad,
            },
        )
        .map_err(|_| CredVaultError::IntegrityCheckFailed)?;

    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sealed_output_is_plaintext_plus_tag() {
        let key = [1u8; 32];
        let nonce = generate_nonce();
        let sealed = seal(&key, &nonce, b"hello", b"").unwrap();
        assert_eq!(sealed.len(), 5 + TAG_LEN);
    }

    #[test]
    fn nonces_are_fresh() {
        assert_ne!(generate_nonce(), generate_nonce());
    }

    #[test]
    fn short_input_fails_closed() {
        let key = [1u8; 32];
        let err = open(&key, &[0u8; NONCE_LEN], &[0u8; 4], b"").unwrap_err();
        assert!(matches!(err, CredVaultError::IntegrityCheckFailed));
    }

    #[test]
    fn bad_key_length_is_rejected() {
        assert!(seal(&[0u8; 7], &[0u8; NONCE_LEN], b"x", b"").is_err());
    }
}
