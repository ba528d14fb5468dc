//! High-level vault operations used by CLI commands.
//!
//! `VaultHandle` wraps the binary format layer, the crypto layer and the
//! ledger so the rest of the application can work with simple calls like
//! `handle.upsert("Gmail", "bob@x.com", "hunter2")` followed by
//! `handle.save()`.
//!
//! The derived vault key lives only inside the handle and is zeroized
//! when the handle is dropped.  The salt is fixed at creation; every
//! `save` seals under a fresh nonce.
//!
//! Only one process may use a vault file at a time.  There is no file
//! locking; two processes saving the same vault will each replace the
//! file atomically and the last writer wins.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use zeroize::Zeroize;

use crate::crypto::encryption::{generate_nonce, open, seal};
use crate::crypto::kdf::{derive_master_key_with_params, generate_salt, Argon2Params};
use crate::crypto::keys::VaultKey;
use crate::errors::{CredVaultError, Result};

use super::format::{self, VaultFile, VaultHeader, CURRENT_VERSION};
use super::ledger::{CredentialRecord, Ledger, LedgerEntry};

/// An unlocked vault: header bytes, decrypted ledger and key material.
pub struct VaultHandle {
    /// Path to the `.vault` file on disk.
    path: PathBuf,

    /// Exact header bytes (salt, KDF params, creation time) used as
    /// associated data when sealing.
    aad: Vec<u8>,

    /// Decrypted records.
    ledger: Ledger,

    /// The derived vault key (zeroized on drop).
    key: VaultKey,
}

impl VaultHandle {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a brand-new, empty vault file at `path`.
    ///
    /// Generates a random salt, derives the key from the password and
    /// writes the empty ledger to disk before returning.
    ///
    /// Pass `None` for `argon2_params` to use the defaults.
    pub fn create(
        path: &Path,
        password: &[u8],
        argon2_params: Option<&Argon2Params>,
    ) -> Result<Self> {
        if path.exists() {
            return Err(CredVaultError::VaultAlreadyExists(path.to_path_buf()));
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let salt = generate_salt();
        let params = argon2_params.copied().unwrap_or_default();

        let mut key_bytes = derive_master_key_with_params(password, &salt, &params)?;
        let key = VaultKey::new(key_bytes);
        key_bytes.zeroize();

        let header = VaultHeader {
            version: CURRENT_VERSION,
            salt: salt.to_vec(),
            created_at: Utc::now(),
            argon2_params: params.into(),
        };
        let aad = format::encode_header(&header)?;

        let mut handle = Self {
            path: path.to_path_buf(),
            aad,
            ledger: Ledger::new(),
            key,
        };
        handle.save()?;

        tracing::info!(path = %path.display(), "created vault");
        Ok(handle)
    }

    /// Open an existing vault file with a single password attempt.
    ///
    /// See `session::Unlocker` for the bounded retry loop.
    pub fn open(path: &Path, password: &[u8]) -> Result<Self> {
        let file = format::read_vault(path)?;
        Self::unlock(path, file, password)
    }

    /// Derive the key for an already parsed vault file and decrypt it.
    ///
    /// A tag mismatch is logged as an integrity failure and reported to
    /// the caller as `WrongPassword`; the two cannot be told apart.
    pub(crate) fn unlock(path: &Path, file: VaultFile, password: &[u8]) -> Result<Self> {
        let params: Argon2Params = file.header.argon2_params.into();
        let mut key_bytes = derive_master_key_with_params(password, &file.header.salt, &params)?;
        let key = VaultKey::new(key_bytes);
        key_bytes.zeroize();

        let mut ledger_key = key.derive_ledger_key()?;
        let opened = open(&ledger_key, &file.nonce, &file.sealed, &file.aad);
        ledger_key.zeroize();

        let plaintext = match opened {
            Ok(p) => p,
            Err(CredVaultError::IntegrityCheckFailed) => {
                tracing::warn!(path = %path.display(), "vault integrity check failed");
                return Err(CredVaultError::WrongPassword);
            }
            Err(e) => return Err(e),
        };

        let ledger = Ledger::from_bytes(&plaintext).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "authenticated payload did not parse");
            e
        })?;

        tracing::debug!(path = %path.display(), records = ledger.len(), "vault unlocked");

        Ok(Self {
            path: path.to_path_buf(),
            aad: file.aad,
            ledger,
            key,
        })
    }

    // ------------------------------------------------------------------
    // Record operations
    // ------------------------------------------------------------------

    /// Insert or overwrite a record.  Call `save` to persist it.
    pub fn upsert(&mut self, service: &str, username: &str, password: &str) {
        self.ledger.upsert(service, username, password);
    }

    pub fn get(&self, service: &str) -> Option<&CredentialRecord> {
        self.ledger.get(service)
    }

    /// Remove a record.  Returns whether it existed.  Call `save` after.
    pub fn delete(&mut self, service: &str) -> bool {
        self.ledger.delete(service)
    }

    /// Service names in insertion order.
    pub fn list_services(&self) -> Vec<&str> {
        self.ledger.service_names()
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[LedgerEntry] {
        self.ledger.list()
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Seal the ledger under a fresh nonce and atomically replace the file.
    pub fn save(&mut self) -> Result<()> {
        let bytes = self.seal_to_bytes()?;
        format::write_atomic(&self.path, &bytes)?;
        tracing::debug!(path = %self.path.display(), records = self.ledger.len(), "vault saved");
        Ok(())
    }

    /// Produce the complete on-disk bytes for the current ledger.
    pub fn seal_to_bytes(&self) -> Result<Vec<u8>> {
        let plaintext = self.ledger.to_bytes()?;
        let nonce = generate_nonce();

        let mut ledger_key = self.key.derive_ledger_key()?;
        let sealed = seal(&ledger_key, &nonce, &plaintext, &self.aad);
        ledger_key.zeroize();

        format::encode_vault(&self.aad, &nonce, &sealed?)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.ledger.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty()
    }
}

impl std::fmt::Debug for VaultHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultHandle")
            .field("path", &self.path)
            .field("records", &self.ledger.len())
            .finish_non_exhaustive()
    }
}
