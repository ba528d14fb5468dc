//! Unlock session: the bounded password-attempt state machine.
//!
//! ```text
//! NoFile ──create_vault──▶ Open
//! file ──Unlocker::new──▶ Locked(n) ──attempt ok──▶ Open
//!                            │ attempt fails, n-1 > 0 ──▶ Locked(n-1)
//!                            └ attempt fails, n-1 = 0 ──▶ LockedOut (terminal)
//! ```
//!
//! The file is read and parsed once, before any password is asked for, so
//! a corrupt header is reported as `CorruptHeader` instead of burning
//! attempts.  Corrupt files are never removed here; `quarantine_corrupt`
//! moves one aside and is only called after the user confirms.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use zeroize::Zeroizing;

use crate::crypto::kdf::Argon2Params;
use crate::errors::{CredVaultError, Result};

use super::format::{self, VaultFile};
use super::store::VaultHandle;

/// Default number of password attempts per session.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Retry state for opening one vault file.
#[derive(Debug)]
pub struct Unlocker {
    path: PathBuf,
    file: VaultFile,
    max_attempts: u32,
    remaining: u32,
}

impl Unlocker {
    /// Read and parse the vault file.  No password is consumed here.
    pub fn new(path: &Path, max_attempts: u32) -> Result<Self> {
        let file = format::read_vault(path)?;
        let max_attempts = max_attempts.max(1);
        Ok(Self {
            path: path.to_path_buf(),
            file,
            max_attempts,
            remaining: max_attempts,
        })
    }

    /// Try one password.
    ///
    /// Once locked out, every call returns `LockedOut` without running
    /// the KDF or looking at `password`.
    pub fn attempt(&mut self, password: &[u8]) -> Result<VaultHandle> {
        if self.remaining == 0 {
            return Err(self.locked_out());
        }

        match VaultHandle::unlock(&self.path, self.file.clone(), password) {
            Ok(handle) => Ok(handle),
            Err(CredVaultError::WrongPassword) => {
                self.remaining -= 1;
                if self.remaining == 0 {
                    tracing::warn!(
                        path = %self.path.display(),
                        attempts = self.max_attempts,
                        "password attempts exhausted"
                    );
                    Err(self.locked_out())
                } else {
                    Err(CredVaultError::WrongPassword)
                }
            }
            Err(e) => Err(e),
        }
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.remaining
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_locked_out(&self) -> bool {
        self.remaining == 0
    }

    fn locked_out(&self) -> CredVaultError {
        CredVaultError::LockedOut {
            attempts: self.max_attempts,
        }
    }
}

/// Open a vault, prompting for the password up to `max_attempts` times.
///
/// `prompt` receives the number of attempts left (equal to
/// `max_attempts` on the first call) and returns the password to try.
/// Wrong passwords are retried; exhaustion returns `LockedOut`.
/// Every other error is returned immediately.
pub fn open_vault<F>(path: &Path, mut prompt: F, max_attempts: u32) -> Result<VaultHandle>
where
    F: FnMut(u32) -> Result<Zeroizing<String>>,
{
    let mut unlocker = Unlocker::new(path, max_attempts)?;
    loop {
        let password = prompt(unlocker.attempts_remaining())?;
        match unlocker.attempt(password.as_bytes()) {
            Err(CredVaultError::WrongPassword) => continue,
            other => return other,
        }
    }
}

/// Create a new empty vault protected by `password`.
pub fn create_vault(
    path: &Path,
    password: &[u8],
    argon2_params: Option<&Argon2Params>,
) -> Result<VaultHandle> {
    VaultHandle::create(path, password, argon2_params)
}

/// Move a corrupt vault aside as `<name>.corrupt-<timestamp>`.
///
/// Returns the new location.  The data is kept so it can still be
/// inspected or recovered by hand.
pub fn quarantine_corrupt(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(CredVaultError::VaultNotFound(path.to_path_buf()));
    }
    let stamp = Utc::now().format("%Y%m%dT%H%M%SZ");
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    let target = path.with_file_name(format!("{name}.corrupt-{stamp}"));
    fs::rename(path, &target)?;
    tracing::warn!(from = %path.display(), to = %target.display(), "quarantined corrupt vault");
    Ok(target)
}
