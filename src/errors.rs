use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in CredVault.
#[derive(Debug, Error)]
pub enum CredVaultError {
    // --- Auth errors ---
    #[error("Invalid password")]
    WrongPassword,

    #[error("Too many failed attempts ({attempts}) — vault locked for this session")]
    LockedOut { attempts: u32 },

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// AEAD tag mismatch. Deliberately says nothing about whether the key
    /// or the data was wrong.
    #[error("Authentication failed — wrong password or corrupted data")]
    IntegrityCheckFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Vault file errors ---
    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    #[error("Vault file is corrupted: {0}")]
    CorruptHeader(String),

    #[error("Decrypted vault contents are unreadable: {0}")]
    LedgerCorrupt(String),

    // --- Record errors ---
    #[error("No entry found for service '{0}'")]
    ServiceNotFound(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Audit error: {0}")]
    AuditError(String),
}

impl CredVaultError {
    /// Process exit code for this error.
    ///
    /// `2` is reserved for vault files that cannot be recovered by retrying
    /// with another password; everything else (including lockout) is `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CorruptHeader(_) | Self::LedgerCorrupt(_) => 2,
            _ => 1,
        }
    }

    /// `true` for the corruption conditions that should offer quarantine.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::CorruptHeader(_) | Self::LedgerCorrupt(_))
    }
}

/// Convenience type alias for CredVault results.
pub type Result<T> = std::result::Result<T, CredVaultError>;
