//! In-memory credential ledger and its plaintext payload encoding.
//!
//! The ledger is an insertion-ordered map of service name to
//! `CredentialRecord`.  Service names are case-sensitive exact keys.
//! Overwriting a service keeps its original position.
//!
//! The payload handed to the cipher is JSON:
//!
//! ```text
//! {"version":1,"entries":[{"service":"..","username":"..","password":".."}]}
//! ```

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::errors::{CredVaultError, Result};

/// Current payload schema version.
const PAYLOAD_VERSION: u32 = 1;

/// Login details stored for one service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CredentialRecord {
    pub username: String,
    pub password: String,
}

impl CredentialRecord {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// One row of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct LedgerEntry {
    pub service: String,
    #[serde(flatten)]
    pub record: CredentialRecord,
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    version: u32,
    entries: &'a [LedgerEntry],
}

#[derive(Deserialize)]
struct Payload {
    version: u32,
    entries: Vec<LedgerEntry>,
}

/// Insertion-ordered service → credential mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record for `service`.
    pub fn upsert(&mut self, service: &str, username: &str, password: &str) {
        let record = CredentialRecord::new(username, password);
        match self.position(service) {
            Some(i) => self.entries[i].record = record,
            None => self.entries.push(LedgerEntry {
                service: service.to_string(),
                record,
            }),
        }
    }

    pub fn get(&self, service: &str) -> Option<&CredentialRecord> {
        self.position(service).map(|i| &self.entries[i].record)
    }

    /// Remove `service`.  Returns whether an entry existed.
    pub fn delete(&mut self, service: &str) -> bool {
        match self.position(service) {
            Some(i) => {
                self.entries.remove(i);
                true
            }
            None => false,
        }
    }

    /// All entries in insertion order.
    pub fn list(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn service_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.service.as_str()).collect()
    }

    pub fn contains(&self, service: &str) -> bool {
        self.position(service).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, service: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.service == service)
    }

    // ------------------------------------------------------------------
    // Payload encoding
    // ------------------------------------------------------------------

    /// Serialize to the plaintext payload.  The buffer is wiped on drop.
    pub fn to_bytes(&self) -> Result<Zeroizing<Vec<u8>>> {
        let payload = PayloadRef {
            version: PAYLOAD_VERSION,
            entries: &self.entries,
        };
        serde_json::to_vec(&payload)
            .map(Zeroizing::new)
            .map_err(|e| CredVaultError::SerializationError(format!("ledger: {e}")))
    }

    /// Parse a decrypted payload.
    ///
    /// A malformed payload is `LedgerCorrupt`, never an empty ledger: the
    /// caller must be able to tell "nothing stored" from "data lost".
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let payload: Payload = serde_json::from_slice(bytes)
            .map_err(|e| CredVaultError::LedgerCorrupt(format!("payload JSON: {e}")))?;

        if payload.version != PAYLOAD_VERSION {
            return Err(CredVaultError::LedgerCorrupt(format!(
                "unsupported payload version {}",
                payload.version
            )));
        }

        let mut ledger = Self::new();
        for entry in payload.entries {
            if ledger.contains(&entry.service) {
                return Err(CredVaultError::LedgerCorrupt(format!(
                    "service '{}' appears more than once",
                    entry.service
                )));
            }
            ledger.entries.push(entry);
        }
        Ok(ledger)
    }
}
