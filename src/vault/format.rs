//! Binary vault file format and the atomic replace protocol.
//!
//! A `.vault` file has this layout:
//!
//! ```text
//! [CVLT: 4][version: 1][header_len: 4 LE][header JSON]
//! [nonce: 12][ciphertext_len: 4 LE][ciphertext][tag: 16]
//! ```
//!
//! - **Magic** (`CVLT`): identifies the file as a CredVault vault.
//! - **Version**: binary format version (currently `1`).
//! - **Header JSON**: serialized `VaultHeader` (salt, KDF params, timestamp).
//! - **Nonce**: fresh per write.
//! - **Ciphertext** / **Tag**: AES-256-GCM output over the ledger payload.
//!
//! Every field is fixed-size or length-prefixed, and the file length must
//! match the declared lengths exactly.  Everything before the nonce is the
//! associated data for the AEAD, so the salt and KDF parameters are
//! covered by the tag too.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::encryption::{NONCE_LEN, TAG_LEN};
use crate::crypto::kdf::{Argon2Params, MIN_SALT_LEN};
use crate::errors::{CredVaultError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes at the start of every vault file.
const MAGIC: &[u8; 4] = b"CVLT";

/// Current binary format version.
pub const CURRENT_VERSION: u8 = 1;

/// Fixed-size prefix: 4 (magic) + 1 (version) + 4 (header_len).
const PREFIX_LEN: usize = 9;

/// Upper bound on the header JSON; a real header is well under 1 KiB.
const MAX_HEADER_LEN: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// VaultHeader
// ---------------------------------------------------------------------------

/// Argon2 parameters stored in the vault header so the exact same
/// KDF settings are used when re-opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArgon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl From<Argon2Params> for StoredArgon2Params {
    fn from(p: Argon2Params) -> Self {
        Self {
            memory_kib: p.memory_kib,
            iterations: p.iterations,
            parallelism: p.parallelism,
        }
    }
}

impl From<StoredArgon2Params> for Argon2Params {
    fn from(p: StoredArgon2Params) -> Self {
        Self {
            memory_kib: p.memory_kib,
            iterations: p.iterations,
            parallelism: p.parallelism,
        }
    }
}

/// Plaintext metadata stored at the beginning of a vault file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultHeader {
    /// Format version.
    pub version: u8,

    /// The salt used for Argon2id key derivation (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// When this vault was first created.
    pub created_at: DateTime<Utc>,

    /// Argon2 params used at vault creation.
    pub argon2_params: StoredArgon2Params,
}

/// A fully parsed vault file.
///
/// `aad` keeps the exact prefix + header bytes from disk so the tag is
/// verified over what was written, not over a re-serialization.
#[derive(Debug, Clone)]
pub struct VaultFile {
    pub header: VaultHeader,
    pub aad: Vec<u8>,
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext with the tag appended, as `encryption::open` expects it.
    pub sealed: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Build the associated-data prefix (magic, version, header) for `header`.
pub fn encode_header(header: &VaultHeader) -> Result<Vec<u8>> {
    let header_bytes = serde_json::to_vec(header)
        .map_err(|e| CredVaultError::SerializationError(format!("header: {e}")))?;
    let header_len = u32::try_from(header_bytes.len()).map_err(|_| {
        CredVaultError::SerializationError(format!(
            "header length {} exceeds u32::MAX",
            header_bytes.len()
        ))
    })?;

    let mut buf = Vec::with_capacity(PREFIX_LEN + header_bytes.len());
    buf.extend_from_slice(MAGIC); // 4 bytes
    buf.push(CURRENT_VERSION); // 1 byte
    buf.extend_from_slice(&header_len.to_le_bytes()); // 4 bytes LE
    buf.extend_from_slice(&header_bytes);
    Ok(buf)
}

/// Assemble a complete vault file from the AAD prefix and sealed payload.
pub fn encode_vault(aad: &[u8], nonce: &[u8; NONCE_LEN], sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < TAG_LEN {
        return Err(CredVaultError::SerializationError(
            "sealed payload shorter than the authentication tag".into(),
        ));
    }
    let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);
    let ct_len = u32::try_from(ciphertext.len()).map_err(|_| {
        CredVaultError::SerializationError(format!(
            "ciphertext length {} exceeds u32::MAX",
            ciphertext.len()
        ))
    })?;

    let total = aad.len() + NONCE_LEN + 4 + ciphertext.len() + TAG_LEN;
    let mut buf = Vec::with_capacity(total);
    buf.extend_from_slice(aad);
    buf.extend_from_slice(nonce);
    buf.extend_from_slice(&ct_len.to_le_bytes());
    buf.extend_from_slice(ciphertext);
    buf.extend_from_slice(tag);
    Ok(buf)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn corrupt(reason: impl Into<String>) -> CredVaultError {
    CredVaultError::CorruptHeader(reason.into())
}

/// Parse a vault file.  Any structural problem is `CorruptHeader`.
pub fn decode_vault(data: &[u8]) -> Result<VaultFile> {
    if data.is_empty() {
        return Err(corrupt("file is empty"));
    }
    if data.len() < PREFIX_LEN {
        return Err(corrupt("file too small to be a valid vault"));
    }
    if &data[0..4] != MAGIC {
        return Err(corrupt("missing CVLT magic bytes"));
    }

    let version = data[4];
    if version != CURRENT_VERSION {
        return Err(corrupt(format!(
            "unsupported version {version}, expected {CURRENT_VERSION}"
        )));
    }

    let header_len = read_u32_le(data, 5)? as usize;
    if header_len > MAX_HEADER_LEN {
        return Err(corrupt(format!("header length {header_len} is implausible")));
    }
    let header_end = PREFIX_LEN + header_len;
    let ct_len_at = header_end + NONCE_LEN;
    if ct_len_at + 4 > data.len() {
        return Err(corrupt("header length exceeds file size"));
    }

    let header: VaultHeader = serde_json::from_slice(&data[PREFIX_LEN..header_end])
        .map_err(|e| corrupt(format!("header JSON: {e}")))?;
    if header.version != CURRENT_VERSION {
        return Err(corrupt(format!(
            "header version {} does not match file version {version}",
            header.version
        )));
    }
    if header.salt.len() < MIN_SALT_LEN {
        return Err(corrupt(format!(
            "salt is {} bytes, expected at least {MIN_SALT_LEN}",
            header.salt.len()
        )));
    }
    Argon2Params::from(header.argon2_params)
        .validate()
        .map_err(|e| corrupt(format!("header KDF parameters: {e}")))?;

    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&data[header_end..ct_len_at]);

    let ct_len = read_u32_le(data, ct_len_at)? as usize;
    let ct_start = ct_len_at + 4;
    let expected = ct_start
        .checked_add(ct_len)
        .and_then(|n| n.checked_add(TAG_LEN))
        .ok_or_else(|| corrupt("ciphertext length overflows"))?;
    if expected != data.len() {
        return Err(corrupt(format!(
            "file is {} bytes but its fields declare {expected}",
            data.len()
        )));
    }

    let mut sealed = Vec::with_capacity(ct_len + TAG_LEN);
    sealed.extend_from_slice(&data[ct_start..]);

    Ok(VaultFile {
        header,
        aad: data[..header_end].to_vec(),
        nonce,
        sealed,
    })
}

fn read_u32_le(data: &[u8], at: usize) -> Result<u32> {
    let bytes: [u8; 4] = data
        .get(at..at + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| corrupt("truncated length field"))?;
    Ok(u32::from_le_bytes(bytes))
}

/// Read and parse a vault file from disk.
pub fn read_vault(path: &Path) -> Result<VaultFile> {
    if !path.exists() {
        return Err(CredVaultError::VaultNotFound(path.to_path_buf()));
    }
    let data = fs::read(path)?;
    decode_vault(&data)
}

// ---------------------------------------------------------------------------
// Atomic replace
// ---------------------------------------------------------------------------

/// Path of the temp file used while replacing `path`.
///
/// It lives in the same directory so the rename stays on one filesystem.
pub fn temp_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ))
}

/// First half of the atomic write: write `bytes` to the temp file and
/// flush it to disk.  The target file is untouched.
pub fn stage_write(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let tmp_path = temp_path(path);
    let mut file = fs::File::create(&tmp_path)?;

    // On Unix, restrict permissions to owner-only read/write.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(tmp_path)
}

/// Second half of the atomic write: rename the staged file over `path`.
pub fn commit_staged(tmp_path: &Path, path: &Path) -> Result<()> {
    fs::rename(tmp_path, path)?;

    // Persist the directory entry as well; not every platform allows
    // opening a directory, so failures here are ignored.
    #[cfg(unix)]
    if let Some(parent) = path.parent() {
        if let Ok(dir) = fs::File::open(if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        }) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}

/// Replace `path` with `bytes` atomically.  Readers see either the old
/// file or the new one, never a partial write.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = stage_write(path, bytes)?;
    if let Err(e) = commit_staged(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
