//! Integration tests for vault storage, the file format and unlock sessions.

use std::fs;

use credvault::crypto::kdf::Argon2Params;
use credvault::crypto::{derive_master_key_with_params, generate_nonce, seal, VaultKey};
use credvault::errors::CredVaultError;
use credvault::vault::format::{self, encode_header, encode_vault, read_vault, stage_write};
use credvault::vault::{
    create_vault, open_vault, quarantine_corrupt, Unlocker, VaultHandle, VaultHeader,
};
use tempfile::TempDir;
use zeroize::Zeroizing;

fn fast() -> Argon2Params {
    Argon2Params {
        memory_kib: 8_192,
        iterations: 1,
        parallelism: 1,
    }
}

/// Create a vault at `<tmp>/test.vault` holding one Gmail record.
fn gmail_vault(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("test.vault");
    let mut handle = create_vault(&path, b"alpaca123", Some(&fast())).unwrap();
    handle.upsert("Gmail", "bob@x.com", "hunter2");
    handle.save().unwrap();
    path
}

// ---------------------------------------------------------------------------
// Create / open / persist
// ---------------------------------------------------------------------------

#[test]
fn stored_record_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);

    let handle = VaultHandle::open(&path, b"alpaca123").unwrap();
    let record = handle.get("Gmail").expect("Gmail should be present");
    assert_eq!(record.username, "bob@x.com");
    assert_eq!(record.password, "hunter2");
}

#[test]
fn wrong_password_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);

    let err = VaultHandle::open(&path, b"wrong").unwrap_err();
    assert!(matches!(err, CredVaultError::WrongPassword));
}

#[test]
fn new_vault_is_empty_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.vault");
    create_vault(&path, b"pw", Some(&fast())).unwrap();

    let handle = VaultHandle::open(&path, b"pw").unwrap();
    assert!(handle.is_empty());
    assert!(handle.list_services().is_empty());
}

#[test]
fn create_twice_fails() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);

    let err = create_vault(&path, b"other", Some(&fast())).unwrap_err();
    assert!(matches!(err, CredVaultError::VaultAlreadyExists(_)));

    // The existing vault is untouched.
    assert!(VaultHandle::open(&path, b"alpaca123").is_ok());
}

#[test]
fn open_missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let err = VaultHandle::open(&dir.path().join("nope.vault"), b"pw").unwrap_err();
    assert!(matches!(err, CredVaultError::VaultNotFound(_)));
}

#[test]
fn create_makes_missing_parent_dirs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("v.vault");
    create_vault(&path, b"pw", Some(&fast())).unwrap();
    assert!(path.exists());
}

#[test]
fn insertion_order_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("order.vault");

    let mut handle = create_vault(&path, b"pw", Some(&fast())).unwrap();
    for service in ["Zeta", "Alpha", "Mid"] {
        handle.upsert(service, "user", "secret");
    }
    handle.save().unwrap();
    drop(handle);

    let handle = VaultHandle::open(&path, b"pw").unwrap();
    assert_eq!(handle.list_services(), vec!["Zeta", "Alpha", "Mid"]);
}

#[test]
fn upsert_overwrites_in_place() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);

    let mut handle = VaultHandle::open(&path, b"alpaca123").unwrap();
    handle.upsert("GitHub", "bob", "gh-pass");
    handle.upsert("Gmail", "bob@y.com", "new-pass");
    handle.save().unwrap();
    drop(handle);

    let handle = VaultHandle::open(&path, b"alpaca123").unwrap();
    assert_eq!(handle.len(), 2);
    assert_eq!(handle.list_services(), vec!["Gmail", "GitHub"]);
    assert_eq!(handle.get("Gmail").unwrap().password, "new-pass");
}

#[test]
fn repeated_identical_upsert_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);

    let mut handle = VaultHandle::open(&path, b"alpaca123").unwrap();
    handle.upsert("Gmail", "bob@x.com", "hunter2");
    handle.save().unwrap();
    drop(handle);

    let handle = VaultHandle::open(&path, b"alpaca123").unwrap();
    assert_eq!(handle.len(), 1);
    assert_eq!(handle.get("Gmail").unwrap().username, "bob@x.com");
}

#[test]
fn delete_then_get_returns_none() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);

    let mut handle = VaultHandle::open(&path, b"alpaca123").unwrap();
    assert!(handle.delete("Gmail"));
    assert!(!handle.delete("Gmail"));
    handle.save().unwrap();
    drop(handle);

    let handle = VaultHandle::open(&path, b"alpaca123").unwrap();
    assert!(handle.get("Gmail").is_none());
}

#[test]
fn service_names_are_case_sensitive() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);

    let handle = VaultHandle::open(&path, b"alpaca123").unwrap();
    assert!(handle.get("gmail").is_none());
}

// ---------------------------------------------------------------------------
// File format and integrity
// ---------------------------------------------------------------------------

#[test]
fn plaintext_never_reaches_disk() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);

    let raw = fs::read(&path).unwrap();
    let haystack = String::from_utf8_lossy(&raw);
    assert!(raw.starts_with(b"CVLT"));
    assert!(!haystack.contains("hunter2"));
    assert!(!haystack.contains("bob@x.com"));
    assert!(!haystack.contains("Gmail"));
}

#[test]
fn tampered_tag_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);

    let mut raw = fs::read(&path).unwrap();
    let last = raw.len() - 1;
    raw[last] ^= 0x01;
    fs::write(&path, &raw).unwrap();

    let err = VaultHandle::open(&path, b"alpaca123").unwrap_err();
    assert!(matches!(err, CredVaultError::WrongPassword));
}

#[test]
fn tampered_header_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);

    let file = read_vault(&path).unwrap();
    let mut header: VaultHeader = file.header.clone();
    header.salt[0] ^= 0xFF;
    let aad = encode_header(&header).unwrap();
    fs::write(&path, encode_vault(&aad, &file.nonce, &file.sealed).unwrap()).unwrap();

    let err = VaultHandle::open(&path, b"alpaca123").unwrap_err();
    assert!(matches!(err, CredVaultError::WrongPassword));
}

#[test]
fn every_save_uses_a_fresh_nonce_and_keeps_the_salt() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);
    let before = read_vault(&path).unwrap();

    let mut handle = VaultHandle::open(&path, b"alpaca123").unwrap();
    handle.save().unwrap();
    let after = read_vault(&path).unwrap();

    assert_ne!(before.nonce, after.nonce);
    assert_eq!(before.header.salt, after.header.salt);
    assert_eq!(before.header.created_at, after.header.created_at);
}

/// Rewrite the stored Argon2 settings, keeping everything else.
fn rewrite_kdf_params(path: &std::path::Path, memory_kib: u32) {
    let file = read_vault(path).unwrap();
    let mut header: VaultHeader = file.header.clone();
    header.argon2_params.memory_kib = memory_kib;
    let aad = encode_header(&header).unwrap();
    fs::write(path, encode_vault(&aad, &file.nonce, &file.sealed).unwrap()).unwrap();
}

#[test]
fn weak_kdf_params_in_header_are_corrupt() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);
    rewrite_kdf_params(&path, 1_024);

    let err = Unlocker::new(&path, 3).unwrap_err();
    assert!(matches!(err, CredVaultError::CorruptHeader(_)));
    assert!(err.is_corruption());
    assert_eq!(err.exit_code(), 2);

    // Corruption is what makes the file eligible for quarantine.
    quarantine_corrupt(&path).unwrap();
    assert!(!path.exists());
}

#[test]
fn oversized_kdf_params_fail_before_any_derivation() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);
    rewrite_kdf_params(&path, u32::MAX);

    let mut prompted = false;
    let err = open_vault(
        &path,
        |_| {
            prompted = true;
            Ok(Zeroizing::new("alpaca123".to_string()))
        },
        3,
    )
    .unwrap_err();

    assert!(matches!(err, CredVaultError::CorruptHeader(_)));
    assert!(!prompted);
    assert!(matches!(
        VaultHandle::open(&path, b"alpaca123"),
        Err(CredVaultError::CorruptHeader(_))
    ));
}

#[test]
fn truncated_file_is_corrupt_header() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);

    let raw = fs::read(&path).unwrap();
    fs::write(&path, &raw[..raw.len() - 5]).unwrap();

    let err = VaultHandle::open(&path, b"alpaca123").unwrap_err();
    assert!(matches!(err, CredVaultError::CorruptHeader(_)));
}

#[test]
fn empty_file_is_corrupt_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.vault");
    fs::write(&path, b"").unwrap();

    let err = Unlocker::new(&path, 3).unwrap_err();
    assert!(matches!(err, CredVaultError::CorruptHeader(_)));
    assert!(err.is_corruption());
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn garbage_file_is_corrupt_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("junk.vault");
    fs::write(&path, b"this is not a vault file at all").unwrap();

    let err = VaultHandle::open(&path, b"pw").unwrap_err();
    assert!(matches!(err, CredVaultError::CorruptHeader(_)));
}

#[test]
fn authentic_but_unparseable_payload_is_ledger_corrupt() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.vault");
    let params = fast();

    let header = VaultHeader {
        version: format::CURRENT_VERSION,
        salt: vec![7u8; 32],
        created_at: chrono::Utc::now(),
        argon2_params: params.into(),
    };
    let aad = encode_header(&header).unwrap();

    let key = VaultKey::new(derive_master_key_with_params(b"pw", &header.salt, &params).unwrap());
    let ledger_key = key.derive_ledger_key().unwrap();
    let nonce = generate_nonce();
    let sealed = seal(&ledger_key, &nonce, b"{not json", &aad).unwrap();
    fs::write(&path, encode_vault(&aad, &nonce, &sealed).unwrap()).unwrap();

    let err = VaultHandle::open(&path, b"pw").unwrap_err();
    assert!(matches!(err, CredVaultError::LedgerCorrupt(_)));
    assert_eq!(err.exit_code(), 2);
}

// ---------------------------------------------------------------------------
// Atomic writes
// ---------------------------------------------------------------------------

#[test]
fn interrupted_write_leaves_original_intact() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);
    let original = fs::read(&path).unwrap();

    // Stage a replacement but never commit it, as if the process died
    // between the temp write and the rename.
    let tmp = stage_write(&path, b"half-written garbage").unwrap();
    assert!(tmp.exists());

    assert_eq!(fs::read(&path).unwrap(), original);
    let handle = VaultHandle::open(&path, b"alpaca123").unwrap();
    assert_eq!(handle.get("Gmail").unwrap().password, "hunter2");
}

#[test]
fn save_leaves_no_temp_file_behind() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);

    assert!(!format::temp_path(&path).exists());
    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names.len(), 1);
}

#[cfg(unix)]
#[test]
fn vault_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);

    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

// ---------------------------------------------------------------------------
// Unlock sessions
// ---------------------------------------------------------------------------

#[test]
fn lockout_after_max_attempts() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);

    let mut unlocker = Unlocker::new(&path, 3).unwrap();
    assert_eq!(unlocker.attempts_remaining(), 3);

    assert!(matches!(
        unlocker.attempt(b"bad-1"),
        Err(CredVaultError::WrongPassword)
    ));
    assert!(matches!(
        unlocker.attempt(b"bad-2"),
        Err(CredVaultError::WrongPassword)
    ));
    assert!(matches!(
        unlocker.attempt(b"bad-3"),
        Err(CredVaultError::LockedOut { attempts: 3 })
    ));
    assert!(unlocker.is_locked_out());

    // Locked out is terminal: even the right password is refused.
    assert!(matches!(
        unlocker.attempt(b"alpaca123"),
        Err(CredVaultError::LockedOut { .. })
    ));
}

#[test]
fn correct_password_after_a_miss_unlocks() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);

    let mut unlocker = Unlocker::new(&path, 3).unwrap();
    assert!(unlocker.attempt(b"nope").is_err());
    assert_eq!(unlocker.attempts_remaining(), 2);

    let handle = unlocker.attempt(b"alpaca123").unwrap();
    assert_eq!(handle.len(), 1);
}

#[test]
fn open_vault_retries_through_the_prompt() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);

    let mut answers = vec!["alpaca123", "wrong"];
    let mut seen = Vec::new();
    let handle = open_vault(
        &path,
        |remaining| {
            seen.push(remaining);
            Ok(Zeroizing::new(answers.pop().unwrap().to_string()))
        },
        3,
    )
    .unwrap();

    assert_eq!(seen, vec![3, 2]);
    assert_eq!(handle.get("Gmail").unwrap().username, "bob@x.com");
}

#[test]
fn open_vault_locks_out_when_every_answer_is_wrong() {
    let dir = TempDir::new().unwrap();
    let path = gmail_vault(&dir);

    let mut calls = 0;
    let err = open_vault(
        &path,
        |_| {
            calls += 1;
            Ok(Zeroizing::new("wrong".to_string()))
        },
        2,
    )
    .unwrap_err();

    assert!(matches!(err, CredVaultError::LockedOut { attempts: 2 }));
    assert_eq!(calls, 2);
}

#[test]
fn corrupt_file_is_reported_before_any_prompt() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.vault");
    fs::write(&path, b"CVLT").unwrap();

    let mut prompted = false;
    let err = open_vault(
        &path,
        |_| {
            prompted = true;
            Ok(Zeroizing::new("pw".to_string()))
        },
        3,
    )
    .unwrap_err();

    assert!(matches!(err, CredVaultError::CorruptHeader(_)));
    assert!(!prompted);
}

#[test]
fn quarantine_moves_the_file_aside() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.vault");
    fs::write(&path, b"garbage").unwrap();

    let moved = quarantine_corrupt(&path).unwrap();

    assert!(!path.exists());
    assert_eq!(fs::read(&moved).unwrap(), b"garbage");
    let name = moved.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("bad.vault.corrupt-"));

    // The slot is free for a fresh vault.
    create_vault(&path, b"pw", Some(&fast())).unwrap();
}
