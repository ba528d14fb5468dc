//! `credvault add` — store or update a credential.

use std::io::{self, IsTerminal};

use crate::cli::output;
use crate::cli::{read_line, read_secret, unlock, validate_service_name, Context};
use crate::errors::{CredVaultError, Result};
use crate::vault::VaultHandle;

/// Execute the `add` command.
pub fn execute(ctx: &Context, service: &str, username: Option<&str>) -> Result<()> {
    validate_service_name(service)?;

    // Username: flag, or a visible prompt when interactive.
    let username = match username {
        Some(u) => u.to_string(),
        None if io::stdin().is_terminal() => read_line("Username/Email")?,
        None => {
            return Err(CredVaultError::CommandFailed(
                "pass --username when piping the password on stdin".into(),
            ))
        }
    };

    // Password: piped stdin, or a hidden prompt.
    let password = read_secret(&format!("Password for {service}"))?;

    let mut handle = unlock(ctx)?;
    let existed = store(&mut handle, service, &username, &password)?;

    ctx.audit("add", Some(if existed { "updated" } else { "added" }));

    let verb = if existed { "updated" } else { "saved" };
    output::success(&format!(
        "Password for {service} {verb} ({} total)",
        handle.len()
    ));

    Ok(())
}

/// Upsert a credential and persist the vault.
///
/// Returns whether the service already existed.
pub fn store(handle: &mut VaultHandle, service: &str, username: &str, password: &str) -> Result<bool> {
    validate_service_name(service)?;
    let existed = handle.get(service).is_some();
    handle.upsert(service, username, password);
    handle.save()?;
    Ok(existed)
}
