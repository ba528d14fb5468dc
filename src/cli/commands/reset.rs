//! `credvault reset` — move a corrupted vault file aside.
//!
//! Only a vault that is actually corrupted can be reset: either its
//! header cannot be parsed, or it unlocks but the decrypted contents are
//! unreadable.  A healthy vault is refused.  The file is renamed, never
//! deleted.

use crate::cli::output;
use crate::cli::{confirm, unlock, Context};
use crate::errors::{CredVaultError, Result};
use crate::vault::{format, quarantine_corrupt};

/// Execute the `reset` command.
pub fn execute(ctx: &Context, force: bool) -> Result<()> {
    match format::read_vault(&ctx.vault_path) {
        Err(CredVaultError::CorruptHeader(reason)) => {
            output::warning(&format!("Vault file is corrupted: {reason}"));
        }
        Err(e) => return Err(e),
        Ok(_) => match unlock(ctx) {
            Err(CredVaultError::LedgerCorrupt(reason)) => {
                output::warning(&format!("Vault contents are unreadable: {reason}"));
            }
            Ok(_) => {
                return Err(CredVaultError::CommandFailed(
                    "vault is not corrupted — refusing to reset it".into(),
                ))
            }
            Err(e) => return Err(e),
        },
    }

    if !force && !confirm("Move the corrupted vault aside? A new vault can then be created.")? {
        output::info("Cancelled.");
        return Ok(());
    }

    let moved = quarantine_corrupt(&ctx.vault_path)?;
    ctx.audit("reset", Some(&format!("moved to {}", moved.display())));

    output::success(&format!("Corrupted vault moved to {}", moved.display()));
    output::tip("Run `credvault init` to create a new vault.");

    Ok(())
}
