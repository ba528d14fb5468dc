//! `credvault delete` — remove a service from the vault.

use crate::cli::output;
use crate::cli::{confirm, unlock, Context};
use crate::errors::{CredVaultError, Result};
use crate::vault::VaultHandle;

/// Execute the `delete` command.
pub fn execute(ctx: &Context, service: &str, force: bool) -> Result<()> {
    // Unless --force is set, ask for confirmation before deleting.
    if !force && !confirm(&format!("Delete service '{service}'?"))? {
        output::info("Cancelled.");
        return Ok(());
    }

    let mut handle = unlock(ctx)?;
    remove(&mut handle, service)?;

    ctx.audit("delete", None);
    output::success(&format!("Service '{service}' deleted"));

    Ok(())
}

/// Delete a service and persist the vault.
///
/// A missing service is `ServiceNotFound` and leaves the file untouched.
pub fn remove(handle: &mut VaultHandle, service: &str) -> Result<()> {
    if !handle.delete(service) {
        return Err(CredVaultError::ServiceNotFound(service.to_string()));
    }
    handle.save()
}
