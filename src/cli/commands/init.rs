//! `credvault init` — create a new, empty vault.

use crate::cli::output;
use crate::cli::{prompt_new_password, Context};
use crate::errors::{CredVaultError, Result};
use crate::vault::create_vault;

/// Execute the `init` command.
pub fn execute(ctx: &Context) -> Result<()> {
    if ctx.vault_path.exists() {
        output::tip("Use `credvault add` to store credentials in the existing vault.");
        return Err(CredVaultError::VaultAlreadyExists(ctx.vault_path.clone()));
    }

    let password = prompt_new_password()?;
    let handle = create_vault(
        &ctx.vault_path,
        password.as_bytes(),
        Some(&ctx.settings.argon2_params()),
    )?;

    ctx.audit("init", Some("vault created"));

    output::success(&format!("Vault created at {}", handle.path().display()));
    output::tip("Run `credvault add <SERVICE>` to store a credential.");
    output::tip("Run `credvault shell` for the interactive menu.");

    Ok(())
}
