//! `credvault shell` — interactive menu.
//!
//! On first run (no vault file) the password entered becomes the master
//! password of a new, empty vault.  A corrupted vault is never replaced
//! without an explicit yes from the user, and even then the old file is
//! moved aside rather than deleted.

use console::style;

use crate::cli::commands::{add, delete};
use crate::cli::output;
use crate::cli::{confirm, prompt_new_password, read_line, read_secret, unlock, Context};
use crate::errors::{CredVaultError, Result};
use crate::vault::{create_vault, quarantine_corrupt, VaultHandle};

/// Main menu entries, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Store,
    Retrieve,
    ShowAll,
    Delete,
    Exit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 5] = [
        MenuChoice::Store,
        MenuChoice::Retrieve,
        MenuChoice::ShowAll,
        MenuChoice::Delete,
        MenuChoice::Exit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuChoice::Store => "Store new password",
            MenuChoice::Retrieve => "Retrieve password",
            MenuChoice::ShowAll => "Show all services",
            MenuChoice::Delete => "Delete service",
            MenuChoice::Exit => "Exit",
        }
    }
}

/// Execute the `shell` command.
pub fn execute(ctx: &Context) -> Result<()> {
    println!("{}", style("CREDVAULT PASSWORD MANAGER").bold());
    output::info(&format!("Vault: {}", ctx.vault_path.display()));

    let mut handle = open_or_create(ctx)?;
    let labels: Vec<&str> = MenuChoice::ALL.iter().map(|c| c.label()).collect();

    loop {
        println!();
        let index = dialoguer::Select::new()
            .with_prompt("Main menu")
            .items(&labels)
            .default(0)
            .interact()
            .map_err(|e| CredVaultError::CommandFailed(format!("menu: {e}")))?;

        let choice = MenuChoice::ALL[index];
        let result = match choice {
            MenuChoice::Store => store_entry(ctx, &mut handle),
            MenuChoice::Retrieve => retrieve_entry(&handle),
            MenuChoice::ShowAll => {
                output::print_services_table(handle.records());
                Ok(())
            }
            MenuChoice::Delete => delete_entry(ctx, &mut handle),
            MenuChoice::Exit => {
                output::info("Exiting.");
                return Ok(());
            }
        };

        match result {
            Ok(()) => {}
            Err(e @ (CredVaultError::CommandFailed(_) | CredVaultError::ServiceNotFound(_))) => {
                output::warning(&e.to_string());
            }
            Err(e) => return Err(e),
        }
    }
}

/// Unlock the vault, creating it on first run and offering quarantine
/// when the file is corrupted.
fn open_or_create(ctx: &Context) -> Result<VaultHandle> {
    if !ctx.vault_path.exists() {
        output::info("No vault found. The password you choose now becomes the master password.");
        return create_new(ctx);
    }

    match unlock(ctx) {
        Err(e) if e.is_corruption() => {
            output::warning(&e.to_string());
            if !confirm("Move the corrupted vault aside and create a new one?")? {
                return Err(e);
            }
            let moved = quarantine_corrupt(&ctx.vault_path)?;
            ctx.audit("reset", Some(&format!("moved to {}", moved.display())));
            output::warning(&format!("Corrupted vault moved to {}", moved.display()));
            create_new(ctx)
        }
        other => other,
    }
}

fn create_new(ctx: &Context) -> Result<VaultHandle> {
    let password = prompt_new_password()?;
    let handle = create_vault(
        &ctx.vault_path,
        password.as_bytes(),
        Some(&ctx.settings.argon2_params()),
    )?;
    ctx.audit("init", Some("vault created"));
    output::success("Vault created.");
    Ok(handle)
}

fn store_entry(ctx: &Context, handle: &mut VaultHandle) -> Result<()> {
    let service = read_line("Service name (e.g. Gmail)")?;
    let username = read_line("Username/Email")?;
    let password = read_secret("Password")?;

    let existed = add::store(handle, &service, &username, &password)?;
    ctx.audit("add", Some(if existed { "updated" } else { "added" }));
    output::success(&format!("Password for {service} saved."));
    Ok(())
}

fn retrieve_entry(handle: &VaultHandle) -> Result<()> {
    let service = read_line("Service name")?;
    let record = handle
        .get(&service)
        .ok_or_else(|| CredVaultError::ServiceNotFound(service.clone()))?;
    output::print_record(&service, record);
    Ok(())
}

fn delete_entry(ctx: &Context, handle: &mut VaultHandle) -> Result<()> {
    output::print_services_table(handle.records());
    if handle.is_empty() {
        return Ok(());
    }

    let service = read_line("Service name to delete")?;
    delete::remove(handle, &service)?;
    ctx.audit("delete", None);
    output::success(&format!("Service '{service}' deleted."));
    Ok(())
}
