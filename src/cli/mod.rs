//! CLI module — Clap argument parser, prompts, output helpers, and
//! command implementations.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{CredVaultError, Result};
use crate::vault::{open_vault, VaultHandle};

/// Environment variable holding the master password for scripted use.
pub const PASSWORD_ENV: &str = "CREDVAULT_PASSWORD";

/// Longest accepted service name, in characters.
const MAX_SERVICE_LEN: usize = 128;

/// CredVault CLI: encrypted credential store.
#[derive(Parser)]
#[command(name = "credvault", about = "Encrypted credential store", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault file (default: `vault_path` from .credvault.toml, else credvault.vault)
    #[arg(long, global = true, env = "CREDVAULT_PATH")]
    pub vault: Option<String>,

    /// Diagnostic output on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new, empty vault
    Init,

    /// Store a credential (add or update)
    Add {
        /// Service name (e.g. Gmail)
        service: String,
        /// Username or email (prompted for if omitted)
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Show the username and password for a service
    Get {
        /// Service name
        service: String,
    },

    /// List all stored services
    List,

    /// Delete a service
    Delete {
        /// Service name
        service: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Interactive menu (creates the vault on first run)
    Shell,

    /// Move a corrupted vault file aside so a new one can be created
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },

    /// View the audit log of vault operations
    #[cfg(feature = "audit-log")]
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolved settings and vault location for one invocation.
#[derive(Debug, Clone)]
pub struct Context {
    pub settings: Settings,
    pub vault_path: PathBuf,
}

impl Context {
    /// Load `.credvault.toml` from the working directory and apply `--vault`.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let settings = Settings::load(&cwd)?;
        let vault_path = match &cli.vault {
            Some(p) => cwd.join(p),
            None => settings.vault_path(&cwd),
        };
        Ok(Self {
            settings,
            vault_path,
        })
    }

    /// Record an audit event; a no-op without the `audit-log` feature.
    ///
    /// The audit database is plaintext, so callers pass fixed strings
    /// only, never anything read from the ledger.
    pub fn audit(&self, op: &str, details: Option<&str>) {
        #[cfg(feature = "audit-log")]
        crate::audit::log_audit(&self.vault_path, op, details);

        #[cfg(not(feature = "audit-log"))]
        let _ = (op, details);
    }
}

/// Master password from `CREDVAULT_PASSWORD`, if set and non-empty.
pub fn env_password() -> Option<Zeroizing<String>> {
    match std::env::var(PASSWORD_ENV) {
        Ok(pw) if !pw.is_empty() => Some(Zeroizing::new(pw)),
        _ => None,
    }
}

/// Prompt for the master password of an existing vault.
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    let pw = dialoguer::Password::new()
        .with_prompt("Enter master password")
        .interact()
        .map_err(|e| CredVaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new master password with confirmation.
///
/// Also respects `CREDVAULT_PASSWORD` for scripted usage.
pub fn prompt_new_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = env_password() {
        return Ok(pw);
    }

    let password = dialoguer::Password::new()
        .with_prompt("Choose master password")
        .with_confirmation(
            "Confirm master password",
            "Passwords do not match, try again",
        )
        .interact()
        .map_err(|e| CredVaultError::CommandFailed(format!("password prompt: {e}")))?;

    Ok(Zeroizing::new(password))
}

/// Unlock the configured vault.
///
/// With `CREDVAULT_PASSWORD` set there is exactly one attempt, so a
/// wrong value fails fast with `WrongPassword`.  Interactively the user
/// gets `max_attempts` tries, after which the session is locked out.
pub fn unlock(ctx: &Context) -> Result<VaultHandle> {
    if !ctx.vault_path.exists() {
        output::tip("Run `credvault init` to create a vault.");
        return Err(CredVaultError::VaultNotFound(ctx.vault_path.clone()));
    }

    if let Some(pw) = env_password() {
        return VaultHandle::open(&ctx.vault_path, pw.as_bytes());
    }

    let max = ctx.settings.max_attempts;
    let result = open_vault(
        &ctx.vault_path,
        |remaining| {
            if remaining < max {
                output::error(&format!(
                    "Invalid password. {remaining} attempt(s) remaining."
                ));
            }
            prompt_password()
        },
        max,
    );

    if let Err(CredVaultError::LockedOut { attempts }) = &result {
        ctx.audit("lockout", Some(&format!("{attempts} failed attempts")));
    }
    result
}

/// Read a secret value: piped stdin if present, otherwise a hidden prompt.
pub fn read_secret(prompt: &str) -> Result<Zeroizing<String>> {
    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = Zeroizing::new(buf.trim_end_matches(|c: char| c == '\r' || c == '\n').to_string());
        return Ok(trimmed);
    }

    let value = dialoguer::Password::new()
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()
        .map_err(|e| CredVaultError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(value))
}

/// Read a plain (visible) line of input.
pub fn read_line(prompt: &str) -> Result<String> {
    dialoguer::Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map_err(|e| CredVaultError::CommandFailed(format!("input prompt: {e}")))
}

/// Ask a yes/no question.
pub fn confirm(prompt: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| CredVaultError::CommandFailed(format!("confirm prompt: {e}")))
}

/// Validate a service name before it is stored.
///
/// Names are case-sensitive.  They must not be blank, must be at most
/// 128 characters and must not contain control characters.
pub fn validate_service_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CredVaultError::CommandFailed(
            "service name cannot be empty".into(),
        ));
    }

    if name.chars().count() > MAX_SERVICE_LEN {
        return Err(CredVaultError::CommandFailed(format!(
            "service name cannot exceed {MAX_SERVICE_LEN} characters"
        )));
    }

    if name.chars().any(char::is_control) {
        return Err(CredVaultError::CommandFailed(format!(
            "service name '{}' contains control characters",
            name.escape_debug()
        )));
    }

    Ok(())
}
