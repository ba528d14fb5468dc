//! `credvault completions` — print a shell completion script.
//!
//! `credvault completions bash > ~/.bash_completion.d/credvault`

use std::io::{self, Write};
use std::str::FromStr;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::{CredVaultError, Result};

/// Execute the `completions` command.
pub fn execute(shell: &str) -> Result<()> {
    let shell = resolve_shell(shell)?;
    render(shell, &mut io::stdout().lock());
    Ok(())
}

/// Write the completion script for `shell` into `out`.
pub fn render(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, out);
}

/// Accepts clap_complete's own names (case-insensitive) plus `ps`.
fn resolve_shell(name: &str) -> Result<Shell> {
    let lowered = name.trim().to_ascii_lowercase();
    let lowered = if lowered == "ps" { "powershell".to_string() } else { lowered };
    Shell::from_str(&lowered).map_err(|_| {
        CredVaultError::CommandFailed(format!(
            "unsupported shell '{name}' (expected bash, zsh, fish, powershell or elvish)"
        ))
    })
}
