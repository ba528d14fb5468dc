//! `credvault get` — print the username and password for one service.

use crate::cli::output;
use crate::cli::{unlock, Context};
use crate::errors::{CredVaultError, Result};

/// Execute the `get` command.
pub fn execute(ctx: &Context, service: &str) -> Result<()> {
    let handle = unlock(ctx)?;

    let record = handle
        .get(service)
        .ok_or_else(|| CredVaultError::ServiceNotFound(service.to_string()))?;
    output::print_record(service, record);

    Ok(())
}
