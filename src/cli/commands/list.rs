//! `credvault list` — display all stored services in a table.

use crate::cli::output;
use crate::cli::{unlock, Context};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(ctx: &Context) -> Result<()> {
    let handle = unlock(ctx)?;

    output::info(&format!("{} service(s) stored", handle.len()));
    output::print_services_table(handle.records());

    Ok(())
}
