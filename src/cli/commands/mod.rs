//! Command implementations, one module per subcommand.

pub mod add;
#[cfg(feature = "audit-log")]
pub mod audit_cmd;
pub mod completions;
pub mod delete;
pub mod get;
pub mod init;
pub mod list;
pub mod reset;
pub mod shell;
