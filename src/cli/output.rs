//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::{CredentialRecord, LedgerEntry};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of stored services (#, Service, Username).
///
/// Passwords are never shown here.
pub fn print_services_table(entries: &[LedgerEntry]) {
    if entries.is_empty() {
        info("No services stored yet.");
        tip("Run `credvault add <SERVICE>` to store your first credential.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Service", "Username"]);

    for (i, e) in entries.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            e.service.clone(),
            e.record.username.clone(),
        ]);
    }

    println!("{table}");
}

/// Print one credential, including its password.
pub fn print_record(service: &str, record: &CredentialRecord) {
    println!("{:<11} {}", style("Service:").bold(), service);
    println!("{:<11} {}", style("Username:").bold(), record.username);
    println!("{:<11} {}", style("Password:").bold(), record.password);
}
