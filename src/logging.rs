//! Diagnostic logging via `tracing`.
//!
//! Diagnostics go to stderr and are separate from the styled user-facing
//! messages in `cli::output`.  `RUST_LOG` wins over the verbosity flag.

use tracing_subscriber::EnvFilter;

/// Map `-v` occurrences to a level for this crate.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber.  Safe to call more than once.
pub fn init(verbosity: u8) {
    let level = level_for(verbosity);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("credvault={level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .without_time()
        .try_init();
}
