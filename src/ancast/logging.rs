//! logging.rs - tracing subscriber setup
//!
//! Diagnostics go to stdout next to the progress lines; RUST_LOG overrides the level.

use std::io::{self, IsTerminal};

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(io::stdout().is_terminal())
        .with_writer(io::stdout)
        .try_init();
}
