//! Logging setup for blogctl
//!
//! Installs a `tracing` subscriber writing to stderr. `RUST_LOG` wins when
//! set; otherwise the CLI verbosity picks the level.

use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::Verbosity;

/// Default filter directive for a verbosity level
pub fn default_directive(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "blogctl=info,warn",
        Verbosity::VeryVerbose => "blogctl=debug,info",
    }
}

/// Build the filter, honouring `RUST_LOG` when present
pub fn build_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)))
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(verbosity: Verbosity, color: bool) {
    let _ = fmt()
        .with_env_filter(build_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_ansi(color)
        .with_target(verbosity == Verbosity::VeryVerbose)
        .try_init();
}
