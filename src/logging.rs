// src/logging.rs
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_JSON: &str = "IPAGRAB_LOG_JSON";

/// Install the global subscriber. `RUST_LOG` overrides the default filter;
/// `IPAGRAB_LOG_JSON=1` switches to JSON lines.
pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        "ipagrab=debug,warn"
    } else {
        "ipagrab=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let json = std::env::var(ENV_LOG_JSON).ok().is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    // A subscriber may already be set (tests, embedding); keep it.
    let _ = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init()
    };
}
