//! # Scheme CLI
//!
//! Command-line front end for scheme-core.
//!
//! ## Usage
//!
//! ```bash
//! # Inspect a label
//! scheme parse "(doc:[default])/(nod:[1])"
//!
//! # Load records and summarize
//! scheme load -f records.json
//! scheme --config scheme.toml load -f records.json --dump
//! ```

mod cli;

use clap::Parser;
use scheme::{AppConfig, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    let config = AppConfig::load(cli.config.as_deref());
    let log_format = config
        .as_ref()
        .map(|c| c.log_format)
        .unwrap_or_default();
    init_tracing(log_format, cli.verbose, cli.quiet);

    let result = config.and_then(|config| cli::execute(cli, &config));
    if let Err(e) = result {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing. `RUST_LOG` takes precedence over the flags.
fn init_tracing(format: LogFormat, verbose: bool, quiet: bool) {
    let default_filter = match (verbose, quiet) {
        (true, _) => "scheme=debug,scheme_core=debug",
        (false, true) => "scheme=warn,scheme_core=warn",
        (false, false) => "scheme=info,scheme_core=info",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}
