//! # engraft - GraphML Loader
//!
//! The command-line loader for engraft graph databases.
//!
//! ## Usage
//!
//! ```bash
//! # Stream a document into a database (created if absent)
//! engraft -D people.db load social.graphml
//!
//! # Smaller commit windows for constrained stores
//! engraft -D people.db load social.graphml --buffer-size 250
//!
//! # Inspect the store
//! engraft -D people.db status --json-mode
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // Initialize tracing — ENGRAFT_LOG_FORMAT=json enables machine-parseable
    // output.
    let log_format = std::env::var("ENGRAFT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "engraft=debug"
    } else {
        "engraft=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
