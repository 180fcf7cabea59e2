//! # Pattern Grader
//!
//! The main binary for the design-pattern compliance grader.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                 apps/pattern-grader (THE BINARY)          │
//! │                                                           │
//! │   ┌─────────────┐   ┌─────────────┐   ┌──────────────┐    │
//! │   │    CLI      │   │   Config    │   │   Reporter   │    │
//! │   │   (clap)    │   │   (toml)    │   │ (files/json) │    │
//! │   └──────┬──────┘   └──────┬──────┘   └──────┬───────┘    │
//! │          └─────────────────┼─────────────────┘            │
//! │                            ▼                              │
//! │                ┌──────────────────────┐                   │
//! │                │ pattern-grader-core  │                   │
//! │                │    (THE PIPELINE)    │                   │
//! │                └──────────────────────┘                   │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! pattern-grader grade reference.complete --output out/
//! pattern-grader grade reference.unsafe --preset singleton-only --json
//! pattern-grader stepped reference.complete
//! pattern-grader list
//! ```
//!
//! Exit status is 0 when the submission passed and 1 otherwise.

use clap::Parser;
use pattern_grader::cli;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);

    match cli::execute(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// PATTERN_GRADER_LOG_FORMAT=json enables machine-parseable output.
fn init_tracing(verbose: bool) {
    let log_format =
        std::env::var("PATTERN_GRADER_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_level = if verbose {
        "pattern_grader=debug,pattern_grader_core=debug"
    } else {
        "pattern_grader=info"
    };
    let filter = EnvFilter::try_from_env("PATTERN_GRADER_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| default_level.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
