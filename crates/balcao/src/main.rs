// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Balcao - operations dashboard backend for small businesses.
//!
//! This is the binary entry point for the Balcao server.

use clap::{Parser, Subcommand};

mod serve;

/// Balcao - operations dashboard backend for small businesses.
#[derive(Parser, Debug)]
#[command(name = "balcao", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the dashboard server (default).
    Serve,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let config = match balcao_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            balcao_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) | None => {
            if let Err(e) = serve::run_serve(config).await {
                tracing::error!(error = %e, "balcao serve failed");
                eprintln!("balcao: {e}");
                std::process::exit(1);
            }
        }
    }
}
