// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Selenggara - equipment maintenance ticket service.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod doctor;
mod repair;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};
use selenggara_config::SelenggaraConfig;

/// Selenggara - equipment maintenance ticket service.
#[derive(Parser, Debug)]
#[command(name = "selenggara", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server.
    Serve,
    /// Check configuration, database, migrations and BIL sequences.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Renumber BIL values so every year runs 1..N again.
    #[command(group(ArgGroup::new("target").required(true).args(["year", "all"])))]
    Repair {
        /// Repair a single year.
        #[arg(long)]
        year: Option<i64>,
        /// Repair every year that has a gap or duplicate.
        #[arg(long)]
        all: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => selenggara_config::load_and_validate_path(path),
        None => selenggara_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            selenggara_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Doctor { plain }) => doctor::run_doctor(&config, plain).await,
        Some(Commands::Repair { year, all }) => {
            let target = if all {
                repair::RepairTarget::All
            } else {
                // clap's ArgGroup guarantees one of the two.
                repair::RepairTarget::Year(year.unwrap_or_default())
            };
            repair::run_repair(&config, target).await
        }
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("selenggara: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn print_config(config: &SelenggaraConfig) -> Result<(), selenggara_core::SelenggaraError> {
    print!("{}", render_config(config)?);
    Ok(())
}

/// The effective configuration as TOML with the bearer token masked.
fn render_config(config: &SelenggaraConfig) -> Result<String, selenggara_core::SelenggaraError> {
    let mut redacted = config.clone();
    if redacted.gateway.bearer_token.is_some() {
        redacted.gateway.bearer_token = Some("[redacted]".to_string());
    }
    toml::to_string_pretty(&redacted)
        .map_err(|e| selenggara_core::SelenggaraError::Config(e.to_string()))
}
