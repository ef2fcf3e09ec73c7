// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parley - a live customer-support conversation engine.
//!
//! Binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;

/// Parley - a live customer-support conversation engine.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Parley server.
    Serve,
    /// Print the resolved configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match parley_config::load_and_validate() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("parley: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("parley serve: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("parley config: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("parley: use --help for available commands");
        }
    }
}
