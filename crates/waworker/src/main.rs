// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Waworker - WhatsApp connection worker daemon.
//!
//! This is the binary entry point for the worker.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod serve;

/// Waworker - WhatsApp connection worker daemon.
#[derive(Parser, Debug)]
#[command(name = "waworker", version, about, long_about = None)]
struct Cli {
    /// Path to a config file (overrides the XDG hierarchy).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the connection worker.
    Serve,
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => waworker_config::load_config_from_path(path),
        None => waworker_config::load_config(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("waworker: invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("waworker serve: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("waworker config: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("waworker: use --help for available commands");
        }
    }
}
