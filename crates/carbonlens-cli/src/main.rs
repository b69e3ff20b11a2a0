//! CarbonLens CLI - ask questions about emissions data.

mod cli;
mod commands;
mod server;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Serve {
            data,
            host,
            port,
            extraction,
        } => commands::serve::run(data, host, port, extraction, cli.verbose),

        Commands::Ask {
            data,
            question,
            json,
            extraction,
        } => commands::ask::run(data, question, json, extraction, cli.verbose),

        Commands::Columns { data, json } => commands::columns::run(data, json, cli.verbose),
    };

    if let Err(e) = result {
        if !e.is::<commands::ask::Reported>() {
            eprintln!("{} {}", "Error:".red().bold(), e);
        }
        std::process::exit(1);
    }
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "carbonlens=debug,tower_http=debug"
    } else {
        "carbonlens=info,tower_http=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
