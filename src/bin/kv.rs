//! kv CLI Binary
//!
//! Command-line interface for the filesystem-backed key/value database.

use clap::Parser;
use kvdb::logging::init_logging;
use kvdb::tooling::cli::{Cli, CliContext};
use std::process;

fn main() {
    let cli = Cli::parse();

    let context = match CliContext::new(cli.database.clone(), cli.config.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    let overrides = cli.logging_overrides(context.database_path().ok());
    if let Err(e) = init_logging(Some(&context.config().logging), &overrides) {
        eprintln!("Error initializing logging: {}", e);
        process::exit(1);
    }

    match context.execute(&cli.command) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
