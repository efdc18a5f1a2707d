//! yangtree CLI
//!
//! Command-line interface for yangtree type catalogs and instance trees

use clap::{Parser, Subcommand};
use yangtree_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "yangtree")]
#[command(about = "yangtree - YANG instance trees and type catalogs", long_about = None)]
struct Cli {
    /// Logging profile (development, production); logging is off when omitted
    #[arg(long, global = true)]
    log: Option<Profile>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Type catalog operations
    Catalog(commands::catalog::CatalogArgs),
    /// Build a sample instance tree and print it as JSON
    Demo(commands::demo::DemoArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Some(profile) = cli.log {
        init(profile);
    }

    let result = match cli.command {
        Commands::Catalog(args) => commands::catalog::execute(args),
        Commands::Demo(args) => commands::demo::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
