mod cli;
mod dataset;
mod error;
mod filter;
mod fmt;
mod loader;
mod metrics;
mod models;
mod normalize;
#[cfg(feature = "pdf")]
mod pdf;
mod settings;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Summary { filters } => cli::summary::run(&filters),
        Commands::Branches { filters } => cli::branches::run(&filters),
        Commands::Clients { filters, csv } => cli::clients::run(&filters, csv.as_deref()),
        Commands::Trends { filters } => cli::trends::run(&filters),
        Commands::Inspect { data_dir } => cli::inspect::run(data_dir.as_deref()),
        Commands::Use { path } => cli::use_dir::run(&path),
        #[cfg(feature = "pdf")]
        Commands::Export { filters, output } => cli::export::run(&filters, output).map(|_| ()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
