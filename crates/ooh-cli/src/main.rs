use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "ooh-cli", version, about = "OOH proposals CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bi-weekly period grid
    Grid {
        #[command(subcommand)]
        action: commands::grid::GridAction,
    },
    /// Period validation and derivation
    Period {
        #[command(subcommand)]
        action: commands::period::PeriodAction,
    },
    /// Price a proposal file
    Quote(commands::quote::QuoteArgs),
    /// Remote proposal cart
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("OOH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Grid { action } => commands::grid::run(action),
        Commands::Period { action } => commands::period::run(action),
        Commands::Quote(args) => commands::quote::run(args),
        Commands::Cart { action } => commands::cart::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
