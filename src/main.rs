use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use fxvest::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fxvest::AppCommand {
    fn from(cmd: Commands) -> fxvest::AppCommand {
        match cmd {
            Commands::Analyze { json } => fxvest::AppCommand::Analyze { json },
            Commands::Add {
                capital,
                currency,
                price,
                date,
            } => fxvest::AppCommand::Add {
                capital,
                currency,
                price,
                date,
            },
            Commands::Import { file } => fxvest::AppCommand::Import { file },
            Commands::Rates { symbol } => fxvest::AppCommand::Rates { symbol },
            Commands::Currencies => fxvest::AppCommand::Currencies,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Analyze in-progress investments and dispatch alerts
    Analyze {
        /// Emit the full metric reports as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a new investment
    Add {
        /// Amount invested, in the base currency
        capital: f64,
        /// Currency purchased
        currency: String,
        /// Bank-executed conversion rate
        price: f64,
        /// Purchase date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Import market data (bank rates, interest terms, quotes) from a YAML file
    Import { file: String },
    /// List daily rates for a currency symbol as JSON
    Rates { symbol: String },
    /// List known currencies as JSON
    Currencies,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxvest::cli::setup::setup(),
        Some(cmd) => fxvest::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
