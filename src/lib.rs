pub mod cli;
pub mod core;
pub mod notify;
pub mod store;

use crate::core::config::AppConfig;
use crate::store::KeyValueStore;
use anyhow::Result;
use chrono::NaiveDate;
use tracing::debug;

pub enum AppCommand {
    Analyze {
        json: bool,
    },
    Add {
        capital: f64,
        currency: String,
        price: f64,
        date: Option<NaiveDate>,
    },
    Import {
        file: String,
    },
    Rates {
        symbol: String,
    },
    Currencies,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let store = KeyValueStore::open(&config.data_path()?)?;

    match command {
        AppCommand::Analyze { json } => cli::analyze::run(&config, &store, json).await,
        AppCommand::Add {
            capital,
            currency,
            price,
            date,
        } => cli::invest::run(
            &store,
            &config.base_currency,
            capital,
            &currency,
            price,
            date,
        ),
        AppCommand::Import { file } => cli::import::run(&store, &file),
        AppCommand::Rates { symbol } => cli::rates::run_rates(&store, &symbol),
        AppCommand::Currencies => cli::rates::run_currencies(&store),
    }
}
