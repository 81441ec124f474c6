//! The `import` command: load market snapshot records from a YAML file.

use crate::core::market::{BankInterest, BankRate, Currency, DailyRate, HourlyRate};
use crate::store::KeyValueStore;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Shape of an import file. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct MarketDataFile {
    #[serde(default)]
    pub bank_rates: Vec<BankRate>,
    #[serde(default)]
    pub bank_interests: Vec<BankInterest>,
    #[serde(default)]
    pub hourly_rates: Vec<HourlyRate>,
    #[serde(default)]
    pub daily_rates: Vec<DailyRate>,
    #[serde(default)]
    pub currencies: Vec<Currency>,
}

pub fn run<P: AsRef<Path>>(store: &KeyValueStore, path: P) -> Result<()> {
    let raw = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read market data file: {}", path.as_ref().display()))?;
    let data: MarketDataFile = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse market data file: {}", path.as_ref().display()))?;

    let market = store.market()?;
    for rate in &data.bank_rates {
        market.put_bank_rate(rate)?;
    }
    for interest in &data.bank_interests {
        market.put_bank_interest(interest)?;
    }
    for rate in &data.hourly_rates {
        market.put_hourly_rate(rate)?;
    }
    for rate in &data.daily_rates {
        market.put_daily_rate(rate)?;
    }
    for currency in &data.currencies {
        market.put_currency(currency)?;
    }

    info!(
        bank_rates = data.bank_rates.len(),
        bank_interests = data.bank_interests.len(),
        hourly_rates = data.hourly_rates.len(),
        daily_rates = data.daily_rates.len(),
        currencies = data.currencies.len(),
        "Market data imported"
    );
    println!(
        "Imported {} bank rates, {} interest terms, {} hourly rates, {} daily rates, {} currencies",
        data.bank_rates.len(),
        data.bank_interests.len(),
        data.hourly_rates.len(),
        data.daily_rates.len(),
        data.currencies.len()
    );
    Ok(())
}
