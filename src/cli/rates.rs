//! The query surface: daily rates per symbol and the currency list, as JSON.

use crate::store::KeyValueStore;
use anyhow::Result;

/// Prints the daily rates for a symbol, ascending by date.
pub fn run_rates(store: &KeyValueStore, symbol: &str) -> Result<()> {
    let rates = store.market()?.daily_rates(&symbol.to_uppercase())?;
    println!("{}", serde_json::to_string_pretty(&rates)?);
    Ok(())
}

/// Prints all known currencies, ascending by name.
pub fn run_currencies(store: &KeyValueStore) -> Result<()> {
    let currencies = store.market()?.currencies()?;
    println!("{}", serde_json::to_string_pretty(&currencies)?);
    Ok(())
}
