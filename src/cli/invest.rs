//! The `add` command: create-or-report-rejection for new investments.

use crate::core::Investment;
use crate::store::KeyValueStore;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

/// Validates and persists a new investment. A rejected record is reported
/// and skipped, never surfaced as a process failure.
pub fn run(
    store: &KeyValueStore,
    base_currency: &str,
    capital: f64,
    currency: &str,
    price: f64,
    date: Option<NaiveDate>,
) -> Result<()> {
    let today = Utc::now().date_naive();
    let buy_date = date.unwrap_or(today);
    let currency = currency.to_uppercase();

    match Investment::create(capital, &currency, price, buy_date, today)
        .map(|mut investment| {
            investment.base_currency = base_currency.to_uppercase();
            investment
        }) {
        Ok(investment) => {
            store.investments()?.insert(&investment)?;
            info!(id = %investment.id, "Investment saved");
            println!(
                "Saved investment {}: {} {} at {} ({})",
                investment.id, capital, currency, price, buy_date
            );
        }
        Err(e) => {
            warn!(error = %e, capital, %currency, price, %buy_date, "Skipping investment");
            println!(
                "Skipped investment ({capital} {currency} at {price}, {buy_date}): {e}"
            );
        }
    }
    Ok(())
}
