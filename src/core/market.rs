//! Market snapshot types and the provider abstraction.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The bank's conversion fee for one direction of a currency pair,
/// applied on top of the market price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRate {
    pub base_currency: String,
    pub to_currency: String,
    /// Fraction in `[0, 1)`.
    pub fee: f64,
}

/// Accrual terms attached to holding a currency. Absence of a record for a
/// currency means it pays no modeled interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankInterest {
    pub currency: String,
    /// Annual interest rate as a fraction.
    pub rate: f64,
    /// Number of accrual periods per year.
    pub annual_maturity: u32,
    /// Months before the interest becomes eligible.
    pub maturity: u32,
}

/// A timestamped market quote for a currency, independent of bank fees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRate {
    pub currency: String,
    pub datetime: DateTime<Utc>,
    pub price: f64,
}

/// One market quote per day, kept for the query surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRate {
    pub currency: String,
    pub date: NaiveDate,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub symbol: String,
    pub name: String,
}

/// Everything the analysis engine needs for one investment, resolved at a
/// single point in time. The buy rate converts base -> buy currency, the sell
/// rate buy -> base. `latest_quote` is the most recent hourly rate strictly
/// before the evaluation time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSnapshot {
    pub buy_rate: Option<BankRate>,
    pub sell_rate: Option<BankRate>,
    pub bank_interest: Option<BankInterest>,
    pub latest_quote: Option<HourlyRate>,
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Resolves the snapshot for a currency pair as of `now`. Items the
    /// provider has no data for come back as `None`; whether that is fatal
    /// is the engine's call, not the provider's.
    async fn snapshot(
        &self,
        base_currency: &str,
        buy_currency: &str,
        now: DateTime<Utc>,
    ) -> Result<MarketSnapshot>;
}
