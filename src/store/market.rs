//! Market snapshot persistence and the store-backed snapshot provider.

use crate::core::market::{
    BankInterest, BankRate, Currency, DailyRate, HourlyRate, MarketDataProvider, MarketSnapshot,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fjall::PartitionHandle;
use tracing::debug;

pub struct MarketStore {
    bank_rates: PartitionHandle,
    bank_interests: PartitionHandle,
    hourly_rates: PartitionHandle,
    daily_rates: PartitionHandle,
    currencies: PartitionHandle,
}

fn pair_key(base: &str, to: &str) -> String {
    format!("{base}:{to}")
}

// Zero-padded epoch seconds keep the per-currency key range in time order.
fn hourly_key(rate: &HourlyRate) -> String {
    format!("{}:{:020}", rate.currency, rate.datetime.timestamp())
}

impl MarketStore {
    pub(crate) fn new(
        bank_rates: PartitionHandle,
        bank_interests: PartitionHandle,
        hourly_rates: PartitionHandle,
        daily_rates: PartitionHandle,
        currencies: PartitionHandle,
    ) -> Self {
        Self {
            bank_rates,
            bank_interests,
            hourly_rates,
            daily_rates,
            currencies,
        }
    }

    pub fn put_bank_rate(&self, rate: &BankRate) -> Result<()> {
        let key = pair_key(&rate.base_currency, &rate.to_currency);
        self.bank_rates.insert(&key, serde_json::to_vec(rate)?)?;
        Ok(())
    }

    pub fn bank_rate(&self, base: &str, to: &str) -> Result<Option<BankRate>> {
        match self.bank_rates.get(pair_key(base, to))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_bank_interest(&self, interest: &BankInterest) -> Result<()> {
        self.bank_interests
            .insert(&interest.currency, serde_json::to_vec(interest)?)?;
        Ok(())
    }

    pub fn bank_interest(&self, currency: &str) -> Result<Option<BankInterest>> {
        match self.bank_interests.get(currency)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_hourly_rate(&self, rate: &HourlyRate) -> Result<()> {
        self.hourly_rates
            .insert(hourly_key(rate), serde_json::to_vec(rate)?)?;
        Ok(())
    }

    /// The most recent quote for `currency` strictly before `before`.
    pub fn latest_quote(
        &self,
        currency: &str,
        before: DateTime<Utc>,
    ) -> Result<Option<HourlyRate>> {
        let prefix = format!("{currency}:");
        for entry in self.hourly_rates.prefix(&prefix).rev() {
            let (_, value) = entry?;
            let rate: HourlyRate = serde_json::from_slice(&value)?;
            if rate.datetime < before {
                return Ok(Some(rate));
            }
        }
        Ok(None)
    }

    pub fn put_daily_rate(&self, rate: &DailyRate) -> Result<()> {
        // ISO dates sort lexicographically, so the key range is date order.
        let key = format!("{}:{}", rate.currency, rate.date);
        self.daily_rates.insert(&key, serde_json::to_vec(rate)?)?;
        Ok(())
    }

    /// All daily rates for a symbol, ascending by date.
    pub fn daily_rates(&self, currency: &str) -> Result<Vec<DailyRate>> {
        let prefix = format!("{currency}:");
        let mut rates = Vec::new();
        for entry in self.daily_rates.prefix(&prefix) {
            let (_, value) = entry?;
            rates.push(serde_json::from_slice(&value)?);
        }
        Ok(rates)
    }

    pub fn put_currency(&self, currency: &Currency) -> Result<()> {
        self.currencies
            .insert(&currency.symbol, serde_json::to_vec(currency)?)?;
        Ok(())
    }

    /// All known currencies, ascending by name.
    pub fn currencies(&self) -> Result<Vec<Currency>> {
        let mut currencies: Vec<Currency> = Vec::new();
        for entry in self.currencies.iter() {
            let (_, value) = entry?;
            currencies.push(serde_json::from_slice(&value)?);
        }
        currencies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(currencies)
    }
}

#[async_trait]
impl MarketDataProvider for MarketStore {
    async fn snapshot(
        &self,
        base_currency: &str,
        buy_currency: &str,
        now: DateTime<Utc>,
    ) -> Result<MarketSnapshot> {
        debug!(base_currency, buy_currency, %now, "Resolving market snapshot");
        Ok(MarketSnapshot {
            buy_rate: self.bank_rate(base_currency, buy_currency)?,
            sell_rate: self.bank_rate(buy_currency, base_currency)?,
            bank_interest: self.bank_interest(buy_currency)?,
            latest_quote: self.latest_quote(buy_currency, now)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::KeyValueStore;
    use chrono::{NaiveDate, TimeZone};
    use tempfile::tempdir;

    fn hourly(currency: &str, ts: DateTime<Utc>, price: f64) -> HourlyRate {
        HourlyRate {
            currency: currency.to_string(),
            datetime: ts,
            price,
        }
    }

    #[test]
    fn test_bank_rates_are_directional() {
        let dir = tempdir().unwrap();
        let store = KeyValueStore::open(dir.path()).unwrap();
        let market = store.market().unwrap();

        market
            .put_bank_rate(&BankRate {
                base_currency: "USD".to_string(),
                to_currency: "AUD".to_string(),
                fee: 0.01,
            })
            .unwrap();

        assert_eq!(market.bank_rate("USD", "AUD").unwrap().unwrap().fee, 0.01);
        assert!(market.bank_rate("AUD", "USD").unwrap().is_none());
    }

    #[test]
    fn test_latest_quote_is_strictly_before() {
        let dir = tempdir().unwrap();
        let store = KeyValueStore::open(dir.path()).unwrap();
        let market = store.market().unwrap();

        let now = Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap();
        market
            .put_hourly_rate(&hourly("AUD", now - chrono::Duration::hours(2), 1.20))
            .unwrap();
        market
            .put_hourly_rate(&hourly("AUD", now - chrono::Duration::hours(1), 1.22))
            .unwrap();
        // At and after `now`; both must be ignored.
        market.put_hourly_rate(&hourly("AUD", now, 1.25)).unwrap();
        market
            .put_hourly_rate(&hourly("AUD", now + chrono::Duration::hours(1), 1.30))
            .unwrap();
        // Other currencies don't leak into the scan.
        market
            .put_hourly_rate(&hourly("EUR", now - chrono::Duration::minutes(5), 0.91))
            .unwrap();

        let latest = market.latest_quote("AUD", now).unwrap().unwrap();
        assert_eq!(latest.price, 1.22);

        assert!(market.latest_quote("JPY", now).unwrap().is_none());
    }

    #[test]
    fn test_daily_rates_ascending_by_date() {
        let dir = tempdir().unwrap();
        let store = KeyValueStore::open(dir.path()).unwrap();
        let market = store.market().unwrap();

        for (date, price) in [
            ("2026-08-03", 1.22),
            ("2026-08-01", 1.20),
            ("2026-08-02", 1.21),
        ] {
            market
                .put_daily_rate(&DailyRate {
                    currency: "AUD".to_string(),
                    date: date.parse::<NaiveDate>().unwrap(),
                    price,
                })
                .unwrap();
        }

        let rates = market.daily_rates("AUD").unwrap();
        let prices: Vec<f64> = rates.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![1.20, 1.21, 1.22]);
    }

    #[test]
    fn test_currencies_ascending_by_name() {
        let dir = tempdir().unwrap();
        let store = KeyValueStore::open(dir.path()).unwrap();
        let market = store.market().unwrap();

        for (symbol, name) in [
            ("USD", "United States Dollar"),
            ("AUD", "Australian Dollar"),
            ("EUR", "Euro"),
        ] {
            market
                .put_currency(&Currency {
                    symbol: symbol.to_string(),
                    name: name.to_string(),
                })
                .unwrap();
        }

        let names: Vec<String> = market
            .currencies()
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(
            names,
            vec!["Australian Dollar", "Euro", "United States Dollar"]
        );
    }

    #[tokio::test]
    async fn test_snapshot_resolution() {
        let dir = tempdir().unwrap();
        let store = KeyValueStore::open(dir.path()).unwrap();
        let market = store.market().unwrap();

        let now = Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap();
        market
            .put_bank_rate(&BankRate {
                base_currency: "USD".to_string(),
                to_currency: "AUD".to_string(),
                fee: 0.01,
            })
            .unwrap();
        market
            .put_bank_rate(&BankRate {
                base_currency: "AUD".to_string(),
                to_currency: "USD".to_string(),
                fee: 0.02,
            })
            .unwrap();
        market
            .put_hourly_rate(&hourly("AUD", now - chrono::Duration::hours(1), 1.22))
            .unwrap();

        let snapshot = market.snapshot("USD", "AUD", now).await.unwrap();
        assert_eq!(snapshot.buy_rate.unwrap().fee, 0.01);
        assert_eq!(snapshot.sell_rate.unwrap().fee, 0.02);
        assert!(snapshot.bank_interest.is_none());
        assert_eq!(snapshot.latest_quote.unwrap().price, 1.22);
    }
}
