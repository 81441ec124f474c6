pub mod investments;
pub mod market;

use anyhow::{Context, Result};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use investments::InvestmentStore;
use market::MarketStore;
use std::path::Path;

/// The embedded key-value store backing all persisted state, one fjall
/// partition per record kind.
pub struct KeyValueStore {
    keyspace: Keyspace,
}

impl KeyValueStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;
        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open data store at {}", path.display()))?;
        Ok(Self { keyspace })
    }

    fn partition(&self, name: &str) -> Result<PartitionHandle> {
        self.keyspace
            .open_partition(name, PartitionCreateOptions::default())
            .with_context(|| format!("Failed to open partition: {name}"))
    }

    pub fn investments(&self) -> Result<InvestmentStore> {
        Ok(InvestmentStore::new(self.partition("investments")?))
    }

    pub fn market(&self) -> Result<MarketStore> {
        Ok(MarketStore::new(
            self.partition("bank_rates")?,
            self.partition("bank_interests")?,
            self.partition("hourly_rates")?,
            self.partition("daily_rates")?,
            self.partition("currencies")?,
        ))
    }
}
