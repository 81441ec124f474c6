//! Investment persistence with version-checked updates.

use crate::core::investment::{Investment, InvestmentStatus};
use anyhow::Result;
use fjall::PartitionHandle;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("investment {id} not found")]
    NotFound { id: Uuid },

    /// Another writer updated the record since it was read. The caller
    /// should re-read and re-decide rather than overwrite.
    #[error("version conflict updating investment {id}: expected {expected}, found {found}")]
    VersionConflict { id: Uuid, expected: u64, found: u64 },

    #[error("storage failure: {0}")]
    Backend(String),
}

pub struct InvestmentStore {
    partition: PartitionHandle,
    // Serializes read-modify-write cycles; fjall keys are only atomic per write.
    write_lock: Mutex<()>,
}

impl InvestmentStore {
    pub(crate) fn new(partition: PartitionHandle) -> Self {
        Self {
            partition,
            write_lock: Mutex::new(()),
        }
    }

    /// Persists a newly created investment.
    pub fn insert(&self, investment: &Investment) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap();
        self.partition.insert(
            investment.id.as_bytes(),
            serde_json::to_vec(investment)?,
        )?;
        debug!(id = %investment.id, "Investment saved");
        Ok(())
    }

    pub fn get(&self, id: &Uuid) -> Result<Option<Investment>> {
        match self.partition.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn list(&self) -> Result<Vec<Investment>> {
        let mut investments = Vec::new();
        for entry in self.partition.iter() {
            let (_, value) = entry?;
            investments.push(serde_json::from_slice(&value)?);
        }
        Ok(investments)
    }

    pub fn in_progress(&self) -> Result<Vec<Investment>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|investment: &Investment| investment.status == InvestmentStatus::InProgress)
            .collect())
    }

    /// Writes back a mutated investment, but only if nobody else has updated
    /// it since it was read. On success the stored (and returned) record
    /// carries a bumped version.
    pub fn update(&self, investment: &Investment) -> Result<Investment, StoreError> {
        let _guard = self.write_lock.lock().unwrap();

        let stored = self
            .partition
            .get(investment.id.as_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .ok_or(StoreError::NotFound { id: investment.id })?;
        let stored: Investment =
            serde_json::from_slice(&stored).map_err(|e| StoreError::Backend(e.to_string()))?;

        if stored.version != investment.version {
            return Err(StoreError::VersionConflict {
                id: investment.id,
                expected: investment.version,
                found: stored.version,
            });
        }

        let mut updated = investment.clone();
        updated.version += 1;
        let bytes =
            serde_json::to_vec(&updated).map_err(|e| StoreError::Backend(e.to_string()))?;
        self.partition
            .insert(investment.id.as_bytes(), bytes)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        debug!(id = %updated.id, version = updated.version, "Investment updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::investment::Notification;
    use crate::store::KeyValueStore;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn investment() -> Investment {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        Investment::create(20000.0, "AUD", 1.25, date, date).unwrap()
    }

    #[test]
    fn test_insert_get_roundtrip() {
        let dir = tempdir().unwrap();
        let store = KeyValueStore::open(dir.path()).unwrap();
        let investments = store.investments().unwrap();

        let record = investment();
        investments.insert(&record).unwrap();

        let loaded = investments.get(&record.id).unwrap().unwrap();
        assert_eq!(loaded, record);
        assert!(investments.get(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_in_progress_filters_status() {
        let dir = tempdir().unwrap();
        let store = KeyValueStore::open(dir.path()).unwrap();
        let investments = store.investments().unwrap();

        let active = investment();
        let mut sold = investment();
        sold.advance_status(InvestmentStatus::Sold).unwrap();
        investments.insert(&active).unwrap();
        investments.insert(&sold).unwrap();

        let in_progress = investments.in_progress().unwrap();
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].id, active.id);
    }

    #[test]
    fn test_update_bumps_version() {
        let dir = tempdir().unwrap();
        let store = KeyValueStore::open(dir.path()).unwrap();
        let investments = store.investments().unwrap();

        let mut record = investment();
        investments.insert(&record).unwrap();

        record.notification = Some(Notification { percent: -0.04 });
        let updated = investments.update(&record).unwrap();
        assert_eq!(updated.version, 1);
        assert_eq!(
            investments.get(&record.id).unwrap().unwrap().notification,
            Some(Notification { percent: -0.04 })
        );
    }

    #[test]
    fn test_stale_update_is_rejected() {
        let dir = tempdir().unwrap();
        let store = KeyValueStore::open(dir.path()).unwrap();
        let investments = store.investments().unwrap();

        let record = investment();
        investments.insert(&record).unwrap();

        // First writer wins.
        let mut first = record.clone();
        first.notification = Some(Notification { percent: 0.05 });
        investments.update(&first).unwrap();

        // Second writer still holds version 0.
        let mut second = record.clone();
        second.notification = Some(Notification { percent: -0.02 });
        let err = investments.update(&second).unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionConflict {
                expected: 0,
                found: 1,
                ..
            }
        ));

        // The first writer's notification survived.
        assert_eq!(
            investments.get(&record.id).unwrap().unwrap().notification,
            Some(Notification { percent: 0.05 })
        );
    }

    #[test]
    fn test_update_unknown_investment() {
        let dir = tempdir().unwrap();
        let store = KeyValueStore::open(dir.path()).unwrap();
        let investments = store.investments().unwrap();

        let err = investments.update(&investment()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
