//! In-process key-value backend.
//!
//! Used by tests and by `--backend memory`. An optional quota on the total
//! stored bytes mimics a browser storage limit.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::factory::{DbConfig, RepositoryFactory};
use super::repository::{BudgetRepository, RepositoryError};

#[derive(Debug, Default)]
pub struct MemoryRepository {
    entries: Mutex<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes that would bring the stored values above `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Mutex::default(),
            quota: Some(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BudgetRepository for MemoryRepository {
    async fn load_raw(
        &self,
        key: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    async fn save_raw(
        &self,
        key: &str,
        value: &str,
    ) -> Result<(), RepositoryError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(limit) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            if others + value.len() > limit {
                return Err(RepositoryError::QuotaExceeded { limit });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(
        &self,
        key: &str,
    ) -> Result<(), RepositoryError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, RepositoryError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.keys().cloned().collect())
    }
}

/// Registers the in-memory backend as `"memory"`. The connection string is
/// ignored; every call creates a fresh, empty store.
pub struct MemoryRepositoryFactory;

#[async_trait]
impl RepositoryFactory for MemoryRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &DbConfig,
    ) -> Result<Box<dyn BudgetRepository>, RepositoryError> {
        Ok(Box::new(MemoryRepository::new()))
    }
}
