use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage quota of {limit} bytes exceeded")]
    QuotaExceeded { limit: usize },
}

/// Keys of the independently stored budget records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    Incomes,
    Freelance,
    Expenses,
    EnkExpenses,
    TaxMethod,
    TaxPercentage,
    SchemaVersion,
}

impl StorageKey {
    pub const ALL: [StorageKey; 7] = [
        Self::Incomes,
        Self::Freelance,
        Self::Expenses,
        Self::EnkExpenses,
        Self::TaxMethod,
        Self::TaxPercentage,
        Self::SchemaVersion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incomes => "kapitalen_incomes",
            Self::Freelance => "kapitalen_freelance",
            Self::Expenses => "kapitalen_expenses",
            Self::EnkExpenses => "kapitalen_enk_expenses",
            Self::TaxMethod => "kapitalen_tax_method",
            Self::TaxPercentage => "kapitalen_tax_percentage",
            Self::SchemaVersion => "kapitalen_schema_version",
        }
    }
}

/// Key-value store holding one JSON document per [`StorageKey`].
#[async_trait]
pub trait BudgetRepository: Send + Sync {
    /// Returns `Ok(None)` when nothing is stored under `key`.
    async fn load_raw(
        &self,
        key: &str,
    ) -> Result<Option<String>, RepositoryError>;

    /// Inserts or replaces the value under `key`.
    async fn save_raw(
        &self,
        key: &str,
        value: &str,
    ) -> Result<(), RepositoryError>;

    /// Removing a missing key is not an error.
    async fn remove(
        &self,
        key: &str,
    ) -> Result<(), RepositoryError>;

    /// Every stored key, sorted.
    async fn keys(&self) -> Result<Vec<String>, RepositoryError>;
}

/// Loads and parses the record under `key`.
///
/// A missing record, a backend failure or unparseable JSON all yield
/// `default`. Failures are logged, never returned.
pub async fn load_or_default<T: DeserializeOwned>(
    repo: &dyn BudgetRepository,
    key: StorageKey,
    default: T,
) -> T {
    let raw = match repo.load_raw(key.as_str()).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return default,
        Err(error) => {
            warn!(key = key.as_str(), %error, "failed to load from storage");
            return default;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(error) => {
            warn!(key = key.as_str(), %error, "stored record is not valid; using default");
            default
        }
    }
}

/// Serializes `value` and stores it under `key`.
///
/// Returns `false` on failure, which is logged.
pub async fn save<T: Serialize + ?Sized>(
    repo: &dyn BudgetRepository,
    key: StorageKey,
    value: &T,
) -> bool {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(error) => {
            warn!(key = key.as_str(), %error, "failed to serialize record");
            return false;
        }
    };

    match repo.save_raw(key.as_str(), &raw).await {
        Ok(()) => {
            debug!(key = key.as_str(), bytes = raw.len(), "saved to storage");
            true
        }
        Err(error) => {
            warn!(key = key.as_str(), %error, "failed to save to storage");
            false
        }
    }
}

pub async fn has_key(
    repo: &dyn BudgetRepository,
    key: StorageKey,
) -> bool {
    matches!(repo.load_raw(key.as_str()).await, Ok(Some(_)))
}

/// Removes every budget record. Stops at the first failure.
pub async fn clear_all(repo: &dyn BudgetRepository) -> bool {
    for key in StorageKey::ALL {
        if let Err(error) = repo.remove(key.as_str()).await {
            warn!(key = key.as_str(), %error, "failed to clear storage");
            return false;
        }
    }
    true
}
