pub mod budget;
pub mod calculations;
pub mod db;
pub mod migration;
pub mod models;
pub mod validation;

pub use budget::{Budget, Collection, PendingSaves};
pub use calculations::{CombinedTaxInput, TaxCalculator, WithholdingEstimator};
pub use db::{BudgetRepository, DbConfig, RepositoryError, RepositoryRegistry, StorageKey};
pub use models::*;
pub use validation::ValidationError;
