mod budget_store;
pub mod factory;
pub mod memory;
pub mod repository;

pub use factory::{DbConfig, RepositoryFactory, RepositoryRegistry};
pub use memory::{MemoryRepository, MemoryRepositoryFactory};
pub use repository::{
    BudgetRepository, RepositoryError, StorageKey, clear_all, has_key, load_or_default, save,
};
