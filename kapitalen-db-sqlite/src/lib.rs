//! SQLite backend for [`kapitalen_core::BudgetRepository`].

mod factory;
mod repository;

pub use factory::SqliteRepositoryFactory;
pub use repository::SqliteRepository;
