use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use kapitalen_core::{BudgetRepository, RepositoryError};
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::debug;

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens the database named by `connection_string`.
    ///
    /// Accepts a bare file path (created if missing), `:memory:`, or a
    /// sqlx-style `sqlite:` URL. In-memory databases are kept on a single
    /// connection that never idles out, so they live as long as the pool.
    pub async fn open(connection_string: &str) -> Result<Self> {
        let (options, in_memory) = connect_options(connection_string)?;

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {connection_string}"))?;

        debug!(connection_string, in_memory, "sqlite store opened");
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }
}

fn connect_options(connection_string: &str) -> Result<(SqliteConnectOptions, bool)> {
    let trimmed = connection_string.trim();
    anyhow::ensure!(!trimmed.is_empty(), "SQLite connection string is empty");

    if trimmed == ":memory:" {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        return Ok((options, true));
    }

    if trimmed.starts_with("sqlite:") {
        let in_memory = trimmed.contains(":memory:") || trimmed.contains("mode=memory");
        let options = SqliteConnectOptions::from_str(trimmed)
            .with_context(|| format!("Invalid SQLite URL: {trimmed}"))?
            .create_if_missing(true);
        return Ok((options, in_memory));
    }

    let options = SqliteConnectOptions::new()
        .filename(trimmed)
        .create_if_missing(true);
    Ok((options, false))
}

fn db_error(error: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(error.to_string())
}

#[async_trait]
impl BudgetRepository for SqliteRepository {
    async fn load_raw(
        &self,
        key: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.map(|row| row.try_get::<String, _>("value"))
            .transpose()
            .map_err(db_error)
    }

    async fn save_raw(
        &self,
        key: &str,
        value: &str,
    ) -> Result<(), RepositoryError> {
        let now = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn remove(
        &self,
        key: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query("SELECT key FROM kv_store ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("key"))
            .collect::<Result<_, _>>()
            .map_err(db_error)
    }
}
