//! Record store subsystem.
//!
//! # Data Flow
//! ```text
//! DatabaseConfig
//!     → connect() (sqlx AnyPool: MySQL in production, SQLite locally)
//!     → DialogueStore (shared by handlers and deferred tasks)
//!     → SqlLogSink (request_log) shares the same pool
//! ```
//!
//! # Design Decisions
//! - One pool per process, injected through AppState; no per-call connects
//! - Each operation is a single auto-committed statement
//! - Schema is assumed to exist; `bootstrap_schema` only serves dev and tests

pub mod dialogues;
pub mod types;

use std::time::Duration;

use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;

use crate::config::DatabaseConfig;

pub use dialogues::DialogueStore;
pub use types::{Dialogue, DialogueFilter, NewDialogue, StoreError, StoreResult};

/// Open the connection pool described by `config`.
pub async fn connect(config: &DatabaseConfig) -> Result<AnyPool, StoreError> {
    sqlx::any::install_default_drivers();

    let url = config
        .connection_url()
        .map_err(|e| StoreError::Database(sqlx::Error::Configuration(Box::new(e))))?;

    let pool = AnyPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&url)
        .await?;

    tracing::info!(
        host = %config.host,
        database = %config.name,
        max_connections = config.max_connections,
        "Database pool ready"
    );

    if config.bootstrap_schema {
        bootstrap_schema(&pool, config.is_sqlite()).await?;
    }

    Ok(pool)
}

/// Whether `pool` talks to SQLite, judged by its connection URL scheme.
pub(crate) fn is_sqlite_pool(pool: &AnyPool) -> bool {
    pool.connect_options().database_url.scheme().starts_with("sqlite")
}

/// Create the `dialogues` and `logs` tables when they do not exist yet.
pub async fn bootstrap_schema(pool: &AnyPool, sqlite: bool) -> Result<(), StoreError> {
    let statements: [&str; 2] = if sqlite {
        [
            "CREATE TABLE IF NOT EXISTS dialogues (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                conversation_id TEXT NOT NULL,
                speaker TEXT NOT NULL,
                content TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS logs (
                microservice TEXT NOT NULL,
                request TEXT NOT NULL,
                response TEXT NOT NULL,
                elapsed INTEGER NOT NULL
            )",
        ]
    } else {
        [
            "CREATE TABLE IF NOT EXISTS dialogues (
                id INT AUTO_INCREMENT PRIMARY KEY,
                user_id INT NOT NULL,
                conversation_id VARCHAR(255) NOT NULL,
                speaker VARCHAR(255) NOT NULL,
                content TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS logs (
                microservice VARCHAR(64) NOT NULL,
                request VARCHAR(2048) NOT NULL,
                response VARCHAR(8) NOT NULL,
                elapsed INT NOT NULL
            )",
        ]
    };

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("Schema bootstrap complete");
    Ok(())
}

/// Throwaway SQLite databases for tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tempfile::TempDir;

    pub(crate) struct TestDatabase {
        pool: AnyPool,
        _dir: TempDir,
    }

    impl TestDatabase {
        pub(crate) async fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = DatabaseConfig {
                url: Some(format!(
                    "sqlite://{}?mode=rwc",
                    dir.path().join("dialogues.db").display()
                )),
                max_connections: 4,
                acquire_timeout_secs: 30,
                bootstrap_schema: true,
                ..Default::default()
            };
            let pool = connect(&config).await.unwrap();
            Self { pool, _dir: dir }
        }

        pub(crate) fn pool(&self) -> &AnyPool {
            &self.pool
        }

        pub(crate) fn store(&self) -> DialogueStore {
            DialogueStore::new(self.pool.clone())
        }
    }
}
