//! # ids-db
//!
//! Repository layer for the Identity Service core.
//!
//! Supports two modes, selected automatically from `DATABASE_URL`:
//!
//! * **Full mode** (`postgres://…`) — PostgreSQL.
//! * **Lite mode** (`sqlite://…`) — embedded SQLite, no external services required.
//!
//! Single-process only (§5, §1 Non-goals) — there is no Redis/cluster fan-out here;
//! the in-process event bus (`ids_core::bus`) is the only cross-component signal.

pub mod any_compat;
pub mod postgres;
pub mod repository;

use anyhow::Result;

/// Which backing store is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbBackend {
    Postgres,
    Sqlite,
}

impl DbBackend {
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("sqlite://") || url.starts_with("sqlite:") {
            DbBackend::Sqlite
        } else {
            DbBackend::Postgres
        }
    }
}

/// Shared database state passed through Axum extractors.
#[derive(Clone)]
pub struct Database {
    /// SQL pool — works with both Postgres and SQLite.
    pub pool: sqlx::AnyPool,
    pub backend: DbBackend,
}

impl Database {
    /// Connect using the URL in `config.database.url`.
    pub async fn connect(config: &ids_common::config::AppConfig) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let backend = DbBackend::from_url(&config.database.url);

        let pool = match backend {
            DbBackend::Postgres => {
                tracing::info!("connecting to PostgreSQL…");
                sqlx::any::AnyPoolOptions::new()
                    .max_connections(config.database.max_connections)
                    .min_connections(config.database.min_connections)
                    .connect(&config.database.url)
                    .await?
            }
            DbBackend::Sqlite => {
                tracing::info!(url = %config.database.url, "connecting to SQLite");
                sqlx::any::AnyPoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .connect(&config.database.url)
                    .await?
            }
        };

        Ok(Self { pool, backend })
    }

    /// Run migrations appropriate for the active backend.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("running database migrations…");
        match self.backend {
            DbBackend::Postgres => {
                sqlx::migrate!("./migrations").run(&self.pool).await?;
            }
            DbBackend::Sqlite => {
                sqlx::migrate!("./migrations-lite").run(&self.pool).await?;
            }
        }
        tracing::info!("migrations complete");
        Ok(())
    }
}
