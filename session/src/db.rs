use async_trait::async_trait;
use sqlx::any::{AnyPoolOptions, install_default_drivers};
use sqlx::pool::PoolConnection;
use sqlx::{Any, AnyPool};

use crate::backend::Backend;
use crate::error::{Result, StoreError};

/// Hands out a live connection for callers that do not already hold one.
///
/// The store itself only borrows `&mut AnyConnection` per call, so a
/// transaction opened by the caller can be passed straight through.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    async fn acquire(&self) -> Result<PoolConnection<Any>>;
}

#[async_trait]
impl ConnectionProvider for AnyPool {
    async fn acquire(&self) -> Result<PoolConnection<Any>> {
        AnyPool::acquire(self)
            .await
            .map_err(|e| StoreError::query(e, "<acquire connection>"))
    }
}

#[derive(Clone)]
pub struct Db {
    pub pool: AnyPool,
}

impl Db {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::query(e, "<connect>"))?;

        Ok(Self { pool })
    }

    /// Creates the `sessions` table on a fresh database. Existing tables are
    /// left alone; there is no migration logic here.
    pub async fn bootstrap(&self, backend: &impl Backend) -> Result<()> {
        for stmt in backend.schema() {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::query(e, stmt))?;
        }

        tracing::info!(backend = backend.name(), "sessions table ready");
        Ok(())
    }
}

#[async_trait]
impl ConnectionProvider for Db {
    async fn acquire(&self) -> Result<PoolConnection<Any>> {
        ConnectionProvider::acquire(&self.pool).await
    }
}
