#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use sqlx::AnyPool;
use sqlx::any::{AnyPoolOptions, install_default_drivers};
use uuid::Uuid;

use session::backend::Backend;
use session::locking::LockingPolicy;

/// Locking flag that counts how often the store asks for it.
#[derive(Default)]
pub struct CountingLocking {
    pub enabled: AtomicBool,
    pub calls: AtomicUsize,
}

impl CountingLocking {
    pub fn new(enabled: bool) -> Arc<Self> {
        Arc::new(Self {
            enabled: AtomicBool::new(enabled),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LockingPolicy for CountingLocking {
    fn locking_enabled(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.enabled.load(Ordering::SeqCst)
    }
}

/// Isolated in-memory SQLite database. The unique name keeps parallel tests
/// apart while the shared cache lets every pooled connection see the same data.
pub async fn sqlite_pool(backend: &impl Backend) -> AnyPool {
    install_default_drivers();

    let db_name = Uuid::new_v4().to_string();
    let conn_str = format!("sqlite:file:{}?mode=memory&cache=shared", db_name);

    let pool = AnyPoolOptions::new()
        .max_connections(5)
        .connect(&conn_str)
        .await
        .unwrap();

    create_schema(&pool, backend).await;
    pool
}

/// MySQL pool from `MYSQL_TEST_URL`, or `None` to skip the test.
pub async fn mysql_pool(backend: &impl Backend) -> Option<AnyPool> {
    let url = std::env::var("MYSQL_TEST_URL").ok()?;
    install_default_drivers();

    let pool = AnyPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .unwrap();

    create_schema(&pool, backend).await;
    Some(pool)
}

async fn create_schema(pool: &AnyPool, backend: &impl Backend) {
    for stmt in backend.schema() {
        sqlx::query(stmt).execute(pool).await.unwrap();
    }
}

/// Fresh session id so MySQL tests can share one database.
pub fn unique_sid(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}
