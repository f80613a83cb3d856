use crate::backend::BackendKind;
use crate::error::Result;

#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Database connection string. The scheme selects the backend.
    pub database_url: String,

    /// Whether the `sessions` table has a `lock_version` column the store
    /// should read and bump.
    pub locking_enabled: bool,

    pub max_connections: u32,
}

impl StoreConfig {
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://sessions_dev.db?mode=rwc".to_string());

        let locking_enabled = std::env::var("SESSION_LOCKING")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8);

        Self {
            database_url,
            locking_enabled,
            max_connections,
        }
    }

    pub fn backend(&self) -> Result<BackendKind> {
        BackendKind::from_url(&self.database_url)
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
