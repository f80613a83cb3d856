//! Backend capabilities
//! --------------------
//! The store speaks to every engine through sqlx's `Any` driver, which already
//! gives a uniform way to run a statement and read back the generated key and
//! the affected-row count. What still differs per engine lives here:
//!
//!  - the engine clock expression used for `updated_at`
//!  - how `updated_at` is projected so it decodes as text
//!  - whether `SELECT ... FOR UPDATE` row locks exist
//!  - native string escaping for the few literals built into SQL text
//!  - bootstrap DDL for a fresh database
pub mod mysql;
pub mod sqlite;

pub use mysql::MySql;
pub use sqlite::Sqlite;

use crate::error::{Result, StoreError};

pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    /// SQL expression evaluated by the engine to stamp `updated_at`.
    fn now_sql(&self) -> &'static str;

    /// Projection of `updated_at` that decodes as text through the `Any` driver.
    fn timestamp_select(&self) -> &'static str;

    /// Suffix that makes an INSERT hand back the new `id` as a row. `None`
    /// means the driver reports the key in the query result instead.
    fn insert_returning(&self) -> Option<&'static str>;

    /// True if `SELECT ... FOR UPDATE` takes a row lock inside a transaction.
    fn supports_row_lock(&self) -> bool;

    /// Escape a string for use inside a single-quoted literal.
    fn escape(&self, raw: &str) -> String;

    /// Escaped, single-quoted literal.
    fn quote(&self, raw: &str) -> String {
        format!("'{}'", self.escape(raw))
    }

    /// `CREATE ... IF NOT EXISTS` statements for the `sessions` table.
    fn schema(&self) -> &'static [&'static str];
}

/// Backend chosen at runtime from a database url.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Sqlite,
    MySql,
}

impl BackendKind {
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(BackendKind::Sqlite),
            "mysql" | "mariadb" => Ok(BackendKind::MySql),
            _ => Err(StoreError::UnsupportedDatabase(url.to_string())),
        }
    }

    fn inner(&self) -> &'static dyn Backend {
        match self {
            BackendKind::Sqlite => &Sqlite,
            BackendKind::MySql => &MySql,
        }
    }
}

impl Backend for BackendKind {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn now_sql(&self) -> &'static str {
        self.inner().now_sql()
    }

    fn timestamp_select(&self) -> &'static str {
        self.inner().timestamp_select()
    }

    fn insert_returning(&self) -> Option<&'static str> {
        self.inner().insert_returning()
    }

    fn supports_row_lock(&self) -> bool {
        self.inner().supports_row_lock()
    }

    fn escape(&self, raw: &str) -> String {
        self.inner().escape(raw)
    }

    fn schema(&self) -> &'static [&'static str] {
        self.inner().schema()
    }
}
