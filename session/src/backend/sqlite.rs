use super::Backend;

/// SQLite: no row-level locks, `datetime('now')` as the engine clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

const SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS sessions (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  session_id TEXT NOT NULL,
  data TEXT NOT NULL,
  updated_at TEXT NOT NULL,
  lock_version INTEGER NOT NULL DEFAULT 0
);
"#,
    "CREATE INDEX IF NOT EXISTS sessions_session_id_idx ON sessions (session_id);",
];

impl Backend for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn now_sql(&self) -> &'static str {
        "datetime('now')"
    }

    fn timestamp_select(&self) -> &'static str {
        "updated_at"
    }

    // the Any driver drops last_insert_rowid
    fn insert_returning(&self) -> Option<&'static str> {
        Some(" RETURNING id")
    }

    fn supports_row_lock(&self) -> bool {
        false
    }

    /// Same rule as `sqlite3_mprintf("%q")`: double every single quote.
    fn escape(&self, raw: &str) -> String {
        raw.replace('\'', "''")
    }

    fn schema(&self) -> &'static [&'static str] {
        SCHEMA
    }
}
