use super::Backend;

/// MySQL / MariaDB (InnoDB): `FOR UPDATE` row locks, `NOW()` as the engine clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

const SCHEMA: &[&str] = &[r#"
CREATE TABLE IF NOT EXISTS sessions (
  id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
  session_id VARCHAR(255) NOT NULL,
  data MEDIUMTEXT NOT NULL,
  updated_at DATETIME NOT NULL,
  lock_version BIGINT NOT NULL DEFAULT 0,
  INDEX sessions_session_id_idx (session_id)
) ENGINE=InnoDB;
"#];

impl Backend for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn now_sql(&self) -> &'static str {
        "NOW()"
    }

    // DATETIME has no text mapping in the Any driver
    fn timestamp_select(&self) -> &'static str {
        "CAST(updated_at AS CHAR) AS updated_at"
    }

    fn insert_returning(&self) -> Option<&'static str> {
        None
    }

    fn supports_row_lock(&self) -> bool {
        true
    }

    /// Same character set as `mysql_real_escape_string`. Assumes the server
    /// does not run with `NO_BACKSLASH_ESCAPES`.
    fn escape(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len() + 8);
        for c in raw.chars() {
            match c {
                '\0' => out.push_str("\\0"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\\' => out.push_str("\\\\"),
                '\'' => out.push_str("\\'"),
                '"' => out.push_str("\\\""),
                '\x1a' => out.push_str("\\Z"),
                other => out.push(other),
            }
        }
        out
    }

    fn schema(&self) -> &'static [&'static str] {
        SCHEMA
    }
}
