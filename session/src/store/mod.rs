//! SessionStore
//! ------------
//! Direct-SQL persistence for `SessionRecord`s in the `sessions` table.
//!
//! The store holds no connection and caches nothing. Every call borrows the
//! caller's `AnyConnection` (a plain pooled connection or `&mut *tx` from an
//! open transaction) and does exactly one round-trip per statement.
//!
//! Two write paths exist:
//!
//!  - `save` is last-writer-wins. With locking enabled it still bumps
//!    `lock_version`, on the assumption that the caller holds the row
//!    (locked find) or accepts overwriting.
//!  - `save_optimistic` is a single-statement compare-and-swap on
//!    `(id, lock_version)`. The affected-row count decides the outcome.
use std::sync::Arc;

use chrono::NaiveDateTime;
use sqlx::any::{AnyQueryResult, AnyRow};
use sqlx::{AnyConnection, Row};

use crate::backend::{Backend, BackendKind};
use crate::error::{Result, StoreError};
use crate::locking::LockingPolicy;
use crate::model::{RecordId, SessionRecord};

pub struct SessionStore<B: Backend = BackendKind> {
    backend: B,
    locking: Arc<dyn LockingPolicy>,
}

impl<B: Backend> SessionStore<B> {
    pub fn new(backend: B, locking: Arc<dyn LockingPolicy>) -> Self {
        Self { backend, locking }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn locking_enabled(&self) -> bool {
        self.locking.locking_enabled()
    }

    /* =========================
    Lookup
    ========================= */

    /// Loads the record for `session_id`, or `None` if no row matches.
    ///
    /// If several rows share the id, the most recently inserted one wins.
    /// `lock` adds `FOR UPDATE` on backends with row locks; the lock only
    /// lasts as long as the caller's transaction.
    pub async fn find_by_session_id(
        &self,
        conn: &mut AnyConnection,
        session_id: &str,
        lock: bool,
    ) -> Result<Option<SessionRecord>> {
        let sql = self.select_sql("session_id = ? ORDER BY id DESC LIMIT 1", lock);

        let row = sqlx::query(&sql)
            .bind(session_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| StoreError::query(e, &sql))?;

        tracing::debug!(
            backend = self.backend.name(),
            session_id,
            lock,
            found = row.is_some(),
            "find_by_session_id"
        );

        row.map(|r| self.row_to_record(&r, &sql)).transpose()
    }

    /// Loads by primary key. `None` id short-circuits without touching the
    /// connection.
    pub async fn find_by_primary_id(
        &self,
        conn: &mut AnyConnection,
        id: Option<RecordId>,
        lock: bool,
    ) -> Result<Option<SessionRecord>> {
        let Some(id) = id else {
            return Ok(None);
        };

        let sql = self.select_sql("id = ?", lock);

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| StoreError::query(e, &sql))?;

        tracing::debug!(
            backend = self.backend.name(),
            id,
            lock,
            found = row.is_some(),
            "find_by_primary_id"
        );

        row.map(|r| self.row_to_record(&r, &sql)).transpose()
    }

    /* =========================
    Creation + deletion
    ========================= */

    /// New in-memory record. Nothing is written until `save`.
    pub fn create(&self, session_id: impl Into<String>, data: impl Into<String>) -> SessionRecord {
        SessionRecord::unpersisted(session_id, data)
    }

    /// Deletes every row, or the rows matching `condition`.
    ///
    /// `condition` is pasted verbatim after `WHERE`. Any caller value inside
    /// it must already be escaped, e.g. with `Backend::quote`.
    pub async fn delete_all(
        &self,
        conn: &mut AnyConnection,
        condition: Option<&str>,
    ) -> Result<u64> {
        self.delete(conn, condition, None).await
    }

    async fn delete(
        &self,
        conn: &mut AnyConnection,
        condition: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<u64> {
        let sql = match condition {
            Some(cond) => format!("DELETE FROM sessions WHERE {cond}"),
            None => "DELETE FROM sessions".to_string(),
        };

        let res = self
            .execute(conn, &sql, |q| match session_id {
                Some(sid) => q.bind(sid),
                None => q,
            })
            .await?;

        tracing::debug!(
            backend = self.backend.name(),
            rows = res.rows_affected(),
            "delete_all"
        );
        Ok(res.rows_affected())
    }

    /* =========================
    Persistence
    ========================= */

    /// Inserts an unsaved record or overwrites a saved one.
    pub async fn save(&self, conn: &mut AnyConnection, record: &mut SessionRecord) -> Result<()> {
        let now = self.backend.now_sql();

        let Some(id) = record.id else {
            let returning = self.backend.insert_returning().unwrap_or("");
            let sql = format!(
                "INSERT INTO sessions (updated_at, session_id, data) VALUES ({now}, ?, ?){returning}"
            );

            let id = if returning.is_empty() {
                let res = self
                    .execute(conn, &sql, |q| q.bind(&record.session_id).bind(&record.data))
                    .await?;
                res.last_insert_id()
                    .ok_or(StoreError::MissingInsertId { sql })?
            } else {
                // the key comes back on the insert itself, same connection
                let row = sqlx::query(&sql)
                    .bind(&record.session_id)
                    .bind(&record.data)
                    .fetch_one(&mut *conn)
                    .await
                    .map_err(|e| StoreError::query(e, &sql))?;
                row.try_get::<i64, _>("id")
                    .map_err(|e| StoreError::query(e, &sql))?
            };

            record.id = Some(id);
            record.lock_version = 0;

            tracing::debug!(
                backend = self.backend.name(),
                session_id = %record.session_id,
                id,
                "inserted session"
            );
            return Ok(());
        };

        if self.locking.locking_enabled() {
            let sql = format!(
                "UPDATE sessions SET updated_at = {now}, data = ?, lock_version = lock_version + 1 WHERE id = ?"
            );
            self.execute(conn, &sql, |q| q.bind(&record.data).bind(id))
                .await?;
            record.lock_version += 1;
        } else {
            let sql = format!("UPDATE sessions SET updated_at = {now}, data = ? WHERE id = ?");
            self.execute(conn, &sql, |q| q.bind(&record.data).bind(id))
                .await?;
        }

        tracing::debug!(
            backend = self.backend.name(),
            session_id = %record.session_id,
            id,
            lock_version = record.lock_version,
            "updated session"
        );
        Ok(())
    }

    /// Writes `record.data` only if the stored `lock_version` still equals the
    /// in-memory one.
    ///
    /// Returns `Ok(false)` when another writer got there first; the record is
    /// left exactly as it was so the caller can re-read and retry.
    pub async fn save_optimistic(
        &self,
        conn: &mut AnyConnection,
        record: &mut SessionRecord,
    ) -> Result<bool> {
        let id = record.id.ok_or(StoreError::UnsavedRecord)?;
        let now = self.backend.now_sql();

        let sql = format!(
            "UPDATE sessions SET updated_at = {now}, data = ?, lock_version = lock_version + 1 \
             WHERE id = ? AND lock_version = ?"
        );
        let expected = record.lock_version;
        let res = self
            .execute(conn, &sql, |q| q.bind(&record.data).bind(id).bind(expected))
            .await?;

        if res.rows_affected() == 1 {
            record.lock_version += 1;
            tracing::debug!(
                backend = self.backend.name(),
                session_id = %record.session_id,
                id,
                lock_version = record.lock_version,
                "optimistic update applied"
            );
            Ok(true)
        } else {
            tracing::warn!(
                backend = self.backend.name(),
                session_id = %record.session_id,
                id,
                expected_version = expected,
                "optimistic update lost: stale lock_version"
            );
            Ok(false)
        }
    }

    /// Refreshes `updated_at` only. Unsaved records are ignored.
    pub async fn touch(&self, conn: &mut AnyConnection, record: &SessionRecord) -> Result<()> {
        let Some(id) = record.id else {
            return Ok(());
        };

        let sql = format!(
            "UPDATE sessions SET updated_at = {} WHERE id = ?",
            self.backend.now_sql()
        );
        self.execute(conn, &sql, |q| q.bind(id)).await?;
        Ok(())
    }

    /// Removes every row carrying this record's session id, not just its own.
    pub async fn destroy(&self, conn: &mut AnyConnection, record: &SessionRecord) -> Result<u64> {
        self.delete(conn, Some("session_id = ?"), Some(record.session_id.as_str()))
            .await
    }

    /* =========================
    Statement plumbing
    ========================= */

    fn select_sql(&self, predicate: &str, lock: bool) -> String {
        let version_col = if self.locking.locking_enabled() {
            ", lock_version"
        } else {
            ""
        };
        let for_update = if lock && self.backend.supports_row_lock() {
            " FOR UPDATE"
        } else {
            ""
        };

        format!(
            "SELECT session_id, data, id, {ts}{version_col} FROM sessions WHERE {predicate}{for_update}",
            ts = self.backend.timestamp_select(),
        )
    }

    async fn execute<'q, F>(
        &self,
        conn: &mut AnyConnection,
        sql: &'q str,
        bind: F,
    ) -> Result<AnyQueryResult>
    where
        F: FnOnce(
            sqlx::query::Query<'q, sqlx::Any, sqlx::any::AnyArguments<'q>>,
        ) -> sqlx::query::Query<'q, sqlx::Any, sqlx::any::AnyArguments<'q>>,
    {
        bind(sqlx::query(sql))
            .execute(&mut *conn)
            .await
            .map_err(|e| StoreError::query(e, sql))
    }

    fn row_to_record(&self, r: &AnyRow, sql: &str) -> Result<SessionRecord> {
        let session_id: String = r
            .try_get("session_id")
            .map_err(|e| StoreError::query(e, sql))?;
        let data = decode_payload(r, sql)?;
        let id: i64 = r.try_get("id").map_err(|e| StoreError::query(e, sql))?;
        let updated_at: String = r
            .try_get("updated_at")
            .map_err(|e| StoreError::query(e, sql))?;

        // the column is only selected when locking is on
        let lock_version: i64 = match r.try_get("lock_version") {
            Ok(v) => v,
            Err(sqlx::Error::ColumnNotFound(_)) => 0,
            Err(e) => return Err(StoreError::query(e, sql)),
        };

        Ok(SessionRecord {
            id: Some(id),
            session_id,
            data,
            updated_at: parse_timestamp(&updated_at)?,
            lock_version,
        })
    }
}

/// Reads `data` as text. MySQL TEXT columns arrive as blobs through the Any
/// driver, so raw bytes are accepted too and must be UTF-8. A NULL payload
/// (only possible on hand-made schemas) reads as an empty string.
fn decode_payload(r: &AnyRow, sql: &str) -> Result<String> {
    match r.try_get::<Option<String>, _>("data") {
        Ok(text) => Ok(text.unwrap_or_default()),
        Err(sqlx::Error::ColumnDecode { .. }) => {
            let bytes: Option<Vec<u8>> =
                r.try_get("data").map_err(|e| StoreError::query(e, sql))?;
            String::from_utf8(bytes.unwrap_or_default()).map_err(|e| StoreError::InvalidRow {
                column: "data",
                value: String::from_utf8_lossy(e.as_bytes()).into_owned(),
            })
        }
        Err(e) => Err(StoreError::query(e, sql)),
    }
}

fn parse_timestamp(v: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(v, "%Y-%m-%d %H:%M:%S%.f").map_err(|_| StoreError::InvalidRow {
        column: "updated_at",
        value: v.to_string(),
    })
}
