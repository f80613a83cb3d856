use chrono::{NaiveDateTime, Utc};
use serde::Serialize;

/// Primary key assigned by the database on first insert.
pub type RecordId = i64;

/// In-memory copy of one row of the `sessions` table.
///
/// A record without an `id` has never been written; the store inserts it on
/// the first save. `lock_version` mirrors the version last known to be
/// committed and only moves when a write that bumps it succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub(crate) id: Option<RecordId>,
    pub(crate) session_id: String,

    /// Opaque serialized payload. The only field callers are expected to change.
    pub(crate) data: String,

    pub(crate) updated_at: NaiveDateTime,
    pub(crate) lock_version: i64,
}

impl SessionRecord {
    pub(crate) fn unpersisted(session_id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            id: None,
            session_id: session_id.into(),
            data: data.into(),
            updated_at: Utc::now().naive_utc(),
            lock_version: 0,
        }
    }

    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn set_data(&mut self, data: impl Into<String>) {
        self.data = data.into();
    }

    /// Engine timestamp as of the last read. Writes do not refresh it.
    pub fn updated_at(&self) -> NaiveDateTime {
        self.updated_at
    }

    pub fn lock_version(&self) -> i64 {
        self.lock_version
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
