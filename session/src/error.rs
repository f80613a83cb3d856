use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Any driver failure while running a statement. Carries the failing SQL
    /// so callers see one error shape whatever the backend.
    #[error("{class}: {message}: {sql}")]
    QueryFailure {
        class: &'static str,
        message: String,
        sql: String,
    },

    #[error("cannot update unsaved record optimistically")]
    UnsavedRecord,

    #[error("driver returned no generated key for insert: {sql}")]
    MissingInsertId { sql: String },

    #[error("invalid value in column {column}: {value}")]
    InvalidRow { column: &'static str, value: String },

    #[error("unsupported database url: {0}")]
    UnsupportedDatabase(String),
}

impl StoreError {
    pub(crate) fn query(err: sqlx::Error, sql: &str) -> Self {
        let message = match &err {
            sqlx::Error::Database(db) => match db.code() {
                Some(code) => format!("[{code}] {}", db.message()),
                None => db.message().to_string(),
            },
            other => other.to_string(),
        };

        StoreError::QueryFailure {
            class: error_class(&err),
            message,
            sql: sql.to_string(),
        }
    }

    pub fn is_query_failure(&self) -> bool {
        matches!(self, StoreError::QueryFailure { .. })
    }
}

fn error_class(err: &sqlx::Error) -> &'static str {
    match err {
        sqlx::Error::Configuration(_) => "Configuration",
        sqlx::Error::Database(_) => "Database",
        sqlx::Error::Io(_) => "Io",
        sqlx::Error::Tls(_) => "Tls",
        sqlx::Error::Protocol(_) => "Protocol",
        sqlx::Error::RowNotFound => "RowNotFound",
        sqlx::Error::TypeNotFound { .. } => "TypeNotFound",
        sqlx::Error::ColumnIndexOutOfBounds { .. } => "ColumnIndexOutOfBounds",
        sqlx::Error::ColumnNotFound(_) => "ColumnNotFound",
        sqlx::Error::ColumnDecode { .. } => "ColumnDecode",
        sqlx::Error::Decode(_) => "Decode",
        sqlx::Error::PoolTimedOut => "PoolTimedOut",
        sqlx::Error::PoolClosed => "PoolClosed",
        sqlx::Error::WorkerCrashed => "WorkerCrashed",
        _ => "Other",
    }
}
