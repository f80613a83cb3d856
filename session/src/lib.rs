//! Raw-SQL store for web session records.
//!
//! One `SessionStore` drives either SQLite or MySQL through sqlx's `Any`
//! driver. Records are plain values; every read and write goes to the
//! database on the caller's connection.
pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod locking;
pub mod model;
pub mod store;

pub use backend::{Backend, BackendKind, MySql, Sqlite};
pub use error::{Result, StoreError};
pub use locking::LockingPolicy;
pub use model::{RecordId, SessionRecord};
pub use store::SessionStore;
