//! Persistence module for request telemetry
//!
//! Telemetry is an append-only log: records are added one at a time,
//! read back as a whole, and only ever removed all together.

pub mod sqlite_store;

pub use sqlite_store::SqliteTelemetryStore;

use crate::models::{NewTelemetryRecord, TelemetryRecord};
use thiserror::Error;

/// Errors that can occur during persistence operations
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid data in database: {0}")]
    InvalidData(String),

    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

/// Trait for telemetry storage backends
pub trait TelemetryStore: Send + Sync {
    /// Durably append one record, assigning its id and creation time
    ///
    /// A record is either fully written or not written at all.
    fn append(&self, record: &NewTelemetryRecord) -> Result<TelemetryRecord, PersistenceError>;

    /// Read every record, newest first
    fn read_all(&self) -> Result<Vec<TelemetryRecord>, PersistenceError>;

    /// Number of stored records
    fn count(&self) -> Result<usize, PersistenceError> {
        Ok(self.read_all()?.len())
    }

    /// Irreversibly delete every record, returning how many were removed
    fn clear_all(&self) -> Result<usize, PersistenceError>;
}
