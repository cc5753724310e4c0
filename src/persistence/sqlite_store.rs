//! SQLite implementation of the TelemetryStore trait

use super::{PersistenceError, TelemetryStore};
use crate::models::{NewTelemetryRecord, RequestKind, TelemetryRecord};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-based telemetry storage
///
/// Every append is a single-row insert, so concurrent appends from
/// different requests interleave but never leave a partial record.
pub struct SqliteTelemetryStore {
    conn: Mutex<Connection>,
}

impl SqliteTelemetryStore {
    /// Open (or create) the database at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, PersistenceError> {
        let conn = Connection::open(db_path)?;
        let store = SqliteTelemetryStore {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite database (useful for testing)
    pub fn in_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()?;
        let store = SqliteTelemetryStore {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), PersistenceError> {
        let conn = self.lock()?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, PersistenceError> {
        self.conn.lock().map_err(|_| PersistenceError::LockPoisoned)
    }

    fn parse_created_at(raw: &str) -> Result<DateTime<Utc>, PersistenceError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| PersistenceError::InvalidData(format!("Invalid timestamp: {}", raw)))
    }
}

impl TelemetryStore for SqliteTelemetryStore {
    fn append(&self, record: &NewTelemetryRecord) -> Result<TelemetryRecord, PersistenceError> {
        // Stored with microsecond precision; truncate so the returned record
        // matches what a later read produces.
        let created_at = Utc::now().trunc_subsecs(6);
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO request_history
             (request_type, processing_time, input_data_size, status_code, result, error_message, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                record.request_type.as_str(),
                record.processing_time,
                record.input_size,
                record.status_code,
                record.result,
                record.error_message,
                created_at.to_rfc3339_opts(SecondsFormat::Micros, true)
            ],
        )?;

        Ok(TelemetryRecord {
            id: conn.last_insert_rowid(),
            request_type: record.request_type,
            processing_time: record.processing_time,
            input_size: record.input_size,
            status_code: record.status_code,
            result: record.result.clone(),
            error_message: record.error_message.clone(),
            created_at,
        })
    }

    fn read_all(&self) -> Result<Vec<TelemetryRecord>, PersistenceError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, request_type, processing_time, input_data_size, status_code,
                    result, error_message, created_at
             FROM request_history
             ORDER BY created_at DESC, id DESC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, u16>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, String>(7)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(id, request_type, processing_time, input_size, status_code, result, error_message, created_at)| {
                    Ok(TelemetryRecord {
                        id,
                        request_type: request_type
                            .parse::<RequestKind>()
                            .map_err(PersistenceError::InvalidData)?,
                        processing_time,
                        input_size,
                        status_code,
                        result,
                        error_message,
                        created_at: Self::parse_created_at(&created_at)?,
                    })
                },
            )
            .collect()
    }

    fn count(&self) -> Result<usize, PersistenceError> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM request_history", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn clear_all(&self) -> Result<usize, PersistenceError> {
        let conn = self.lock()?;
        Ok(conn.execute("DELETE FROM request_history", [])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteTelemetryStore {
        SqliteTelemetryStore::in_memory().expect("Failed to create in-memory store")
    }

    fn record(status_code: u16, input_size: Option<i64>) -> NewTelemetryRecord {
        NewTelemetryRecord {
            request_type: RequestKind::Logs,
            processing_time: 0.25,
            input_size,
            status_code,
            result: None,
            error_message: None,
        }
    }

    #[test]
    fn test_append_assigns_increasing_ids() {
        let store = create_test_store();
        let first = store.append(&record(200, Some(3))).unwrap();
        let second = store.append(&record(403, None)).unwrap();
        assert!(second.id > first.id);
        assert!(second.created_at >= first.created_at);
    }

    #[test]
    fn test_roundtrip_fields() {
        let store = create_test_store();
        let new = NewTelemetryRecord {
            request_type: RequestKind::Json,
            processing_time: 0.125,
            input_size: Some(512),
            status_code: 200,
            result: Some(r#"{"score":0.1}"#.to_string()),
            error_message: None,
        };
        let appended = store.append(&new).unwrap();

        let all = store.read_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, appended.id);
        assert_eq!(all[0].request_type, RequestKind::Json);
        assert_eq!(all[0].processing_time, 0.125);
        assert_eq!(all[0].input_size, Some(512));
        assert_eq!(all[0].result.as_deref(), Some(r#"{"score":0.1}"#));
        assert_eq!(all[0].error_message, None);
        assert_eq!(all[0].created_at, appended.created_at);
    }

    #[test]
    fn test_read_all_newest_first() {
        let store = create_test_store();
        let ids: Vec<i64> = (0..3)
            .map(|_| store.append(&record(200, None)).unwrap().id)
            .collect();

        let read: Vec<i64> = store.read_all().unwrap().iter().map(|r| r.id).collect();
        let mut expected = ids.clone();
        expected.reverse();
        assert_eq!(read, expected);
    }

    #[test]
    fn test_rejects_unknown_status() {
        let store = create_test_store();
        assert!(store.append(&record(418, None)).is_err());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_clear_all() {
        let store = create_test_store();
        store.append(&record(200, Some(1))).unwrap();
        store.append(&record(500, None)).unwrap();

        assert_eq!(store.clear_all().unwrap(), 2);
        assert!(store.read_all().unwrap().is_empty());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.db");
        {
            let store = SqliteTelemetryStore::new(&path).unwrap();
            store.append(&record(200, Some(2))).unwrap();
        }
        let reopened = SqliteTelemetryStore::new(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }
}
