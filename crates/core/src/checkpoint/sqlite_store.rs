//! SQLite-backed parameter store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection};

use super::store::{CheckpointError, ParameterStore};

/// SQLite-backed named parameter store.
pub struct SqliteParameterStore {
    conn: Mutex<Connection>,
}

impl SqliteParameterStore {
    /// Open the database file, creating it and the schema if needed.
    pub fn new(path: &Path) -> Result<Self, CheckpointError> {
        let conn = Connection::open(path).map_err(|e| CheckpointError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, CheckpointError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CheckpointError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CheckpointError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS parameters (
                name TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| CheckpointError::Database(e.to_string()))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, CheckpointError> {
        self.conn
            .lock()
            .map_err(|_| CheckpointError::Database("connection lock poisoned".to_string()))
    }
}

impl ParameterStore for SqliteParameterStore {
    fn get_parameter(&self, name: &str) -> Result<Option<String>, CheckpointError> {
        let conn = self.conn()?;
        let result = conn.query_row(
            "SELECT value FROM parameters WHERE name = ?",
            params![name],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(CheckpointError::Database(e.to_string())),
        }
    }

    fn put_parameter(&self, name: &str, value: &str) -> Result<(), CheckpointError> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO parameters (name, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(name) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![name, value, Utc::now().to_rfc3339()],
        )
        .map_err(|e| CheckpointError::Database(e.to_string()))?;
        Ok(())
    }
}
