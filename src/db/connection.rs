use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use crate::errors::SiteguardError;

/// Handle to the persistent store. Cheap to clone; every scan task holds
/// one, and the connection mutex is the only cross-task synchronization.
pub struct Database {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(path: &str) -> Result<Self, SiteguardError> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| SiteguardError::Database(format!("Failed to open database: {}", e)))?;

        // WAL so concurrent scan tasks don't serialize on reads; the busy
        // timeout covers short write bursts at finalize time
        Self::configure(&conn, "PRAGMA journal_mode=WAL;")?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self, SiteguardError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SiteguardError::Database(format!("Failed to open in-memory db: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, SiteguardError> {
        Self::configure(&conn, "")?;
        let db = Self { conn: Arc::new(Mutex::new(conn)) };
        {
            let conn = db.conn.lock().unwrap();
            conn.execute_batch(super::schema::CREATE_TABLES)
                .map_err(|e| SiteguardError::Database(format!("Failed to create tables: {}", e)))?;
        }
        Ok(db)
    }

    fn configure(conn: &Connection, extra: &str) -> Result<(), SiteguardError> {
        let pragmas = format!("{}PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;", extra);
        conn.execute_batch(&pragmas)
            .map_err(|e| SiteguardError::Database(format!("Failed to set pragmas: {}", e)))
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self { conn: self.conn.clone() }
    }
}
