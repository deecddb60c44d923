use chrono::Utc;
use crate::errors::SiteguardError;
use super::Database;

impl Database {
    pub fn ensure_user(&self, id: &str, email: Option<&str>) -> Result<(), SiteguardError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO users (id, email, created_at) VALUES (?1, ?2, ?3) ON CONFLICT(id) DO NOTHING",
            rusqlite::params![id, email, Utc::now().to_rfc3339()],
        ).map_err(|e| SiteguardError::Database(format!("Failed to upsert user: {}", e)))?;
        Ok(())
    }

    /// Recompute the user's completed-scan count from the scans table and
    /// persist it. Counting from the store keeps the value correct under
    /// concurrent scans for the same user.
    pub fn refresh_completed_scan_count(&self, user_id: &str) -> Result<u32, SiteguardError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM scans WHERE user_id = ?1 AND status = 'complete'",
            rusqlite::params![user_id],
            |row| row.get(0),
        ).map_err(|e| SiteguardError::Database(format!("Count query failed: {}", e)))?;

        conn.execute(
            "UPDATE users SET completed_scans = ?2 WHERE id = ?1",
            rusqlite::params![user_id, count],
        ).map_err(|e| SiteguardError::Database(format!("Count update failed: {}", e)))?;
        Ok(count as u32)
    }

    pub fn get_user(&self, id: &str) -> Result<Option<serde_json::Value>, SiteguardError> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT id, email, completed_scans, created_at FROM users WHERE id = ?1",
            rusqlite::params![id],
            |row: &rusqlite::Row| {
                Ok(serde_json::json!({
                    "id": row.get::<_, String>(0)?,
                    "email": row.get::<_, Option<String>>(1)?,
                    "completed_scans": row.get::<_, i64>(2)?,
                    "created_at": row.get::<_, String>(3)?,
                }))
            },
        );
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(SiteguardError::Database(format!("Query error: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScanStatus, SeverityCounts};

    #[test]
    fn test_db_ensure_user_idempotent() {
        let db = Database::in_memory().unwrap();
        db.ensure_user("user-1", Some("a@example.com")).unwrap();
        db.ensure_user("user-1", Some("other@example.com")).unwrap();

        let user = db.get_user("user-1").unwrap().unwrap();
        assert_eq!(user["email"], "a@example.com");
        assert_eq!(user["completed_scans"], 0);
    }

    #[test]
    fn test_db_completed_count_recomputed_from_store() {
        let db = Database::in_memory().unwrap();
        db.ensure_user("user-1", None).unwrap();

        for i in 0..3 {
            let id = format!("scan-{}", i);
            db.create_scan(&id, "user-1", None, Some("https://example.com")).unwrap();
            db.transition_scan(&id, ScanStatus::Scanning).unwrap();
            db.transition_scan(&id, ScanStatus::Translating).unwrap();
        }
        db.finalize_scan("scan-0", 100, &SeverityCounts::default(), 0).unwrap();
        db.finalize_scan("scan-1", 75, &SeverityCounts { critical: 1, ..Default::default() }, 1).unwrap();
        db.mark_scan_failed("scan-2", "boom").unwrap();

        let count = db.refresh_completed_scan_count("user-1").unwrap();
        assert_eq!(count, 2);
        assert_eq!(db.get_user("user-1").unwrap().unwrap()["completed_scans"], 2);
    }
}
