use chrono::Utc;
use crate::errors::SiteguardError;
use crate::models::{ScanStatus, SeverityCounts};
use super::Database;

impl Database {
    pub fn create_scan(
        &self,
        id: &str,
        user_id: &str,
        repo_url: Option<&str>,
        target_url: Option<&str>,
    ) -> Result<(), SiteguardError> {
        if repo_url.is_none() && target_url.is_none() {
            return Err(SiteguardError::Database(
                "Scan needs a repository or a URL target".to_string(),
            ));
        }
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO scans (id, user_id, repo_url, target_url, status, created_at) VALUES (?1, ?2, ?3, ?4, 'queued', ?5)",
            rusqlite::params![id, user_id, repo_url, target_url, Utc::now().to_rfc3339()],
        ).map_err(|e| SiteguardError::Database(format!("Failed to create scan: {}", e)))?;
        Ok(())
    }

    pub fn get_scan_status(&self, id: &str) -> Result<Option<ScanStatus>, SiteguardError> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT status FROM scans WHERE id = ?1",
            rusqlite::params![id],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(s) => Ok(ScanStatus::from_str(&s)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(SiteguardError::Database(format!("Query error: {}", e))),
        }
    }

    /// Move a scan to `next`. Transitions are monotonic: a regression to an
    /// earlier phase or out of a terminal state is rejected here, not just
    /// in the runner.
    pub fn transition_scan(&self, id: &str, next: ScanStatus) -> Result<(), SiteguardError> {
        let current = self
            .get_scan_status(id)?
            .ok_or_else(|| SiteguardError::Database(format!("Unknown scan: {}", id)))?;
        if !current.can_transition_to(next) {
            return Err(SiteguardError::Database(format!(
                "Illegal scan transition {} -> {} for {}",
                current.as_str(),
                next.as_str(),
                id
            )));
        }

        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        match next {
            ScanStatus::Cloning | ScanStatus::Scanning if current == ScanStatus::Queued => {
                conn.execute(
                    "UPDATE scans SET status = ?2, started_at = ?3 WHERE id = ?1",
                    rusqlite::params![id, next.as_str(), now],
                )
            }
            _ => conn.execute(
                "UPDATE scans SET status = ?2 WHERE id = ?1",
                rusqlite::params![id, next.as_str()],
            ),
        }
        .map_err(|e| SiteguardError::Database(format!("Update failed: {}", e)))?;
        Ok(())
    }

    /// Terminal failure: records the error message and completion timestamp.
    /// A no-op for scans already in a terminal state.
    pub fn mark_scan_failed(&self, id: &str, error: &str) -> Result<(), SiteguardError> {
        match self.get_scan_status(id)? {
            Some(s) if !s.is_terminal() => {}
            _ => return Ok(()),
        }
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE scans SET status = 'failed', error_message = ?2, completed_at = ?3 WHERE id = ?1",
            rusqlite::params![id, error, Utc::now().to_rfc3339()],
        ).map_err(|e| SiteguardError::Database(format!("Update failed: {}", e)))?;
        Ok(())
    }

    /// Terminal success: score, counters, total, status and completion
    /// timestamp land in a single UPDATE.
    pub fn finalize_scan(
        &self,
        id: &str,
        score: u8,
        counts: &SeverityCounts,
        total_findings: u32,
    ) -> Result<(), SiteguardError> {
        let current = self
            .get_scan_status(id)?
            .ok_or_else(|| SiteguardError::Database(format!("Unknown scan: {}", id)))?;
        if !current.can_transition_to(ScanStatus::Complete) {
            return Err(SiteguardError::Database(format!(
                "Illegal scan transition {} -> complete for {}",
                current.as_str(),
                id
            )));
        }
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE scans SET status = 'complete', score = ?2, finding_count_critical = ?3, finding_count_high = ?4, finding_count_medium = ?5, finding_count_low = ?6, total_findings = ?7, completed_at = ?8 WHERE id = ?1",
            rusqlite::params![
                id,
                score as i64,
                counts.critical as i64,
                counts.high as i64,
                counts.medium as i64,
                counts.low as i64,
                total_findings as i64,
                Utc::now().to_rfc3339(),
            ],
        ).map_err(|e| SiteguardError::Database(format!("Finalize failed: {}", e)))?;
        Ok(())
    }

    pub fn set_include_dynamic(&self, id: &str, include: bool) -> Result<(), SiteguardError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE scans SET include_dynamic = ?2 WHERE id = ?1",
            rusqlite::params![id, include as i64],
        ).map_err(|e| SiteguardError::Database(format!("Update failed: {}", e)))?;
        Ok(())
    }

    pub fn get_scan(&self, id: &str) -> Result<Option<serde_json::Value>, SiteguardError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, repo_url, target_url, status, finding_count_critical, finding_count_high, finding_count_medium, finding_count_low, total_findings, score, error_message, include_dynamic, created_at, started_at, completed_at FROM scans WHERE id = ?1"
        ).map_err(|e| SiteguardError::Database(format!("Query failed: {}", e)))?;

        let result = stmt.query_row(rusqlite::params![id], |row: &rusqlite::Row| {
            Ok(serde_json::json!({
                "id": row.get::<_, String>(0)?,
                "user_id": row.get::<_, String>(1)?,
                "repo_url": row.get::<_, Option<String>>(2)?,
                "target_url": row.get::<_, Option<String>>(3)?,
                "status": row.get::<_, String>(4)?,
                "finding_counts": {
                    "critical": row.get::<_, i64>(5)?,
                    "high": row.get::<_, i64>(6)?,
                    "medium": row.get::<_, i64>(7)?,
                    "low": row.get::<_, i64>(8)?,
                },
                "total_findings": row.get::<_, i64>(9)?,
                "score": row.get::<_, Option<i64>>(10)?,
                "error": row.get::<_, Option<String>>(11)?,
                "include_dynamic": row.get::<_, i64>(12)? != 0,
                "created_at": row.get::<_, String>(13)?,
                "started_at": row.get::<_, Option<String>>(14)?,
                "completed_at": row.get::<_, Option<String>>(15)?,
            }))
        });

        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(SiteguardError::Database(format!("Query error: {}", e))),
        }
    }

    pub fn list_scans(&self, user_id: Option<&str>, limit: usize, offset: usize) -> Result<Vec<serde_json::Value>, SiteguardError> {
        fn row_to_json(row: &rusqlite::Row) -> rusqlite::Result<serde_json::Value> {
            Ok(serde_json::json!({
                "id": row.get::<_, String>(0)?,
                "user_id": row.get::<_, String>(1)?,
                "repo_url": row.get::<_, Option<String>>(2)?,
                "target_url": row.get::<_, Option<String>>(3)?,
                "status": row.get::<_, String>(4)?,
                "score": row.get::<_, Option<i64>>(5)?,
                "total_findings": row.get::<_, i64>(6)?,
                "created_at": row.get::<_, String>(7)?,
                "completed_at": row.get::<_, Option<String>>(8)?,
            }))
        }

        const COLUMNS: &str = "id, user_id, repo_url, target_url, status, score, total_findings, created_at, completed_at";
        let conn = self.conn.lock().unwrap();
        let mut results = Vec::new();

        if let Some(user) = user_id {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM scans WHERE user_id = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
                COLUMNS
            )).map_err(|e| SiteguardError::Database(format!("Query failed: {}", e)))?;
            let rows = stmt.query_map(rusqlite::params![user, limit as i64, offset as i64], row_to_json)
                .map_err(|e| SiteguardError::Database(format!("Query error: {}", e)))?;
            for row in rows {
                results.push(row.map_err(|e| SiteguardError::Database(format!("Row error: {}", e)))?);
            }
        } else {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM scans ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
                COLUMNS
            )).map_err(|e| SiteguardError::Database(format!("Query failed: {}", e)))?;
            let rows = stmt.query_map(rusqlite::params![limit as i64, offset as i64], row_to_json)
                .map_err(|e| SiteguardError::Database(format!("Query error: {}", e)))?;
            for row in rows {
                results.push(row.map_err(|e| SiteguardError::Database(format!("Row error: {}", e)))?);
            }
        }

        Ok(results)
    }
}
