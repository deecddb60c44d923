use chrono::Utc;
use crate::errors::SiteguardError;
use crate::models::{Finding, FindingStatus, Narrative, Severity, SeverityCounts};
use super::Database;

impl Database {
    /// Bulk insert, one transaction per adapter batch. Narrative fields must
    /// already be populated (fallbacks at minimum) before a row gets here.
    pub fn insert_findings(&self, findings: &[Finding]) -> Result<(), SiteguardError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()
            .map_err(|e| SiteguardError::Database(format!("Transaction failed: {}", e)))?;
        for f in findings {
            tx.execute(
                "INSERT INTO findings (id, scan_id, severity, category, rule_id, location, line, snippet, raw_output, plain_english, business_impact, fix_prompt, verification_step, status, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                rusqlite::params![
                    f.id,
                    f.scan_id,
                    f.severity.as_str(),
                    f.category,
                    f.rule_id,
                    f.location,
                    f.line.map(|l| l as i64),
                    f.snippet,
                    f.raw_output.to_string(),
                    f.plain_english,
                    f.business_impact,
                    f.fix_prompt,
                    f.verification_step,
                    f.status.as_str(),
                    Utc::now().to_rfc3339(),
                ],
            ).map_err(|e| SiteguardError::Database(format!("Failed to insert finding: {}", e)))?;
        }
        tx.commit()
            .map_err(|e| SiteguardError::Database(format!("Commit failed: {}", e)))?;
        Ok(())
    }

    /// Overwrite the narrative fields once translation succeeds for a finding.
    pub fn update_narrative(&self, finding_id: &str, narrative: &Narrative) -> Result<(), SiteguardError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE findings SET plain_english = ?2, business_impact = ?3, fix_prompt = ?4, verification_step = ?5 WHERE id = ?1",
            rusqlite::params![
                finding_id,
                narrative.plain_english,
                narrative.business_impact,
                narrative.fix_prompt,
                narrative.verification_step,
            ],
        ).map_err(|e| SiteguardError::Database(format!("Narrative update failed: {}", e)))?;
        Ok(())
    }

    pub fn update_finding_status(&self, finding_id: &str, status: FindingStatus) -> Result<bool, SiteguardError> {
        let conn = self.conn.lock().unwrap();
        let affected = conn.execute(
            "UPDATE findings SET status = ?2 WHERE id = ?1",
            rusqlite::params![finding_id, status.as_str()],
        ).map_err(|e| SiteguardError::Database(format!("Status update failed: {}", e)))?;
        Ok(affected > 0)
    }

    pub fn get_findings(&self, scan_id: &str) -> Result<Vec<Finding>, SiteguardError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, scan_id, severity, category, rule_id, location, line, snippet, raw_output, plain_english, business_impact, fix_prompt, verification_step, status FROM findings WHERE scan_id = ?1 ORDER BY CASE severity WHEN 'critical' THEN 0 WHEN 'high' THEN 1 WHEN 'medium' THEN 2 WHEN 'low' THEN 3 WHEN 'info' THEN 4 ELSE 5 END, created_at"
        ).map_err(|e| SiteguardError::Database(format!("Query failed: {}", e)))?;

        let rows = stmt.query_map(rusqlite::params![scan_id], |row: &rusqlite::Row| {
            let severity_str: String = row.get(2)?;
            let status_str: String = row.get(13)?;
            let raw_str: String = row.get(8)?;

            Ok(Finding {
                id: row.get(0)?,
                scan_id: row.get(1)?,
                severity: Severity::from_str(&severity_str).unwrap_or(Severity::Info),
                category: row.get(3)?,
                rule_id: row.get(4)?,
                location: row.get(5)?,
                line: row.get::<_, Option<i64>>(6)?.map(|l| l as u32),
                snippet: row.get(7)?,
                raw_output: serde_json::from_str(&raw_str).unwrap_or(serde_json::Value::Null),
                plain_english: row.get(9)?,
                business_impact: row.get(10)?,
                fix_prompt: row.get(11)?,
                verification_step: row.get(12)?,
                status: FindingStatus::from_str(&status_str).unwrap_or(FindingStatus::Open),
            })
        }).map_err(|e| SiteguardError::Database(format!("Query error: {}", e)))?;

        let mut findings = Vec::new();
        for row in rows {
            findings.push(row.map_err(|e| SiteguardError::Database(format!("Row error: {}", e)))?);
        }
        Ok(findings)
    }

    /// Counters and total computed from the persisted set, so the result is
    /// correct even when adapters inserted their rows in separate batches.
    pub fn severity_counts(&self, scan_id: &str) -> Result<(SeverityCounts, u32), SiteguardError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT severity, COUNT(*) FROM findings WHERE scan_id = ?1 GROUP BY severity"
        ).map_err(|e| SiteguardError::Database(format!("Query failed: {}", e)))?;

        let rows = stmt.query_map(rusqlite::params![scan_id], |row: &rusqlite::Row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        }).map_err(|e| SiteguardError::Database(format!("Query error: {}", e)))?;

        let mut counts = SeverityCounts::default();
        let mut total: u32 = 0;
        for row in rows {
            let (severity, n) = row.map_err(|e| SiteguardError::Database(format!("Row error: {}", e)))?;
            let n = n as u32;
            total += n;
            match Severity::from_str(&severity) {
                Some(Severity::Critical) => counts.critical += n,
                Some(Severity::High) => counts.high += n,
                Some(Severity::Medium) => counts.medium += n,
                Some(Severity::Low) => counts.low += n,
                _ => {}
            }
        }
        Ok((counts, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_finding(id: &str, scan_id: &str, severity: Severity) -> Finding {
        Finding {
            id: id.to_string(),
            scan_id: scan_id.to_string(),
            severity,
            category: "sql-injection".to_string(),
            rule_id: "python.lang.security.sql-injection".to_string(),
            location: "app/db.py".to_string(),
            line: Some(42),
            snippet: "cursor.execute(f\"SELECT * FROM users WHERE id = {uid}\")".to_string(),
            raw_output: json!({"check_id": "sql-injection"}),
            plain_english: "Your database queries mix user input directly into commands.".to_string(),
            business_impact: "An attacker could read or delete customer data.".to_string(),
            fix_prompt: "Tell your AI coding assistant: \"Use parameterized queries everywhere.\"".to_string(),
            verification_step: "Re-run a scan and confirm this issue is gone.".to_string(),
            status: FindingStatus::Open,
        }
    }

    #[test]
    fn test_db_insert_and_get_findings() {
        let db = Database::in_memory().unwrap();
        db.create_scan("scan-1", "user-1", None, Some("https://example.com")).unwrap();
        db.insert_findings(&[make_finding("f-1", "scan-1", Severity::Critical)]).unwrap();

        let results = db.get_findings("scan-1").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "f-1");
        assert_eq!(results[0].severity, Severity::Critical);
        assert_eq!(results[0].category, "sql-injection");
        assert_eq!(results[0].line, Some(42));
        assert_eq!(results[0].status, FindingStatus::Open);
        assert_eq!(results[0].raw_output["check_id"], "sql-injection");
    }

    #[test]
    fn test_db_findings_ordered_by_severity() {
        let db = Database::in_memory().unwrap();
        db.create_scan("scan-2", "user-1", None, Some("https://example.com")).unwrap();
        db.insert_findings(&[
            make_finding("f-low", "scan-2", Severity::Low),
            make_finding("f-crit", "scan-2", Severity::Critical),
            make_finding("f-high", "scan-2", Severity::High),
        ]).unwrap();

        let results = db.get_findings("scan-2").unwrap();
        assert_eq!(results[0].severity, Severity::Critical);
        assert_eq!(results[1].severity, Severity::High);
        assert_eq!(results[2].severity, Severity::Low);
    }

    #[test]
    fn test_db_update_narrative() {
        let db = Database::in_memory().unwrap();
        db.create_scan("scan-3", "user-1", None, Some("https://example.com")).unwrap();
        db.insert_findings(&[make_finding("f-n", "scan-3", Severity::High)]).unwrap();

        let narrative = Narrative {
            plain_english: "Translated explanation.".to_string(),
            business_impact: "Translated impact.".to_string(),
            fix_prompt: "Tell your AI coding assistant: \"Fix it.\"".to_string(),
            verification_step: "Check it.".to_string(),
        };
        db.update_narrative("f-n", &narrative).unwrap();

        let results = db.get_findings("scan-3").unwrap();
        assert_eq!(results[0].plain_english, "Translated explanation.");
        assert_eq!(results[0].fix_prompt, "Tell your AI coding assistant: \"Fix it.\"");
    }

    #[test]
    fn test_db_update_finding_status() {
        let db = Database::in_memory().unwrap();
        db.create_scan("scan-4", "user-1", None, Some("https://example.com")).unwrap();
        db.insert_findings(&[make_finding("f-s", "scan-4", Severity::Medium)]).unwrap();

        assert!(db.update_finding_status("f-s", FindingStatus::FalsePositive).unwrap());
        assert!(!db.update_finding_status("f-missing", FindingStatus::Fixed).unwrap());

        let results = db.get_findings("scan-4").unwrap();
        assert_eq!(results[0].status, FindingStatus::FalsePositive);
    }

    #[test]
    fn test_db_severity_counts() {
        let db = Database::in_memory().unwrap();
        db.create_scan("scan-5", "user-1", None, Some("https://example.com")).unwrap();
        let mut findings = vec![
            make_finding("f-a", "scan-5", Severity::Critical),
            make_finding("f-b", "scan-5", Severity::High),
            make_finding("f-c", "scan-5", Severity::High),
            make_finding("f-d", "scan-5", Severity::Info),
        ];
        findings[3].category = "seo".to_string();
        db.insert_findings(&findings).unwrap();

        let (counts, total) = db.severity_counts("scan-5").unwrap();
        assert_eq!(counts.critical, 1);
        assert_eq!(counts.high, 2);
        assert_eq!(counts.medium, 0);
        // info findings count toward the total but have no counter column
        assert_eq!(total, 4);
    }

    #[test]
    fn test_db_findings_cascade_delete() {
        let db = Database::in_memory().unwrap();
        db.create_scan("scan-6", "user-1", None, Some("https://example.com")).unwrap();
        db.insert_findings(&[make_finding("f-x", "scan-6", Severity::Low)]).unwrap();

        {
            let conn = db.conn.lock().unwrap();
            conn.execute("DELETE FROM scans WHERE id = 'scan-6'", []).unwrap();
        }
        assert!(db.get_findings("scan-6").unwrap().is_empty());
    }
}
