pub const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT,
    completed_scans INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS scans (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    repo_url TEXT,
    target_url TEXT,
    status TEXT NOT NULL DEFAULT 'queued',
    finding_count_critical INTEGER NOT NULL DEFAULT 0,
    finding_count_high INTEGER NOT NULL DEFAULT 0,
    finding_count_medium INTEGER NOT NULL DEFAULT 0,
    finding_count_low INTEGER NOT NULL DEFAULT 0,
    total_findings INTEGER NOT NULL DEFAULT 0,
    score INTEGER,
    error_message TEXT,
    include_dynamic INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    started_at TEXT,
    completed_at TEXT
);

CREATE TABLE IF NOT EXISTS findings (
    id TEXT PRIMARY KEY,
    scan_id TEXT NOT NULL REFERENCES scans(id) ON DELETE CASCADE,
    severity TEXT NOT NULL,
    category TEXT NOT NULL,
    rule_id TEXT NOT NULL,
    location TEXT NOT NULL,
    line INTEGER,
    snippet TEXT NOT NULL DEFAULT '',
    raw_output TEXT NOT NULL DEFAULT '{}',
    plain_english TEXT NOT NULL,
    business_impact TEXT NOT NULL,
    fix_prompt TEXT NOT NULL,
    verification_step TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'open',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_findings_scan ON findings(scan_id);
CREATE INDEX IF NOT EXISTS idx_findings_severity ON findings(severity);
CREATE INDEX IF NOT EXISTS idx_scans_status ON scans(status);
CREATE INDEX IF NOT EXISTS idx_scans_user ON scans(user_id);
";
