use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Scan lifecycle states, in strict forward order. `Failed` is an absorbing
/// terminal state reachable from any non-terminal state; there is no path
/// back to an earlier phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Queued,
    Cloning,
    Scanning,
    Translating,
    Complete,
    Failed,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Queued => "queued",
            ScanStatus::Cloning => "cloning",
            ScanStatus::Scanning => "scanning",
            ScanStatus::Translating => "translating",
            ScanStatus::Complete => "complete",
            ScanStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(ScanStatus::Queued),
            "cloning" => Some(ScanStatus::Cloning),
            "scanning" => Some(ScanStatus::Scanning),
            "translating" => Some(ScanStatus::Translating),
            "complete" => Some(ScanStatus::Complete),
            "failed" => Some(ScanStatus::Failed),
            _ => None,
        }
    }

    /// Position in the forward progression. `Failed` shares the terminal
    /// rank so nothing can move past it.
    pub fn phase_rank(&self) -> u8 {
        match self {
            ScanStatus::Queued => 0,
            ScanStatus::Cloning => 1,
            ScanStatus::Scanning => 2,
            ScanStatus::Translating => 3,
            ScanStatus::Complete => 4,
            ScanStatus::Failed => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Complete | ScanStatus::Failed)
    }

    /// Transitions are monotonic: forward only, and `Failed` is reachable
    /// from any non-terminal state.
    pub fn can_transition_to(&self, next: ScanStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == ScanStatus::Failed {
            return true;
        }
        next.phase_rank() > self.phase_rank()
    }
}

/// Per-severity finding counters persisted on the scan row at completion.
/// `info` findings count toward the total but have no counter column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

/// One invocation of the pipeline against a repository and/or a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scan {
    pub id: String,
    pub user_id: String,
    pub repo_url: Option<String>,
    pub target_url: Option<String>,
    pub status: ScanStatus,
    pub counts: SeverityCounts,
    pub total_findings: u32,
    pub score: Option<u8>,
    pub error_message: Option<String>,
    pub include_dynamic: bool,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Completed-scan summary handed to the notification collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub scan_id: String,
    pub target_name: String,
    pub score: u8,
    pub total_findings: u32,
    pub counts_by_severity: HashMap<String, u32>,
    pub completed_at: DateTime<Utc>,
}
