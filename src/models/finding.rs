use serde::{Deserialize, Serialize};

/// Severity level for a finding, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Returns a numeric rank where lower values indicate higher severity.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
            Severity::Info => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            "info" => Some(Severity::Info),
            _ => None,
        }
    }
}

/// Review state of a finding. The core only ever writes `Open`; the other
/// states arrive through the dashboard and are persisted verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingStatus {
    Open,
    Fixed,
    Accepted,
    FalsePositive,
}

impl FindingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FindingStatus::Open => "open",
            FindingStatus::Fixed => "fixed",
            FindingStatus::Accepted => "accepted",
            FindingStatus::FalsePositive => "false_positive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(FindingStatus::Open),
            "fixed" => Some(FindingStatus::Fixed),
            "accepted" => Some(FindingStatus::Accepted),
            "false_positive" | "fp" => Some(FindingStatus::FalsePositive),
            _ => None,
        }
    }
}

/// The four user-facing narrative fields produced by translation (or by the
/// deterministic fallback when translation is unavailable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub plain_english: String,
    pub business_impact: String,
    pub fix_prompt: String,
    pub verification_step: String,
}

/// One normalized issue surfaced by any adapter, scoped to a scan.
///
/// `location` is sanitized before this record exists; it never carries the
/// transient workdir prefix. The narrative fields are non-empty from the
/// moment of insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub scan_id: String,
    pub severity: Severity,
    pub category: String,
    pub rule_id: String,
    pub location: String,
    pub line: Option<u32>,
    pub snippet: String,
    /// Opaque raw tool output, retained for audit and debugging.
    pub raw_output: serde_json::Value,
    pub plain_english: String,
    pub business_impact: String,
    pub fix_prompt: String,
    pub verification_step: String,
    pub status: FindingStatus,
}

impl Finding {
    pub fn narrative(&self) -> Narrative {
        Narrative {
            plain_english: self.plain_english.clone(),
            business_impact: self.business_impact.clone(),
            fix_prompt: self.fix_prompt.clone(),
            verification_step: self.verification_step.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_roundtrip() {
        for s in [Severity::Critical, Severity::High, Severity::Medium, Severity::Low, Severity::Info] {
            assert_eq!(Severity::from_str(s.as_str()), Some(s));
        }
        assert_eq!(Severity::from_str("ERROR"), None);
    }

    #[test]
    fn test_severity_rank_ordering() {
        assert!(Severity::Critical.rank() < Severity::High.rank());
        assert!(Severity::High.rank() < Severity::Medium.rank());
        assert!(Severity::Medium.rank() < Severity::Low.rank());
        assert!(Severity::Low.rank() < Severity::Info.rank());
    }

    #[test]
    fn test_finding_status_roundtrip() {
        for s in [FindingStatus::Open, FindingStatus::Fixed, FindingStatus::Accepted, FindingStatus::FalsePositive] {
            assert_eq!(FindingStatus::from_str(s.as_str()), Some(s));
        }
    }
}
