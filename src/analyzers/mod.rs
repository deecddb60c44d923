pub mod dynamic_site;
pub mod seo;
pub mod static_code;

use serde::{Deserialize, Serialize};
use crate::errors::SiteguardError;
use crate::models::Severity;

/// Document shape read back from the static-analysis tool's output file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemgrepOutput {
    #[serde(default)]
    pub results: Vec<SemgrepResult>,
    #[serde(default)]
    pub errors: Vec<SemgrepError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemgrepResult {
    pub check_id: String,
    pub path: String,
    #[serde(default)]
    pub start: SemgrepPosition,
    #[serde(default)]
    pub end: SemgrepPosition,
    pub extra: SemgrepExtra,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SemgrepPosition {
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub col: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemgrepExtra {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub lines: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemgrepError {
    #[serde(default)]
    pub message: String,
}

/// Report shape produced by the dynamic-site tool. Risk codes arrive as
/// strings ("3", "2", "1", "0") in the traditional JSON report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZapReport {
    #[serde(default)]
    pub site: Vec<ZapSite>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZapSite {
    #[serde(default)]
    pub alerts: Vec<ZapAlert>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZapAlert {
    #[serde(default)]
    pub riskcode: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub evidence: String,
    #[serde(default)]
    pub pluginid: String,
}

/// SEO findings carry canonical severities at generation time; there is no
/// external tool vocabulary to map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoFinding {
    pub severity: Severity,
    pub rule_id: String,
    pub message: String,
    pub url: String,
    pub evidence: String,
}

/// Tagged adapter result, consumed through one normalization arm per
/// variant rather than run-time type inspection.
#[derive(Debug, Clone)]
pub enum AnalyzerOutput {
    Static(SemgrepOutput),
    Dynamic(ZapReport),
    Seo(Vec<SeoFinding>),
}

/// What an adapter hands back: raw output plus tool-level errors that are
/// logged but never abort the scan.
#[derive(Debug)]
pub struct AdapterReport {
    pub output: AnalyzerOutput,
    pub tool_errors: Vec<SiteguardError>,
}

impl AdapterReport {
    pub fn empty_static() -> Self {
        Self { output: AnalyzerOutput::Static(SemgrepOutput::default()), tool_errors: Vec::new() }
    }

    pub fn empty_dynamic() -> Self {
        Self { output: AnalyzerOutput::Dynamic(ZapReport::default()), tool_errors: Vec::new() }
    }
}
