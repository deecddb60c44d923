use std::path::Path;
use serde_json::json;
use crate::analyzers::{AnalyzerOutput, SemgrepOutput, SeoFinding, ZapReport};
use crate::models::Severity;

/// Ordered category table, first match wins. The order is a contract: a rule
/// id like "hardcoded-sql-password" classifies as hardcoded-secrets because
/// the secrets row is checked first.
pub const CATEGORY_RULES: &[(&[&str], &str)] = &[
    (&["secret", "hardcoded", "password"], "hardcoded-secrets"),
    (&["sql", "injection"], "sql-injection"),
    (&["xss", "cross-site"], "xss"),
    (&["auth", "session"], "missing-auth"),
    (&["idor", "object-reference"], "idor"),
    (&["crypto", "encrypt"], "insecure-crypto"),
    (&["eval", "dangerous"], "dangerous-functions"),
    (&["supabase", "firebase"], "exposed-credentials"),
    (&["input", "valid"], "missing-validation"),
];

pub const CATEGORY_OTHER: &str = "other";

/// One canonical finding record, ready for fallback-narrative generation and
/// persistence. Locations are already sanitized when this type exists.
#[derive(Debug, Clone)]
pub struct NormalizedFinding {
    pub severity: Severity,
    pub category: String,
    pub rule_id: String,
    pub location: String,
    pub line: Option<u32>,
    pub snippet: String,
    pub message: String,
    pub raw_output: serde_json::Value,
}

pub struct NormalizeContext<'a> {
    /// Sandbox root to strip from static finding locations.
    pub sandbox_root: Option<&'a Path>,
    /// Scanned URL, used as the location for dynamic findings.
    pub target_url: Option<&'a str>,
}

/// Canonicalize one adapter's raw output. One arm per analyzer variant.
pub fn normalize(output: AnalyzerOutput, ctx: &NormalizeContext<'_>) -> Vec<NormalizedFinding> {
    match output {
        AnalyzerOutput::Static(out) => normalize_static(out, ctx.sandbox_root),
        AnalyzerOutput::Dynamic(report) => normalize_dynamic(report, ctx.target_url.unwrap_or("")),
        AnalyzerOutput::Seo(findings) => normalize_seo(findings),
    }
}

fn normalize_static(output: SemgrepOutput, sandbox_root: Option<&Path>) -> Vec<NormalizedFinding> {
    output
        .results
        .into_iter()
        .map(|r| {
            let raw = json!({
                "check_id": r.check_id,
                "start": { "line": r.start.line, "col": r.start.col },
                "end": { "line": r.end.line, "col": r.end.col },
                "message": r.extra.message,
                "severity": r.extra.severity,
            });
            NormalizedFinding {
                severity: severity_from_static(&r.extra.severity),
                category: categorize_rule(&r.check_id).to_string(),
                rule_id: r.check_id,
                location: sanitize_location(&r.path, sandbox_root),
                line: Some(r.start.line).filter(|l| *l > 0),
                snippet: r.extra.lines,
                message: sanitize_location(&r.extra.message, sandbox_root),
                raw_output: raw,
            }
        })
        .collect()
}

fn normalize_dynamic(report: ZapReport, target_url: &str) -> Vec<NormalizedFinding> {
    report
        .site
        .into_iter()
        .flat_map(|s| s.alerts)
        .map(|a| {
            let raw = serde_json::to_value(&a).unwrap_or(serde_json::Value::Null);
            let message = if a.desc.is_empty() {
                a.name.clone()
            } else {
                format!("{}: {}", a.name, a.desc)
            };
            NormalizedFinding {
                severity: severity_from_risk_code(&a.riskcode),
                category: "dast".to_string(),
                rule_id: format!("zap-{}", a.pluginid),
                location: target_url.to_string(),
                line: None,
                snippet: a.evidence,
                message,
                raw_output: raw,
            }
        })
        .collect()
}

fn normalize_seo(findings: Vec<SeoFinding>) -> Vec<NormalizedFinding> {
    findings
        .into_iter()
        .map(|f| {
            let raw = serde_json::to_value(&f).unwrap_or(serde_json::Value::Null);
            NormalizedFinding {
                severity: f.severity,
                category: "seo".to_string(),
                rule_id: f.rule_id,
                location: f.url,
                line: None,
                snippet: f.evidence,
                message: f.message,
                raw_output: raw,
            }
        })
        .collect()
}

/// Static-analysis severity vocabulary onto the canonical scale.
pub fn severity_from_static(severity: &str) -> Severity {
    match severity.to_lowercase().as_str() {
        "error" => Severity::Critical,
        "warning" => Severity::High,
        "info" => Severity::Medium,
        _ => Severity::Low,
    }
}

/// Dynamic-site risk codes onto the canonical scale. Unknown codes are low.
pub fn severity_from_risk_code(code: &str) -> Severity {
    match code.trim() {
        "3" => Severity::Critical,
        "2" => Severity::High,
        "1" => Severity::Medium,
        "0" => Severity::Low,
        _ => Severity::Low,
    }
}

/// Derive a category tag from a rule identifier via the ordered table.
pub fn categorize_rule(rule_id: &str) -> &'static str {
    let lower = rule_id.to_lowercase();
    for (needles, category) in CATEGORY_RULES {
        if needles.iter().any(|n| lower.contains(n)) {
            return category;
        }
    }
    CATEGORY_OTHER
}

/// Strip the sandbox root and any transient-workdir fragment from a
/// location. This is the single enforcement point keeping internal
/// filesystem layout out of every user-facing surface; the removal is
/// permanent and irreversible.
pub fn sanitize_location(location: &str, sandbox_root: Option<&Path>) -> String {
    let mut out = location.to_string();

    if let Some(root) = sandbox_root {
        let root_str = root.to_string_lossy();
        if let Some(stripped) = out.strip_prefix(root_str.as_ref()) {
            out = stripped.trim_start_matches(['/', '\\']).to_string();
        } else {
            out = out.replace(root_str.as_ref(), "");
        }
    }

    // Backstop for workdir fragments embedded anywhere in the string
    let workdir_re = regex::Regex::new(
        r"(?i)(?:[^\s'\x22]*[/\\])?sg-(?:scan|zap)-[0-9a-f][0-9a-f-]*[/\\]?",
    )
    .unwrap();
    let out = workdir_re.replace_all(&out, "").to_string();
    out.trim_start_matches(['/', '\\']).to_string()
}

/// Remove markup and decode the common entities from an HTML-bearing field.
pub fn strip_html(text: &str) -> String {
    let tag_re = regex::Regex::new(r"(?s)<[^>]*>").unwrap();
    let stripped = tag_re.replace_all(text, " ");
    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    let ws_re = regex::Regex::new(r"\s+").unwrap();
    ws_re.replace_all(decoded.trim(), " ").to_string()
}
