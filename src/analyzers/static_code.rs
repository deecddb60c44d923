use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use crate::config::ScannerConfig;
use crate::errors::SiteguardError;
use crate::utils::truncate_error;
use super::{AdapterReport, AnalyzerOutput, SemgrepOutput};
use tracing::{debug, warn};

const STATIC_TIMEOUT_SECS: u64 = 180;

/// Run the static-analysis tool against an acquired sandbox directory.
///
/// Exit-code contract: 0 means a clean run, 1 means findings were detected
/// (still a success; the output file is parsed in both cases); any other
/// exit is a tool failure and degrades to zero findings plus a recorded
/// diagnostic. This adapter never returns an error.
pub async fn run(sandbox_dir: &Path, config: &ScannerConfig) -> AdapterReport {
    let mut report = AdapterReport::empty_static();

    let dir_name = sandbox_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "scan".to_string());
    let output_path = sandbox_dir
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{}-semgrep.json", dir_name));

    debug!(dir = %sandbox_dir.display(), "Running static analysis");

    let result = tokio::time::timeout(
        Duration::from_secs(STATIC_TIMEOUT_SECS),
        Command::new(&config.semgrep_bin)
            .arg("--config")
            .arg(&config.semgrep_config)
            .arg("--json")
            .arg("--output")
            .arg(&output_path)
            .arg("--metrics=off")
            .arg(sandbox_dir)
            .kill_on_drop(true)
            .output(),
    )
    .await;

    let output = match result {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            report.tool_errors.push(SiteguardError::AdapterTool(format!("Static analysis could not start: {}", e)));
            return report;
        }
        Err(_) => {
            report.tool_errors.push(SiteguardError::Timeout(format!(
                "Static analysis timed out after {}s",
                STATIC_TIMEOUT_SECS
            )));
            return report;
        }
    };

    let exit_code = output.status.code();
    match exit_code {
        Some(0) | Some(1) => {
            // 1 = findings detected; the output file is still authoritative
            match tokio::fs::read_to_string(&output_path).await {
                Ok(raw) => match parse_semgrep_output(&raw) {
                    Ok(parsed) => {
                        debug!(results = parsed.results.len(), "Static analysis parsed");
                        for e in &parsed.errors {
                            if !e.message.is_empty() {
                                report.tool_errors.push(SiteguardError::AdapterTool(format!("Static analysis: {}", e.message)));
                            }
                        }
                        report.output = AnalyzerOutput::Static(parsed);
                    }
                    Err(e) => {
                        report.tool_errors.push(SiteguardError::AdapterTool(format!("Unparsable static analysis output: {}", e)));
                    }
                },
                Err(e) => {
                    report.tool_errors.push(SiteguardError::AdapterTool(format!("Static analysis output missing: {}", e)));
                }
            }
        }
        other => {
            let stderr = truncate_error(&String::from_utf8_lossy(&output.stderr));
            warn!(exit_code = ?other, "Static analysis tool failed");
            report.tool_errors.push(SiteguardError::AdapterTool(format!(
                "Static analysis exited with {:?}: {}",
                other, stderr
            )));
        }
    }

    if let Err(e) = tokio::fs::remove_file(&output_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!(error = %e, "Could not remove static analysis output file");
        }
    }

    report
}

pub fn parse_semgrep_output(raw: &str) -> Result<SemgrepOutput, serde_json::Error> {
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "results": [
            {
                "check_id": "python.lang.security.audit.sql-injection",
                "path": "app/db.py",
                "start": {"line": 42, "col": 5},
                "end": {"line": 42, "col": 60},
                "extra": {
                    "message": "Detected string interpolation in a SQL statement",
                    "severity": "ERROR",
                    "lines": "cursor.execute(f\"SELECT * FROM users WHERE id = {uid}\")"
                }
            }
        ],
        "errors": [
            {"message": "Skipped 2 files larger than 1 MB"}
        ]
    }"#;

    #[test]
    fn test_parse_semgrep_output() {
        let parsed = parse_semgrep_output(SAMPLE).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].check_id, "python.lang.security.audit.sql-injection");
        assert_eq!(parsed.results[0].start.line, 42);
        assert_eq!(parsed.results[0].extra.severity, "ERROR");
        assert_eq!(parsed.errors.len(), 1);
    }

    #[test]
    fn test_parse_empty_document() {
        let parsed = parse_semgrep_output("{}").unwrap();
        assert!(parsed.results.is_empty());
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn test_parse_garbage_rejected() {
        assert!(parse_semgrep_output("semgrep crashed hard").is_err());
    }

    #[tokio::test]
    async fn test_missing_tool_degrades_to_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScannerConfig {
            semgrep_bin: "/nonexistent/semgrep-binary".to_string(),
            ..Default::default()
        };

        let report = run(dir.path(), &config).await;
        assert!(!report.tool_errors.is_empty());
        match report.output {
            AnalyzerOutput::Static(out) => assert!(out.results.is_empty()),
            _ => panic!("expected static output"),
        }
    }
}
