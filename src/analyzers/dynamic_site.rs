use bollard::container::{
    Config, CreateContainerOptions, RemoveContainerOptions, StartContainerOptions,
    StopContainerOptions, WaitContainerOptions,
};
use bollard::models::HostConfig;
use bollard::Docker;
use futures::StreamExt;
use std::time::Duration;
use uuid::Uuid;
use crate::config::ScannerConfig;
use crate::errors::SiteguardError;
use crate::normalize::strip_html;
use super::{AdapterReport, AnalyzerOutput, ZapReport};
use tracing::{debug, warn};

const DYNAMIC_TIMEOUT_SECS: u64 = 300;
const REPORT_FILE: &str = "report.json";

/// Run the dynamic-site tool as a one-shot container against a URL that
/// already passed the safety gate.
///
/// Exit-code contract: the tool exits non-zero whenever it raises alerts, so
/// the exit status is advisory only; the report file is authoritative. A
/// missing report file means zero findings, not an error. This adapter never
/// returns an error.
pub async fn run(target_url: &str, config: &ScannerConfig) -> AdapterReport {
    let mut report = AdapterReport::empty_dynamic();

    let run_id = Uuid::new_v4();
    let host_dir = config.workdir_root.join(format!("sg-zap-{}", run_id));
    if let Err(e) = tokio::fs::create_dir_all(&host_dir).await {
        report.tool_errors.push(SiteguardError::AdapterTool(format!("Could not create scan workdir: {}", e)));
        return report;
    }

    let docker = match Docker::connect_with_local_defaults() {
        Ok(d) => d,
        Err(e) => {
            report.tool_errors.push(SiteguardError::AdapterTool(format!("Docker unavailable: {}", e)));
            cleanup_dir(&host_dir).await;
            return report;
        }
    };

    let container_name = format!("sg-zap-{}", run_id);
    let host_config = HostConfig {
        binds: Some(vec![format!("{}:/zap/wrk:rw", host_dir.display())]),
        ..Default::default()
    };
    let container_config = Config {
        image: Some(config.zap_image.clone()),
        cmd: Some(vec![
            "zap-baseline.py".to_string(),
            "-t".to_string(),
            target_url.to_string(),
            "-J".to_string(),
            REPORT_FILE.to_string(),
        ]),
        host_config: Some(host_config),
        ..Default::default()
    };

    debug!(target = %target_url, image = %config.zap_image, "Launching dynamic-site container");

    let create = docker
        .create_container(
            Some(CreateContainerOptions { name: container_name.clone(), platform: None }),
            container_config,
        )
        .await;
    if let Err(e) = create {
        report.tool_errors.push(SiteguardError::AdapterTool(format!("Could not create scan container: {}", e)));
        cleanup_dir(&host_dir).await;
        return report;
    }

    if let Err(e) = docker
        .start_container(&container_name, None::<StartContainerOptions<String>>)
        .await
    {
        report.tool_errors.push(SiteguardError::AdapterTool(format!("Could not start scan container: {}", e)));
        remove_container(&docker, &container_name).await;
        cleanup_dir(&host_dir).await;
        return report;
    }

    let mut wait_stream = docker.wait_container(&container_name, None::<WaitContainerOptions<String>>);
    let waited = tokio::time::timeout(Duration::from_secs(DYNAMIC_TIMEOUT_SECS), wait_stream.next()).await;

    match waited {
        Ok(Some(Ok(resp))) => {
            debug!(exit_code = resp.status_code, "Dynamic-site container exited");
        }
        // Non-zero exit surfaces as a wait error; possibly normal, the
        // report file decides
        Ok(Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. }))) => {
            debug!(exit_code = code, "Dynamic-site container exited non-zero");
        }
        Ok(Some(Err(e))) => {
            report.tool_errors.push(SiteguardError::AdapterTool(format!("Container wait failed: {}", e)));
        }
        Ok(None) => {
            report.tool_errors.push(SiteguardError::AdapterTool("Container wait stream ended unexpectedly".to_string()));
        }
        Err(_) => {
            warn!(target = %target_url, "Dynamic-site scan timed out");
            report.tool_errors.push(SiteguardError::Timeout(format!(
                "Dynamic-site scan timed out after {}s",
                DYNAMIC_TIMEOUT_SECS
            )));
            let _ = docker.stop_container(&container_name, Some(StopContainerOptions { t: 5 })).await;
        }
    }

    remove_container(&docker, &container_name).await;

    // Read the report regardless of how the container exited
    let report_path = host_dir.join(REPORT_FILE);
    match tokio::fs::read_to_string(&report_path).await {
        Ok(raw) => match parse_zap_report(&raw) {
            Ok(parsed) => {
                let alerts: usize = parsed.site.iter().map(|s| s.alerts.len()).sum();
                debug!(alerts, "Dynamic-site report parsed");
                report.output = AnalyzerOutput::Dynamic(parsed);
            }
            Err(e) => {
                report.tool_errors.push(SiteguardError::AdapterTool(format!("Unparsable dynamic-site report: {}", e)));
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(target = %target_url, "No dynamic-site report produced");
        }
        Err(e) => {
            report.tool_errors.push(SiteguardError::AdapterTool(format!("Could not read dynamic-site report: {}", e)));
        }
    }

    cleanup_dir(&host_dir).await;
    report
}

/// Parse the tool's JSON report and strip markup from every HTML-bearing
/// text field before anything downstream sees it.
pub fn parse_zap_report(raw: &str) -> Result<ZapReport, serde_json::Error> {
    let mut parsed: ZapReport = serde_json::from_str(raw)?;
    for site in &mut parsed.site {
        for alert in &mut site.alerts {
            alert.name = strip_html(&alert.name);
            alert.desc = strip_html(&alert.desc);
            alert.solution = strip_html(&alert.solution);
            alert.evidence = strip_html(&alert.evidence);
        }
    }
    Ok(parsed)
}

async fn remove_container(docker: &Docker, name: &str) {
    if let Err(e) = docker
        .remove_container(name, Some(RemoveContainerOptions { force: true, ..Default::default() }))
        .await
    {
        debug!(container = %name, error = %e, "Could not remove scan container");
    }
}

async fn cleanup_dir(dir: &std::path::Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!(dir = %dir.display(), error = %e, "Could not remove scan workdir");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "site": [
            {
                "alerts": [
                    {
                        "riskcode": "3",
                        "name": "SQL Injection",
                        "desc": "<p>SQL injection may be possible.</p>",
                        "solution": "<p>Use prepared statements.</p>",
                        "evidence": "You have an error in your SQL syntax",
                        "pluginid": "40018"
                    },
                    {
                        "riskcode": "0",
                        "name": "Server Leaks Version Information",
                        "desc": "banner",
                        "solution": "hide it",
                        "evidence": "nginx/1.18.0",
                        "pluginid": "10036"
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_zap_report() {
        let parsed = parse_zap_report(SAMPLE).unwrap();
        assert_eq!(parsed.site.len(), 1);
        assert_eq!(parsed.site[0].alerts.len(), 2);
        assert_eq!(parsed.site[0].alerts[0].riskcode, "3");
        assert_eq!(parsed.site[0].alerts[0].pluginid, "40018");
    }

    #[test]
    fn test_parse_strips_html_from_text_fields() {
        let parsed = parse_zap_report(SAMPLE).unwrap();
        let alert = &parsed.site[0].alerts[0];
        assert_eq!(alert.desc, "SQL injection may be possible.");
        assert_eq!(alert.solution, "Use prepared statements.");
        assert!(!alert.desc.contains('<'));
    }

    #[test]
    fn test_parse_empty_report() {
        let parsed = parse_zap_report("{}").unwrap();
        assert!(parsed.site.is_empty());
    }

    #[test]
    fn test_parse_garbage_rejected() {
        assert!(parse_zap_report("<html>not json</html>").is_err());
    }
}
