use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use url::Url;
use uuid::Uuid;
use crate::analyzers::{self, AdapterReport};
use crate::config::AppConfig;
use crate::db::Database;
use crate::errors::SiteguardError;
use crate::llm::LlmProvider;
use crate::models::{Finding, FindingStatus, ScanStatus, ScanSummary};
use crate::normalize::{self, NormalizeContext};
use crate::notify::Notifier;
use crate::sandbox::{self, Sandbox};
use crate::translate::{fallback_narrative, TranslationBatcher};
use super::score::compute_score;
use tracing::{error, info, warn};

/// What the request handler hands to the pipeline. The caller receives only
/// the scan id; completion is observed by polling the persisted records.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub scan_id: String,
    pub user_id: String,
    pub repo_url: Option<String>,
    pub target_url: Option<String>,
}

/// Drives one scan from `queued` to a terminal state. Owns every status
/// transition; adapters and the translator never touch scan state.
pub struct ScanRunner {
    db: Database,
    config: Arc<AppConfig>,
    llm: Arc<dyn LlmProvider>,
}

impl ScanRunner {
    pub fn new(db: Database, config: Arc<AppConfig>, llm: Arc<dyn LlmProvider>) -> Self {
        Self { db, config, llm }
    }

    /// Fire-and-forget entry point: spawn the scan as an independent task.
    /// Any error that escapes `run` lands in the scan's error message and a
    /// `failed` terminal status.
    pub fn spawn(self, request: ScanRequest) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let scan_id = request.scan_id.clone();
            if let Err(e) = self.run(request).await {
                error!(scan_id = %scan_id, error = %e, "Scan failed");
                if let Err(db_err) = self.db.mark_scan_failed(&scan_id, &e.to_string()) {
                    error!(scan_id = %scan_id, error = %db_err, "Could not record scan failure");
                }
            }
        })
    }

    pub async fn run(&self, request: ScanRequest) -> Result<(), SiteguardError> {
        info!(scan_id = %request.scan_id, "Scan started");

        // Phase: cloning. Skipped entirely for URL-only scans; an
        // acquisition failure here is fatal.
        let mut sandbox: Option<Sandbox> = None;
        if let Some(repo_url) = &request.repo_url {
            self.db.transition_scan(&request.scan_id, ScanStatus::Cloning)?;
            let acquired = sandbox::acquire(
                repo_url,
                &self.config.git.access_token,
                &self.config.scanner.workdir_root,
            )
            .await?;
            sandbox = Some(acquired);
        }

        self.db.transition_scan(&request.scan_id, ScanStatus::Scanning)?;

        // Analysis phase. The sandbox is released on every exit path before
        // the outcome propagates.
        let analysis = self.run_analysis(&request, sandbox.as_ref()).await;
        if let Some(sb) = sandbox.take() {
            sb.release().await;
        }
        analysis?;

        // Phase: translating. Batch failures degrade to fallback
        // narratives inside the batcher; only store errors escape.
        self.db.transition_scan(&request.scan_id, ScanStatus::Translating)?;
        let batcher = TranslationBatcher::new(self.llm.clone())
            .with_batch_delay(Duration::from_millis(self.config.llm.batch_delay_ms));
        let translated = batcher.translate_all(&self.db, &request.scan_id).await?;
        info!(scan_id = %request.scan_id, translated, "Translation phase finished");

        // Finalize from the persisted finding set, not the in-memory one
        let (counts, total) = self.db.severity_counts(&request.scan_id)?;
        let findings = self.db.get_findings(&request.scan_id)?;
        let score = compute_score(findings.iter().map(|f| &f.severity));
        self.db.finalize_scan(&request.scan_id, score, &counts, total)?;

        let completed = self.db.refresh_completed_scan_count(&request.user_id)?;
        info!(user_id = %request.user_id, completed_scans = completed, "User scan count refreshed");

        // Best-effort notification; a delivery failure never reverts the scan
        let summary = ScanSummary {
            scan_id: request.scan_id.clone(),
            target_name: request
                .target_url
                .clone()
                .or_else(|| request.repo_url.clone())
                .unwrap_or_default(),
            score,
            total_findings: total,
            counts_by_severity: HashMap::from([
                ("critical".to_string(), counts.critical),
                ("high".to_string(), counts.high),
                ("medium".to_string(), counts.medium),
                ("low".to_string(), counts.low),
            ]),
            completed_at: Utc::now(),
        };
        Notifier::new(self.config.notify.webhook_url.clone())
            .notify_completed(&summary)
            .await;

        info!(scan_id = %request.scan_id, score, total_findings = total, "Scan complete");
        Ok(())
    }

    /// Run every applicable adapter in sequence. Tool-level errors inside an
    /// adapter are logged and absorbed; only unexpected failures (store
    /// errors, normalization panics) propagate.
    async fn run_analysis(
        &self,
        request: &ScanRequest,
        sandbox: Option<&Sandbox>,
    ) -> Result<(), SiteguardError> {
        if let Some(sandbox) = sandbox {
            let report = analyzers::static_code::run(sandbox.path(), &self.config.scanner).await;
            self.persist_report(&request.scan_id, report, Some(sandbox.path()), None)?;
        }

        if let Some(raw_url) = &request.target_url {
            match sandbox::validate_url(raw_url).await {
                Ok(url) => {
                    self.db.set_include_dynamic(&request.scan_id, true)?;
                    let report = analyzers::dynamic_site::run(url.as_str(), &self.config.scanner).await;
                    self.persist_report(&request.scan_id, report, None, Some(url.as_str()))?;

                    let report = analyzers::seo::run(&url).await;
                    self.persist_report(&request.scan_id, report, None, Some(url.as_str()))?;
                }
                Err(SiteguardError::SafetyRejection(reason)) => {
                    // Dynamic pass skipped: zero findings, not an error. The
                    // SEO battery is a plain page fetch and still runs when
                    // the URL at least parses.
                    warn!(scan_id = %request.scan_id, reason = %reason, "Dynamic pass skipped for unsafe target");
                    if let Ok(url) = Url::parse(raw_url) {
                        let report = analyzers::seo::run(&url).await;
                        self.persist_report(&request.scan_id, report, None, Some(url.as_str()))?;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Normalize one adapter's raw output, attach fallback narratives, and
    /// persist the batch. Tool errors are logged here and nowhere else.
    fn persist_report(
        &self,
        scan_id: &str,
        report: AdapterReport,
        sandbox_root: Option<&Path>,
        target_url: Option<&str>,
    ) -> Result<(), SiteguardError> {
        for tool_error in &report.tool_errors {
            warn!(scan_id = %scan_id, diagnostic = %tool_error, "Analyzer tool error");
        }

        let ctx = NormalizeContext { sandbox_root, target_url };
        let normalized = normalize::normalize(report.output, &ctx);
        if normalized.is_empty() {
            return Ok(());
        }

        let findings: Vec<Finding> = normalized
            .into_iter()
            .map(|n| {
                let narrative =
                    fallback_narrative(&n.rule_id, &n.category, n.severity, &n.message);
                Finding {
                    id: Uuid::new_v4().to_string(),
                    scan_id: scan_id.to_string(),
                    severity: n.severity,
                    category: n.category,
                    rule_id: n.rule_id,
                    location: n.location,
                    line: n.line,
                    snippet: n.snippet,
                    raw_output: n.raw_output,
                    plain_english: narrative.plain_english,
                    business_impact: narrative.business_impact,
                    fix_prompt: narrative.fix_prompt,
                    verification_step: narrative.verification_step,
                    status: FindingStatus::Open,
                }
            })
            .collect();

        info!(scan_id = %scan_id, count = findings.len(), "Persisting normalized findings");
        self.db.insert_findings(&findings)
    }
}
