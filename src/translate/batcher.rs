use std::sync::Arc;
use std::time::Duration;
use crate::db::Database;
use crate::errors::SiteguardError;
use crate::llm::LlmProvider;
use crate::models::{Finding, Narrative};
use crate::utils::truncate_snippet;
use super::fallback::FIX_PROMPT_PREAMBLE;
use tracing::{debug, info, warn};

/// Findings per LLM call.
pub const BATCH_SIZE: usize = 5;

const CALL_TIMEOUT_SECS: u64 = 90;

/// The four-field output contract, fixed by the system instruction. The
/// reply must contain exactly one JSON array with one element per finding.
pub const TRANSLATION_SYSTEM_PROMPT: &str = r#"You translate technical security and SEO scanner findings into plain language for a non-technical founder. You will receive a numbered list of findings. Reply with EXACTLY ONE JSON array, one object per finding, in the same order, and nothing else.

Each object has these fields:
- "plain_english": at most 2 sentences explaining the problem to someone with no technical background, including a simple analogy. No jargon, no file names.
- "business_impact": one or two sentences on what this means for the business, calibrated to the stated severity (a critical issue sounds urgent, a low issue sounds routine).
- "fix_prompt": a message the user will paste into their own AI coding assistant, written in first person as if the user is speaking. It MUST start with the literal text: Tell your AI coding assistant: " and it MUST end with a closing double quote. It must reference the vulnerable code pattern shown in the snippet and name a concrete safe replacement. It must NEVER mention file paths, line numbers, directory names, or anything about where code lives on a server.
- "verification_step": one plain-language sentence describing how the user can confirm the fix worked.

File paths in the input are context hints only and are excluded from your output. Never reveal them."#;

/// Groups findings into fixed-size batches, sends each batch to the
/// language-model service, and writes the parsed narratives back. Any
/// failure (transport, timeout, malformed reply, missing element) leaves
/// the affected findings on their fallback narratives; translation is never
/// fatal to a scan.
pub struct TranslationBatcher {
    llm: Arc<dyn LlmProvider>,
    batch_delay: Duration,
}

impl TranslationBatcher {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm, batch_delay: Duration::from_secs(1) }
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Translate every finding of a scan, batch by batch, sequentially.
    /// Returns the number of findings that received an LLM narrative.
    pub async fn translate_all(&self, db: &Database, scan_id: &str) -> Result<usize, SiteguardError> {
        let findings = db.get_findings(scan_id)?;
        if findings.is_empty() {
            return Ok(0);
        }

        let mut translated = 0;
        for (i, batch) in findings.chunks(BATCH_SIZE).enumerate() {
            if i > 0 {
                tokio::time::sleep(self.batch_delay).await;
            }

            match self.translate_batch(batch).await {
                Ok(narratives) => {
                    for (finding, narrative) in batch.iter().zip(narratives) {
                        match narrative {
                            Some(n) => {
                                db.update_narrative(&finding.id, &n)?;
                                translated += 1;
                            }
                            None => {
                                debug!(finding = %finding.id, "No narrative in reply; fallback kept");
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(scan_id = %scan_id, batch = i, error = %e, "Translation batch failed; fallback narratives kept");
                }
            }
        }

        info!(scan_id = %scan_id, translated, total = findings.len(), "Translation pass finished");
        Ok(translated)
    }

    async fn translate_batch(&self, batch: &[Finding]) -> Result<Vec<Option<Narrative>>, SiteguardError> {
        let prompt = build_batch_prompt(batch);

        let response = tokio::time::timeout(
            Duration::from_secs(CALL_TIMEOUT_SECS),
            self.llm.complete(&prompt, Some(TRANSLATION_SYSTEM_PROMPT)),
        )
        .await
        .map_err(|_| SiteguardError::Translation(format!("LLM call timed out after {}s", CALL_TIMEOUT_SECS)))?
        .map_err(|e| SiteguardError::Translation(e.to_string()))?;

        Ok(parse_reply(&response.content, batch))
    }
}

/// Per-finding description. The file path rides along only as a hint, and
/// the system instruction forbids echoing it.
pub fn build_finding_description(index: usize, finding: &Finding) -> String {
    // The raw tool message survives in raw_output; the stored plain_english
    // is already a fallback narrative at this point
    let message = finding
        .raw_output
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or(&finding.plain_english);
    format!(
        "Finding {n}:\n- rule: {rule}\n- severity: {severity}\n- issue: {message}\n- vulnerable code snippet:\n{snippet}\n- location hint (context only, excluded from output): {location}\n",
        n = index + 1,
        rule = finding.rule_id,
        severity = finding.severity.as_str(),
        message = message,
        snippet = truncate_snippet(&finding.snippet),
        location = finding.location,
    )
}

pub fn build_batch_prompt(batch: &[Finding]) -> String {
    let mut prompt = format!(
        "Translate these {} findings. Reply with one JSON array of {} objects.\n\n",
        batch.len(),
        batch.len()
    );
    for (i, finding) in batch.iter().enumerate() {
        prompt.push_str(&build_finding_description(i, finding));
        prompt.push('\n');
    }
    prompt
}

/// Locate the first JSON-array substring of the reply and map its elements
/// onto the batch. No array, or a missing/invalid element, yields `None`
/// for the corresponding finding. A missing optional `business_impact`
/// keeps the finding's existing (fallback) impact text.
pub fn parse_reply(text: &str, batch: &[Finding]) -> Vec<Option<Narrative>> {
    let mut out = vec![None; batch.len()];

    let array = match extract_json_array(text) {
        Some(a) => a,
        None => return out,
    };

    for (i, finding) in batch.iter().enumerate() {
        let Some(element) = array.get(i) else { continue };

        let plain_english = non_empty_str(element, "plain_english");
        let fix_prompt = non_empty_str(element, "fix_prompt");
        let verification_step = non_empty_str(element, "verification_step");

        let (Some(plain_english), Some(fix_prompt), Some(verification_step)) =
            (plain_english, fix_prompt, verification_step)
        else {
            continue;
        };

        if !fix_prompt.starts_with(FIX_PROMPT_PREAMBLE) || !fix_prompt.ends_with('"') {
            continue;
        }

        let business_impact = non_empty_str(element, "business_impact")
            .unwrap_or_else(|| finding.business_impact.clone());

        out[i] = Some(Narrative {
            plain_english,
            business_impact,
            fix_prompt,
            verification_step,
        });
    }

    out
}

fn extract_json_array(text: &str) -> Option<Vec<serde_json::Value>> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if start >= end {
        return None;
    }
    serde_json::from_str::<Vec<serde_json::Value>>(&text[start..=end]).ok()
}

fn non_empty_str(element: &serde_json::Value, key: &str) -> Option<String> {
    element
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use crate::llm::LlmResponse;
    use crate::models::{FindingStatus, Severity};
    use crate::translate::fallback::fallback_narrative;

    struct MockProvider {
        replies: Mutex<Vec<String>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockProvider {
        fn new(replies: Vec<&str>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().rev().map(String::from).collect()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        async fn complete(&self, prompt: &str, _system: Option<&str>) -> Result<LlmResponse, SiteguardError> {
            self.calls.lock().unwrap().push(prompt.to_string());
            let reply = self.replies.lock().unwrap().pop()
                .ok_or_else(|| SiteguardError::LlmApi("no scripted reply".into()))?;
            Ok(LlmResponse { content: reply, input_tokens: None, output_tokens: None, model: "mock".into() })
        }

        fn provider_name(&self) -> &str { "mock" }
        fn model_name(&self) -> &str { "mock" }
    }

    fn make_finding(id: &str, scan_id: &str) -> Finding {
        let fallback = fallback_narrative("test.rule.sql-injection", "sql-injection", Severity::High, "interpolated query");
        Finding {
            id: id.to_string(),
            scan_id: scan_id.to_string(),
            severity: Severity::High,
            category: "sql-injection".to_string(),
            rule_id: "test.rule.sql-injection".to_string(),
            location: "app/db.py".to_string(),
            line: Some(10),
            snippet: "query(\"...\" + input)".to_string(),
            raw_output: serde_json::Value::Null,
            plain_english: fallback.plain_english,
            business_impact: fallback.business_impact,
            fix_prompt: fallback.fix_prompt,
            verification_step: fallback.verification_step,
            status: FindingStatus::Open,
        }
    }

    fn good_element() -> &'static str {
        r#"{"plain_english": "Plain words.", "business_impact": "Bad for business.", "fix_prompt": "Tell your AI coding assistant: \"Use parameterized queries.\"", "verification_step": "Scan again."}"#
    }

    #[test]
    fn test_parse_reply_happy_path() {
        let batch = vec![make_finding("f-1", "s-1")];
        let reply = format!("Here you go:\n[{}]\nDone.", good_element());
        let parsed = parse_reply(&reply, &batch);
        let n = parsed[0].as_ref().unwrap();
        assert_eq!(n.plain_english, "Plain words.");
        assert!(n.fix_prompt.starts_with(FIX_PROMPT_PREAMBLE));
    }

    #[test]
    fn test_parse_reply_no_array() {
        let batch = vec![make_finding("f-1", "s-1"), make_finding("f-2", "s-1")];
        let parsed = parse_reply("I cannot help with that.", &batch);
        assert_eq!(parsed, vec![None, None]);
    }

    #[test]
    fn test_parse_reply_missing_element() {
        let batch = vec![make_finding("f-1", "s-1"), make_finding("f-2", "s-1")];
        let reply = format!("[{}]", good_element());
        let parsed = parse_reply(&reply, &batch);
        assert!(parsed[0].is_some());
        assert!(parsed[1].is_none());
    }

    #[test]
    fn test_parse_reply_missing_required_field() {
        let batch = vec![make_finding("f-1", "s-1")];
        let reply = r#"[{"plain_english": "Words.", "verification_step": "Check."}]"#;
        let parsed = parse_reply(reply, &batch);
        assert!(parsed[0].is_none());
    }

    #[test]
    fn test_parse_reply_rejects_malformed_fix_prompt() {
        let batch = vec![make_finding("f-1", "s-1")];
        let reply = r#"[{"plain_english": "Words.", "fix_prompt": "Just fix it somehow", "verification_step": "Check."}]"#;
        let parsed = parse_reply(reply, &batch);
        assert!(parsed[0].is_none());
    }

    #[test]
    fn test_parse_reply_optional_business_impact_keeps_fallback() {
        let batch = vec![make_finding("f-1", "s-1")];
        let expected_fallback = batch[0].business_impact.clone();
        let reply = r#"[{"plain_english": "Words.", "fix_prompt": "Tell your AI coding assistant: \"Do the thing.\"", "verification_step": "Check."}]"#;
        let parsed = parse_reply(reply, &batch);
        let n = parsed[0].as_ref().unwrap();
        assert_eq!(n.business_impact, expected_fallback);
    }

    #[test]
    fn test_prompt_includes_hint_marker_and_snippet() {
        let finding = make_finding("f-1", "s-1");
        let prompt = build_batch_prompt(std::slice::from_ref(&finding));
        assert!(prompt.contains("context only, excluded from output"));
        assert!(prompt.contains("query(\"...\" + input)"));
        assert!(prompt.contains("test.rule.sql-injection"));
    }

    #[tokio::test]
    async fn test_translate_all_batches_of_five() {
        let db = Database::in_memory().unwrap();
        db.create_scan("s-1", "u-1", None, Some("https://example.com")).unwrap();
        let findings: Vec<Finding> = (0..7).map(|i| make_finding(&format!("f-{}", i), "s-1")).collect();
        db.insert_findings(&findings).unwrap();

        let elements5 = format!("[{}]", vec![good_element(); 5].join(","));
        let elements2 = format!("[{}]", vec![good_element(); 2].join(","));
        let provider = Arc::new(MockProvider::new(vec![elements5.as_str(), elements2.as_str()]));

        let batcher = TranslationBatcher::new(provider.clone()).with_batch_delay(Duration::ZERO);
        let translated = batcher.translate_all(&db, "s-1").await.unwrap();

        assert_eq!(translated, 7);
        assert_eq!(provider.calls.lock().unwrap().len(), 2);
        for f in db.get_findings("s-1").unwrap() {
            assert_eq!(f.plain_english, "Plain words.");
        }
    }

    #[tokio::test]
    async fn test_translate_all_survives_batch_failure() {
        let db = Database::in_memory().unwrap();
        db.create_scan("s-2", "u-1", None, Some("https://example.com")).unwrap();
        let findings: Vec<Finding> = (0..6).map(|i| make_finding(&format!("g-{}", i), "s-2")).collect();
        let original_plain = findings[0].plain_english.clone();
        db.insert_findings(&findings).unwrap();

        // First batch reply has no JSON array; second reply errors out
        let provider = Arc::new(MockProvider::new(vec!["nope, no array here"]));
        let batcher = TranslationBatcher::new(provider).with_batch_delay(Duration::ZERO);
        let translated = batcher.translate_all(&db, "s-2").await.unwrap();

        assert_eq!(translated, 0);
        for f in db.get_findings("s-2").unwrap() {
            assert_eq!(f.plain_english, original_plain);
            assert!(!f.fix_prompt.is_empty());
        }
    }

    #[tokio::test]
    async fn test_translate_all_empty_scan() {
        let db = Database::in_memory().unwrap();
        db.create_scan("s-3", "u-1", None, Some("https://example.com")).unwrap();

        let provider = Arc::new(MockProvider::new(vec![]));
        let batcher = TranslationBatcher::new(provider).with_batch_delay(Duration::ZERO);
        assert_eq!(batcher.translate_all(&db, "s-3").await.unwrap(), 0);
    }
}
