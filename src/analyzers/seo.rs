use std::time::{Duration, Instant};
use reqwest::Client;
use url::Url;
use crate::models::Severity;
use super::{AdapterReport, AnalyzerOutput, SeoFinding};
use tracing::{debug, warn};

const FETCH_TIMEOUT_SECS: u64 = 15;
const SLOW_RESPONSE_MS: u128 = 3_000;
const MAX_PAYLOAD_BYTES: usize = 2_000_000;
const MAX_TITLE_CHARS: usize = 60;
const MAX_META_DESCRIPTION_CHARS: usize = 160;

/// Run the SEO battery against a target URL.
///
/// Each auxiliary resource (robots.txt, sitemap.xml, llms.txt) degrades to a
/// specific finding when absent or malformed. Only a total failure of the
/// primary page fetch short-circuits, yielding exactly one synthetic
/// critical finding. This adapter never returns an error.
pub async fn run(target: &Url) -> AdapterReport {
    let mut report = AdapterReport {
        output: AnalyzerOutput::Seo(Vec::new()),
        tool_errors: Vec::new(),
    };

    let client = Client::new();
    let started = Instant::now();
    let page = fetch_text(&client, target.as_str()).await;
    let latency = started.elapsed();

    let html = match page {
        Ok(body) => body,
        Err(reason) => {
            warn!(target = %target, reason = %reason, "Primary page unreachable");
            report.output = AnalyzerOutput::Seo(vec![SeoFinding {
                severity: Severity::Critical,
                rule_id: "seo-site-unreachable".to_string(),
                message: format!("The site could not be fetched: {}", reason),
                url: target.to_string(),
                evidence: reason,
            }]);
            return report;
        }
    };

    let mut findings = check_html(&html, target);

    if target.scheme() != "https" {
        findings.push(SeoFinding {
            severity: Severity::High,
            rule_id: "seo-not-https".to_string(),
            message: "The site is served over plain HTTP instead of HTTPS".to_string(),
            url: target.to_string(),
            evidence: format!("scheme is {}", target.scheme()),
        });
    }

    if latency.as_millis() > SLOW_RESPONSE_MS {
        findings.push(SeoFinding {
            severity: Severity::Medium,
            rule_id: "seo-slow-response".to_string(),
            message: format!("The page took {} ms to respond", latency.as_millis()),
            url: target.to_string(),
            evidence: format!("{} ms", latency.as_millis()),
        });
    }

    if html.len() > MAX_PAYLOAD_BYTES {
        findings.push(SeoFinding {
            severity: Severity::Low,
            rule_id: "seo-heavy-page".to_string(),
            message: format!("The page payload is {} bytes", html.len()),
            url: target.to_string(),
            evidence: format!("{} bytes", html.len()),
        });
    }

    findings.extend(check_robots(&client, target).await);
    findings.extend(check_sitemap(&client, target).await);
    findings.extend(check_llms_txt(&client, target).await);

    debug!(target = %target, findings = findings.len(), "SEO battery complete");
    report.output = AnalyzerOutput::Seo(findings);
    report
}

/// The fixed structural check battery over the fetched page body. Pure, so
/// the battery is testable without a server.
pub fn check_html(html: &str, target: &Url) -> Vec<SeoFinding> {
    let mut findings = Vec::new();
    let url = target.to_string();

    let finding = |severity: Severity, rule_id: &str, message: String, evidence: String| SeoFinding {
        severity,
        rule_id: rule_id.to_string(),
        message,
        url: url.clone(),
        evidence,
    };

    let title_re = regex::Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap();
    match title_re.captures(html) {
        None => findings.push(finding(
            Severity::High,
            "seo-missing-title",
            "The page has no <title> tag".to_string(),
            String::new(),
        )),
        Some(cap) => {
            let title = cap[1].trim().to_string();
            if title.is_empty() {
                findings.push(finding(
                    Severity::High,
                    "seo-missing-title",
                    "The page's <title> tag is empty".to_string(),
                    String::new(),
                ));
            } else if title.chars().count() > MAX_TITLE_CHARS {
                findings.push(finding(
                    Severity::Low,
                    "seo-title-too-long",
                    format!("The page title is {} characters; search engines truncate around {}", title.chars().count(), MAX_TITLE_CHARS),
                    title,
                ));
            }
        }
    }

    let meta_desc_re = regex::Regex::new(
        r#"(?is)<meta[^>]+name\s*=\s*["']description["'][^>]*>"#,
    ).unwrap();
    let content_re = regex::Regex::new(r#"(?is)content\s*=\s*["']([^"']*)["']"#).unwrap();
    match meta_desc_re.find(html) {
        None => findings.push(finding(
            Severity::Medium,
            "seo-missing-meta-description",
            "The page has no meta description".to_string(),
            String::new(),
        )),
        Some(tag) => {
            let content = content_re
                .captures(tag.as_str())
                .map(|c| c[1].trim().to_string())
                .unwrap_or_default();
            if content.is_empty() {
                findings.push(finding(
                    Severity::Medium,
                    "seo-missing-meta-description",
                    "The page's meta description is empty".to_string(),
                    String::new(),
                ));
            } else if content.chars().count() > MAX_META_DESCRIPTION_CHARS {
                findings.push(finding(
                    Severity::Low,
                    "seo-meta-description-too-long",
                    format!("The meta description is {} characters; search engines truncate around {}", content.chars().count(), MAX_META_DESCRIPTION_CHARS),
                    content,
                ));
            }
        }
    }

    let h1_re = regex::Regex::new(r"(?is)<h1[\s>]").unwrap();
    let h1_count = h1_re.find_iter(html).count();
    if h1_count == 0 {
        findings.push(finding(
            Severity::Medium,
            "seo-missing-h1",
            "The page has no <h1> heading".to_string(),
            String::new(),
        ));
    } else if h1_count > 1 {
        findings.push(finding(
            Severity::Low,
            "seo-multiple-h1",
            format!("The page has {} <h1> headings; one is expected", h1_count),
            format!("{} headings", h1_count),
        ));
    }

    let canonical_re = regex::Regex::new(r#"(?is)<link[^>]+rel\s*=\s*["']canonical["']"#).unwrap();
    if !canonical_re.is_match(html) {
        findings.push(finding(
            Severity::Low,
            "seo-missing-canonical",
            "The page declares no canonical URL".to_string(),
            String::new(),
        ));
    }

    let viewport_re = regex::Regex::new(r#"(?is)<meta[^>]+name\s*=\s*["']viewport["']"#).unwrap();
    if !viewport_re.is_match(html) {
        findings.push(finding(
            Severity::Medium,
            "seo-missing-viewport",
            "The page has no viewport meta tag, so mobile rendering suffers".to_string(),
            String::new(),
        ));
    }

    let img_re = regex::Regex::new(r"(?is)<img\b[^>]*>").unwrap();
    let alt_re = regex::Regex::new(r#"(?is)\balt\s*="#).unwrap();
    let missing_alt = img_re
        .find_iter(html)
        .filter(|m| !alt_re.is_match(m.as_str()))
        .count();
    if missing_alt > 0 {
        findings.push(finding(
            Severity::Low,
            "seo-images-missing-alt",
            format!("{} image(s) have no alt text", missing_alt),
            format!("{} images", missing_alt),
        ));
    }

    let noindex_re = regex::Regex::new(
        r#"(?is)<meta[^>]+name\s*=\s*["']robots["'][^>]+content\s*=\s*["'][^"']*noindex"#,
    ).unwrap();
    if noindex_re.is_match(html) {
        findings.push(finding(
            Severity::Critical,
            "seo-noindex-enabled",
            "The page tells search engines not to index it".to_string(),
            "meta robots noindex".to_string(),
        ));
    }

    findings
}

/// A robots.txt blocks everything when the wildcard agent group contains a
/// bare `Disallow: /`.
pub fn robots_blocks_all(robots: &str) -> bool {
    let mut in_wildcard_group = false;
    for line in robots.lines() {
        let line = line.trim();
        let lower = line.to_lowercase();
        if let Some(agent) = lower.strip_prefix("user-agent:") {
            in_wildcard_group = agent.trim() == "*";
        } else if in_wildcard_group {
            if let Some(path) = lower.strip_prefix("disallow:") {
                if path.trim() == "/" {
                    return true;
                }
            }
        }
    }
    false
}

async fn check_robots(client: &Client, target: &Url) -> Vec<SeoFinding> {
    let url = match target.join("/robots.txt") {
        Ok(u) => u,
        Err(_) => return Vec::new(),
    };
    match fetch_text(client, url.as_str()).await {
        Ok(body) => {
            if robots_blocks_all(&body) {
                vec![SeoFinding {
                    severity: Severity::Critical,
                    rule_id: "seo-robots-blocks-all".to_string(),
                    message: "robots.txt blocks all crawlers from the entire site".to_string(),
                    url: url.to_string(),
                    evidence: "User-agent: * / Disallow: /".to_string(),
                }]
            } else {
                Vec::new()
            }
        }
        Err(reason) => vec![SeoFinding {
            severity: Severity::Low,
            rule_id: "seo-missing-robots".to_string(),
            message: "No robots.txt was found".to_string(),
            url: url.to_string(),
            evidence: reason,
        }],
    }
}

async fn check_sitemap(client: &Client, target: &Url) -> Vec<SeoFinding> {
    let url = match target.join("/sitemap.xml") {
        Ok(u) => u,
        Err(_) => return Vec::new(),
    };
    match fetch_text(client, url.as_str()).await {
        Ok(body) => {
            if body.contains("<urlset") || body.contains("<sitemapindex") {
                Vec::new()
            } else {
                vec![SeoFinding {
                    severity: Severity::Medium,
                    rule_id: "seo-invalid-sitemap".to_string(),
                    message: "sitemap.xml exists but is not a valid sitemap document".to_string(),
                    url: url.to_string(),
                    evidence: body.chars().take(120).collect(),
                }]
            }
        }
        Err(reason) => vec![SeoFinding {
            severity: Severity::Medium,
            rule_id: "seo-missing-sitemap".to_string(),
            message: "No sitemap.xml was found".to_string(),
            url: url.to_string(),
            evidence: reason,
        }],
    }
}

async fn check_llms_txt(client: &Client, target: &Url) -> Vec<SeoFinding> {
    let url = match target.join("/llms.txt") {
        Ok(u) => u,
        Err(_) => return Vec::new(),
    };
    match fetch_text(client, url.as_str()).await {
        Ok(_) => Vec::new(),
        Err(reason) => vec![SeoFinding {
            severity: Severity::Info,
            rule_id: "seo-missing-llms-txt".to_string(),
            message: "No llms.txt was found; AI crawlers get no guidance".to_string(),
            url: url.to_string(),
            evidence: reason,
        }],
    }
}

async fn fetch_text(client: &Client, url: &str) -> Result<String, String> {
    let resp = client
        .get(url)
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let status = resp.status();
    if !status.is_success() {
        return Err(format!("HTTP {}", status.as_u16()));
    }
    resp.text().await.map_err(|e| e.to_string())
}
