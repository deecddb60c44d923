use crate::models::{Narrative, Severity};

/// Fixed opening of every fix prompt, on both the LLM and fallback paths.
pub const FIX_PROMPT_PREAMBLE: &str = "Tell your AI coding assistant: \"";

/// Replace anything path-shaped with a neutral phrase. Fallback narratives
/// are built from raw tool messages, which routinely embed file paths.
pub fn scrub_paths(text: &str) -> String {
    let path_re = regex::Regex::new(r"(?:[A-Za-z]:)?(?:[\w.~-]+)?(?:[/\\][\w.~-]+)+[/\\]?").unwrap();
    let scrubbed = path_re.replace_all(text, "the affected code").to_string();
    let ws_re = regex::Regex::new(r"\s+").unwrap();
    ws_re.replace_all(scrubbed.trim(), " ").to_string()
}

/// Deterministic, path-free narrative derived from the rule id and the raw
/// tool message. Used at insertion time and kept whenever translation fails;
/// every field is always non-empty.
pub fn fallback_narrative(rule_id: &str, category: &str, severity: Severity, message: &str) -> Narrative {
    let issue = humanize_category(category);
    let detail = {
        let scrubbed = scrub_paths(message);
        if scrubbed.is_empty() {
            format!("an issue of type {}", friendly_rule(rule_id))
        } else {
            scrubbed
        }
    };

    Narrative {
        plain_english: plain_english_for(category),
        business_impact: business_impact_for(severity),
        fix_prompt: format!(
            "{preamble}My app has a {issue} problem ({rule}). The scanner reported: {detail}. \
             Please find every place this pattern appears in my project and replace it with a \
             safe, widely recommended alternative.\"",
            preamble = FIX_PROMPT_PREAMBLE,
            issue = issue,
            rule = friendly_rule(rule_id),
            detail = detail,
        ),
        verification_step: format!(
            "After your AI assistant applies the fix, run a fresh scan and confirm the {} \
             finding no longer appears.",
            issue
        ),
    }
}

fn plain_english_for(category: &str) -> String {
    let text = match category {
        "hardcoded-secrets" => {
            "A password or secret key is written directly into your code where anyone who sees \
             the code can read it. It's like taping your house key to the front door."
        }
        "sql-injection" => {
            "Your app builds database commands by pasting in text that visitors type. It's like \
             a cashier who follows any note a customer hands over, including 'open the register'."
        }
        "xss" => {
            "Your site can display text from visitors without cleaning it first, so a visitor \
             could sneak in a script that runs for everyone else. It's like letting anyone pin \
             notes to your shop window, including fake price tags."
        }
        "missing-auth" => {
            "Part of your app doesn't properly check who a visitor is before letting them in. \
             It's like a members-only club with no one checking cards at the door."
        }
        "idor" => {
            "Your app lets people open records just by guessing their number, without checking \
             the record belongs to them. It's like a hotel where any room key opens any door."
        }
        "insecure-crypto" => {
            "Your app protects data with an outdated scrambling method that attackers know how \
             to undo. It's like locking a safe with a combination printed in old manuals."
        }
        "dangerous-functions" => {
            "Your code uses a shortcut that runs whatever text it is given as live code. It's \
             like an intercom that obeys any instruction shouted into it."
        }
        "exposed-credentials" => {
            "Access keys for your backend services are visible to anyone who inspects your app. \
             It's like printing the warehouse alarm code on every receipt."
        }
        "missing-validation" => {
            "Your app accepts whatever visitors send without checking it looks right first. \
             It's like a mailroom that forwards every package unopened, even the ticking ones."
        }
        "seo" => {
            "Search engines are having trouble understanding or ranking this page. It's like a \
             shop with no sign on the door and no listing in the directory."
        }
        "dast" => {
            "Probing the live site uncovered a weakness in how it responds to unusual requests. \
             It's like a door that opens when you jiggle the handle the wrong way."
        }
        _ => {
            "The scanner flagged a weakness in how this part of your app is built. It's like an \
             inspector marking a loose railing before anyone gets hurt."
        }
    };
    text.to_string()
}

fn business_impact_for(severity: Severity) -> String {
    let text = match severity {
        Severity::Critical => {
            "Urgent: attackers actively look for this kind of weakness, and a single incident \
             could expose customer data, interrupt your service, and damage trust."
        }
        Severity::High => {
            "Serious: exploiting this takes modest effort and could leak data or let someone \
             act as one of your users."
        }
        Severity::Medium => {
            "Moderate: on its own the damage is limited, but combined with other weaknesses it \
             widens what an attacker can reach."
        }
        Severity::Low => {
            "Minor: unlikely to cause direct harm, but fixing it reduces the information and \
             footholds available to an attacker."
        }
        Severity::Info => {
            "Informational: no direct risk, but addressing it improves the overall health of \
             your site."
        }
    };
    text.to_string()
}

/// Readable label for a category slug, e.g. "sql-injection" -> "sql injection".
fn humanize_category(category: &str) -> String {
    category.trim().replace(['-', '_'], " ")
}

/// Last segment of a rule id, kept free of path separators.
fn friendly_rule(rule_id: &str) -> String {
    let segment = rule_id
        .rsplit(['.', '/'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(rule_id);
    if segment.is_empty() {
        "unnamed-rule".to_string()
    } else {
        segment.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_fields_never_empty() {
        for severity in [Severity::Critical, Severity::High, Severity::Medium, Severity::Low, Severity::Info] {
            for category in ["sql-injection", "seo", "dast", "other", "nonsense-category"] {
                let n = fallback_narrative("some.rule", category, severity, "a message");
                assert!(!n.plain_english.is_empty());
                assert!(!n.business_impact.is_empty());
                assert!(!n.fix_prompt.is_empty());
                assert!(!n.verification_step.is_empty());
            }
        }
    }

    #[test]
    fn test_fallback_fields_never_empty_with_empty_inputs() {
        let n = fallback_narrative("", "", Severity::Low, "");
        assert!(!n.plain_english.is_empty());
        assert!(!n.business_impact.is_empty());
        assert!(!n.fix_prompt.is_empty());
        assert!(!n.verification_step.is_empty());
    }

    #[test]
    fn test_fix_prompt_shape() {
        let n = fallback_narrative("python.lang.sql-injection", "sql-injection", Severity::Critical, "Detected interpolation");
        assert!(n.fix_prompt.starts_with(FIX_PROMPT_PREAMBLE));
        assert!(n.fix_prompt.ends_with('"'));
        assert!(n.fix_prompt.contains("sql-injection"));
    }

    #[test]
    fn test_fallback_is_path_free() {
        let message = "Hardcoded key in /tmp/siteguard/sg-scan-abc123/src/config.js near line 4";
        let n = fallback_narrative("hardcoded-key", "hardcoded-secrets", Severity::High, message);
        for field in [&n.plain_english, &n.business_impact, &n.fix_prompt, &n.verification_step] {
            assert!(!field.contains("sg-scan-"), "field leaked workdir: {}", field);
            assert!(!field.contains("/tmp/"), "field leaked path: {}", field);
            assert!(!field.contains("src/config.js"), "field leaked path: {}", field);
        }
    }

    #[test]
    fn test_scrub_paths() {
        assert_eq!(scrub_paths("see /etc/passwd now"), "see the affected code now");
        assert_eq!(scrub_paths("clean message"), "clean message");
        assert!(scrub_paths("C:\\Users\\app\\secret.txt leaked").starts_with("the affected code"));
    }

    #[test]
    fn test_friendly_rule_takes_last_segment() {
        assert_eq!(friendly_rule("python.lang.security.sql-injection"), "sql-injection");
        assert_eq!(friendly_rule("rules/xss-check"), "xss-check");
        assert_eq!(friendly_rule("plain-rule"), "plain-rule");
        assert_eq!(friendly_rule(""), "unnamed-rule");
    }
}
