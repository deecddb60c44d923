use crate::models::Severity;

/// Fixed deduction per finding by severity.
pub fn severity_weight(severity: Severity) -> i64 {
    match severity {
        Severity::Critical => 25,
        Severity::High => 15,
        Severity::Medium => 5,
        Severity::Low => 2,
        Severity::Info => 0,
    }
}

/// Weighted-deduction score over a finding multiset: start at 100, subtract
/// per severity, clamp to [0, 100]. Pure and order-independent; an empty
/// set scores exactly 100.
pub fn compute_score<'a, I>(severities: I) -> u8
where
    I: IntoIterator<Item = &'a Severity>,
{
    let deductions: i64 = severities.into_iter().map(|s| severity_weight(*s)).sum();
    (100i64 - deductions).clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_scores_100() {
        assert_eq!(compute_score([].iter()), 100);
    }

    #[test]
    fn test_single_critical_scores_75() {
        assert_eq!(compute_score([Severity::Critical].iter()), 75);
    }

    #[test]
    fn test_weights() {
        assert_eq!(compute_score([Severity::High].iter()), 85);
        assert_eq!(compute_score([Severity::Medium].iter()), 95);
        assert_eq!(compute_score([Severity::Low].iter()), 98);
        assert_eq!(compute_score([Severity::Info].iter()), 100);
    }

    #[test]
    fn test_clamped_at_zero() {
        let many = vec![Severity::Critical; 10];
        assert_eq!(compute_score(many.iter()), 0);
    }

    #[test]
    fn test_order_independence() {
        let a = vec![Severity::Critical, Severity::Low, Severity::High, Severity::Medium];
        let b = vec![Severity::Medium, Severity::High, Severity::Low, Severity::Critical];
        assert_eq!(compute_score(a.iter()), compute_score(b.iter()));
    }

    #[test]
    fn test_idempotent() {
        let set = vec![Severity::High, Severity::High, Severity::Low];
        assert_eq!(compute_score(set.iter()), compute_score(set.iter()));
        assert_eq!(compute_score(set.iter()), 66);
    }

    #[test]
    fn test_score_always_in_range() {
        for n in 0..50 {
            let set = vec![Severity::Critical; n];
            let score = compute_score(set.iter());
            assert!(score <= 100);
        }
    }
}
