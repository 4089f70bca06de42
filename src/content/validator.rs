//! Validation of generated biography text.
//!
//! The provider, left unconstrained, drifts toward a generic templated
//! biography ("Early Years", "School Days", ...) instead of grounding the
//! output in the user's actual timeline. The validator catches that: it
//! rejects any of a fixed denylist of template phrases and requires at
//! least half of the user-supplied time periods to surface in the text.

use super::segments::LifeSegment;

/// Generic chapter phrases that must never appear in generated output,
/// with their localized equivalents.
pub const FORBIDDEN_PHRASES: &[&str] = &[
    "Early Years",
    "School Days",
    "Family Time",
    "Growing Up",
    "童年时光",
    "学生时代",
    "家庭时光",
    "成长历程",
    "青春岁月",
    "幼年时代",
    "校园生活",
    "家人陪伴",
    "成长时光",
];

/// Result of validating one generated candidate.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub ok: bool,
    pub violations: Vec<String>,
}

/// Validate generated text against the denylist and the user's life
/// segments (extracted from the original requirements).
pub fn validate(generated: &str, original_requirements: &str) -> Verdict {
    let mut violations = Vec::new();

    for phrase in FORBIDDEN_PHRASES {
        if generated.contains(phrase) {
            violations.push(format!("contains forbidden phrase: {}", phrase));
        }
    }

    let segments = LifeSegment::extract(original_requirements);
    if !segments.is_empty() {
        let total = segments.len();
        let found = segments
            .iter()
            .filter(|s| period_mentioned(generated, &s.period))
            .count();
        // At least 50% of the supplied periods must be woven in.
        if found * 2 < total {
            violations.push(format!(
                "insufficient use of user-supplied periods: {}/{}",
                found, total
            ));
        }
    }

    Verdict {
        ok: violations.is_empty(),
        violations,
    }
}

/// A period counts as mentioned if its label appears verbatim, or any
/// whitespace-separated token of the label does.
fn period_mentioned(generated: &str, period: &str) -> bool {
    if generated.contains(period) {
        return true;
    }
    period
        .split_whitespace()
        .any(|token| generated.contains(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_passes() {
        let verdict = validate("2020年我们去了西藏。", "");
        assert!(verdict.ok);
        assert!(verdict.violations.is_empty());
    }

    #[test]
    fn test_forbidden_phrase_english() {
        let verdict = validate("Chapter 1: Early Years of a quiet child", "");
        assert!(!verdict.ok);
        assert_eq!(
            verdict.violations,
            vec!["contains forbidden phrase: Early Years".to_string()]
        );
    }

    #[test]
    fn test_forbidden_phrase_localized() {
        let verdict = validate("第一章：童年时光", "");
        assert!(!verdict.ok);
        assert!(verdict.violations[0].contains("童年时光"));
    }

    #[test]
    fn test_multiple_violations_all_reported() {
        let verdict = validate("Early Years and School Days", "");
        assert_eq!(verdict.violations.len(), 2);
    }

    #[test]
    fn test_both_periods_echoed_passes() {
        let requirements = "时期：2020\n活动：trip\n时期：2022\n活动：graduation";
        let generated = "In 2020 we travelled; in 2022 came the graduation.";
        let verdict = validate(generated, requirements);
        assert!(verdict.ok);
        assert!(verdict.violations.is_empty());
    }

    #[test]
    fn test_half_coverage_is_enough() {
        let requirements = "时期：2020\n活动：trip\n时期：2022\n活动：graduation";
        let generated = "In 2020 something memorable happened.";
        assert!(validate(generated, requirements).ok);
    }

    #[test]
    fn test_insufficient_coverage_reports_ratio() {
        let requirements = "时期：2020\n活动：a\n时期：2022\n活动：b\n时期：2024\n活动：c";
        let generated = "Only 2020 shows up here.";
        let verdict = validate(generated, requirements);
        assert!(!verdict.ok);
        assert_eq!(
            verdict.violations,
            vec!["insufficient use of user-supplied periods: 1/3".to_string()]
        );
    }

    #[test]
    fn test_token_match_counts_as_mention() {
        let requirements = "Period: summer 2020\nActivity: hiking";
        let generated = "That 2020 hike stayed with me.";
        assert!(validate(generated, requirements).ok);
    }

    #[test]
    fn test_no_segments_skips_coverage_rule() {
        let verdict = validate("anything at all", "write something nice");
        assert!(verdict.ok);
    }
}
