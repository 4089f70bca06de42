//! Life-segment extraction from free-text user requirements.
//!
//! Users describe their timeline as labelled lines, one field per line.
//! Both the Chinese labels used by the mobile client and their English
//! equivalents are accepted:
//!
//! ```text
//! 时期：2020年夏天
//! 活动：去西藏旅行
//! Period: 2022
//! Activity: graduation trip
//! ```
//!
//! Segments are extracted once per generation attempt and immutable after
//! that; they drive chapter generation and ground the validator's coverage
//! check.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A user-supplied (time period, activity) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeSegment {
    /// Label of a time span, e.g. a year or a descriptive phrase
    pub period: String,
    /// What happened during that period
    pub activity: String,
}

impl LifeSegment {
    /// Extract all life segments from the requirements text, in order of
    /// appearance. A period line opens a segment; the next activity line
    /// completes it. A period without a following activity keeps an empty
    /// activity.
    pub fn extract(requirements: &str) -> Vec<LifeSegment> {
        let period_re = Regex::new(r"^\s*(?:时期|[Pp]eriod)\s*[:：]\s*(.+?)\s*$").unwrap();
        let activity_re = Regex::new(r"^\s*(?:活动|[Aa]ctivity)\s*[:：]\s*(.+?)\s*$").unwrap();

        let mut segments = Vec::new();
        let mut pending: Option<String> = None;

        for line in requirements.lines() {
            if let Some(cap) = period_re.captures(line) {
                if let Some(period) = pending.take() {
                    segments.push(LifeSegment {
                        period,
                        activity: String::new(),
                    });
                }
                pending = Some(cap[1].to_string());
            } else if let Some(cap) = activity_re.captures(line) {
                if let Some(period) = pending.take() {
                    segments.push(LifeSegment {
                        period,
                        activity: cap[1].to_string(),
                    });
                }
            }
        }

        if let Some(period) = pending {
            segments.push(LifeSegment {
                period,
                activity: String::new(),
            });
        }

        segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_chinese_labels() {
        let text = "生活片段\n时期：2020年夏天\n活动：去西藏旅行\n时期：2022\n活动：毕业";
        let segments = LifeSegment::extract(text);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].period, "2020年夏天");
        assert_eq!(segments[0].activity, "去西藏旅行");
        assert_eq!(segments[1].period, "2022");
    }

    #[test]
    fn test_extracts_english_labels() {
        let text = "Period: 2020\nActivity: road trip\nperiod: 2022\nactivity: graduation";
        let segments = LifeSegment::extract(text);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].period, "2020");
        assert_eq!(segments[1].activity, "graduation");
    }

    #[test]
    fn test_period_without_activity_is_kept() {
        let text = "时期：2024\nsome unrelated line";
        let segments = LifeSegment::extract(text);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].period, "2024");
        assert!(segments[0].activity.is_empty());
    }

    #[test]
    fn test_no_segments_in_plain_text() {
        assert!(LifeSegment::extract("please write something warm").is_empty());
    }

    #[test]
    fn test_activity_without_period_is_ignored() {
        let text = "活动：毕业旅行";
        assert!(LifeSegment::extract(text).is_empty());
    }
}
