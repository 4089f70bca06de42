//! Prompt construction for the generation pipeline.
//!
//! The biography prompt is deliberately hard-edged: it enumerates the
//! forbidden template phrases and demands one chapter per user-supplied
//! life segment. Softer phrasings measurably regress to generic output.

use super::validator::FORBIDDEN_PHRASES;

/// Default prompt for per-photo analysis.
pub fn image_analysis_prompt() -> &'static str {
    "请详细描述这张图片的内容，包括人物、场景、活动、情绪等细节"
}

/// Build the biography-generation prompt from photo analyses and the
/// (possibly feedback-augmented) requirements.
pub fn biography_prompt(image_analyses: &[String], requirements: &str, language: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are writing a personal biography. Follow every rule below; violating any rule makes the output unusable.\n\n");

    prompt.push_str("User's real information:\n");
    if requirements.trim().is_empty() {
        prompt.push_str("(none provided — write a brief, restrained biography)\n");
    } else {
        prompt.push_str(requirements);
        prompt.push('\n');
    }

    prompt.push_str("\nPhoto reference information:\n");
    for (i, analysis) in image_analyses.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, analysis));
    }

    prompt.push_str("\nForbidden chapter titles and phrases (never use any of these):\n");
    for phrase in FORBIDDEN_PHRASES {
        prompt.push_str(&format!("- {}\n", phrase));
    }

    prompt.push_str(
        "\nRules:\n\
         1. Base every sentence on the user's provided information; invent no people, places or events.\n\
         2. Each chapter corresponds to one user-provided life segment, with a personalized title naming its period.\n\
         3. If information is scarce, write brief authentic content rather than fabricate.\n\
         4. One short opening paragraph, one short closing paragraph, nothing generic in between.\n",
    );

    if language.starts_with("zh") {
        prompt.push_str("\nOutput language: 中文。字数 800-1200 字。语调温馨真实。\n");
    } else {
        prompt.push_str("\nOutput language: English. 800-1200 words. Warm, grounded tone.\n");
    }

    prompt.push_str("\nWrite the biography now:\n");
    prompt
}

/// Append the validator's findings to the requirements for the next
/// attempt, so each retry is better informed than the last.
pub fn retry_feedback(requirements: &str, violations: &[String]) -> String {
    format!(
        "{}\nPrevious attempt failed: {}\nAvoid these issues.",
        requirements,
        violations.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_analyses_and_forbidden_phrases() {
        let analyses = vec!["a family at the beach".to_string(), "a graduation".to_string()];
        let prompt = biography_prompt(&analyses, "时期：2020\n活动：trip", "zh-CN");
        assert!(prompt.contains("1. a family at the beach"));
        assert!(prompt.contains("2. a graduation"));
        assert!(prompt.contains("Early Years"));
        assert!(prompt.contains("时期：2020"));
        assert!(prompt.contains("中文"));
    }

    #[test]
    fn test_english_prompt_for_other_languages() {
        let prompt = biography_prompt(&[], "Period: 2020", "en");
        assert!(prompt.contains("English"));
    }

    #[test]
    fn test_retry_feedback_carries_violations() {
        let augmented = retry_feedback(
            "Period: 2020",
            &["contains forbidden phrase: Early Years".to_string()],
        );
        assert!(augmented.starts_with("Period: 2020"));
        assert!(augmented.contains("Previous attempt failed: contains forbidden phrase: Early Years"));
        assert!(augmented.ends_with("Avoid these issues."));
    }
}
