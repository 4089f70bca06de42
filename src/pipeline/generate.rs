//! Biography generation with content validation and bounded retries.
//!
//! A validation shortfall is not a hard error: intermediate failures feed
//! the violation list back into the next prompt, and the final attempt is
//! returned even if imperfect — a slightly generic biography beats no
//! biography. `max_attempts` bounds worst-case latency and provider spend.

use tokio_util::sync::CancellationToken;

use crate::content::{self, prompts};
use crate::llm::ProviderRouter;

use super::StageError;

/// Default number of generation attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Result of the generation loop.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// The accepted (or best-available) biography text
    pub text: String,
    /// Number of attempts actually made
    pub attempts: u32,
    /// Violations of the final attempt; empty when validation passed
    pub violations: Vec<String>,
}

/// Generate a biography grounded in the photo analyses and user
/// requirements, retrying on validation failure up to `max_attempts`.
pub async fn generate_validated_biography(
    router: &ProviderRouter,
    image_analyses: &[String],
    user_requirements: &str,
    language: &str,
    max_attempts: u32,
    cancel: &CancellationToken,
) -> Result<GenerationOutcome, StageError> {
    let mut requirements = user_requirements.to_string();

    for attempt in 1..=max_attempts {
        tracing::info!(attempt, max_attempts, "Generating biography candidate");

        let prompt = prompts::biography_prompt(image_analyses, &requirements, language);
        let candidate = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StageError::Cancelled),
            result = router.generate_text(&prompt) => result?,
        };

        let verdict = content::validate(&candidate, user_requirements);
        if verdict.ok {
            tracing::info!(attempt, "Generated content passed validation");
            return Ok(GenerationOutcome {
                text: candidate,
                attempts: attempt,
                violations: Vec::new(),
            });
        }

        tracing::warn!(
            attempt,
            violations = ?verdict.violations,
            "Generated content failed validation"
        );

        if attempt == max_attempts {
            // Out of attempts: return the imperfect candidate with its
            // violations discoverable for logging.
            return Ok(GenerationOutcome {
                text: candidate,
                attempts: attempt,
                violations: verdict.violations,
            });
        }

        requirements = prompts::retry_feedback(&requirements, &verdict.violations);
    }

    // Unreachable given the loop above; kept as a safety net.
    Err(StageError::RetriesExhausted { max_attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ProviderClient, ProviderError, TextStyle};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Stub provider returning scripted generation outputs in order; the
    /// last entry repeats once the script runs out.
    struct ScriptedProvider {
        outputs: Vec<String>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(outputs: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                outputs: outputs.iter().map(|s| s.to_string()).collect(),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ProviderClient for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model_ids(&self) -> String {
            "scripted/scripted".to_string()
        }

        async fn analyze_image(&self, _: &str, _: &str) -> Result<String, ProviderError> {
            Ok("a photo".to_string())
        }

        async fn generate_text(&self, _: &str) -> Result<String, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.outputs[call.min(self.outputs.len() - 1)].clone())
        }

        async fn optimize_text(&self, text: &str, _: TextStyle) -> Result<String, ProviderError> {
            Ok(text.to_string())
        }
    }

    fn router_over(provider: Arc<ScriptedProvider>) -> ProviderRouter {
        ProviderRouter::new(provider.clone(), provider)
    }

    const REQUIREMENTS: &str = "时期：2020\n活动：trip\n时期：2022\n活动：graduation";

    #[tokio::test]
    async fn test_accepts_clean_text_on_third_attempt() {
        let provider = ScriptedProvider::new(&[
            "Early Years of someone in 2020 and 2022",
            "School Days in 2020 and 2022",
            "In 2020 we travelled; 2022 brought graduation.",
        ]);
        let router = router_over(provider.clone());

        let outcome = generate_validated_biography(
            &router,
            &[],
            REQUIREMENTS,
            "en",
            3,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.text, "In 2020 we travelled; 2022 brought graduation.");
        assert_eq!(outcome.attempts, 3);
        assert!(outcome.violations.is_empty());
        // No fourth attempt.
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_attempt_with_violations() {
        let provider =
            ScriptedProvider::new(&["Early Years, nothing about the user's timeline"]);
        let router = router_over(provider.clone());

        let outcome = generate_validated_biography(
            &router,
            &[],
            REQUIREMENTS,
            "en",
            3,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.attempts, 3);
        assert_eq!(provider.calls(), 3);
        assert!(!outcome.violations.is_empty());
        assert!(outcome
            .violations
            .iter()
            .any(|v| v.contains("Early Years")));
        assert!(outcome
            .violations
            .iter()
            .any(|v| v.contains("insufficient use of user-supplied periods")));
    }

    #[tokio::test]
    async fn test_first_attempt_success_is_single_call() {
        let provider = ScriptedProvider::new(&["2020 and 2022, exactly as lived."]);
        let router = router_over(provider.clone());

        let outcome = generate_validated_biography(
            &router,
            &[],
            REQUIREMENTS,
            "en",
            3,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.attempts, 1);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_generation() {
        let provider = ScriptedProvider::new(&["whatever"]);
        let router = router_over(provider);
        let token = CancellationToken::new();
        token.cancel();

        let err = generate_validated_biography(
            &router,
            &[],
            REQUIREMENTS,
            "en",
            3,
            &token,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StageError::Cancelled));
    }
}
