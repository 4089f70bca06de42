//! Primary/backup failover router.
//!
//! One router instance is shared by every task in the process. Provider
//! health is a property of the upstream service, not of any single task, so
//! the failure counter and the sticky backup flag are global: after the
//! threshold is reached, all subsequent calls route to the backup until an
//! operator resets the router.
//!
//! Every operation gets at most one fallback hop. A primary failure is
//! always followed by a single backup attempt; if that also fails the
//! operation fails with a composite error naming both causes.

use std::sync::Arc;
use tokio::sync::Mutex;

use serde::Serialize;
use thiserror::Error;

use super::error::ProviderError;
use super::{ProviderClient, TextStyle};

/// Consecutive primary failures after which all traffic moves to the backup.
pub const FAILOVER_THRESHOLD: u32 = 3;

/// Error from a routed operation.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The router was already on the backup and the backup call failed.
    #[error("backup provider failed: {0}")]
    Backup(ProviderError),

    /// The primary call failed and the single backup attempt failed too.
    #[error("both providers failed; primary: {primary}; backup: {backup}")]
    BothFailed {
        primary: ProviderError,
        backup: ProviderError,
    },
}

/// Mutable failover state. The increment-and-compare sequence must be
/// atomic, so all access goes through one mutex.
#[derive(Debug, Default)]
struct RouterState {
    consecutive_failures: u32,
    using_backup: bool,
}

/// Serializable router snapshot for operator status responses.
#[derive(Debug, Clone, Serialize)]
pub struct RouterSnapshot {
    pub using_backup: bool,
    pub consecutive_failures: u32,
    pub failure_threshold: u32,
    pub current_provider: String,
    pub primary_models: String,
    pub backup_models: String,
}

/// One provider operation, captured so the primary attempt and the backup
/// hop execute the identical call.
enum Op<'a> {
    AnalyzeImage { image_url: &'a str, prompt: &'a str },
    GenerateText { prompt: &'a str },
    OptimizeText { text: &'a str, style: TextStyle },
}

impl Op<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Op::AnalyzeImage { .. } => "analyze_image",
            Op::GenerateText { .. } => "generate_text",
            Op::OptimizeText { .. } => "optimize_text",
        }
    }

    async fn invoke(&self, client: &dyn ProviderClient) -> Result<String, ProviderError> {
        match self {
            Op::AnalyzeImage { image_url, prompt } => client.analyze_image(image_url, prompt).await,
            Op::GenerateText { prompt } => client.generate_text(prompt).await,
            Op::OptimizeText { text, style } => client.optimize_text(text, *style).await,
        }
    }
}

/// Failover router over exactly two provider clients.
pub struct ProviderRouter {
    primary: Arc<dyn ProviderClient>,
    backup: Arc<dyn ProviderClient>,
    state: Mutex<RouterState>,
}

impl ProviderRouter {
    pub fn new(primary: Arc<dyn ProviderClient>, backup: Arc<dyn ProviderClient>) -> Self {
        Self {
            primary,
            backup,
            state: Mutex::new(RouterState::default()),
        }
    }

    /// Analyze an image, failing over per the routing policy.
    pub async fn analyze_image(
        &self,
        image_url: &str,
        prompt: &str,
    ) -> Result<String, RouterError> {
        self.execute(Op::AnalyzeImage { image_url, prompt }).await
    }

    /// Generate text, failing over per the routing policy.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, RouterError> {
        self.execute(Op::GenerateText { prompt }).await
    }

    /// Optimize text, failing over per the routing policy.
    pub async fn optimize_text(&self, text: &str, style: TextStyle) -> Result<String, RouterError> {
        self.execute(Op::OptimizeText { text, style }).await
    }

    async fn execute(&self, op: Op<'_>) -> Result<String, RouterError> {
        let on_backup = self.state.lock().await.using_backup;

        if on_backup {
            return op.invoke(&*self.backup).await.map_err(RouterError::Backup);
        }

        match op.invoke(&*self.primary).await {
            Ok(text) => {
                self.state.lock().await.consecutive_failures = 0;
                Ok(text)
            }
            Err(primary_err) => {
                let (failures, flipped) = {
                    let mut state = self.state.lock().await;
                    state.consecutive_failures = state.consecutive_failures.saturating_add(1);
                    let flipped = if state.consecutive_failures >= FAILOVER_THRESHOLD
                        && !state.using_backup
                    {
                        state.using_backup = true;
                        true
                    } else {
                        false
                    };
                    (state.consecutive_failures, flipped)
                };

                if flipped {
                    tracing::warn!(
                        consecutive_failures = failures,
                        operation = op.kind(),
                        "Primary provider unhealthy — switching all traffic to backup"
                    );
                } else {
                    tracing::warn!(
                        consecutive_failures = failures,
                        threshold = FAILOVER_THRESHOLD,
                        operation = op.kind(),
                        error = %primary_err,
                        "Primary provider call failed"
                    );
                }

                // One best-effort backup hop regardless of the threshold.
                match op.invoke(&*self.backup).await {
                    Ok(text) => Ok(text),
                    Err(backup_err) => {
                        tracing::error!(
                            operation = op.kind(),
                            primary = %primary_err,
                            backup = %backup_err,
                            "Backup provider failed as well"
                        );
                        Err(RouterError::BothFailed {
                            primary: primary_err,
                            backup: backup_err,
                        })
                    }
                }
            }
        }
    }

    /// Snapshot of the failover state for operator status responses.
    pub async fn snapshot(&self) -> RouterSnapshot {
        let state = self.state.lock().await;
        RouterSnapshot {
            using_backup: state.using_backup,
            consecutive_failures: state.consecutive_failures,
            failure_threshold: FAILOVER_THRESHOLD,
            current_provider: if state.using_backup {
                self.backup.name().to_string()
            } else {
                self.primary.name().to_string()
            },
            primary_models: self.primary.model_ids(),
            backup_models: self.backup.model_ids(),
        }
    }

    /// Operator reset: route traffic back to the primary and clear the
    /// failure counter. Never happens automatically.
    pub async fn reset_to_primary(&self) {
        let mut state = self.state.lock().await;
        state.using_backup = false;
        state.consecutive_failures = 0;
        tracing::info!("Router reset to primary provider");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Stub provider that fails the first `fail_first` calls, counting every
    /// invocation.
    struct StubProvider {
        name: &'static str,
        fail_first: u32,
        calls: AtomicU32,
    }

    impl StubProvider {
        fn new(name: &'static str, fail_first: u32) -> Arc<Self> {
            Arc::new(Self {
                name,
                fail_first,
                calls: AtomicU32::new(0),
            })
        }

        fn healthy(name: &'static str) -> Arc<Self> {
            Self::new(name, 0)
        }

        fn always_failing(name: &'static str) -> Arc<Self> {
            Self::new(name, u32::MAX)
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn respond(&self) -> Result<String, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                Err(ProviderError::timeout(format!("{} timed out", self.name)))
            } else {
                Ok(format!("{} ok", self.name))
            }
        }
    }

    #[async_trait::async_trait]
    impl ProviderClient for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn model_ids(&self) -> String {
            format!("{}-vision/{}-text", self.name, self.name)
        }

        async fn analyze_image(&self, _: &str, _: &str) -> Result<String, ProviderError> {
            self.respond()
        }

        async fn generate_text(&self, _: &str) -> Result<String, ProviderError> {
            self.respond()
        }

        async fn optimize_text(&self, _: &str, _: TextStyle) -> Result<String, ProviderError> {
            self.respond()
        }
    }

    #[tokio::test]
    async fn test_primary_success_stays_on_primary() {
        let primary = StubProvider::healthy("primary");
        let backup = StubProvider::healthy("backup");
        let router = ProviderRouter::new(primary.clone(), backup.clone());

        for _ in 0..5 {
            assert_eq!(router.generate_text("p").await.unwrap(), "primary ok");
        }
        let snap = router.snapshot().await;
        assert!(!snap.using_backup);
        assert_eq!(snap.consecutive_failures, 0);
        assert_eq!(backup.calls(), 0);
    }

    #[tokio::test]
    async fn test_failover_after_three_consecutive_failures() {
        let primary = StubProvider::always_failing("primary");
        let backup = StubProvider::healthy("backup");
        let router = ProviderRouter::new(primary.clone(), backup.clone());

        // Three primary failures, each followed by one backup hop.
        for _ in 0..3 {
            assert_eq!(router.generate_text("p").await.unwrap(), "backup ok");
        }
        let snap = router.snapshot().await;
        assert_eq!(snap.consecutive_failures, 3);
        assert!(snap.using_backup);
        assert_eq!(snap.current_provider, "backup");
        assert_eq!(primary.calls(), 3);

        // Fourth call goes straight to the backup, no primary attempt.
        assert_eq!(router.analyze_image("u", "p").await.unwrap(), "backup ok");
        assert_eq!(primary.calls(), 3);
        assert_eq!(backup.calls(), 4);
    }

    #[tokio::test]
    async fn test_backup_is_sticky_even_if_primary_would_recover() {
        // Primary fails exactly 3 times, then would succeed.
        let primary = StubProvider::new("primary", 3);
        let backup = StubProvider::healthy("backup");
        let router = ProviderRouter::new(primary.clone(), backup.clone());

        for _ in 0..3 {
            router.generate_text("p").await.unwrap();
        }
        // Primary would now succeed, but the flag never auto-reverts.
        for _ in 0..3 {
            assert_eq!(router.generate_text("p").await.unwrap(), "backup ok");
        }
        assert_eq!(primary.calls(), 3);
        assert!(router.snapshot().await.using_backup);
    }

    #[tokio::test]
    async fn test_success_resets_failure_counter() {
        // Fail twice, succeed, fail twice again: threshold is never reached.
        let primary = StubProvider::new("primary", 2);
        let backup = StubProvider::healthy("backup");
        let router = ProviderRouter::new(primary.clone(), backup.clone());

        router.generate_text("p").await.unwrap();
        router.generate_text("p").await.unwrap();
        assert_eq!(router.snapshot().await.consecutive_failures, 2);

        assert_eq!(router.generate_text("p").await.unwrap(), "primary ok");
        let snap = router.snapshot().await;
        assert_eq!(snap.consecutive_failures, 0);
        assert!(!snap.using_backup);
    }

    #[tokio::test]
    async fn test_both_failing_is_a_composite_error() {
        let primary = StubProvider::always_failing("primary");
        let backup = StubProvider::always_failing("backup");
        let router = ProviderRouter::new(primary, backup);

        let err = router.generate_text("p").await.unwrap_err();
        match err {
            RouterError::BothFailed { primary, backup } => {
                assert!(primary.to_string().contains("primary timed out"));
                assert!(backup.to_string().contains("backup timed out"));
            }
            other => panic!("expected composite error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_operator_reset_returns_to_primary() {
        let primary = StubProvider::new("primary", 3);
        let backup = StubProvider::healthy("backup");
        let router = ProviderRouter::new(primary.clone(), backup);

        for _ in 0..3 {
            router.generate_text("p").await.unwrap();
        }
        assert!(router.snapshot().await.using_backup);

        router.reset_to_primary().await;
        let snap = router.snapshot().await;
        assert!(!snap.using_backup);
        assert_eq!(snap.consecutive_failures, 0);

        // Next call tries the primary again (stub now succeeds).
        assert_eq!(router.generate_text("p").await.unwrap(), "primary ok");
    }

    #[tokio::test]
    async fn test_all_three_operations_route() {
        let primary = StubProvider::healthy("primary");
        let backup = StubProvider::healthy("backup");
        let router = ProviderRouter::new(primary.clone(), backup);

        router.analyze_image("url", "prompt").await.unwrap();
        router.generate_text("prompt").await.unwrap();
        router
            .optimize_text("text", TextStyle::Literary)
            .await
            .unwrap();
        assert_eq!(primary.calls(), 3);
    }
}
