//! Process-wide task registry.
//!
//! The registry is the only reader-facing view of task state. Writers (the
//! single pipeline execution owning a task) mutate through the transition
//! operations; readers get cloned snapshots, so a status poller can never
//! observe a half-applied update. Records are never deleted automatically;
//! retention is an external concern.
//!
//! The trait exists so a persistent backing store can be substituted
//! without touching pipeline logic.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

use super::record::{BiographyArtifacts, TaskError, TaskId, TaskRecord, TaskStatus};

/// Errors from registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown task: {0}")]
    NotFound(TaskId),

    #[error(transparent)]
    Transition(#[from] TaskError),
}

/// Aggregate task counts for the stats endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistryStats {
    pub total_tasks: usize,
    pub active_tasks: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    pub cancelled_tasks: usize,
}

/// Storage interface for task records.
#[async_trait]
pub trait TaskRegistry: Send + Sync {
    /// Insert a fresh `Pending` record and return its snapshot.
    async fn create(&self) -> TaskRecord;

    /// Snapshot of a record, if known.
    async fn get(&self, id: TaskId) -> Option<TaskRecord>;

    /// Transition `Pending -> Processing`.
    async fn start(&self, id: TaskId) -> Result<(), RegistryError>;

    /// Update progress/message of a `Processing` record.
    async fn advance(&self, id: TaskId, progress: f32, message: &str) -> Result<(), RegistryError>;

    /// Transition to `Completed` and publish the result.
    async fn complete(&self, id: TaskId, artifacts: BiographyArtifacts)
        -> Result<(), RegistryError>;

    /// Transition to `Failed` with a diagnostic.
    async fn fail(&self, id: TaskId, reason: &str) -> Result<(), RegistryError>;

    /// Transition an active record to `Cancelled`.
    async fn cancel(&self, id: TaskId) -> Result<(), RegistryError>;

    /// Aggregate counts over all records.
    async fn stats(&self) -> RegistryStats;
}

/// In-memory registry; task state does not survive a process restart.
#[derive(Default)]
pub struct InMemoryTaskRegistry {
    tasks: RwLock<HashMap<TaskId, TaskRecord>>,
}

impl InMemoryTaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    async fn mutate<F>(&self, id: TaskId, f: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut TaskRecord) -> Result<(), TaskError>,
    {
        let mut tasks = self.tasks.write().await;
        let record = tasks.get_mut(&id).ok_or(RegistryError::NotFound(id))?;
        f(record)?;
        Ok(())
    }
}

#[async_trait]
impl TaskRegistry for InMemoryTaskRegistry {
    async fn create(&self) -> TaskRecord {
        let record = TaskRecord::new();
        let mut tasks = self.tasks.write().await;
        tasks.insert(record.id, record.clone());
        record
    }

    async fn get(&self, id: TaskId) -> Option<TaskRecord> {
        self.tasks.read().await.get(&id).cloned()
    }

    async fn start(&self, id: TaskId) -> Result<(), RegistryError> {
        self.mutate(id, |r| r.start()).await
    }

    async fn advance(&self, id: TaskId, progress: f32, message: &str) -> Result<(), RegistryError> {
        self.mutate(id, |r| r.advance(progress, message)).await
    }

    async fn complete(
        &self,
        id: TaskId,
        artifacts: BiographyArtifacts,
    ) -> Result<(), RegistryError> {
        self.mutate(id, |r| r.complete(artifacts)).await
    }

    async fn fail(&self, id: TaskId, reason: &str) -> Result<(), RegistryError> {
        self.mutate(id, |r| r.fail(reason)).await
    }

    async fn cancel(&self, id: TaskId) -> Result<(), RegistryError> {
        self.mutate(id, |r| r.cancel()).await
    }

    async fn stats(&self) -> RegistryStats {
        let tasks = self.tasks.read().await;
        let mut stats = RegistryStats {
            total_tasks: tasks.len(),
            ..Default::default()
        };
        for record in tasks.values() {
            match record.status {
                TaskStatus::Pending | TaskStatus::Processing => stats.active_tasks += 1,
                TaskStatus::Completed => stats.completed_tasks += 1,
                TaskStatus::Failed => stats.failed_tasks += 1,
                TaskStatus::Cancelled => stats.cancelled_tasks += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifacts() -> BiographyArtifacts {
        BiographyArtifacts {
            document_path: "/tmp/doc.html".to_string(),
            title: "t".to_string(),
            biography: "b".to_string(),
            image_analyses: vec![],
            qr_codes: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_and_get_snapshot() {
        let registry = InMemoryTaskRegistry::new();
        let record = registry.create().await;
        let snapshot = registry.get(record.id).await.unwrap();
        assert_eq!(snapshot.status, TaskStatus::Pending);
        assert_eq!(snapshot.progress, 0.0);
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let registry = InMemoryTaskRegistry::new();
        assert!(registry.get(TaskId::new()).await.is_none());
        assert!(matches!(
            registry.start(TaskId::new()).await,
            Err(RegistryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_completed_snapshot_reads_are_identical() {
        let registry = InMemoryTaskRegistry::new();
        let record = registry.create().await;
        registry.start(record.id).await.unwrap();
        registry.complete(record.id, artifacts()).await.unwrap();

        let first = registry.get(record.id).await.unwrap();
        let second = registry.get(record.id).await.unwrap();
        assert_eq!(first.result, second.result);
        assert_eq!(first.updated_at, second.updated_at);
        assert_eq!(first.progress, second.progress);
    }

    #[tokio::test]
    async fn test_snapshot_is_isolated_from_later_writes() {
        let registry = InMemoryTaskRegistry::new();
        let record = registry.create().await;
        registry.start(record.id).await.unwrap();
        let before = registry.get(record.id).await.unwrap();
        registry.advance(record.id, 0.6, "later").await.unwrap();
        assert_eq!(before.progress, 0.0);
        assert_eq!(
            registry.get(record.id).await.unwrap().progress,
            0.6
        );
    }

    #[tokio::test]
    async fn test_stats_counts_by_status() {
        let registry = InMemoryTaskRegistry::new();
        let a = registry.create().await;
        let b = registry.create().await;
        let c = registry.create().await;

        registry.start(a.id).await.unwrap();
        registry.complete(a.id, artifacts()).await.unwrap();
        registry.start(b.id).await.unwrap();
        registry.fail(b.id, "x").await.unwrap();
        registry.cancel(c.id).await.unwrap();

        let stats = registry.stats().await;
        assert_eq!(stats.total_tasks, 3);
        assert_eq!(stats.active_tasks, 0);
        assert_eq!(stats.completed_tasks, 1);
        assert_eq!(stats.failed_tasks, 1);
        assert_eq!(stats.cancelled_tasks, 1);
    }

    #[tokio::test]
    async fn test_invalid_transition_surfaces() {
        let registry = InMemoryTaskRegistry::new();
        let record = registry.create().await;
        let err = registry.complete(record.id, artifacts()).await.unwrap_err();
        assert!(matches!(err, RegistryError::Transition(_)));
    }
}
