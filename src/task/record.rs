//! Core TaskRecord type with validated status transitions.
//!
//! # Invariants
//! - `progress` is in `[0.0, 1.0]` and never decreases
//! - `Completed`, `Failed` and `Cancelled` are terminal
//! - `result` is present only when `Completed`; `error` only when `Failed`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a task.
///
/// # Properties
/// - Globally unique within the process
/// - Immutable once created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Create a new unique task ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TaskId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a task in its lifecycle.
///
/// # State Machine
/// ```text
/// Pending -> Processing -> Completed
///        \             \-> Failed
///         \-> Cancelled <-/   (from any non-terminal state)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is created, pipeline not yet started
    Pending,
    /// Pipeline is running
    Processing,
    /// Pipeline finished and the result is published
    Completed,
    /// A stage failed; the error field holds the diagnostic
    Failed,
    /// The task was cancelled before reaching a terminal state
    Cancelled,
}

impl TaskStatus {
    /// Check if the task is in a terminal state.
    ///
    /// # Property
    /// `is_terminal() => !is_active()`
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Check if the task can still make progress.
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Processing)
    }
}

/// Summary of one analyzed photo, carried into the published result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    /// Original upload file name
    pub file_name: String,
    /// Provider-generated description
    pub summary: String,
}

/// Reference to a QR code for one uploaded medium. The payload is the
/// encodable public URL; rasterization happens outside the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrCodeRef {
    /// Original upload file name
    pub file_name: String,
    /// Public URL the QR code encodes
    pub media_url: String,
}

/// Published result of a completed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiographyArtifacts {
    /// Path of the rendered document on disk
    pub document_path: String,
    /// Document title
    pub title: String,
    /// Final biography text
    pub biography: String,
    /// Per-photo analysis summaries
    pub image_analyses: Vec<ImageAnalysis>,
    /// QR references for the uploaded media
    pub qr_codes: Vec<QrCodeRef>,
}

/// Mutable progress state of one biography request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub status: TaskStatus,
    /// Fraction complete in `[0.0, 1.0]`, non-decreasing while active
    pub progress: f32,
    /// Human-readable current-stage description
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<BiographyArtifacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// Create a fresh record in `Pending` with zero progress.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            status: TaskStatus::Pending,
            progress: 0.0,
            message: "biography request accepted".to_string(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Transition `Pending -> Processing`.
    pub fn start(&mut self) -> Result<(), TaskError> {
        match self.status {
            TaskStatus::Pending => {
                self.status = TaskStatus::Processing;
                self.touch();
                Ok(())
            }
            other => Err(TaskError::InvalidTransition {
                from: other,
                to: TaskStatus::Processing,
            }),
        }
    }

    /// Update progress and stage message while `Processing`.
    ///
    /// Progress is clamped to `[0.0, 1.0]` and never moves backward.
    pub fn advance(&mut self, progress: f32, message: &str) -> Result<(), TaskError> {
        match self.status {
            TaskStatus::Processing => {
                self.progress = self.progress.max(progress.clamp(0.0, 1.0));
                self.message = message.to_string();
                self.touch();
                Ok(())
            }
            other => Err(TaskError::InvalidTransition {
                from: other,
                to: TaskStatus::Processing,
            }),
        }
    }

    /// Transition `Processing -> Completed` and publish the result.
    pub fn complete(&mut self, artifacts: BiographyArtifacts) -> Result<(), TaskError> {
        match self.status {
            TaskStatus::Processing => {
                self.status = TaskStatus::Completed;
                self.progress = 1.0;
                self.message = "biography generated".to_string();
                self.result = Some(artifacts);
                self.touch();
                Ok(())
            }
            other => Err(TaskError::InvalidTransition {
                from: other,
                to: TaskStatus::Completed,
            }),
        }
    }

    /// Transition `Processing -> Failed` with a diagnostic. No partial
    /// result is ever published.
    pub fn fail(&mut self, reason: &str) -> Result<(), TaskError> {
        match self.status {
            TaskStatus::Processing => {
                self.status = TaskStatus::Failed;
                self.message = format!("generation failed: {}", reason);
                self.error = Some(reason.to_string());
                self.touch();
                Ok(())
            }
            other => Err(TaskError::InvalidTransition {
                from: other,
                to: TaskStatus::Failed,
            }),
        }
    }

    /// Transition any active state to `Cancelled`.
    pub fn cancel(&mut self) -> Result<(), TaskError> {
        if self.status.is_active() {
            self.status = TaskStatus::Cancelled;
            self.message = "cancelled by caller".to_string();
            self.touch();
            Ok(())
        } else {
            Err(TaskError::InvalidTransition {
                from: self.status,
                to: TaskStatus::Cancelled,
            })
        }
    }
}

impl Default for TaskRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from task state transitions.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TaskError {
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
}
