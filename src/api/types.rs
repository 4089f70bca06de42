//! API request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{BiographyArtifacts, TaskId, TaskRecord, TaskStatus};

/// Response after submitting a biography request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateBiographyResponse {
    /// Unique task identifier
    pub task_id: TaskId,

    /// Status at creation time (always `pending`)
    pub status: TaskStatus,
}

/// Externally observable task state. Mirrors the task state machine
/// exactly; no interim states are invented at this layer.
#[derive(Debug, Clone, Serialize)]
pub struct TaskStatusResponse {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub progress: f32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<BiographyArtifacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TaskRecord> for TaskStatusResponse {
    fn from(record: TaskRecord) -> Self {
        Self {
            task_id: record.id,
            status: record.status,
            progress: record.progress,
            message: record.message,
            result: record.result,
            error: record.error,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Response after requesting cancellation.
#[derive(Debug, Clone, Serialize)]
pub struct CancelResponse {
    pub task_id: TaskId,
    pub status: &'static str,
}

/// Request for one-shot text optimization.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeRequest {
    pub text: String,

    /// One of "professional", "literary", "storytelling", "warm"
    /// (default: "warm")
    pub style: Option<String>,
}

/// Response with the optimized text.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizeResponse {
    pub optimized: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Error body for every non-2xx response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_response_omits_empty_result_and_error() {
        let record = TaskRecord::new();
        let value = serde_json::to_value(TaskStatusResponse::from(record)).unwrap();
        assert_eq!(value["status"], "pending");
        assert_eq!(value["progress"], 0.0);
        assert!(value.get("result").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_status_response_carries_failure_diagnostic() {
        let mut record = TaskRecord::new();
        record.start().unwrap();
        record.fail("no valid image").unwrap();
        let value = serde_json::to_value(TaskStatusResponse::from(record)).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["error"], "no valid image");
        assert!(value.get("result").is_none());
    }
}
