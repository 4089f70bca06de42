//! Biography pipeline orchestration.
//!
//! `Orchestrator::submit` validates the upload set, creates the task
//! record, and launches the five-stage pipeline on an independent tokio
//! task, returning the id immediately. Stages run strictly sequentially:
//!
//! 1. image analysis          (progress 0.1 -> 0.3)
//! 2. validated generation    (-> 0.6)
//! 3. QR references           (-> 0.7)
//! 4. layout assembly         (-> 0.85)
//! 5. document rendering      (-> 1.0, publishes the result)
//!
//! A stage error fails the task with its diagnostic and stops the run; no
//! partial result is ever published. Errors never escape the spawned task.
//! The whole run is bounded by one configurable deadline, and each task
//! carries a cancellation token observed at stage boundaries and inside
//! provider calls.

pub mod generate;
mod layout;
mod qr;

pub use generate::{generate_validated_biography, GenerationOutcome, DEFAULT_MAX_ATTEMPTS};
pub use layout::{assemble_layout, DocumentLayout, DocumentSection};
pub use qr::build_qr_refs;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::content::prompts;
use crate::files::{is_supported_image, FileStore, FileStoreError, StoredImage, UploadedPhoto};
use crate::llm::{ProviderRouter, RouterError};
use crate::render::{RenderError, Renderer};
use crate::task::{
    BiographyArtifacts, ImageAnalysis, RegistryError, TaskId, TaskRecord, TaskRegistry, TaskStatus,
};

// Stage checkpoints. Strictly increasing; the final stage publishes 1.0
// through `complete`.
const PROGRESS_STARTED: f32 = 0.1;
const PROGRESS_IMAGES_ANALYZED: f32 = 0.3;
const PROGRESS_TEXT_GENERATED: f32 = 0.6;
const PROGRESS_QR_GENERATED: f32 = 0.7;
const PROGRESS_LAYOUT_DONE: f32 = 0.85;

/// A biography generation request as handed over by the upload intake.
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub photos: Vec<UploadedPhoto>,
    pub requirements: String,
    /// Document template style, e.g. "classic"
    pub style: String,
    /// Output language tag, e.g. "zh-CN"
    pub language: String,
}

/// Errors from task submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no uploaded file is a supported image type")]
    NoValidImages,

    #[error(transparent)]
    Storage(#[from] FileStoreError),
}

/// Errors from status/result queries and cancellation.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("unknown task: {0}")]
    NotFound(TaskId),

    #[error("task {0} is not completed yet")]
    NotReady(TaskId),

    #[error("task {0} already reached a terminal state")]
    AlreadyFinished(TaskId),
}

/// Errors raised inside a pipeline stage. Converted into the task's
/// terminal state at the driver boundary, never propagated further.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("cancelled")]
    Cancelled,

    #[error("generation retries exhausted after {max_attempts} attempts")]
    RetriesExhausted { max_attempts: u32 },

    #[error("provider failure: {0}")]
    Provider(#[from] RouterError),

    #[error(transparent)]
    Files(#[from] FileStoreError),

    #[error("rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Shared components a pipeline run needs; cloned per task.
struct PipelineCtx {
    registry: Arc<dyn TaskRegistry>,
    router: Arc<ProviderRouter>,
    files: Arc<FileStore>,
    renderer: Arc<dyn Renderer>,
}

/// Entry point for biography generation: owns submission, status queries
/// and cancellation of tasks.
pub struct Orchestrator {
    registry: Arc<dyn TaskRegistry>,
    router: Arc<ProviderRouter>,
    files: Arc<FileStore>,
    renderer: Arc<dyn Renderer>,
    task_deadline: Duration,
    cancel_tokens: Arc<Mutex<HashMap<TaskId, CancellationToken>>>,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<dyn TaskRegistry>,
        router: Arc<ProviderRouter>,
        files: Arc<FileStore>,
        renderer: Arc<dyn Renderer>,
        task_deadline: Duration,
    ) -> Self {
        Self {
            registry,
            router,
            files,
            renderer,
            task_deadline,
            cancel_tokens: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Validate the upload set, create the task record, and launch the
    /// pipeline. Returns without waiting for any stage.
    ///
    /// Rejects the request before creating any record when no upload is a
    /// supported image type.
    pub async fn submit(&self, request: SubmitRequest) -> Result<TaskId, SubmitError> {
        if !request
            .photos
            .iter()
            .any(|p| is_supported_image(&p.content_type))
        {
            return Err(SubmitError::NoValidImages);
        }

        let images = self.files.save_images(&request.photos).await?;

        let record = self.registry.create().await;
        let id = record.id;

        let token = CancellationToken::new();
        self.cancel_tokens.lock().await.insert(id, token.clone());

        let ctx = PipelineCtx {
            registry: Arc::clone(&self.registry),
            router: Arc::clone(&self.router),
            files: Arc::clone(&self.files),
            renderer: Arc::clone(&self.renderer),
        };
        let deadline = self.task_deadline;
        let cancel_tokens = Arc::clone(&self.cancel_tokens);
        let SubmitRequest {
            requirements,
            style,
            language,
            ..
        } = request;

        tokio::spawn(async move {
            run_pipeline(
                &ctx,
                id,
                &images,
                &requirements,
                &style,
                &language,
                &token,
                deadline,
            )
            .await;
            cancel_tokens.lock().await.remove(&id);
        });

        tracing::info!(task = %id, "Biography task submitted");
        Ok(id)
    }

    /// Snapshot of the task record. Eventually consistent with the
    /// in-flight pipeline; fields never move backward.
    pub async fn get_status(&self, id: TaskId) -> Result<TaskRecord, StatusError> {
        self.registry
            .get(id)
            .await
            .ok_or(StatusError::NotFound(id))
    }

    /// Published artifacts of a completed task.
    pub async fn get_result(&self, id: TaskId) -> Result<BiographyArtifacts, StatusError> {
        let record = self.get_status(id).await?;
        if record.status != TaskStatus::Completed {
            return Err(StatusError::NotReady(id));
        }
        record.result.ok_or(StatusError::NotReady(id))
    }

    /// Request cancellation of an in-flight task. The pipeline observes
    /// the token and transitions the record to `Cancelled` itself, so the
    /// record keeps a single writer.
    pub async fn cancel(&self, id: TaskId) -> Result<(), StatusError> {
        let record = self.get_status(id).await?;
        if record.status.is_terminal() {
            return Err(StatusError::AlreadyFinished(id));
        }
        if let Some(token) = self.cancel_tokens.lock().await.get(&id) {
            token.cancel();
            tracing::info!(task = %id, "Cancellation requested");
        }
        Ok(())
    }
}

/// Run the pipeline under the overall deadline and convert every failure
/// mode into a terminal record state.
#[allow(clippy::too_many_arguments)]
async fn run_pipeline(
    ctx: &PipelineCtx,
    id: TaskId,
    images: &[StoredImage],
    requirements: &str,
    style: &str,
    language: &str,
    cancel: &CancellationToken,
    deadline: Duration,
) {
    let outcome = tokio::time::timeout(
        deadline,
        drive(ctx, id, images, requirements, style, language, cancel),
    )
    .await;

    let finish = match outcome {
        Ok(Ok(())) => return,
        Ok(Err(StageError::Cancelled)) => {
            tracing::info!(task = %id, "Task cancelled");
            ctx.registry.cancel(id).await
        }
        Ok(Err(err)) => {
            tracing::error!(task = %id, error = %err, "Pipeline stage failed");
            ctx.registry.fail(id, &err.to_string()).await
        }
        Err(_) => {
            tracing::error!(task = %id, "Task deadline exceeded");
            ctx.registry.fail(id, "task deadline exceeded").await
        }
    };

    if let Err(err) = finish {
        tracing::error!(task = %id, error = %err, "Failed to record terminal task state");
    }
}

/// The five stages, strictly sequential. Each checkpoint is visible to
/// status pollers before the next stage starts.
async fn drive(
    ctx: &PipelineCtx,
    id: TaskId,
    images: &[StoredImage],
    requirements: &str,
    style: &str,
    language: &str,
    cancel: &CancellationToken,
) -> Result<(), StageError> {
    if cancel.is_cancelled() {
        return Err(StageError::Cancelled);
    }
    ctx.registry.start(id).await?;

    // Stage 1: image analysis
    ctx.registry
        .advance(id, PROGRESS_STARTED, "analyzing uploaded photos")
        .await?;
    let mut analyses = Vec::with_capacity(images.len());
    for image in images {
        let data_uri = ctx.files.read_data_uri(image).await?;
        let summary = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StageError::Cancelled),
            result = ctx.router.analyze_image(&data_uri, prompts::image_analysis_prompt()) => result?,
        };
        analyses.push(ImageAnalysis {
            file_name: image.file_name.clone(),
            summary,
        });
    }
    ctx.registry
        .advance(id, PROGRESS_IMAGES_ANALYZED, "generating biography content")
        .await?;

    // Stage 2: text generation with validation
    let summaries: Vec<String> = analyses.iter().map(|a| a.summary.clone()).collect();
    let outcome = generate::generate_validated_biography(
        &ctx.router,
        &summaries,
        requirements,
        language,
        DEFAULT_MAX_ATTEMPTS,
        cancel,
    )
    .await?;
    if !outcome.violations.is_empty() {
        tracing::warn!(
            task = %id,
            attempts = outcome.attempts,
            violations = ?outcome.violations,
            "Returning best-available biography despite validation shortfall"
        );
    }
    ctx.registry
        .advance(id, PROGRESS_TEXT_GENERATED, "generating media QR codes")
        .await?;

    // Stage 3: QR references
    let qr_codes = qr::build_qr_refs(images);
    ctx.registry
        .advance(id, PROGRESS_QR_GENERATED, "assembling document layout")
        .await?;

    // Stage 4: layout assembly
    let document = layout::assemble_layout(&outcome.text, images, &qr_codes, style, language);
    ctx.registry
        .advance(id, PROGRESS_LAYOUT_DONE, "rendering document")
        .await?;

    // Stage 5: rendering + result publication
    if cancel.is_cancelled() {
        return Err(StageError::Cancelled);
    }
    let path = ctx.renderer.render(&document, &id.to_string()).await?;

    let artifacts = BiographyArtifacts {
        document_path: path.to_string_lossy().into_owned(),
        title: document.title,
        biography: outcome.text,
        image_analyses: analyses,
        qr_codes,
    };
    ctx.registry.complete(id, artifacts).await?;
    tracing::info!(task = %id, "Biography task completed");
    Ok(())
}
