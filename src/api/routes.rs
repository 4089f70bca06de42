//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::Config;
use crate::files::{FileStore, UploadedPhoto};
use crate::llm::{ArkClient, ProviderClient, ProviderRouter, TextStyle};
use crate::pipeline::{Orchestrator, StatusError, SubmitError, SubmitRequest};
use crate::render::{HtmlRenderer, Renderer};
use crate::task::{InMemoryTaskRegistry, TaskId, TaskRegistry, TaskStatus};

use super::types::*;

/// Maximum accepted upload size (all parts combined).
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared application state.
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub provider_router: Arc<ProviderRouter>,
    pub registry: Arc<dyn TaskRegistry>,
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let files = Arc::new(FileStore::new(&config.data_dir, &config.public_base_url).await?);

    let primary: Arc<dyn ProviderClient> = Arc::new(ArkClient::new(
        config.primary.clone(),
        config.provider_timeout,
    ));
    let backup: Arc<dyn ProviderClient> = Arc::new(ArkClient::new(
        config.backup.clone(),
        config.provider_timeout,
    ));
    let provider_router = Arc::new(ProviderRouter::new(primary, backup));

    let registry: Arc<dyn TaskRegistry> = Arc::new(InMemoryTaskRegistry::new());
    let renderer: Arc<dyn Renderer> = Arc::new(HtmlRenderer::new(files.output_dir()));

    let orchestrator = Orchestrator::new(
        Arc::clone(&registry),
        Arc::clone(&provider_router),
        files,
        renderer,
        config.task_deadline,
    );

    let state = Arc::new(AppState {
        orchestrator,
        provider_router,
        registry,
    });

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/stats", get(stats))
        .route("/api/biography", post(create_biography))
        .route("/api/biography/:id/status", get(biography_status))
        .route("/api/biography/:id/download", get(download_biography))
        .route("/api/biography/:id/cancel", post(cancel_biography))
        .route("/api/ai/status", get(ai_status))
        .route("/api/ai/reset", post(ai_reset))
        .route("/api/ai/optimize", post(ai_optimize))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Error type mapping domain errors onto HTTP responses.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::NoValidImages => {
                ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            SubmitError::Storage(_) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}

impl From<StatusError> for ApiError {
    fn from(err: StatusError) -> Self {
        match err {
            StatusError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, err.to_string()),
            StatusError::NotReady(_) | StatusError::AlreadyFinished(_) => {
                ApiError::new(StatusCode::CONFLICT, err.to_string())
            }
        }
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "biography-agent",
        timestamp: chrono::Utc::now(),
    })
}

async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.registry.stats().await)
}

async fn create_biography(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CreateBiographyResponse>), ApiError> {
    let mut photos = Vec::new();
    let mut requirements = String::new();
    let mut style = "classic".to_string();
    let mut language = "zh-CN".to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("malformed upload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "photos" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::new(StatusCode::BAD_REQUEST, format!("upload read failed: {}", e))
                })?;
                photos.push(UploadedPhoto {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "requirements" => requirements = read_text_field(field).await?,
            "style" => style = read_text_field(field).await?,
            "language" => language = read_text_field(field).await?,
            _ => {}
        }
    }

    let task_id = state
        .orchestrator
        .submit(SubmitRequest {
            photos,
            requirements,
            style,
            language,
        })
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateBiographyResponse {
            task_id,
            status: TaskStatus::Pending,
        }),
    ))
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("field read failed: {}", e)))
}

async fn biography_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskStatusResponse>, ApiError> {
    let record = state.orchestrator.get_status(TaskId::from(id)).await?;
    Ok(Json(TaskStatusResponse::from(record)))
}

async fn download_biography(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let artifacts = state.orchestrator.get_result(TaskId::from(id)).await?;
    let bytes = tokio::fs::read(&artifacts.document_path).await.map_err(|e| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("document unreadable: {}", e),
        )
    })?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"biography_{}.html\"", id),
            ),
        ],
        bytes,
    )
        .into_response())
}

async fn cancel_biography(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<CancelResponse>), ApiError> {
    let task_id = TaskId::from(id);
    state.orchestrator.cancel(task_id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(CancelResponse {
            task_id,
            status: "cancelling",
        }),
    ))
}

async fn ai_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.provider_router.snapshot().await)
}

async fn ai_reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.provider_router.reset_to_primary().await;
    Json(state.provider_router.snapshot().await)
}

async fn ai_optimize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, ApiError> {
    let style: TextStyle = request
        .style
        .as_deref()
        .unwrap_or("warm")
        .parse()
        .map_err(|e: String| ApiError::new(StatusCode::BAD_REQUEST, e))?;

    let optimized = state
        .provider_router
        .optimize_text(&request.text, style)
        .await
        .map_err(|e| ApiError::new(StatusCode::BAD_GATEWAY, e.to_string()))?;

    Ok(Json(OptimizeResponse { optimized }))
}
