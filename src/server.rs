//! HTTP surface.
//!
//! Routes, handlers, and error mapping. Every extractor invocation is routed
//! through the worker pool so the runtime threads stay free while yt-dlp
//! blocks; handlers suspend on `submit(..).await` and resume with the result.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/` | Service banner |
//! | `POST` | `/api/video/info` | Metadata plus ranked rendition candidates |
//! | `POST` | `/api/video/download` | Direct link or server-side download, per config |
//! | `GET`  | `/api/video/file/{filename}` | Stream a materialized file |
//! | `POST` | `/api/status` | Append a client check-in |
//! | `GET`  | `/api/status` | List client check-ins |
//!
//! # Error Contract
//!
//! Failures serialize as `{"detail": "..."}`: extraction failures as
//! HTTP 400 carrying the underlying message, missing files as HTTP 404.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::config::{AppConfig, DeliveryMode};
use crate::extractor::{normalize, DownloadJob, ExtractError, MediaExtractor, MediaSummary};
use crate::pool::WorkerPool;
use crate::status::{StatusRecord, StatusStore};

/// Shared application state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub extractor: Arc<dyn MediaExtractor>,
    pub pool: Arc<WorkerPool>,
    pub store: StatusStore,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        extractor: Arc<dyn MediaExtractor>,
        pool: Arc<WorkerPool>,
        store: StatusStore,
    ) -> Self {
        Self {
            config,
            extractor,
            pool,
            store,
        }
    }
}

/// Build the application router with all `/api` routes and CORS applied.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/api/", get(root))
        .route("/api/video/info", post(video_info))
        .route("/api/video/download", post(video_download))
        .route("/api/video/file/{filename}", get(video_file))
        .route("/api/status", post(create_status).get(list_status))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.allow_any_origin() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

// ============ Error response ============

/// Client-facing failure; serializes as `{"detail": ...}`.
pub struct AppError {
    status: StatusCode,
    detail: String,
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

fn bad_request(detail: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        detail: detail.into(),
    }
}

fn not_found(detail: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        detail: detail.into(),
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        bad_request(err.to_string())
    }
}

// ============ Request/response bodies ============

#[derive(Deserialize)]
struct VideoInfoRequest {
    url: String,
}

#[derive(Deserialize)]
struct DownloadRequest {
    url: String,
    format_id: String,
}

#[derive(Serialize)]
struct RootResponse {
    message: String,
}

#[derive(Serialize)]
struct DirectLinkResponse {
    download_url: String,
    title: String,
    ext: String,
}

#[derive(Serialize)]
struct MaterializeResponse {
    download_id: String,
    filename: String,
    status: String,
}

#[derive(Deserialize)]
struct StatusRequest {
    client_name: String,
}

// ============ Handlers ============

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "VidSaver API".to_string(),
    })
}

/// `POST /api/video/info`: describe the URL and rank its renditions.
async fn video_info(
    State(state): State<AppState>,
    Json(req): Json<VideoInfoRequest>,
) -> Result<Json<MediaSummary>, AppError> {
    let extractor = Arc::clone(&state.extractor);
    let url = req.url.clone();
    let info = state
        .pool
        .submit(move || extractor.describe(&url))
        .await
        .map_err(|e| {
            error!(url = %req.url, "describe failed: {e}");
            AppError::from(e)
        })?;

    let formats = normalize(&info.formats);
    Ok(Json(MediaSummary {
        title: info.title,
        thumbnail: info.thumbnail,
        duration: info.duration,
        video_id: info.id,
        formats,
    }))
}

/// `POST /api/video/download`: delivery depends on configuration.
async fn video_download(
    State(state): State<AppState>,
    Json(req): Json<DownloadRequest>,
) -> Result<Response, AppError> {
    match state.config.delivery {
        DeliveryMode::DirectLink => direct_link(state, req).await.map(IntoResponse::into_response),
        DeliveryMode::Materialize => materialize(state, req).await.map(IntoResponse::into_response),
    }
}

/// Resolve the upstream direct URL for the chosen rendition. No bytes touch
/// our storage in this mode.
async fn direct_link(
    state: AppState,
    req: DownloadRequest,
) -> Result<Json<DirectLinkResponse>, AppError> {
    let extractor = Arc::clone(&state.extractor);
    let url = req.url.clone();
    let format_id = req.format_id.clone();
    let link = state
        .pool
        .submit(move || extractor.resolve_direct(&url, &format_id))
        .await
        .map_err(|e| {
            error!(url = %req.url, "direct link resolution failed: {e}");
            AppError::from(e)
        })?;

    let download_url = link.url.ok_or_else(|| {
        bad_request(format!(
            "no direct url reported for format {}",
            req.format_id
        ))
    })?;

    Ok(Json(DirectLinkResponse {
        download_url,
        title: link.title,
        ext: link.ext,
    }))
}

/// Download the chosen rendition server-side under a fresh job id, then
/// report the filename for later retrieval.
async fn materialize(
    state: AppState,
    req: DownloadRequest,
) -> Result<Json<MaterializeResponse>, AppError> {
    tokio::fs::create_dir_all(&state.config.download_dir)
        .await
        .map_err(|e| bad_request(format!("cannot prepare download directory: {e}")))?;

    let mut job = DownloadJob::new(&state.config.download_dir);
    let extractor = Arc::clone(&state.extractor);
    let url = req.url.clone();
    let format_id = req.format_id.clone();
    let template = job.output_template.clone();

    match state
        .pool
        .submit(move || extractor.materialize(&url, &format_id, &template))
        .await
    {
        Ok(final_path) => {
            job.complete(&final_path);
            Ok(Json(MaterializeResponse {
                filename: job.filename.unwrap_or_default(),
                download_id: job.id,
                status: job.state.to_string(),
            }))
        }
        Err(e) => {
            job.fail();
            error!(url = %req.url, job_id = %job.id, "materialize failed: {e}");
            Err(AppError::from(e))
        }
    }
}

/// `GET /api/video/file/{filename}`: stream a materialized file from disk.
async fn video_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    // Only bare filenames are ever handed out; anything path-like is bogus.
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(not_found("File not found"));
    }

    let path = state.config.download_dir.join(&filename);
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| not_found("File not found"))?;

    let body = Body::from_stream(ReaderStream::new(file));
    let headers = [
        (
            header::CONTENT_TYPE,
            "application/octet-stream".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, body).into_response())
}

/// `POST /api/status`: append one check-in.
async fn create_status(
    State(state): State<AppState>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<StatusRecord>, AppError> {
    let record = state.store.create(&req.client_name).await.map_err(|e| {
        error!("status insert failed: {e}");
        bad_request(e.to_string())
    })?;
    Ok(Json(record))
}

/// `GET /api/status`: list check-ins in storage order.
async fn list_status(State(state): State<AppState>) -> Result<Json<Vec<StatusRecord>>, AppError> {
    let records = state.store.list().await.map_err(|e| {
        error!("status list failed: {e}");
        bad_request(e.to_string())
    })?;
    Ok(Json(records))
}
