//! HTTP API handlers

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error};

use crate::jobs::JobStoreError;
use crate::types::{JobId, JobStatus, UserId};

use super::types::*;
use super::AppState;

/// Resolve the calling user from the `x-user-id` header injected by the
/// upstream auth layer.
fn caller(headers: &HeaderMap) -> Result<UserId, Response> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<UserId>().ok())
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(
                    "UNAUTHENTICATED",
                    "Missing or invalid x-user-id header",
                )),
            )
                .into_response()
        })
}

fn store_error_response(err: &JobStoreError) -> Response {
    let (status, code) = match err {
        JobStoreError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        JobStoreError::AnotherJobActive => (StatusCode::CONFLICT, "CONFLICT"),
        JobStoreError::AlreadyProcessing(_) => (StatusCode::CONFLICT, "CONFLICT"),
        JobStoreError::DeleteWhileProcessing(_) => (StatusCode::CONFLICT, "CONFLICT"),
        JobStoreError::InvalidTransition { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INVALID_TRANSITION")
        }
    };
    (status, Json(ErrorResponse::new(code, err.to_string()))).into_response()
}

/// Health check
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create a configuration
pub async fn create_configuration(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateConfigurationRequest>,
) -> impl IntoResponse {
    let user_id = match caller(&headers) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let url = request.url.trim();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "VALIDATION",
                "URL must start with http:// or https://",
            )),
        )
            .into_response();
    }
    if url::Url::parse(url).is_err() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("VALIDATION", "URL is not valid")),
        )
            .into_response();
    }

    let job = state.ctx.store.create(user_id, url);
    debug!("configuration {} created for user {}", job.id, user_id);

    (StatusCode::CREATED, Json(ConfigurationResponse::from(&job))).into_response()
}

/// List the caller's configurations
pub async fn list_configurations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let user_id = match caller(&headers) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let page = params.page.max(1);
    let page_size = params.page_size.clamp(1, 100);
    let offset = (page - 1) * page_size;

    let items: Vec<ConfigurationResponse> = state
        .ctx
        .store
        .list(user_id, offset, page_size)
        .iter()
        .map(ConfigurationResponse::from)
        .collect();

    Json(ConfigurationListResponse {
        total: state.ctx.store.count(user_id),
        items,
        page,
        page_size,
    })
    .into_response()
}

/// Read one configuration
pub async fn get_configuration(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(config_id): Path<JobId>,
) -> impl IntoResponse {
    let user_id = match caller(&headers) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.ctx.store.get(config_id, user_id) {
        Some(job) => Json(ConfigurationResponse::from(&job)).into_response(),
        None => store_error_response(&JobStoreError::NotFound(config_id)),
    }
}

/// Delete a configuration. Rejected while it is being processed.
pub async fn delete_configuration(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(config_id): Path<JobId>,
) -> impl IntoResponse {
    let user_id = match caller(&headers) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.ctx.store.delete(config_id, user_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => store_error_response(&err),
    }
}

/// Trigger an ingestion job for a configuration.
///
/// Admission is the store's atomic `try_start`, performed here before the
/// background task is spawned; the task itself resumes the already
/// Processing record. Conflicts and missing configurations surface
/// synchronously, before any state change.
pub async fn start_ingestion(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<StartIngestionRequest>,
) -> impl IntoResponse {
    let user_id = match caller(&headers) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    if let Err(err) = state.ctx.store.try_start(request.config_id, user_id, false) {
        return store_error_response(&err);
    }

    match state.runner.spawn(request.config_id, user_id) {
        Ok(task_id) => (
            StatusCode::OK,
            Json(StartIngestionResponse {
                message: "Ingestion job started".to_string(),
                task_id: task_id.to_string(),
                config_id: request.config_id,
                status: JobStatus::Processing,
            }),
        )
            .into_response(),
        Err(e) => {
            // Release the admission so the record is not stuck in Processing
            error!("failed to spawn ingestion task: {}", e);
            let _ = state
                .ctx
                .store
                .fail(request.config_id, format!("failed to start: {}", e));
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("TASK_INFRASTRUCTURE", e.to_string())),
            )
                .into_response()
        }
    }
}
