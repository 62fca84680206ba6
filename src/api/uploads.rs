// Object uploads and staged image previews

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::infrastructure::middleware::Vc;
use crate::infrastructure::storage::{Bucket, StoredObject};
use crate::services::preview_registry::{Preview, PREVIEW_SCHEME};

pub const FILE_NAME_HEADER: &str = "x-file-name";

#[derive(Debug, Deserialize)]
pub struct CommitPreviewRequest {
    pub bucket: Bucket,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/uploads/{bucket}", post(upload_handler))
        .route("/uploads/{bucket}/{*path}", delete(remove_upload_handler))
        .route("/previews", post(create_preview_handler))
        .route("/previews/{id}", get(get_preview_handler).delete(revoke_preview_handler))
        .route("/previews/{id}/commit", post(commit_preview_handler))
}

fn content_type(headers: &HeaderMap) -> String {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string()
}

fn owned_preview(state: &AppState, owner_id: &str, id: &str) -> AppResult<Preview> {
    let url = format!("{}{}", PREVIEW_SCHEME, id);
    let preview = state
        .previews
        .get(&url)
        .ok_or_else(|| AppError::NotFound(format!("Preview {} not found", id)))?;
    if preview.owner_id != owner_id {
        return Err(AppError::Forbidden("Preview belongs to another user".to_string()));
    }
    Ok(preview)
}

pub async fn upload_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(bucket): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<(StatusCode, Json<StoredObject>)> {
    let owner_id = vc.require_user()?;
    let bucket: Bucket = bucket.parse()?;
    let file_name = headers
        .get(FILE_NAME_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest(format!("Missing {} header", FILE_NAME_HEADER)))?;
    if body.is_empty() {
        return Err(AppError::Validation("Empty upload".to_string()));
    }

    let stored = state
        .uploads
        .upload(owner_id, bucket, file_name, &content_type(&headers), &body)
        .await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn remove_upload_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path((bucket, path)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let owner_id = vc.require_user()?;
    let removed = state.uploads.remove(owner_id, bucket.parse()?, &path).await?;
    Ok(Json(json!({ "removed": removed })))
}

pub async fn create_preview_handler(
    State(state): State<AppState>,
    vc: Vc,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Value>)> {
    let owner_id = vc.require_user()?;
    let url = state
        .uploads
        .stage(owner_id, &content_type(&headers), body.to_vec())?;
    Ok((StatusCode::CREATED, Json(json!({ "url": url }))))
}

pub async fn get_preview_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let owner_id = vc.require_user()?;
    let preview = owned_preview(&state, owner_id, &id)?;
    Ok(([(header::CONTENT_TYPE, preview.content_type)], preview.bytes).into_response())
}

pub async fn revoke_preview_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let owner_id = vc.require_user()?;
    let preview = owned_preview(&state, owner_id, &id)?;
    let revoked = state.previews.revoke(&preview.url);
    Ok(Json(json!({ "revoked": revoked })))
}

pub async fn commit_preview_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(id): Path<String>,
    Json(req): Json<CommitPreviewRequest>,
) -> AppResult<(StatusCode, Json<StoredObject>)> {
    let owner_id = vc.require_user()?;
    let url = format!("{}{}", PREVIEW_SCHEME, id);
    let stored = state.uploads.commit(owner_id, &url, req.bucket).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}
