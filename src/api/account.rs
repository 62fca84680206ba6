// Account deletion and admin routes

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::infrastructure::middleware::{has_service_key, HasServiceKey, ServiceCaller, Vc};
use crate::models::UserSummary;
use crate::services::ErasureReport;

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SelfDeleteRequest {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirmation: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/delete-account", post(delete_account_handler))
        .route("/account/delete", post(self_delete_handler))
        .route("/admin/users", get(list_users_handler))
        .route("/admin/users/{id}", delete(admin_delete_user_handler))
}

/// Internal deletion endpoint. Callers either present the service key or delete themselves.
pub async fn delete_account_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    vc: Vc,
    Json(req): Json<DeleteAccountRequest>,
) -> AppResult<Json<ErasureReport>> {
    if req.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id is required".to_string()));
    }

    let privileged = has_service_key(&headers, state.service_role_key());
    let is_self = vc.user_id.as_deref() == Some(req.user_id.as_str());
    if !privileged && !is_self {
        return Err(AppError::Forbidden("Not allowed to delete this account".to_string()));
    }

    info!(user_id = %req.user_id, privileged, request_id = %vc.request_id, "Account deletion requested");
    let report = state.eraser.erase(&req.user_id).await?;
    Ok(Json(report))
}

pub async fn self_delete_handler(
    State(state): State<AppState>,
    vc: Vc,
    Json(req): Json<SelfDeleteRequest>,
) -> AppResult<Json<ErasureReport>> {
    let user_id = vc.require_user()?;
    let report = state
        .eraser
        .erase_with_password(user_id, &req.password, &req.confirmation)
        .await?;
    Ok(Json(report))
}

pub async fn list_users_handler(
    State(state): State<AppState>,
    _caller: ServiceCaller,
) -> AppResult<Json<Vec<UserSummary>>> {
    Ok(Json(state.auth.list_users().await?))
}

pub async fn admin_delete_user_handler(
    State(state): State<AppState>,
    _caller: ServiceCaller,
    Path(user_id): Path<String>,
) -> AppResult<Json<ErasureReport>> {
    let report = state.eraser.erase(&user_id).await?;
    if !report.account_record_removed {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }
    Ok(Json(report))
}
