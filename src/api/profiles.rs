// Profile page, settings and follow routes

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::infrastructure::middleware::Vc;
use crate::models::{Profile, ProfileUpdate};
use crate::services::ProfileView;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profiles/{id}", get(get_profile_handler).patch(update_profile_handler))
        .route("/follows/{id}", post(follow_handler).delete(unfollow_handler))
}

pub async fn get_profile_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(user_id): Path<String>,
) -> AppResult<Json<ProfileView>> {
    let view = state.profiles.aggregate(&user_id, vc.user_id.as_deref()).await?;
    Ok(Json(view))
}

pub async fn update_profile_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(user_id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> AppResult<Json<Profile>> {
    if vc.require_user()? != user_id {
        return Err(AppError::Forbidden("You can only edit your own profile".to_string()));
    }
    if matches!(update.username.as_deref(), Some(name) if name.trim().is_empty()) {
        return Err(AppError::Validation("Username cannot be empty".to_string()));
    }
    state
        .store
        .update_profile(&user_id, update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", user_id)))
}

pub async fn follow_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(following_id): Path<String>,
) -> AppResult<Json<Value>> {
    let follower_id = vc.require_user()?;
    let created = state.social.follow(follower_id, &following_id).await?;
    Ok(Json(json!({ "following": true, "created": created })))
}

pub async fn unfollow_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(following_id): Path<String>,
) -> AppResult<Json<Value>> {
    let follower_id = vc.require_user()?;
    let removed = state.social.unfollow(follower_id, &following_id).await?;
    Ok(Json(json!({ "following": false, "removed": removed })))
}
