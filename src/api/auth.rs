// Session routes

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::infrastructure::auth::{Session, SignUpRequest};
use crate::infrastructure::middleware::Vc;
use crate::models::Profile;

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(sign_up_handler))
        .route("/auth/signin", post(sign_in_handler))
        .route("/auth/signout", post(sign_out_handler))
        .route("/auth/me", get(me_handler))
}

pub async fn sign_up_handler(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> AppResult<(StatusCode, Json<Profile>)> {
    let profile = state.auth.sign_up(req).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn sign_in_handler(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> AppResult<Json<Session>> {
    let session = state.auth.sign_in_with_password(&req.email, &req.password).await?;
    Ok(Json(session))
}

pub async fn sign_out_handler(State(state): State<AppState>, vc: Vc) -> AppResult<Json<Value>> {
    let token = vc.require_token()?;
    let user_id = vc.require_user()?;
    let signed_out = state.auth.sign_out(token).await;

    // Previews outlive a session only while the user is still signed in elsewhere.
    let previews_revoked = if state.auth.has_live_session(user_id).await {
        0
    } else {
        state.previews.revoke_owned_by(user_id)
    };
    Ok(Json(json!({ "signed_out": signed_out, "previews_revoked": previews_revoked })))
}

pub async fn me_handler(State(state): State<AppState>, vc: Vc) -> AppResult<Json<Profile>> {
    let token = vc.require_token()?;
    Ok(Json(state.auth.current_user(token).await?))
}
