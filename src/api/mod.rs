// HTTP surface - every route lives under /api behind the viewer middleware

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Response},
    middleware, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    services::{fs::ServeFileSystemResponseBody, ServeDir},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::app_state::AppState;
use crate::infrastructure::middleware::viewer_context_middleware;
use crate::infrastructure::storage::is_inline_media;
use crate::services::preview_registry::MAX_PREVIEW_BYTES;

pub mod account;
pub mod auth;
pub mod content;
pub mod profiles;
pub mod uploads;

/// Anything that is not image or video media is downloaded rather than rendered.
fn attachment_unless_media(response: &Response<ServeFileSystemResponseBody>) -> Option<HeaderValue> {
    let content_type = response.headers().get(header::CONTENT_TYPE)?.to_str().ok()?;
    (!is_inline_media(content_type)).then(|| HeaderValue::from_static("attachment"))
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth::routes())
        .merge(account::routes())
        .merge(profiles::routes())
        .merge(content::routes())
        .merge(uploads::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            viewer_context_middleware::<AppState>,
        ))
        .layer(DefaultBodyLimit::max(MAX_PREVIEW_BYTES + 64 * 1024))
        .with_state(state.clone());

    let storage = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_DISPOSITION,
            attachment_unless_media,
        ))
        .service(ServeDir::new(&state.storage_root));

    Router::new()
        .nest("/api", api)
        .nest_service("/storage", storage)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
