// Gallery, content detail, comments and drafts routes

use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::infrastructure::middleware::Vc;
use crate::models::{
    Category, CommentTarget, CommentWithAuthor, ContentItem, ContentKind, ContentPatch,
    GalleryQuery, LikeState, NewContent,
};
use crate::services::{
    available_tags, filter_by_tags, DownloadTicket, DraftInput, DraftView, TocEntry,
    RETRIES_LEFT_HEADER,
};

#[derive(Debug, Default, Deserialize)]
pub struct GalleryParams {
    pub category: Option<String>,
    pub media_type: Option<String>,
    /// Comma-separated tag selection
    pub tags: Option<String>,
}

impl GalleryParams {
    fn selected_tags(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    pub items: Vec<ContentItem>,
    /// Tags across the unfiltered listing, for the tag picker
    pub available_tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DetailParams {
    /// Which manual attempt this is, starting at 1
    pub attempt: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct NewCommentRequest {
    pub content: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/gallery/{kind}", get(gallery_handler))
        .route("/content/{kind}", post(create_content_handler))
        .route(
            "/content/{kind}/{id}",
            get(get_content_handler)
                .patch(update_content_handler)
                .delete(delete_content_handler),
        )
        .route("/content/{kind}/{id}/like", post(like_handler))
        .route("/content/{kind}/{id}/download", post(download_handler))
        .route("/content/{kind}/{id}/toc", get(toc_handler))
        .route(
            "/content/{kind}/{id}/comments",
            get(list_comments_handler).post(add_comment_handler),
        )
        .route("/drafts", put(save_draft_handler))
        .route("/drafts/{id}", get(get_draft_handler))
}

fn parse_kind(raw: &str) -> AppResult<ContentKind> {
    raw.parse()
}

pub async fn gallery_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<GalleryParams>,
) -> AppResult<Json<GalleryResponse>> {
    let mut query = GalleryQuery::new(parse_kind(&kind)?).category(Category::parse(
        params.category.as_deref().unwrap_or(Category::ALL_SENTINEL),
    ));
    if let Some(media_type) = params.media_type.as_deref().filter(|m| !m.is_empty()) {
        query = query.media_type(media_type);
    }

    let items = state.gallery.list(&query).await?;
    let tags = available_tags(&items);
    Ok(Json(GalleryResponse {
        items: filter_by_tags(items, &params.selected_tags()),
        available_tags: tags,
    }))
}

pub async fn create_content_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(kind): Path<String>,
    Json(input): Json<NewContent>,
) -> AppResult<(StatusCode, Json<ContentItem>)> {
    let owner_id = vc.require_user()?;
    let item = state.content.create(owner_id, parse_kind(&kind)?, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_content_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    Query(params): Query<DetailParams>,
) -> Result<Json<ContentItem>, Response> {
    let kind = parse_kind(&kind).map_err(IntoResponse::into_response)?;
    let attempt = params.attempt.unwrap_or(1);

    state.details.fetch(kind, &id, attempt).await.map(Json).map_err(|e| {
        let retries_left = state.details.retries_left(attempt, &e);
        let mut response = e.into_response();
        response
            .headers_mut()
            .insert(RETRIES_LEFT_HEADER, HeaderValue::from(retries_left));
        response
    })
}

pub async fn update_content_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path((kind, id)): Path<(String, String)>,
    Json(patch): Json<ContentPatch>,
) -> AppResult<Json<ContentItem>> {
    let owner_id = vc.require_user()?;
    let item = state
        .content
        .update(owner_id, parse_kind(&kind)?, &id, patch)
        .await?;
    Ok(Json(item))
}

pub async fn delete_content_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path((kind, id)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let owner_id = vc.require_user()?;
    state.content.delete(owner_id, parse_kind(&kind)?, &id).await?;
    Ok(Json(json!({ "id": id, "deleted": true })))
}

pub async fn like_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path((kind, id)): Path<(String, String)>,
) -> AppResult<Json<LikeState>> {
    let user_id = vc.require_user()?;
    let like = state.content.toggle_like(user_id, parse_kind(&kind)?, &id).await?;
    Ok(Json(like))
}

pub async fn download_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> AppResult<Json<DownloadTicket>> {
    let ticket = state.content.record_download(parse_kind(&kind)?, &id).await?;
    Ok(Json(ticket))
}

pub async fn toc_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> AppResult<Json<Vec<TocEntry>>> {
    let toc = state.content.table_of_contents(parse_kind(&kind)?, &id).await?;
    Ok(Json(toc))
}

pub async fn list_comments_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> AppResult<Json<Vec<CommentWithAuthor>>> {
    let target = CommentTarget {
        kind: parse_kind(&kind)?,
        id: &id,
    };
    Ok(Json(state.social.list_comments(target).await?))
}

pub async fn add_comment_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path((kind, id)): Path<(String, String)>,
    Json(req): Json<NewCommentRequest>,
) -> AppResult<(StatusCode, Json<CommentWithAuthor>)> {
    let user_id = vc.require_user()?;
    let target = CommentTarget {
        kind: parse_kind(&kind)?,
        id: &id,
    };
    let comment = state.social.add_comment(user_id, target, &req.content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn save_draft_handler(
    State(state): State<AppState>,
    vc: Vc,
    Json(input): Json<DraftInput>,
) -> AppResult<Json<DraftView>> {
    let user_id = vc.require_user()?;
    Ok(Json(state.drafts.save_draft(user_id, input).await?))
}

pub async fn get_draft_handler(
    State(state): State<AppState>,
    vc: Vc,
    Path(id): Path<String>,
) -> AppResult<Json<DraftView>> {
    let user_id = vc.require_user()?;
    Ok(Json(state.drafts.get_draft(user_id, &id).await?))
}
