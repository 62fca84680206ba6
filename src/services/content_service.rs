// Content CRUD, likes and downloads

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::ContentStore;
use crate::models::{ContentItem, ContentKind, ContentPatch, Counter, LikeState, NewContent};
use crate::services::toc::{extract_toc, TocEntry};

#[derive(Debug, Clone, Serialize)]
pub struct DownloadTicket {
    pub media_url: String,
    pub downloads: i64,
}

#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn ContentStore>,
}

impl ContentService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    async fn load(&self, kind: ContentKind, id: &str) -> AppResult<ContentItem> {
        self.store
            .get_content(kind, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", kind, id)))
    }

    async fn load_owned(&self, owner_id: &str, kind: ContentKind, id: &str) -> AppResult<ContentItem> {
        let item = self.load(kind, id).await?;
        if item.user_id != owner_id {
            return Err(AppError::Forbidden(format!("{} {} belongs to another user", kind, id)));
        }
        Ok(item)
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(&self, owner_id: &str, kind: ContentKind, input: NewContent) -> AppResult<ContentItem> {
        if input.title.trim().is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }
        if input.category.trim().is_empty() {
            return Err(AppError::Validation("Category is required".to_string()));
        }

        let now = Utc::now();
        let item = ContentItem {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            user_id: owner_id.to_string(),
            title: input.title.trim().to_string(),
            body: input.body,
            media_url: input.media_url,
            category: input.category,
            media_type: input.media_type,
            tags: input.tags,
            likes: 0,
            views: 0,
            comments: 0,
            downloads: 0,
            status: input.status,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_content(&item).await?;
        info!(%kind, id = %item.id, owner_id, "Content created");
        Ok(item)
    }

    pub async fn update(
        &self,
        owner_id: &str,
        kind: ContentKind,
        id: &str,
        patch: ContentPatch,
    ) -> AppResult<ContentItem> {
        let mut item = self.load_owned(owner_id, kind, id).await?;
        patch.apply(&mut item);
        if item.title.trim().is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }
        item.updated_at = Utc::now();
        self.store.update_content(&item).await?;
        Ok(item)
    }

    pub async fn delete(&self, owner_id: &str, kind: ContentKind, id: &str) -> AppResult<()> {
        self.load_owned(owner_id, kind, id).await?;
        if !self.store.delete_content(kind, id).await? {
            return Err(AppError::NotFound(format!("{} {} not found", kind, id)));
        }
        info!(%kind, id, owner_id, "Content deleted");
        Ok(())
    }

    /// Toggle the user's like. The counter moves only when the like row actually changes.
    pub async fn toggle_like(&self, user_id: &str, kind: ContentKind, id: &str) -> AppResult<LikeState> {
        let item = self.load(kind, id).await?;

        if self.store.insert_like(user_id, kind, id).await? {
            let likes = self.store.increment_counter(kind, id, Counter::Likes, 1).await?;
            return Ok(LikeState { liked: true, likes });
        }
        if self.store.delete_like(user_id, kind, id).await? {
            let likes = self.store.increment_counter(kind, id, Counter::Likes, -1).await?;
            return Ok(LikeState { liked: false, likes });
        }
        // Raced with a concurrent toggle from the same user.
        Ok(LikeState {
            liked: false,
            likes: item.likes,
        })
    }

    pub async fn record_download(&self, kind: ContentKind, id: &str) -> AppResult<DownloadTicket> {
        let item = self.load(kind, id).await?;
        let media_url = item
            .media_url
            .ok_or_else(|| AppError::BadRequest(format!("{} {} has no downloadable media", kind, id)))?;
        let downloads = self
            .store
            .increment_counter(kind, id, Counter::Downloads, 1)
            .await?;
        Ok(DownloadTicket { media_url, downloads })
    }

    pub async fn table_of_contents(&self, kind: ContentKind, id: &str) -> AppResult<Vec<TocEntry>> {
        let item = self.load(kind, id).await?;
        Ok(item.body.as_deref().map(extract_toc).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite_database::SqliteDatabase;

    fn new_post(title: &str, body: &str) -> NewContent {
        NewContent {
            title: title.to_string(),
            body: Some(body.to_string()),
            media_url: None,
            category: "blog".to_string(),
            media_type: None,
            tags: vec!["rust".to_string()],
            status: Default::default(),
        }
    }

    async fn service() -> ContentService {
        let db = SqliteDatabase::new_in_memory().await.unwrap();
        ContentService::new(Arc::new(db))
    }

    #[tokio::test]
    async fn test_only_owner_can_edit_or_delete() {
        let content = service().await;
        let post = content
            .create("alice", ContentKind::Post, new_post("Hello", "# Hi"))
            .await
            .unwrap();

        let patch = ContentPatch {
            title: Some("Hijacked".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            content.update("mallory", ContentKind::Post, &post.id, patch.clone()).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            content.delete("mallory", ContentKind::Post, &post.id).await,
            Err(AppError::Forbidden(_))
        ));

        let updated = content
            .update("alice", ContentKind::Post, &post.id, ContentPatch {
                title: Some("Hello again".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.title, "Hello again");
        assert_eq!(updated.tags, vec!["rust"]);

        content.delete("alice", ContentKind::Post, &post.id).await.unwrap();
        assert!(matches!(
            content.delete("alice", ContentKind::Post, &post.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_like_toggle_counts_once_per_user() {
        let content = service().await;
        let post = content
            .create("alice", ContentKind::Post, new_post("Hello", ""))
            .await
            .unwrap();

        let first = content.toggle_like("bob", ContentKind::Post, &post.id).await.unwrap();
        assert_eq!(first, LikeState { liked: true, likes: 1 });
        let other = content.toggle_like("carol", ContentKind::Post, &post.id).await.unwrap();
        assert_eq!(other.likes, 2);
        let undo = content.toggle_like("bob", ContentKind::Post, &post.id).await.unwrap();
        assert_eq!(undo, LikeState { liked: false, likes: 1 });

        assert!(matches!(
            content.toggle_like("bob", ContentKind::Image, &post.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_download_requires_media_and_counts() {
        let content = service().await;
        let mut input = new_post("Render", "");
        input.media_url = Some("http://localhost:3000/storage/outputimage/a.png".to_string());
        let image = content.create("alice", ContentKind::Image, input).await.unwrap();
        let text = content
            .create("alice", ContentKind::Post, new_post("Text", ""))
            .await
            .unwrap();

        let ticket = content.record_download(ContentKind::Image, &image.id).await.unwrap();
        assert_eq!(ticket.downloads, 1);
        assert!(ticket.media_url.ends_with("a.png"));
        assert!(matches!(
            content.record_download(ContentKind::Post, &text.id).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_toc_of_post_body() {
        let content = service().await;
        let post = content
            .create("alice", ContentKind::Post, new_post("Guide", "# A\n## B\n## B"))
            .await
            .unwrap();
        let toc = content.table_of_contents(ContentKind::Post, &post.id).await.unwrap();
        let anchors: Vec<_> = toc.iter().map(|e| e.anchor.as_str()).collect();
        assert_eq!(anchors, vec!["a", "b", "b-1"]);
    }
}
