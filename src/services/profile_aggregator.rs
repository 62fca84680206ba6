// Profile page aggregation
//
// All slices are fetched concurrently. The profile row is required; every other slice
// degrades to empty on failure and is named in `ProfileView::degraded`.

use serde::Serialize;
use std::sync::Arc;
use tracing::{instrument, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::ContentStore;
use crate::models::{CommentWithAuthor, ContentItem, ContentKind, ContentStatus, FollowEdge, PublicProfile};

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub profile: PublicProfile,
    pub posts: Vec<ContentItem>,
    pub images: Vec<ContentItem>,
    pub videos: Vec<ContentItem>,
    pub models: Vec<ContentItem>,
    pub comments: Vec<CommentWithAuthor>,
    pub followings: Vec<FollowEdge>,
    pub followers: Vec<FollowEdge>,
    pub is_following: bool,
    pub degraded: Vec<&'static str>,
}

#[derive(Clone)]
pub struct ProfileAggregator {
    store: Arc<dyn ContentStore>,
}

impl ProfileAggregator {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn aggregate(&self, user_id: &str, viewer_id: Option<&str>) -> AppResult<ProfileView> {
        let store = &self.store;
        let published = |kind| store.list_user_content(kind, user_id, ContentStatus::Published);
        let follow_check = async {
            match viewer_id {
                Some(viewer) if viewer != user_id => store.follow_exists(viewer, user_id).await,
                _ => Ok(false),
            }
        };

        let (profile, posts, images, videos, models, comments, followings, followers, is_following) = tokio::join!(
            store.get_profile(user_id),
            published(ContentKind::Post),
            published(ContentKind::Image),
            published(ContentKind::Video),
            published(ContentKind::Model),
            store.list_comments_by_user(user_id),
            store.list_followings(user_id),
            store.list_followers(user_id),
            follow_check,
        );

        let profile = profile?
            .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", user_id)))?
            .public_view(viewer_id);

        let mut degraded = Vec::new();
        let view = ProfileView {
            profile,
            posts: slice_or_default("posts", posts, &mut degraded),
            images: slice_or_default("images", images, &mut degraded),
            videos: slice_or_default("videos", videos, &mut degraded),
            models: slice_or_default("models", models, &mut degraded),
            comments: slice_or_default("comments", comments, &mut degraded),
            followings: slice_or_default("followings", followings, &mut degraded),
            followers: slice_or_default("followers", followers, &mut degraded),
            is_following: slice_or_default("is_following", is_following, &mut degraded),
            degraded,
        };
        Ok(view)
    }
}

fn slice_or_default<T: Default>(
    slice: &'static str,
    result: AppResult<T>,
    degraded: &mut Vec<&'static str>,
) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(slice, error = %e, "Profile slice failed, rendering empty");
            degraded.push(slice);
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite_database::SqliteDatabase;
    use crate::models::{Comment, CommentTarget};
    use chrono::Utc;

    async fn profile(db: &SqliteDatabase, name: &str) -> String {
        let now = Utc::now();
        let id = uuid::Uuid::new_v4().to_string();
        let user = crate::models::UserRecord {
            id: id.clone(),
            email: format!("{}@example.com", name),
            password_hash: "x".to_string(),
            created_at: now,
        };
        let profile = crate::models::Profile {
            id: id.clone(),
            username: name.to_string(),
            email: user.email.clone(),
            avatar_url: None,
            bio: None,
            follower_count: 0,
            following_count: 0,
            created_at: now,
        };
        db.insert_user(&user, &profile).await.unwrap();
        id
    }

    async fn post(db: &SqliteDatabase, user_id: &str, status: ContentStatus) -> String {
        let now = Utc::now();
        let item = ContentItem {
            id: uuid::Uuid::new_v4().to_string(),
            kind: ContentKind::Post,
            user_id: user_id.to_string(),
            title: "hello".to_string(),
            body: Some("# Hello".to_string()),
            media_url: None,
            category: "blog".to_string(),
            media_type: None,
            tags: vec![],
            likes: 0,
            views: 0,
            comments: 0,
            downloads: 0,
            status,
            created_at: now,
            updated_at: now,
        };
        db.insert_content(&item).await.unwrap();
        item.id
    }

    #[tokio::test]
    async fn test_aggregate_collects_every_slice() {
        let db = Arc::new(SqliteDatabase::new_in_memory().await.unwrap());
        let owner = profile(&db, "owner").await;
        let fan = profile(&db, "fan").await;

        let published = post(&db, &owner, ContentStatus::Published).await;
        post(&db, &owner, ContentStatus::Draft).await;
        db.insert_comment(&Comment::new(
            &owner,
            CommentTarget {
                kind: ContentKind::Post,
                id: &published,
            },
            "first".to_string(),
        ))
        .await
        .unwrap();
        db.insert_follow(&fan, &owner).await.unwrap();

        let aggregator = ProfileAggregator::new(db.clone());
        let view = aggregator.aggregate(&owner, Some(&fan)).await.unwrap();

        assert_eq!(view.profile.username, "owner");
        assert_eq!(view.profile.email, None);
        assert_eq!(view.profile.follower_count, 1);
        assert_eq!(view.posts.len(), 1);
        assert_eq!(view.posts[0].id, published);
        assert!(view.images.is_empty() && view.videos.is_empty() && view.models.is_empty());
        assert_eq!(view.comments.len(), 1);
        assert_eq!(view.comments[0].author.username.as_deref(), Some("owner"));
        assert_eq!(view.followers.len(), 1);
        assert_eq!(view.followers[0].profile.username.as_deref(), Some("fan"));
        assert!(view.followings.is_empty());
        assert!(view.is_following);
        assert!(view.degraded.is_empty());

        let own_view = aggregator.aggregate(&owner, Some(&owner)).await.unwrap();
        assert!(!own_view.is_following);
        assert_eq!(own_view.profile.email.as_deref(), Some("owner@example.com"));
        let anonymous = aggregator.aggregate(&owner, None).await.unwrap();
        assert!(!anonymous.is_following);
        assert_eq!(anonymous.profile.email, None);
    }

    #[tokio::test]
    async fn test_missing_profile_is_fatal() {
        let db = Arc::new(SqliteDatabase::new_in_memory().await.unwrap());
        let aggregator = ProfileAggregator::new(db);
        assert!(matches!(
            aggregator.aggregate("nobody", None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failing_slice_renders_empty() {
        let db = Arc::new(SqliteDatabase::new_in_memory().await.unwrap());
        let owner = profile(&db, "owner").await;
        post(&db, &owner, ContentStatus::Published).await;
        sqlx::query("DROP TABLE comments").execute(db.pool()).await.unwrap();

        let view = ProfileAggregator::new(db.clone())
            .aggregate(&owner, None)
            .await
            .unwrap();
        assert_eq!(view.degraded, vec!["comments"]);
        assert!(view.comments.is_empty());
        assert_eq!(view.posts.len(), 1);
    }

    #[tokio::test]
    async fn test_profile_query_error_is_fatal() {
        let db = Arc::new(SqliteDatabase::new_in_memory().await.unwrap());
        let owner = profile(&db, "owner").await;
        sqlx::query("ALTER TABLE profiles RENAME TO profiles_offline")
            .execute(db.pool())
            .await
            .unwrap();

        let result = ProfileAggregator::new(db.clone()).aggregate(&owner, None).await;
        assert!(matches!(result, Err(AppError::DatabaseError(_))), "{:?}", result.err());
    }

    #[tokio::test]
    async fn test_secondary_list_errors_collapse_to_empty() {
        let db = Arc::new(SqliteDatabase::new_in_memory().await.unwrap());
        let owner = profile(&db, "owner").await;
        let fan = profile(&db, "fan").await;
        post(&db, &owner, ContentStatus::Published).await;
        sqlx::query("DROP TABLE images").execute(db.pool()).await.unwrap();
        sqlx::query("DROP TABLE videos").execute(db.pool()).await.unwrap();

        let view = ProfileAggregator::new(db.clone())
            .aggregate(&owner, Some(&fan))
            .await
            .unwrap();
        assert_eq!(view.degraded, vec!["images", "videos"]);
        assert!(view.images.is_empty() && view.videos.is_empty());
        assert_eq!(view.posts.len(), 1);
        assert_eq!(view.profile.username, "owner");
    }
}
