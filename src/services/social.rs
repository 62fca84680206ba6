// Comments and follows

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::ContentStore;
use crate::models::{Comment, CommentTarget, CommentWithAuthor, Counter, ProfileSummary};

pub const MAX_COMMENT_LEN: usize = 2000;

#[derive(Clone)]
pub struct SocialService {
    store: Arc<dyn ContentStore>,
}

impl SocialService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Post a comment and bump the parent's comment counter.
    pub async fn add_comment(
        &self,
        user_id: &str,
        target: CommentTarget<'_>,
        content: &str,
    ) -> AppResult<CommentWithAuthor> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("Comment cannot be empty".to_string()));
        }
        if content.chars().count() > MAX_COMMENT_LEN {
            return Err(AppError::Validation(format!(
                "Comment exceeds {} characters",
                MAX_COMMENT_LEN
            )));
        }

        if self.store.get_content(target.kind, target.id).await?.is_none() {
            return Err(AppError::NotFound(format!("{} {} not found", target.kind, target.id)));
        }

        let comment = Comment::new(user_id, target, content.to_string());
        self.store.insert_comment(&comment).await?;

        if let Err(e) = self
            .store
            .increment_counter(target.kind, target.id, Counter::Comments, 1)
            .await
        {
            warn!(kind = %target.kind, id = target.id, error = %e, "Comment saved but counter not bumped");
        }

        let author = match self.store.get_profile(user_id).await? {
            Some(profile) => ProfileSummary {
                id: profile.id,
                username: Some(profile.username),
                avatar_url: profile.avatar_url,
            },
            None => ProfileSummary {
                id: user_id.to_string(),
                username: None,
                avatar_url: None,
            },
        };
        Ok(CommentWithAuthor { comment, author })
    }

    pub async fn list_comments(&self, target: CommentTarget<'_>) -> AppResult<Vec<CommentWithAuthor>> {
        self.store.list_comments_for(target).await
    }

    /// Returns `false` if the edge already existed.
    pub async fn follow(&self, follower_id: &str, following_id: &str) -> AppResult<bool> {
        if follower_id == following_id {
            return Err(AppError::Validation("You cannot follow yourself".to_string()));
        }
        if self.store.get_profile(following_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Profile {} not found", following_id)));
        }
        let created = self.store.insert_follow(follower_id, following_id).await?;
        if created {
            info!(follower_id, following_id, "Followed");
        }
        Ok(created)
    }

    pub async fn unfollow(&self, follower_id: &str, following_id: &str) -> AppResult<bool> {
        self.store.delete_follow(follower_id, following_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::auth::{AuthService, SignUpRequest};
    use crate::infrastructure::sqlite_database::SqliteDatabase;
    use crate::models::{ContentKind, NewContent};
    use crate::services::content_service::ContentService;
    use std::time::Duration;

    struct Fixture {
        social: SocialService,
        content: ContentService,
        auth: AuthService,
        db: Arc<SqliteDatabase>,
    }

    async fn fixture() -> Fixture {
        let db = Arc::new(SqliteDatabase::new_in_memory().await.unwrap());
        Fixture {
            social: SocialService::new(db.clone()),
            content: ContentService::new(db.clone()),
            auth: AuthService::new(db.clone(), Duration::from_secs(60)),
            db,
        }
    }

    async fn user(auth: &AuthService, name: &str) -> String {
        auth.sign_up(SignUpRequest {
            email: format!("{}@example.com", name),
            password: "password123".to_string(),
            username: name.to_string(),
        })
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_comment_bumps_counter_and_carries_author() {
        let f = fixture().await;
        let alice = user(&f.auth, "alice").await;
        let image = f
            .content
            .create(&alice, ContentKind::Image, NewContent {
                title: "Sunset".to_string(),
                body: None,
                media_url: Some("http://x/a.png".to_string()),
                category: "landscape".to_string(),
                media_type: Some("png".to_string()),
                tags: vec![],
                status: Default::default(),
            })
            .await
            .unwrap();
        let target = CommentTarget {
            kind: ContentKind::Image,
            id: &image.id,
        };

        assert!(matches!(
            f.social.add_comment(&alice, target, "   ").await,
            Err(AppError::Validation(_))
        ));

        let posted = f.social.add_comment(&alice, target, " lovely ").await.unwrap();
        assert_eq!(posted.comment.content, "lovely");
        assert_eq!(posted.comment.image_id.as_deref(), Some(image.id.as_str()));
        assert_eq!(posted.author.username.as_deref(), Some("alice"));

        let listed = f.social.list_comments(target).await.unwrap();
        assert_eq!(listed.len(), 1);
        let reloaded = f.db.get_content(ContentKind::Image, &image.id).await.unwrap().unwrap();
        assert_eq!(reloaded.comments, 1);

        let missing = CommentTarget {
            kind: ContentKind::Video,
            id: &image.id,
        };
        assert!(matches!(
            f.social.add_comment(&alice, missing, "hi").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_follow_rules_and_counts() {
        let f = fixture().await;
        let alice = user(&f.auth, "alice").await;
        let bob = user(&f.auth, "bob").await;

        assert!(matches!(
            f.social.follow(&alice, &alice).await,
            Err(AppError::Validation(_))
        ));
        assert!(f.social.follow(&alice, &bob).await.unwrap());
        assert!(!f.social.follow(&alice, &bob).await.unwrap());

        let bob_profile = f.db.get_profile(&bob).await.unwrap().unwrap();
        assert_eq!(bob_profile.follower_count, 1);
        let alice_profile = f.db.get_profile(&alice).await.unwrap().unwrap();
        assert_eq!(alice_profile.following_count, 1);

        assert!(f.social.unfollow(&alice, &bob).await.unwrap());
        assert!(!f.social.unfollow(&alice, &bob).await.unwrap());
        assert_eq!(f.db.get_profile(&bob).await.unwrap().unwrap().follower_count, 0);
    }
}
