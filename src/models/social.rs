// Comments, follows, likes and drafts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::ContentKind;
use super::profile::ProfileSummary;

/// The content item a comment hangs off. Exactly one parent column is set per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentTarget<'a> {
    pub kind: ContentKind,
    pub id: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub post_id: Option<String>,
    pub image_id: Option<String>,
    pub video_id: Option<String>,
    pub model_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(user_id: &str, target: CommentTarget<'_>, content: String) -> Self {
        let mut comment = Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            content,
            post_id: None,
            image_id: None,
            video_id: None,
            model_id: None,
            created_at: Utc::now(),
        };
        let parent = Some(target.id.to_string());
        match target.kind {
            ContentKind::Post => comment.post_id = parent,
            ContentKind::Image => comment.image_id = parent,
            ContentKind::Video => comment.video_id = parent,
            ContentKind::Model => comment.model_id = parent,
        }
        comment
    }
}

/// Comment joined with its author's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: ProfileSummary,
}

/// A follow relation joined with the profile on the other end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowEdge {
    pub follower_id: String,
    pub following_id: String,
    pub created_at: DateTime<Utc>,
    pub profile: ProfileSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub likes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_sets_exactly_one_parent() {
        let comment = Comment::new(
            "user-1",
            CommentTarget {
                kind: ContentKind::Video,
                id: "video-9",
            },
            "nice render".to_string(),
        );
        assert_eq!(comment.video_id.as_deref(), Some("video-9"));
        assert!(comment.post_id.is_none() && comment.image_id.is_none() && comment.model_id.is_none());
    }
}
