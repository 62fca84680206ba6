// Database Interface - typed access to every table the gallery uses
// Each method maps to one SQL statement (or one short transaction) against the store

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{
    Comment, CommentTarget, CommentWithAuthor, ContentItem, ContentKind, ContentStatus, Counter,
    Draft, FollowEdge, GalleryQuery, Profile, ProfileUpdate, UserRecord,
};

/// Tables holding rows owned by a user, in the order account erasure visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserTable {
    Follows,
    Likes,
    Posts,
    Images,
    Videos,
    AiModels,
    Comments,
    Drafts,
}

impl UserTable {
    pub const ERASE_ORDER: [UserTable; 8] = [
        UserTable::Follows,
        UserTable::Likes,
        UserTable::Posts,
        UserTable::Images,
        UserTable::Videos,
        UserTable::AiModels,
        UserTable::Comments,
        UserTable::Drafts,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            UserTable::Follows => "follows",
            UserTable::Likes => "likes",
            UserTable::Posts => "posts",
            UserTable::Images => "images",
            UserTable::Videos => "videos",
            UserTable::AiModels => "ai_models",
            UserTable::Comments => "comments",
            UserTable::Drafts => "drafts",
        }
    }

    /// WHERE clause selecting the user's rows; binds the user id once per `?`.
    pub fn owner_predicate(&self) -> &'static str {
        match self {
            UserTable::Follows => "follower_id = ? OR following_id = ?",
            _ => "user_id = ?",
        }
    }
}

/// Storage trait for the gallery backend
#[async_trait]
pub trait ContentStore: Send + Sync {
    // Users and profiles
    async fn insert_user(&self, user: &UserRecord, profile: &Profile) -> AppResult<()>;
    async fn get_user(&self, id: &str) -> AppResult<Option<UserRecord>>;
    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<UserRecord>>;
    async fn list_users(&self) -> AppResult<Vec<UserRecord>>;
    async fn get_profile(&self, id: &str) -> AppResult<Option<Profile>>;
    async fn update_profile(&self, id: &str, update: ProfileUpdate) -> AppResult<Option<Profile>>;

    // Content items
    async fn insert_content(&self, item: &ContentItem) -> AppResult<()>;
    async fn get_content(&self, kind: ContentKind, id: &str) -> AppResult<Option<ContentItem>>;
    async fn update_content(&self, item: &ContentItem) -> AppResult<()>;
    async fn delete_content(&self, kind: ContentKind, id: &str) -> AppResult<bool>;
    async fn list_user_content(
        &self,
        kind: ContentKind,
        user_id: &str,
        status: ContentStatus,
    ) -> AppResult<Vec<ContentItem>>;
    async fn query_gallery(&self, query: &GalleryQuery) -> AppResult<Vec<ContentItem>>;
    /// Atomic `counter = counter + delta`; returns the new value.
    async fn increment_counter(
        &self,
        kind: ContentKind,
        id: &str,
        counter: Counter,
        delta: i64,
    ) -> AppResult<i64>;

    // Likes
    async fn insert_like(&self, user_id: &str, kind: ContentKind, content_id: &str) -> AppResult<bool>;
    async fn delete_like(&self, user_id: &str, kind: ContentKind, content_id: &str) -> AppResult<bool>;

    // Comments
    async fn insert_comment(&self, comment: &Comment) -> AppResult<()>;
    async fn list_comments_by_user(&self, user_id: &str) -> AppResult<Vec<CommentWithAuthor>>;
    async fn list_comments_for(&self, target: CommentTarget<'_>) -> AppResult<Vec<CommentWithAuthor>>;

    // Follows
    async fn insert_follow(&self, follower_id: &str, following_id: &str) -> AppResult<bool>;
    async fn delete_follow(&self, follower_id: &str, following_id: &str) -> AppResult<bool>;
    async fn follow_exists(&self, follower_id: &str, following_id: &str) -> AppResult<bool>;
    /// Profiles `user_id` follows.
    async fn list_followings(&self, user_id: &str) -> AppResult<Vec<FollowEdge>>;
    /// Profiles following `user_id`.
    async fn list_followers(&self, user_id: &str) -> AppResult<Vec<FollowEdge>>;

    // Drafts
    async fn upsert_draft(&self, draft: &Draft) -> AppResult<()>;
    async fn get_draft(&self, id: &str) -> AppResult<Option<Draft>>;

    // Erasure
    /// Delete every row of `table` owned by `user_id`. Zero rows is success.
    async fn delete_user_rows(&self, table: UserTable, user_id: &str) -> AppResult<u64>;
    /// Delete the profile and credential rows together. Returns whether anything existed.
    async fn delete_account_record(&self, user_id: &str) -> AppResult<bool>;
}
