use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{Sqlite, SqlitePool, SqlitePoolOptions, SqliteRow},
    QueryBuilder, Row,
};

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{ContentStore, UserTable};
use crate::models::{
    Comment, CommentTarget, CommentWithAuthor, ContentItem, ContentKind, ContentStatus, Counter,
    Draft, FollowEdge, GalleryQuery, Profile, ProfileSummary, ProfileUpdate, UserRecord,
};

const CONTENT_COLUMNS: &str = "id, user_id, title, body, media_url, category, media_type, tags, \
     likes, views, comments, downloads, status, created_at, updated_at";

const PROFILE_SELECT: &str = r#"
    SELECT p.id, p.username, p.email, p.avatar_url, p.bio, p.created_at,
        (SELECT COUNT(*) FROM follows f WHERE f.following_id = p.id) AS follower_count,
        (SELECT COUNT(*) FROM follows f WHERE f.follower_id = p.id) AS following_count
    FROM profiles p
"#;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.user_id, c.content, c.post_id, c.image_id, c.video_id, c.model_id,
        c.created_at, p.username AS author_username, p.avatar_url AS author_avatar_url
    FROM comments c
    LEFT JOIN profiles p ON p.id = c.user_id
"#;

fn decode_err(e: sqlx::Error) -> AppError {
    AppError::DatabaseError(format!("Failed to decode row: {}", e))
}

/// Unique-key violations become `Conflict`; everything else is a database error.
fn write_err(context: &str, e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("{}: already exists", context))
        }
        _ => AppError::DatabaseError(format!("{}: {}", context, e)),
    }
}

fn content_from_row(kind: ContentKind, row: &SqliteRow) -> AppResult<ContentItem> {
    let tags_raw: String = row.try_get("tags").map_err(decode_err)?;
    let tags: Vec<String> = serde_json::from_str(&tags_raw).map_err(|e| {
        AppError::DatabaseError(format!("Malformed tags column {:?}: {}", tags_raw, e))
    })?;
    let status: String = row.try_get("status").map_err(decode_err)?;

    Ok(ContentItem {
        id: row.try_get("id").map_err(decode_err)?,
        kind,
        user_id: row.try_get("user_id").map_err(decode_err)?,
        title: row.try_get("title").map_err(decode_err)?,
        body: row.try_get("body").map_err(decode_err)?,
        media_url: row.try_get("media_url").map_err(decode_err)?,
        category: row.try_get("category").map_err(decode_err)?,
        media_type: row.try_get("media_type").map_err(decode_err)?,
        tags,
        likes: row.try_get("likes").map_err(decode_err)?,
        views: row.try_get("views").map_err(decode_err)?,
        comments: row.try_get("comments").map_err(decode_err)?,
        downloads: row.try_get("downloads").map_err(decode_err)?,
        status: status.parse()?,
        created_at: row.try_get("created_at").map_err(decode_err)?,
        updated_at: row.try_get("updated_at").map_err(decode_err)?,
    })
}

fn profile_from_row(row: &SqliteRow) -> AppResult<Profile> {
    Ok(Profile {
        id: row.try_get("id").map_err(decode_err)?,
        username: row.try_get("username").map_err(decode_err)?,
        email: row.try_get("email").map_err(decode_err)?,
        avatar_url: row.try_get("avatar_url").map_err(decode_err)?,
        bio: row.try_get("bio").map_err(decode_err)?,
        follower_count: row.try_get("follower_count").map_err(decode_err)?,
        following_count: row.try_get("following_count").map_err(decode_err)?,
        created_at: row.try_get("created_at").map_err(decode_err)?,
    })
}

fn user_from_row(row: &SqliteRow) -> AppResult<UserRecord> {
    Ok(UserRecord {
        id: row.try_get("id").map_err(decode_err)?,
        email: row.try_get("email").map_err(decode_err)?,
        password_hash: row.try_get("password_hash").map_err(decode_err)?,
        created_at: row.try_get("created_at").map_err(decode_err)?,
    })
}

fn comment_from_row(row: &SqliteRow) -> AppResult<CommentWithAuthor> {
    let comment = Comment {
        id: row.try_get("id").map_err(decode_err)?,
        user_id: row.try_get("user_id").map_err(decode_err)?,
        content: row.try_get("content").map_err(decode_err)?,
        post_id: row.try_get("post_id").map_err(decode_err)?,
        image_id: row.try_get("image_id").map_err(decode_err)?,
        video_id: row.try_get("video_id").map_err(decode_err)?,
        model_id: row.try_get("model_id").map_err(decode_err)?,
        created_at: row.try_get("created_at").map_err(decode_err)?,
    };
    let author = ProfileSummary {
        id: comment.user_id.clone(),
        username: row.try_get("author_username").map_err(decode_err)?,
        avatar_url: row.try_get("author_avatar_url").map_err(decode_err)?,
    };
    Ok(CommentWithAuthor { comment, author })
}

fn follow_edge_from_row(row: &SqliteRow, other_column: &str) -> AppResult<FollowEdge> {
    let follower_id: String = row.try_get("follower_id").map_err(decode_err)?;
    let following_id: String = row.try_get("following_id").map_err(decode_err)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode_err)?;
    Ok(FollowEdge {
        profile: ProfileSummary {
            id: row.try_get(other_column).map_err(decode_err)?,
            username: row.try_get("username").map_err(decode_err)?,
            avatar_url: row.try_get("avatar_url").map_err(decode_err)?,
        },
        follower_id,
        following_id,
        created_at,
    })
}

fn draft_from_row(row: &SqliteRow) -> AppResult<Draft> {
    Ok(Draft {
        id: row.try_get("id").map_err(decode_err)?,
        user_id: row.try_get("user_id").map_err(decode_err)?,
        title: row.try_get("title").map_err(decode_err)?,
        body: row.try_get("body").map_err(decode_err)?,
        updated_at: row.try_get("updated_at").map_err(decode_err)?,
    })
}

/// SQLite implementation of the content store
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub async fn connect(url: &str, max_connections: u32) -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to {}: {}", url, e)))?;

        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    /// Single-connection in-memory database; every pooled connection would otherwise get its
    /// own empty database.
    pub async fn new_in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;

        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Database health check failed: {}", e)))?;
        Ok(())
    }

    /// Create every table and index if missing
    pub async fn initialize(&self) -> AppResult<()> {
        let mut statements = vec![
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#
            .to_string(),
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL,
                avatar_url TEXT,
                bio TEXT,
                created_at TEXT NOT NULL
            )
            "#
            .to_string(),
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                content TEXT NOT NULL,
                post_id TEXT,
                image_id TEXT,
                video_id TEXT,
                model_id TEXT,
                created_at TEXT NOT NULL
            )
            "#
            .to_string(),
            "CREATE INDEX IF NOT EXISTS idx_comments_user ON comments(user_id)".to_string(),
            r#"
            CREATE TABLE IF NOT EXISTS follows (
                follower_id TEXT NOT NULL,
                following_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (follower_id, following_id)
            )
            "#
            .to_string(),
            "CREATE INDEX IF NOT EXISTS idx_follows_following ON follows(following_id)".to_string(),
            r#"
            CREATE TABLE IF NOT EXISTS likes (
                user_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                content_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (user_id, kind, content_id)
            )
            "#
            .to_string(),
            r#"
            CREATE TABLE IF NOT EXISTS drafts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#
            .to_string(),
        ];

        for kind in ContentKind::ALL {
            let table = kind.table();
            statements.push(format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    title TEXT NOT NULL,
                    body TEXT,
                    media_url TEXT,
                    category TEXT NOT NULL,
                    media_type TEXT,
                    tags TEXT NOT NULL DEFAULT '[]',
                    likes INTEGER NOT NULL DEFAULT 0,
                    views INTEGER NOT NULL DEFAULT 0,
                    comments INTEGER NOT NULL DEFAULT 0,
                    downloads INTEGER NOT NULL DEFAULT 0,
                    status TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )
                "#
            ));
            statements.push(format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_user ON {table}(user_id, status)"
            ));
            statements.push(format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_category ON {table}(category, created_at DESC)"
            ));
        }

        for statement in statements {
            sqlx::query(&statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to initialize schema: {}", e)))?;
        }

        tracing::info!("Gallery schema initialized");
        Ok(())
    }
}

#[async_trait]
impl ContentStore for SqliteDatabase {
    async fn insert_user(&self, user: &UserRecord, profile: &Profile) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

        sqlx::query("INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)")
            .bind(&user.id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| write_err("User with this email", e))?;

        sqlx::query(
            "INSERT INTO profiles (id, username, email, avatar_url, bio, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&profile.id)
        .bind(&profile.username)
        .bind(&profile.email)
        .bind(&profile.avatar_url)
        .bind(&profile.bio)
        .bind(profile.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_err("Profile with this username", e))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit user insert: {}", e)))
    }

    async fn get_user(&self, id: &str) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query("SELECT id, email, password_hash, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get user {}: {}", id, e)))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let row =
            sqlx::query("SELECT id, email, password_hash, created_at FROM users WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to get user by email: {}", e)))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list_users(&self) -> AppResult<Vec<UserRecord>> {
        let rows = sqlx::query(
            "SELECT id, email, password_hash, created_at FROM users ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list users: {}", e)))?;
        rows.iter().map(user_from_row).collect()
    }

    async fn get_profile(&self, id: &str) -> AppResult<Option<Profile>> {
        let row = sqlx::query(&format!("{} WHERE p.id = ?", PROFILE_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get profile {}: {}", id, e)))?;
        row.as_ref().map(profile_from_row).transpose()
    }

    async fn update_profile(&self, id: &str, update: ProfileUpdate) -> AppResult<Option<Profile>> {
        let result = sqlx::query(
            r#"
            UPDATE profiles SET
                username = COALESCE(?1, username),
                avatar_url = CASE WHEN ?2 IS NULL THEN avatar_url ELSE NULLIF(TRIM(?2), '') END,
                bio = CASE WHEN ?3 IS NULL THEN bio ELSE NULLIF(TRIM(?3), '') END
            WHERE id = ?4
            "#,
        )
        .bind(update.username)
        .bind(update.avatar_url)
        .bind(update.bio)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| write_err("Profile with this username", e))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_profile(id).await
    }

    async fn insert_content(&self, item: &ContentItem) -> AppResult<()> {
        let tags = serde_json::to_string(&item.tags)
            .map_err(|e| AppError::Internal(format!("Failed to encode tags: {}", e)))?;

        sqlx::query(&format!(
            "INSERT INTO {} ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            item.kind.table(),
            CONTENT_COLUMNS
        ))
        .bind(&item.id)
        .bind(&item.user_id)
        .bind(&item.title)
        .bind(&item.body)
        .bind(&item.media_url)
        .bind(&item.category)
        .bind(&item.media_type)
        .bind(tags)
        .bind(item.likes)
        .bind(item.views)
        .bind(item.comments)
        .bind(item.downloads)
        .bind(item.status.as_str())
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_err(&format!("{} {}", item.kind, item.id), e))?;
        Ok(())
    }

    async fn get_content(&self, kind: ContentKind, id: &str) -> AppResult<Option<ContentItem>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE id = ?",
            CONTENT_COLUMNS,
            kind.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to get {} {}: {}", kind, id, e)))?;

        row.map(|row| content_from_row(kind, &row)).transpose()
    }

    async fn update_content(&self, item: &ContentItem) -> AppResult<()> {
        let tags = serde_json::to_string(&item.tags)
            .map_err(|e| AppError::Internal(format!("Failed to encode tags: {}", e)))?;

        let result = sqlx::query(&format!(
            r#"
            UPDATE {} SET title = ?, body = ?, media_url = ?, category = ?, media_type = ?,
                tags = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
            item.kind.table()
        ))
        .bind(&item.title)
        .bind(&item.body)
        .bind(&item.media_url)
        .bind(&item.category)
        .bind(&item.media_type)
        .bind(tags)
        .bind(item.status.as_str())
        .bind(item.updated_at)
        .bind(&item.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to update {} {}: {}", item.kind, item.id, e))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} {} not found", item.kind, item.id)));
        }
        Ok(())
    }

    async fn delete_content(&self, kind: ContentKind, id: &str) -> AppResult<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", kind.table()))
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete {} {}: {}", kind, id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_user_content(
        &self,
        kind: ContentKind,
        user_id: &str,
        status: ContentStatus,
    ) -> AppResult<Vec<ContentItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE user_id = ? AND status = ? ORDER BY created_at DESC, rowid DESC",
            CONTENT_COLUMNS,
            kind.table()
        ))
        .bind(user_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to list {} rows for {}: {}", kind, user_id, e))
        })?;

        rows.iter().map(|row| content_from_row(kind, row)).collect()
    }

    async fn query_gallery(&self, query: &GalleryQuery) -> AppResult<Vec<ContentItem>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM {} WHERE status = ",
            CONTENT_COLUMNS,
            query.kind.table()
        ));
        qb.push_bind(ContentStatus::Published.as_str());

        for predicate in query.predicates() {
            qb.push(format!(" AND {} = ", predicate.column));
            qb.push_bind(predicate.value);
        }

        qb.push(" ORDER BY created_at DESC, rowid DESC");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to query gallery: {}", e)))?;

        rows.iter()
            .map(|row| content_from_row(query.kind, row))
            .collect()
    }

    async fn increment_counter(
        &self,
        kind: ContentKind,
        id: &str,
        counter: Counter,
        delta: i64,
    ) -> AppResult<i64> {
        let column = counter.column();
        let row = sqlx::query(&format!(
            "UPDATE {table} SET {column} = MAX({column} + ?, 0) WHERE id = ? RETURNING {column}",
            table = kind.table(),
        ))
        .bind(delta)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to bump {} on {} {}: {}", column, kind, id, e))
        })?;

        match row {
            Some(row) => row.try_get::<i64, _>(0).map_err(decode_err),
            None => Err(AppError::NotFound(format!("{} {} not found", kind, id))),
        }
    }

    async fn insert_like(&self, user_id: &str, kind: ContentKind, content_id: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO likes (user_id, kind, content_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(content_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert like: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_like(&self, user_id: &str, kind: ContentKind, content_id: &str) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM likes WHERE user_id = ? AND kind = ? AND content_id = ?")
                .bind(user_id)
                .bind(kind.as_str())
                .bind(content_id)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to delete like: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_comment(&self, comment: &Comment) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, user_id, content, post_id, image_id, video_id, model_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.user_id)
        .bind(&comment.content)
        .bind(&comment.post_id)
        .bind(&comment.image_id)
        .bind(&comment.video_id)
        .bind(&comment.model_id)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert comment: {}", e)))?;
        Ok(())
    }

    async fn list_comments_by_user(&self, user_id: &str) -> AppResult<Vec<CommentWithAuthor>> {
        let rows = sqlx::query(&format!(
            "{} WHERE c.user_id = ? ORDER BY c.created_at DESC, c.rowid DESC",
            COMMENT_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list comments by {}: {}", user_id, e)))?;
        rows.iter().map(comment_from_row).collect()
    }

    async fn list_comments_for(&self, target: CommentTarget<'_>) -> AppResult<Vec<CommentWithAuthor>> {
        let rows = sqlx::query(&format!(
            "{} WHERE c.{} = ? ORDER BY c.created_at ASC, c.rowid ASC",
            COMMENT_SELECT,
            target.kind.comment_column()
        ))
        .bind(target.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!(
                "Failed to list comments on {} {}: {}",
                target.kind, target.id, e
            ))
        })?;
        rows.iter().map(comment_from_row).collect()
    }

    async fn insert_follow(&self, follower_id: &str, following_id: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO follows (follower_id, following_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(follower_id)
        .bind(following_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert follow: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_follow(&self, follower_id: &str, following_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND following_id = ?")
            .bind(follower_id)
            .bind(following_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete follow: {}", e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn follow_exists(&self, follower_id: &str, following_id: &str) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM follows WHERE follower_id = ? AND following_id = ?")
            .bind(follower_id)
            .bind(following_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to check follow: {}", e)))?;
        Ok(row.is_some())
    }

    async fn list_followings(&self, user_id: &str) -> AppResult<Vec<FollowEdge>> {
        let rows = sqlx::query(
            r#"
            SELECT f.follower_id, f.following_id, f.created_at, p.username, p.avatar_url
            FROM follows f
            LEFT JOIN profiles p ON p.id = f.following_id
            WHERE f.follower_id = ?
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list followings: {}", e)))?;
        rows.iter()
            .map(|row| follow_edge_from_row(row, "following_id"))
            .collect()
    }

    async fn list_followers(&self, user_id: &str) -> AppResult<Vec<FollowEdge>> {
        let rows = sqlx::query(
            r#"
            SELECT f.follower_id, f.following_id, f.created_at, p.username, p.avatar_url
            FROM follows f
            LEFT JOIN profiles p ON p.id = f.follower_id
            WHERE f.following_id = ?
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list followers: {}", e)))?;
        rows.iter()
            .map(|row| follow_edge_from_row(row, "follower_id"))
            .collect()
    }

    async fn upsert_draft(&self, draft: &Draft) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO drafts (id, user_id, title, body, updated_at) VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                body = excluded.body,
                updated_at = excluded.updated_at
            WHERE drafts.user_id = excluded.user_id
            "#,
        )
        .bind(&draft.id)
        .bind(&draft.user_id)
        .bind(&draft.title)
        .bind(&draft.body)
        .bind(draft.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to save draft {}: {}", draft.id, e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Forbidden(format!(
                "Draft {} belongs to another user",
                draft.id
            )));
        }
        Ok(())
    }

    async fn get_draft(&self, id: &str) -> AppResult<Option<Draft>> {
        let row = sqlx::query("SELECT id, user_id, title, body, updated_at FROM drafts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get draft {}: {}", id, e)))?;
        row.as_ref().map(draft_from_row).transpose()
    }

    async fn delete_user_rows(&self, table: UserTable, user_id: &str) -> AppResult<u64> {
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            table.name(),
            table.owner_predicate()
        );
        let mut query = sqlx::query(&sql).bind(user_id);
        if table == UserTable::Follows {
            query = query.bind(user_id);
        }

        let result = query.execute(&self.pool).await.map_err(|e| {
            AppError::DatabaseError(format!(
                "Failed to delete {} rows for {}: {}",
                table.name(),
                user_id,
                e
            ))
        })?;
        Ok(result.rows_affected())
    }

    async fn delete_account_record(&self, user_id: &str) -> AppResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

        let profiles = sqlx::query("DELETE FROM profiles WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete profile {}: {}", user_id, e)))?;

        let users = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete user {}: {}", user_id, e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit account delete: {}", e)))?;

        Ok(profiles.rows_affected() + users.rows_affected() > 0)
    }
}
