// Content items - posts, images, videos and models share one row shape

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// The four kinds of user-authored content, each backed by its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Post,
    Image,
    Video,
    Model,
}

impl ContentKind {
    pub const ALL: [ContentKind; 4] = [
        ContentKind::Post,
        ContentKind::Image,
        ContentKind::Video,
        ContentKind::Model,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Post => "post",
            ContentKind::Image => "image",
            ContentKind::Video => "video",
            ContentKind::Model => "model",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            ContentKind::Post => "posts",
            ContentKind::Image => "images",
            ContentKind::Video => "videos",
            ContentKind::Model => "ai_models",
        }
    }

    /// Column on `comments` pointing at this kind of parent.
    pub fn comment_column(&self) -> &'static str {
        match self {
            ContentKind::Post => "post_id",
            ContentKind::Image => "image_id",
            ContentKind::Video => "video_id",
            ContentKind::Model => "model_id",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = AppError;

    // Path segments use the plural table-ish names, JSON bodies the singular ones.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "post" | "posts" => Ok(ContentKind::Post),
            "image" | "images" => Ok(ContentKind::Image),
            "video" | "videos" => Ok(ContentKind::Video),
            "model" | "models" | "ai_models" => Ok(ContentKind::Model),
            _ => Err(AppError::Validation(format!("Unknown content kind: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Draft,
    #[default]
    Published,
    Archived,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }
}

impl FromStr for ContentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ContentStatus::Draft),
            "published" => Ok(ContentStatus::Published),
            "archived" => Ok(ContentStatus::Archived),
            _ => Err(AppError::Validation(format!("Unknown content status: {}", s))),
        }
    }
}

/// Counter columns shared by every content table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Likes,
    Views,
    Comments,
    Downloads,
}

impl Counter {
    pub fn column(&self) -> &'static str {
        match self {
            Counter::Likes => "likes",
            Counter::Views => "views",
            Counter::Comments => "comments",
            Counter::Downloads => "downloads",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub kind: ContentKind,
    pub user_id: String,
    pub title: String,
    pub body: Option<String>,
    pub media_url: Option<String>,
    pub category: String,
    pub media_type: Option<String>,
    pub tags: Vec<String>,
    pub likes: i64,
    pub views: i64,
    pub comments: i64,
    pub downloads: i64,
    pub status: ContentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    pub fn has_any_tag(&self, selected: &[String]) -> bool {
        self.tags.iter().any(|tag| selected.contains(tag))
    }
}

/// Payload for creating a content item.
#[derive(Debug, Clone, Deserialize)]
pub struct NewContent {
    pub title: String,
    pub body: Option<String>,
    pub media_url: Option<String>,
    pub category: String,
    pub media_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: ContentStatus,
}

/// Owner-side edit; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub media_url: Option<String>,
    pub category: Option<String>,
    pub media_type: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<ContentStatus>,
}

impl ContentPatch {
    pub fn apply(self, item: &mut ContentItem) {
        if let Some(title) = self.title {
            item.title = title;
        }
        if let Some(body) = self.body {
            item.body = Some(body);
        }
        if let Some(media_url) = self.media_url {
            item.media_url = Some(media_url);
        }
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(media_type) = self.media_type {
            item.media_type = Some(media_type);
        }
        if let Some(tags) = self.tags {
            item.tags = tags;
        }
        if let Some(status) = self.status {
            item.status = status;
        }
    }
}

/// Category filter for gallery listings. `ALL` disables the category predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    All,
    Named(String),
}

impl Category {
    pub const ALL_SENTINEL: &'static str = "ALL";

    pub fn parse(raw: &str) -> Self {
        if raw == Self::ALL_SENTINEL {
            Category::All
        } else {
            Category::Named(raw.to_string())
        }
    }
}

/// An equality predicate applied by a gallery query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub column: &'static str,
    pub value: String,
}

/// Single-table gallery query, newest first, no limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryQuery {
    pub kind: ContentKind,
    pub category: Category,
    pub media_type: Option<String>,
}

impl GalleryQuery {
    pub fn new(kind: ContentKind) -> Self {
        Self {
            kind,
            category: Category::All,
            media_type: None,
        }
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// The equality predicates this query applies, in the order they are bound.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Category::Named(category) = &self.category {
            predicates.push(Predicate {
                column: "category",
                value: category.clone(),
            });
        }
        if let Some(media_type) = &self.media_type {
            predicates.push(Predicate {
                column: "media_type",
                value: media_type.clone(),
            });
        }
        predicates
    }
}
