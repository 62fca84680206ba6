// Gallery listings - one content table, optional category and media-type filters

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::ContentStore;
use crate::models::{Category, ContentItem, GalleryQuery};

#[derive(Clone)]
pub struct GalleryService {
    store: Arc<dyn ContentStore>,
}

impl GalleryService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Published items of `query.kind`, newest first. Backend failures are logged with the
    /// query that caused them and surfaced as a generic "Failed to load gallery".
    pub async fn list(&self, query: &GalleryQuery) -> AppResult<Vec<ContentItem>> {
        match self.store.query_gallery(query).await {
            Ok(items) => {
                debug!(kind = %query.kind, count = items.len(), "Gallery loaded");
                Ok(items)
            }
            Err(e) => {
                let category = match &query.category {
                    Category::All => Category::ALL_SENTINEL,
                    Category::Named(name) => name.as_str(),
                };
                error!(
                    kind = %query.kind,
                    table = query.kind.table(),
                    category,
                    media_type = ?query.media_type,
                    error = %e,
                    "Gallery query failed"
                );
                Err(AppError::ServiceUnavailable("Failed to load gallery".to_string()))
            }
        }
    }
}

/// Keep items carrying at least one of `selected`. An empty selection keeps everything.
pub fn filter_by_tags(items: Vec<ContentItem>, selected: &[String]) -> Vec<ContentItem> {
    if selected.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| item.has_any_tag(selected))
        .collect()
}

/// Distinct tags across `items`, sorted.
pub fn available_tags(items: &[ContentItem]) -> Vec<String> {
    items
        .iter()
        .flat_map(|item| item.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
