// Local preview handles for staged uploads
//
// A preview URL is created when an image is staged and released exactly once: on explicit
// removal, when it is committed to a bucket, or when its owner's session is torn down.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{AppError, AppResult};

pub const PREVIEW_SCHEME: &str = "preview:";
pub const MAX_PREVIEW_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Preview {
    pub url: String,
    pub owner_id: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PreviewStats {
    pub created: u64,
    pub revoked: u64,
    pub live: usize,
}

#[derive(Default)]
struct RegistryState {
    live: HashMap<String, Preview>,
    created: u64,
    revoked: u64,
}

impl RegistryState {
    fn release(&mut self, url: &str) -> Option<Preview> {
        let preview = self.live.remove(url)?;
        self.revoked += 1;
        Some(preview)
    }
}

#[derive(Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<Mutex<RegistryState>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create(&self, owner_id: &str, content_type: &str, bytes: Vec<u8>) -> AppResult<String> {
        if !content_type.starts_with("image/") {
            return Err(AppError::Validation(format!(
                "Only images can be previewed, got {}",
                content_type
            )));
        }
        if bytes.is_empty() {
            return Err(AppError::Validation("Empty upload".to_string()));
        }
        if bytes.len() > MAX_PREVIEW_BYTES {
            return Err(AppError::Validation(format!(
                "Preview exceeds {} bytes",
                MAX_PREVIEW_BYTES
            )));
        }

        let url = format!("{}{}", PREVIEW_SCHEME, uuid::Uuid::new_v4());
        let preview = Preview {
            url: url.clone(),
            owner_id: owner_id.to_string(),
            content_type: content_type.to_string(),
            bytes,
            created_at: Utc::now(),
        };

        let mut state = self.state();
        state.live.insert(url.clone(), preview);
        state.created += 1;
        Ok(url)
    }

    pub fn get(&self, url: &str) -> Option<Preview> {
        self.state().live.get(url).cloned()
    }

    /// Release a preview. Returns `false` if it was already released.
    pub fn revoke(&self, url: &str) -> bool {
        self.state().release(url).is_some()
    }

    pub fn revoke_owned_by(&self, owner_id: &str) -> usize {
        let mut state = self.state();
        let urls: Vec<String> = state
            .live
            .values()
            .filter(|preview| preview.owner_id == owner_id)
            .map(|preview| preview.url.clone())
            .collect();
        for url in &urls {
            state.release(url);
        }
        urls.len()
    }

    pub fn revoke_all(&self) -> usize {
        let mut state = self.state();
        let count = state.live.len();
        state.live.clear();
        state.revoked += count as u64;
        count
    }

    pub fn stats(&self) -> PreviewStats {
        let state = self.state();
        PreviewStats {
            created: state.created,
            revoked: state.revoked,
            live: state.live.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png() -> Vec<u8> {
        vec![0x89, b'P', b'N', b'G']
    }

    #[test]
    fn test_each_url_is_revoked_exactly_once() {
        let registry = PreviewRegistry::new();
        let a = registry.create("u1", "image/png", png()).unwrap();
        let b = registry.create("u1", "image/png", png()).unwrap();
        let c = registry.create("u2", "image/webp", png()).unwrap();

        // removal path
        assert!(registry.revoke(&a));
        assert!(!registry.revoke(&a));

        // commit path
        assert_eq!(registry.get(&b).unwrap().content_type, "image/png");
        assert!(registry.revoke(&b));
        assert!(registry.get(&b).is_none());

        // teardown path
        assert_eq!(registry.revoke_all(), 1);
        assert!(!registry.revoke(&c));

        let stats = registry.stats();
        assert_eq!(stats.created, 3);
        assert_eq!(stats.revoked, 3);
        assert_eq!(stats.live, 0);
    }

    #[test]
    fn test_revoke_owned_by_only_touches_that_owner() {
        let registry = PreviewRegistry::new();
        registry.create("u1", "image/png", png()).unwrap();
        registry.create("u1", "image/png", png()).unwrap();
        let keep = registry.create("u2", "image/png", png()).unwrap();

        assert_eq!(registry.revoke_owned_by("u1"), 2);
        assert_eq!(registry.revoke_owned_by("u1"), 0);
        assert!(registry.get(&keep).is_some());
        assert_eq!(registry.stats().revoked, 2);
    }

    #[test]
    fn test_rejects_non_images_and_empty_payloads() {
        let registry = PreviewRegistry::new();
        assert!(registry.create("u1", "text/html", png()).is_err());
        assert!(registry.create("u1", "image/png", Vec::new()).is_err());
        assert_eq!(registry.stats().created, 0);
    }
}
