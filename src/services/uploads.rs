// Upload flow: stage an image as a preview, then commit it to a bucket

use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::infrastructure::storage::{
    media_extension, validate_media_upload, validate_object_path, Bucket, ObjectStore, StoredObject,
};
use crate::services::preview_registry::PreviewRegistry;

#[derive(Clone)]
pub struct UploadService {
    storage: Arc<dyn ObjectStore>,
    previews: PreviewRegistry,
}

impl UploadService {
    pub fn new(storage: Arc<dyn ObjectStore>, previews: PreviewRegistry) -> Self {
        Self { storage, previews }
    }

    pub fn stage(&self, owner_id: &str, content_type: &str, bytes: Vec<u8>) -> AppResult<String> {
        self.previews.create(owner_id, content_type, bytes)
    }

    /// Upload a staged preview under `<owner>/<uuid>.<ext>`. The preview stays live if the
    /// upload fails so the client can retry.
    pub async fn commit(&self, owner_id: &str, preview_url: &str, bucket: Bucket) -> AppResult<StoredObject> {
        let preview = self
            .previews
            .get(preview_url)
            .ok_or_else(|| AppError::NotFound(format!("Preview {} not found", preview_url)))?;
        if preview.owner_id != owner_id {
            return Err(AppError::Forbidden("Preview belongs to another user".to_string()));
        }

        let path = format!(
            "{}/{}.{}",
            owner_id,
            uuid::Uuid::new_v4(),
            media_extension(&preview.content_type)?
        );
        let stored = self
            .storage
            .upload(bucket, &path, &preview.bytes, &preview.content_type)
            .await?;

        self.previews.revoke(preview_url);
        info!(owner_id, bucket = %bucket, path = %stored.path, "Committed preview");
        Ok(stored)
    }

    /// Direct upload without staging, e.g. images pasted into a post body.
    pub async fn upload(
        &self,
        owner_id: &str,
        bucket: Bucket,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> AppResult<StoredObject> {
        validate_object_path(file_name)?;
        validate_media_upload(file_name, content_type)?;
        let path = format!("{}/{}", owner_id, file_name);
        self.storage.upload(bucket, &path, bytes, content_type).await
    }

    /// Objects live under their owner's prefix; anything else is off limits.
    pub async fn remove(&self, owner_id: &str, bucket: Bucket, path: &str) -> AppResult<bool> {
        validate_object_path(path)?;
        let owned = path
            .split_once('/')
            .map(|(prefix, rest)| prefix == owner_id && !rest.is_empty())
            .unwrap_or(false);
        if !owned {
            return Err(AppError::Forbidden(format!("{}/{} is not yours", bucket, path)));
        }
        self.storage.remove(bucket, path).await
    }
}
