// Object storage - named buckets with public URLs

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// Images embedded in post bodies
    Posts,
    /// Generated image outputs
    OutputImage,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Posts => "posts",
            Bucket::OutputImage => "outputimage",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posts" => Ok(Bucket::Posts),
            "outputimage" => Ok(Bucket::OutputImage),
            _ => Err(AppError::Validation(format!("Unknown bucket: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredObject {
    pub bucket: Bucket,
    pub path: String,
    pub size: u64,
    pub content_type: String,
    pub public_url: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> AppResult<StoredObject>;
    fn public_url(&self, bucket: Bucket, path: &str) -> String;
    async fn remove(&self, bucket: Bucket, path: &str) -> AppResult<bool>;
}

/// Media types accepted into buckets, with the file extensions each may carry.
/// The first extension is the one given to committed previews.
const MEDIA_TYPES: &[(&str, &[&str])] = &[
    ("image/png", &["png"]),
    ("image/jpeg", &["jpg", "jpeg"]),
    ("image/webp", &["webp"]),
    ("image/gif", &["gif"]),
    ("video/mp4", &["mp4"]),
    ("video/webm", &["webm"]),
];

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

fn media_extensions(content_type: &str) -> Option<&'static [&'static str]> {
    let essence = essence(content_type);
    MEDIA_TYPES
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, extensions)| *extensions)
}

/// Canonical extension for an accepted media type.
pub fn media_extension(content_type: &str) -> AppResult<&'static str> {
    media_extensions(content_type)
        .and_then(|extensions| extensions.first().copied())
        .ok_or_else(|| AppError::Validation(format!("Unsupported media type: {}", content_type)))
}

/// Whether a served object may render inline in the browser.
pub fn is_inline_media(content_type: &str) -> bool {
    media_extensions(content_type).is_some()
}

/// Uploads must be an accepted image or video type whose file extension matches it.
pub fn validate_media_upload(file_name: &str, content_type: &str) -> AppResult<()> {
    let extensions = media_extensions(content_type)
        .ok_or_else(|| AppError::Validation(format!("Unsupported media type: {}", content_type)))?;
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !extensions.contains(&extension.as_str()) {
        return Err(AppError::Validation(format!(
            "File name {} does not match {}",
            file_name, content_type
        )));
    }
    Ok(())
}

/// Rejects anything that could escape the bucket directory.
pub fn validate_object_path(path: &str) -> AppResult<()> {
    if path.is_empty() {
        return Err(AppError::Validation("Object path is empty".to_string()));
    }
    let candidate = Path::new(path);
    let clean = candidate
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    if !clean {
        return Err(AppError::Validation(format!("Invalid object path: {}", path)));
    }
    Ok(())
}

/// Filesystem-backed store: `<root>/<bucket>/<path>`, served under `/storage`.
pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: Bucket, path: &str) -> AppResult<PathBuf> {
        validate_object_path(path)?;
        Ok(self.root.join(bucket.as_str()).join(path))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> AppResult<StoredObject> {
        let target = self.object_path(bucket, path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::StorageError(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        tokio::fs::write(&target, bytes).await.map_err(|e| {
            AppError::StorageError(format!("Failed to write {}: {}", target.display(), e))
        })?;

        tracing::info!(bucket = %bucket, path, size = bytes.len(), "Stored object");

        Ok(StoredObject {
            bucket,
            path: path.to_string(),
            size: bytes.len() as u64,
            content_type: content_type.to_string(),
            public_url: self.public_url(bucket, path),
        })
    }

    fn public_url(&self, bucket: Bucket, path: &str) -> String {
        format!("{}/storage/{}/{}", self.public_base_url, bucket, path)
    }

    async fn remove(&self, bucket: Bucket, path: &str) -> AppResult<bool> {
        let target = self.object_path(bucket, path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::StorageError(format!(
                "Failed to remove {}: {}",
                target.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_writes_under_bucket_and_builds_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "https://cdn.example.com/");

        let stored = store
            .upload(Bucket::OutputImage, "u1/render.png", b"png-bytes", "image/png")
            .await
            .unwrap();

        assert_eq!(stored.size, 9);
        assert_eq!(
            stored.public_url,
            "https://cdn.example.com/storage/outputimage/u1/render.png"
        );
        let on_disk = std::fs::read(dir.path().join("outputimage/u1/render.png")).unwrap();
        assert_eq!(on_disk, b"png-bytes");

        assert!(store.remove(Bucket::OutputImage, "u1/render.png").await.unwrap());
        assert!(!store.remove(Bucket::OutputImage, "u1/render.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_traversal_paths_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "http://localhost");

        for bad in ["../escape.png", "/etc/passwd", "a/../../b", ""] {
            let result = store.upload(Bucket::Posts, bad, b"x", "text/plain").await;
            assert!(matches!(result, Err(AppError::Validation(_))), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_bucket_names() {
        assert_eq!("outputimage".parse::<Bucket>().unwrap(), Bucket::OutputImage);
        assert!("avatars".parse::<Bucket>().is_err());
    }
}
