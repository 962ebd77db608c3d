//! Storage Provider
//!
//! The external storage seam and a filesystem-backed implementation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;

/// Storage error
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bucket not found: {0}")]
    BucketNotFound(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("object already exists: {0}")]
    AlreadyExists(String),
    #[error("provider error: {0}")]
    Provider(String),
}

/// Access policy applied when a bucket is created.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketPolicy {
    /// Whether objects are publicly readable.
    pub public: bool,
    /// Per-object byte ceiling.
    pub max_bytes: u64,
    /// Allowed MIME types for uploads into the bucket.
    pub allowed_mime_types: Vec<String>,
}

/// Per-upload options.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Content type recorded with the object.
    pub content_type: String,
    /// Overwrite an existing object at the same path.
    pub upsert: bool,
}

/// Contract with the external storage provider.
///
/// The upload pipeline is the sole consumer; nothing else in the engine
/// talks to storage directly.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    async fn bucket_exists(&self, name: &str) -> Result<bool, StorageError>;

    async fn create_bucket(&self, name: &str, policy: BucketPolicy) -> Result<(), StorageError>;

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        options: &StoreOptions,
    ) -> Result<(), StorageError>;

    async fn get_public_url(&self, bucket: &str, path: &str) -> Result<String, StorageError>;

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), StorageError>;
}

/// Filesystem-backed provider: buckets are directories under a root.
///
/// Stands in for a hosted object store during development and tests; the
/// public URL is derived from a configured base, which may be
/// protocol-relative the way CDN-fronted providers return it.
pub struct FsStorage {
    root: PathBuf,
    base_url: String,
    policies: Arc<RwLock<HashMap<String, BucketPolicy>>>,
}

impl FsStorage {
    pub fn new(root: PathBuf, base_url: impl Into<String>) -> Self {
        Self {
            root,
            base_url: base_url.into(),
            policies: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn object_path(&self, bucket: &str, path: &str) -> PathBuf {
        self.root.join(bucket).join(path)
    }
}

#[async_trait]
impl StorageProvider for FsStorage {
    async fn bucket_exists(&self, name: &str) -> Result<bool, StorageError> {
        match fs::metadata(self.root.join(name)).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_bucket(&self, name: &str, policy: BucketPolicy) -> Result<(), StorageError> {
        fs::create_dir_all(self.root.join(name)).await?;

        let mut policies = self.policies.write().await;
        policies.insert(name.to_string(), policy);
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        options: &StoreOptions,
    ) -> Result<(), StorageError> {
        if !self.bucket_exists(bucket).await? {
            return Err(StorageError::BucketNotFound(bucket.to_string()));
        }

        {
            let policies = self.policies.read().await;
            if let Some(policy) = policies.get(bucket) {
                if bytes.len() as u64 > policy.max_bytes {
                    return Err(StorageError::Provider(format!(
                        "object exceeds bucket limit of {} bytes",
                        policy.max_bytes
                    )));
                }
                if !policy.allowed_mime_types.is_empty()
                    && !policy
                        .allowed_mime_types
                        .iter()
                        .any(|m| m == &options.content_type)
                {
                    return Err(StorageError::Provider(format!(
                        "content type {} not allowed in bucket {}",
                        options.content_type, bucket
                    )));
                }
            }
        }

        let full_path = self.object_path(bucket, path);

        if !options.upsert {
            if let Ok(true) = fs::try_exists(&full_path).await {
                return Err(StorageError::AlreadyExists(path.to_string()));
            }
        }

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&full_path, bytes).await?;
        Ok(())
    }

    async fn get_public_url(&self, bucket: &str, path: &str) -> Result<String, StorageError> {
        Ok(format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            bucket,
            path
        ))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), StorageError> {
        for path in paths {
            let full_path = self.object_path(bucket, path);
            match fs::remove_file(&full_path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_policy() -> BucketPolicy {
        BucketPolicy {
            public: true,
            max_bytes: 1024,
            allowed_mime_types: vec!["image/png".to_string()],
        }
    }

    fn store_options() -> StoreOptions {
        StoreOptions {
            content_type: "image/png".to_string(),
            upsert: true,
        }
    }

    #[tokio::test]
    async fn create_then_upload_then_resolve_url() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::new(dir.path().to_path_buf(), "https://cdn.example.com");

        assert!(!storage.bucket_exists("banners").await.unwrap());
        storage
            .create_bucket("banners", test_policy())
            .await
            .unwrap();
        assert!(storage.bucket_exists("banners").await.unwrap());

        storage
            .upload("banners", "u1/a.png", b"data", &store_options())
            .await
            .unwrap();

        let url = storage.get_public_url("banners", "u1/a.png").await.unwrap();
        assert_eq!(url, "https://cdn.example.com/banners/u1/a.png");
    }

    #[tokio::test]
    async fn upload_to_missing_bucket_fails() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::new(dir.path().to_path_buf(), "/media");

        let result = storage
            .upload("missing", "a.png", b"data", &store_options())
            .await;

        assert!(matches!(result, Err(StorageError::BucketNotFound(_))));
    }

    #[tokio::test]
    async fn upsert_overwrites_in_place() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::new(dir.path().to_path_buf(), "/media");
        storage.create_bucket("b", test_policy()).await.unwrap();

        storage
            .upload("b", "a.png", b"first", &store_options())
            .await
            .unwrap();
        storage
            .upload("b", "a.png", b"second", &store_options())
            .await
            .unwrap();

        let contents = std::fs::read(dir.path().join("b/a.png")).unwrap();
        assert_eq!(contents, b"second");
    }

    #[tokio::test]
    async fn non_upsert_refuses_overwrite() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::new(dir.path().to_path_buf(), "/media");
        storage.create_bucket("b", test_policy()).await.unwrap();

        let options = StoreOptions {
            content_type: "image/png".to_string(),
            upsert: false,
        };

        storage
            .upload("b", "a.png", b"first", &options)
            .await
            .unwrap();
        let result = storage.upload("b", "a.png", b"second", &options).await;

        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn bucket_policy_enforces_limits() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::new(dir.path().to_path_buf(), "/media");
        storage.create_bucket("b", test_policy()).await.unwrap();

        let oversized = vec![0u8; 2048];
        let result = storage
            .upload("b", "big.png", &oversized, &store_options())
            .await;
        assert!(matches!(result, Err(StorageError::Provider(_))));

        let wrong_type = StoreOptions {
            content_type: "image/svg+xml".to_string(),
            upsert: true,
        };
        let result = storage.upload("b", "a.svg", b"<svg/>", &wrong_type).await;
        assert!(matches!(result, Err(StorageError::Provider(_))));
    }

    #[tokio::test]
    async fn remove_ignores_missing_objects() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::new(dir.path().to_path_buf(), "/media");
        storage.create_bucket("b", test_policy()).await.unwrap();

        storage
            .upload("b", "a.png", b"data", &store_options())
            .await
            .unwrap();

        storage
            .remove("b", &["a.png".to_string(), "ghost.png".to_string()])
            .await
            .unwrap();

        assert!(!dir.path().join("b/a.png").exists());
    }
}
