//! Upload Pipeline
//!
//! Destination provisioning, object naming, and durable reference handling.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::models::{sanitize_for_path, ImageAsset, StoredImageReference, UploadTarget};

use super::storage::{BucketPolicy, StorageError, StorageProvider, StoreOptions};
use super::validator::{AssetValidator, ValidationError};

/// Upload pipeline error
///
/// Bucket provisioning failure is deliberately absent: it is a non-fatal
/// probe, logged and bypassed, and the upload call that follows is the
/// authoritative source of success or failure.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("transport failure: {0}")]
    Transport(#[from] StorageError),
}

/// Takes a validated file, establishes a collision-free path, ensures the
/// destination exists, uploads, and returns a durable public reference.
pub struct UploadPipeline {
    provider: Arc<dyn StorageProvider>,
    validator: AssetValidator,
}

impl UploadPipeline {
    pub fn new(provider: Arc<dyn StorageProvider>, validator: AssetValidator) -> Self {
        Self {
            provider,
            validator,
        }
    }

    pub fn validator(&self) -> &AssetValidator {
        &self.validator
    }

    /// Upload the raw source file and return its stored reference.
    ///
    /// The bytes go up unmodified; crop, zoom, and rotation remain
    /// presentation metadata applied at render time.
    pub async fn upload(
        &self,
        asset: &ImageAsset,
        target: &UploadTarget,
    ) -> Result<StoredImageReference, UploadError> {
        self.validator.validate_asset(asset)?;

        self.ensure_destination(&target.bucket).await;

        let path = self.generate_path(target, &asset.extension());

        let options = StoreOptions {
            content_type: asset.mime_type().to_string(),
            upsert: true,
        };
        self.provider
            .upload(&target.bucket, &path, asset.bytes(), &options)
            .await?;

        let url = self.provider.get_public_url(&target.bucket, &path).await?;
        let url = qualify_protocol(url);

        tracing::debug!(bucket = %target.bucket, path = %path, "uploaded asset");

        Ok(StoredImageReference::new(&target.bucket, path, url))
    }

    /// Collision-resistant relative path:
    /// `{owner}/{subfolder}/{timestamp}_{token}.{ext}`.
    pub fn generate_path(&self, target: &UploadTarget, extension: &str) -> String {
        let timestamp = Utc::now().timestamp_millis();
        let token = Uuid::new_v4().simple().to_string();
        let file = format!("{}_{}.{}", timestamp, &token[..12], extension);

        match target.subfolder.as_deref() {
            Some(subfolder) => format!(
                "{}/{}/{}",
                target.owner_id,
                sanitize_for_path(subfolder),
                file
            ),
            None => format!("{}/{}", target.owner_id, file),
        }
    }

    /// Best-effort destination check: confirm the bucket exists, creating it
    /// with public-read access and the validator's limits when it does not.
    ///
    /// Never propagates failure; the upload that follows is authoritative.
    async fn ensure_destination(&self, bucket: &str) {
        match self.provider.bucket_exists(bucket).await {
            Ok(true) => {}
            Ok(false) => {
                let policy = BucketPolicy {
                    public: true,
                    max_bytes: self.validator.policy().max_bytes,
                    allowed_mime_types: self.validator.policy().allowed_mime_types.clone(),
                };
                if let Err(e) = self.provider.create_bucket(bucket, policy).await {
                    tracing::warn!(bucket = %bucket, error = %e, "bucket provisioning failed");
                }
            }
            Err(e) => {
                tracing::warn!(bucket = %bucket, error = %e, "bucket existence check failed");
            }
        }
    }
}

/// Guarantee a protocol-qualified URL, prefixing `https:` when the provider
/// returned a protocol-relative one.
fn qualify_protocol(url: String) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::asset::png_bytes;
    use crate::services::validator::ValidationPolicy;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    use crate::services::storage::FsStorage;

    fn pipeline_with(provider: Arc<dyn StorageProvider>) -> UploadPipeline {
        UploadPipeline::new(provider, AssetValidator::default())
    }

    fn test_asset() -> ImageAsset {
        ImageAsset::from_bytes("photo.png", png_bytes(8, 6)).unwrap()
    }

    /// Provider stub that counts calls and rejects bucket creation.
    struct CountingProvider {
        calls: AtomicUsize,
        fail_provisioning: bool,
    }

    impl CountingProvider {
        fn new(fail_provisioning: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_provisioning,
            }
        }
    }

    #[async_trait]
    impl StorageProvider for CountingProvider {
        async fn bucket_exists(&self, _name: &str) -> Result<bool, StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        }

        async fn create_bucket(
            &self,
            name: &str,
            _policy: BucketPolicy,
        ) -> Result<(), StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_provisioning {
                Err(StorageError::Provider(format!("cannot create {}", name)))
            } else {
                Ok(())
            }
        }

        async fn upload(
            &self,
            _bucket: &str,
            _path: &str,
            _bytes: &[u8],
            _options: &StoreOptions,
        ) -> Result<(), StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn get_public_url(&self, bucket: &str, path: &str) -> Result<String, StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("//cdn.example.com/{}/{}", bucket, path))
        }

        async fn remove(&self, _bucket: &str, _paths: &[String]) -> Result<(), StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn generated_paths_are_namespaced_and_unique() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline_with(Arc::new(FsStorage::new(
            dir.path().to_path_buf(),
            "/media",
        )));
        let target = UploadTarget::new("category-images", "user-1").with_subfolder("My Category! #1");

        let first = pipeline.generate_path(&target, "png");
        let second = pipeline.generate_path(&target, "png");

        assert!(first.starts_with("user-1/My_Category_1/"));
        assert!(first.ends_with(".png"));
        assert_ne!(first, second);
    }

    #[test]
    fn path_without_subfolder_degrades_to_owner_prefix() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline_with(Arc::new(FsStorage::new(
            dir.path().to_path_buf(),
            "/media",
        )));
        let target = UploadTarget::new("banners", "user-2");

        let path = pipeline.generate_path(&target, "jpg");

        assert_eq!(path.matches('/').count(), 1);
        assert!(path.starts_with("user-2/"));
    }

    #[tokio::test]
    async fn oversized_file_makes_no_provider_call() {
        let provider = Arc::new(CountingProvider::new(false));
        let pipeline = UploadPipeline::new(
            provider.clone(),
            AssetValidator::new(ValidationPolicy::new(16, vec!["image/png".to_string()])),
        );
        let target = UploadTarget::new("product-images", "user-1");

        let result = pipeline.upload(&test_asset(), &target).await;

        assert!(matches!(result, Err(UploadError::Validation(_))));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provisioning_failure_does_not_abort_upload() {
        let provider = Arc::new(CountingProvider::new(true));
        let pipeline = pipeline_with(provider.clone());
        let target = UploadTarget::new("product-images", "user-1");

        let reference = pipeline.upload(&test_asset(), &target).await.unwrap();

        assert_eq!(reference.bucket, "product-images");
        // exists + failed create + upload + url lookup
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn protocol_relative_urls_are_qualified() {
        let provider = Arc::new(CountingProvider::new(false));
        let pipeline = pipeline_with(provider);
        let target = UploadTarget::new("banners", "user-1");

        let reference = pipeline.upload(&test_asset(), &target).await.unwrap();

        assert!(reference.base_url.starts_with("https://cdn.example.com/banners/"));
    }

    #[tokio::test]
    async fn upload_round_trips_original_bytes() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(FsStorage::new(dir.path().to_path_buf(), "/media"));
        let pipeline = pipeline_with(storage);
        let asset = test_asset();
        let target = UploadTarget::new("product-images", "user-1");

        let reference = pipeline.upload(&asset, &target).await.unwrap();

        let stored = std::fs::read(
            dir.path()
                .join(&reference.bucket)
                .join(&reference.path),
        )
        .unwrap();
        assert_eq!(stored, asset.bytes());
    }
}
