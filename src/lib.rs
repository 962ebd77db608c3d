//! Storemedia - Image Positioning and Upload Engine for Storefronts
//!
//! Storemedia is the image subsystem of a multi-tenant storefront builder:
//!
//! - **Acquisition**: gate selected or downloaded files by size and MIME type
//! - **Positioning**: pan, zoom, and rotate against a target aspect ratio
//! - **Preview**: CSS-equivalent render instructions for the host UI
//! - **Upload**: collision-free paths, bucket provisioning, durable URLs
//! - **Freshness**: cache-busting tokens over stable stored references
//! - **Binding**: one stored reference per owner/purpose slot
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storemedia::{
//!     FsStorage, LogicalSlot, MediaEngine, MemoryRecordStore, UploadTarget,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = MediaEngine::new(
//!         Arc::new(FsStorage::new("uploads".into(), "https://cdn.example.com")),
//!         Arc::new(MemoryRecordStore::new()),
//!     );
//!
//!     // Select a file and position it
//!     let bytes = std::fs::read("banner.jpg").unwrap();
//!     let asset = engine.acquire_from_bytes("banner.jpg", bytes).unwrap();
//!     let mut session = engine.open_session(asset);
//!
//!     // Confirm: upload, bind, and get a fresh display URL
//!     let target = UploadTarget::new(UploadTarget::BANNERS, "store-1");
//!     let slot = LogicalSlot::new("store-1", "banner");
//!     let outcome = engine.confirm(&mut session, &target, &slot).await.unwrap();
//!     println!("Live at: {}", outcome.display_url);
//! }
//! ```
//!
//! ## Design
//!
//! The source file is uploaded unmodified; crop, zoom, and rotation are
//! presentation metadata persisted alongside the bare URL and applied at
//! render time. Storage and the owning-record repository are external
//! collaborators behind the [`StorageProvider`] and [`OwnerRecordStore`]
//! traits.

pub mod engine;
pub mod models;
pub mod services;
pub mod session;
pub mod settings;

// Re-exports
pub use models::{
    detect_mime_type, sanitize_for_path, Anchor, AssetError, ContainerBox, FitMode, ImageAsset,
    LogicalSlot, NaturalSize, NudgeDirection, StoredImageReference, TransformEvent,
    TransformMetadata, TransformState, TransformTuning, UploadTarget, ZoomRange,
};

pub use services::{
    with_freshness_token, AspectRatio, AssetValidator, BindError, BoundRecord, BucketPolicy,
    DragPhase, FreshnessOptions, FsStorage, InteractionController, ListenerGuard,
    MemoryRecordStore, OwnerRecordStore, PersistenceBinder, PointerPoint, RenderInstructions,
    StorageError, StorageProvider, StoreOptions, UploadError, UploadPipeline, ValidationError,
    ValidationPolicy,
};

pub use engine::{AcquireError, ConfirmError, ConfirmOutcome, MediaEngine};
pub use session::EditSession;
pub use settings::StudioSettings;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize an engine with default settings.
pub fn init(
    provider: std::sync::Arc<dyn StorageProvider>,
    records: std::sync::Arc<dyn OwnerRecordStore>,
) -> MediaEngine {
    MediaEngine::new(provider, records)
}

/// Initialize with custom settings
pub fn init_with_settings(
    provider: std::sync::Arc<dyn StorageProvider>,
    records: std::sync::Arc<dyn OwnerRecordStore>,
    settings: StudioSettings,
) -> MediaEngine {
    MediaEngine::with_settings(provider, records, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::asset::png_bytes;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn fs_engine(dir: &std::path::Path) -> MediaEngine {
        init(
            Arc::new(FsStorage::new(
                dir.to_path_buf(),
                "https://cdn.example.com",
            )),
            Arc::new(MemoryRecordStore::new()),
        )
    }

    /// Provider whose uploads always fail at the transport layer.
    struct FailingProvider;

    #[async_trait]
    impl StorageProvider for FailingProvider {
        async fn bucket_exists(&self, _name: &str) -> Result<bool, StorageError> {
            Ok(true)
        }

        async fn create_bucket(
            &self,
            _name: &str,
            _policy: BucketPolicy,
        ) -> Result<(), StorageError> {
            Ok(())
        }

        async fn upload(
            &self,
            _bucket: &str,
            _path: &str,
            _bytes: &[u8],
            _options: &StoreOptions,
        ) -> Result<(), StorageError> {
            Err(StorageError::Provider("connection reset".to_string()))
        }

        async fn get_public_url(
            &self,
            _bucket: &str,
            _path: &str,
        ) -> Result<String, StorageError> {
            Err(StorageError::Provider("connection reset".to_string()))
        }

        async fn remove(&self, _bucket: &str, _paths: &[String]) -> Result<(), StorageError> {
            Ok(())
        }
    }

    /// Record store that can be toggled to fail its next upserts.
    struct FlakyRecordStore {
        inner: MemoryRecordStore,
        failing: AtomicBool,
    }

    impl FlakyRecordStore {
        fn new(failing: bool) -> Self {
            Self {
                inner: MemoryRecordStore::new(),
                failing: AtomicBool::new(failing),
            }
        }
    }

    #[async_trait]
    impl OwnerRecordStore for FlakyRecordStore {
        async fn upsert(&self, record: BoundRecord) -> Result<Option<BoundRecord>, BindError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(BindError::Store("row lock timeout".to_string()));
            }
            self.inner.upsert(record).await
        }

        async fn get(&self, slot: &LogicalSlot) -> Result<Option<BoundRecord>, BindError> {
            self.inner.get(slot).await
        }

        async fn delete(&self, slot: &LogicalSlot) -> Result<Option<BoundRecord>, BindError> {
            self.inner.delete(slot).await
        }
    }

    /// Drag the anchor from the centered default to `{30, 70}` on a
    /// 400x300 container (sensitivity halves raw pointer deltas).
    fn drag_to_30_70(session: &mut EditSession) {
        let container = ContainerBox::new(400.0, 300.0);
        session.pointer_down(PointerPoint::new(200.0, 150.0), ListenerGuard::noop());
        session.pointer_move(PointerPoint::new(40.0, 270.0));
        assert!(session.frame_tick(container));
        session.pointer_up();
    }

    #[tokio::test]
    async fn confirm_uploads_original_file_and_binds_metadata() {
        let dir = tempdir().unwrap();
        let engine = fs_engine(dir.path());

        let original = png_bytes(3000, 2000);
        let asset = engine
            .acquire_from_bytes("product.png", original.clone())
            .unwrap();
        assert_eq!(asset.natural(), NaturalSize::new(3000, 2000));

        let mut session = engine.open_session(asset);
        session.apply(TransformEvent::SetScale(1.5));
        drag_to_30_70(&mut session);

        let target = UploadTarget::new(UploadTarget::PRODUCT_IMAGES, "store-1");
        let slot = LogicalSlot::new("store-1", "product:42");
        let outcome = engine.confirm(&mut session, &target, &slot).await.unwrap();

        // The raw source file went up, not a rendered bitmap.
        let stored = std::fs::read(
            dir.path()
                .join(&outcome.reference.bucket)
                .join(&outcome.reference.path),
        )
        .unwrap();
        assert_eq!(stored, original);

        // Bare URL persisted; freshness token only on the display URL.
        let metadata = outcome.record.metadata.unwrap();
        assert!((metadata.anchor.x - 30.0).abs() < 1e-3);
        assert!((metadata.anchor.y - 70.0).abs() < 1e-3);
        assert_eq!(metadata.scale, 1.5);
        assert_eq!(metadata.rotation, 0);
        assert_eq!(metadata.fit_mode, FitMode::Cover);
        assert!(!outcome.record.url.contains('?'));
        assert!(outcome.display_url.starts_with(&outcome.record.url));
        assert!(outcome.display_url.contains("?t="));

        // Asset ownership transferred out of the session.
        assert!(!session.has_asset());
        assert!(!session.is_uploading());
    }

    #[tokio::test]
    async fn transport_failure_preserves_session_for_retry() {
        let dir = tempdir().unwrap();
        let broken = init(Arc::new(FailingProvider), Arc::new(MemoryRecordStore::new()));
        let working = fs_engine(dir.path());

        let asset = working
            .acquire_from_bytes("banner.png", png_bytes(160, 50))
            .unwrap();
        let mut session = working.open_session(asset);
        session.apply(TransformEvent::SetScale(1.3));
        drag_to_30_70(&mut session);
        let framing = session.transform().clone();

        let target = UploadTarget::new(UploadTarget::BANNERS, "store-1");
        let slot = LogicalSlot::new("store-1", "banner");

        let result = broken.confirm(&mut session, &target, &slot).await;
        assert!(matches!(result, Err(ConfirmError::Upload(_))));

        // File and positioning survive the failure.
        assert!(session.has_asset());
        assert!(!session.is_uploading());
        assert_eq!(session.transform(), &framing);

        // Retry re-invokes only the pipeline; no re-selection needed.
        let outcome = working.confirm(&mut session, &target, &slot).await.unwrap();
        assert!(!session.has_asset());
        assert_eq!(outcome.record.slot, slot);
    }

    #[tokio::test]
    async fn bind_failure_is_distinct_and_retries_only_the_bind() {
        let dir = tempdir().unwrap();
        let records = Arc::new(FlakyRecordStore::new(true));
        let engine = init(
            Arc::new(FsStorage::new(
                dir.path().to_path_buf(),
                "https://cdn.example.com",
            )),
            records.clone(),
        );

        let asset = engine
            .acquire_from_bytes("tile.png", png_bytes(40, 30))
            .unwrap();
        let mut session = engine.open_session(asset);

        let target = UploadTarget::new(UploadTarget::CATEGORY_IMAGES, "store-1");
        let slot = LogicalSlot::new("store-1", "category:shoes");

        let err = engine.confirm(&mut session, &target, &slot).await.unwrap_err();
        let reference = match err {
            ConfirmError::Bind { reference, .. } => reference,
            other => panic!("expected bind failure, got {:?}", other),
        };

        // The object exists in storage, orphaned until the bind succeeds.
        assert!(dir
            .path()
            .join(&reference.bucket)
            .join(&reference.path)
            .exists());
        assert!(session.has_asset());
        assert_eq!(session.pending_bind(), Some(&reference));

        records.failing.store(false, Ordering::SeqCst);
        let outcome = engine.retry_bind(&mut session, &slot).await.unwrap();

        // Same object: the retry did not upload again.
        assert_eq!(outcome.reference, reference);
        assert!(!session.has_asset());
        assert!(session.pending_bind().is_none());
    }

    #[tokio::test]
    async fn confirm_is_rejected_while_upload_outstanding() {
        let dir = tempdir().unwrap();
        let engine = fs_engine(dir.path());

        let asset = engine
            .acquire_from_bytes("photo.png", png_bytes(10, 10))
            .unwrap();
        let mut session = engine.open_session(asset);
        session.set_uploading(true);

        let target = UploadTarget::new(UploadTarget::PRODUCT_IMAGES, "store-1");
        let slot = LogicalSlot::new("store-1", "product:1");

        let result = engine.confirm(&mut session, &target, &slot).await;

        assert!(matches!(result, Err(ConfirmError::Busy)));
        assert!(session.has_asset());
    }

    #[tokio::test]
    async fn reads_rederive_fresh_display_urls() {
        let dir = tempdir().unwrap();
        let engine = fs_engine(dir.path());

        let asset = engine
            .acquire_from_bytes("banner.png", png_bytes(32, 10))
            .unwrap();
        let mut session = engine.open_session(asset);

        let target = UploadTarget::new(UploadTarget::BANNERS, "store-1");
        let slot = LogicalSlot::new("store-1", "banner");
        engine.confirm(&mut session, &target, &slot).await.unwrap();

        let (first_record, first_url) = engine.load_bound(&slot).await.unwrap().unwrap();
        let (second_record, second_url) = engine.load_bound(&slot).await.unwrap().unwrap();

        // Same bare URL, different freshness tokens on every read.
        assert_eq!(first_record.url, second_record.url);
        assert_ne!(first_url, second_url);
        assert!(first_url.starts_with(&first_record.url));
    }

    #[tokio::test]
    async fn confirm_without_asset_reports_no_selection() {
        let dir = tempdir().unwrap();
        let engine = fs_engine(dir.path());

        let asset = engine
            .acquire_from_bytes("photo.png", png_bytes(10, 10))
            .unwrap();
        let mut session = engine.open_session(asset);
        session.cancel();

        let target = UploadTarget::new(UploadTarget::PRODUCT_IMAGES, "store-1");
        let slot = LogicalSlot::new("store-1", "product:1");

        let result = engine.confirm(&mut session, &target, &slot).await;
        assert!(matches!(result, Err(ConfirmError::NoAsset)));
    }

    #[tokio::test]
    async fn reopening_a_slot_restores_prior_framing() {
        let dir = tempdir().unwrap();
        let engine = fs_engine(dir.path());

        let asset = engine
            .acquire_from_bytes("tile.png", png_bytes(40, 30))
            .unwrap();
        let mut session = engine.open_session(asset);
        session.apply(TransformEvent::SetScale(1.5));
        drag_to_30_70(&mut session);

        let target = UploadTarget::new(UploadTarget::CATEGORY_IMAGES, "store-1");
        let slot = LogicalSlot::new("store-1", "category:shoes");
        engine.confirm(&mut session, &target, &slot).await.unwrap();

        let replacement = engine
            .acquire_from_bytes("tile2.png", png_bytes(40, 30))
            .unwrap();
        let reopened = engine
            .open_session_for_slot(replacement, &slot)
            .await
            .unwrap();

        assert!((reopened.transform().anchor().x - 30.0).abs() < 1e-3);
        assert_eq!(reopened.transform().scale(), 1.5);
    }
}
