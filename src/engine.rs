//! Storemedia Engine Entry Point

use std::sync::Arc;

use crate::models::{ImageAsset, LogicalSlot, StoredImageReference, TransformState, UploadTarget};
use crate::services::binder::{BindError, BoundRecord, OwnerRecordStore, PersistenceBinder};
use crate::services::storage::StorageProvider;
use crate::services::upload::{UploadError, UploadPipeline};
use crate::services::urls::with_freshness_token;
use crate::services::validator::{AssetValidator, ValidationError};
use crate::session::EditSession;
use crate::settings::StudioSettings;

/// Acquisition error
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("unreadable image: {0}")]
    Asset(#[from] crate::models::AssetError),
    #[error("network error: {0}")]
    Network(String),
}

/// Confirm error
///
/// A bind failure after a successful upload is reported distinctly: the
/// object exists in storage but is not attached, and a retry re-attempts
/// only the bind.
#[derive(Debug, thiserror::Error)]
pub enum ConfirmError {
    #[error("no file selected")]
    NoAsset,
    #[error("an upload is already in progress")]
    Busy,
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("uploaded but not attached: {source}")]
    Bind {
        reference: StoredImageReference,
        source: BindError,
    },
    #[error("nothing waiting to be attached")]
    NothingPending,
}

/// Result of a successful confirm.
#[derive(Debug, Clone)]
pub struct ConfirmOutcome {
    /// Durable reference with the bare URL.
    pub reference: StoredImageReference,
    /// Record now bound to the slot.
    pub record: BoundRecord,
    /// Immediately-fresh display URL for the host UI.
    pub display_url: String,
}

/// Storemedia Engine
///
/// Wires the validator, upload pipeline, and persistence binder over the
/// external storage and record seams, and orchestrates the confirm flow for
/// editing sessions.
pub struct MediaEngine {
    settings: StudioSettings,
    provider: Arc<dyn StorageProvider>,
    records: Arc<dyn OwnerRecordStore>,
    pipeline: UploadPipeline,
    binder: PersistenceBinder,
}

impl MediaEngine {
    /// Create an engine with default settings.
    pub fn new(provider: Arc<dyn StorageProvider>, records: Arc<dyn OwnerRecordStore>) -> Self {
        Self::with_settings(provider, records, StudioSettings::default())
    }

    /// Create an engine with custom settings.
    pub fn with_settings(
        provider: Arc<dyn StorageProvider>,
        records: Arc<dyn OwnerRecordStore>,
        settings: StudioSettings,
    ) -> Self {
        let validator = AssetValidator::new(settings.validation_policy());
        let pipeline = UploadPipeline::new(Arc::clone(&provider), validator);
        let binder = PersistenceBinder::new(Arc::clone(&records), Arc::clone(&provider));

        Self {
            settings,
            provider,
            records,
            pipeline,
            binder,
        }
    }

    pub fn settings(&self) -> &StudioSettings {
        &self.settings
    }

    /// Replace settings, rebuilding the services derived from them.
    pub fn update_settings(&mut self, settings: StudioSettings) {
        let validator = AssetValidator::new(settings.validation_policy());
        self.pipeline = UploadPipeline::new(Arc::clone(&self.provider), validator);
        self.settings = settings;
    }

    // Service accessors
    pub fn provider(&self) -> &Arc<dyn StorageProvider> {
        &self.provider
    }

    pub fn records(&self) -> &Arc<dyn OwnerRecordStore> {
        &self.records
    }

    pub fn pipeline(&self) -> &UploadPipeline {
        &self.pipeline
    }

    pub fn binder(&self) -> &PersistenceBinder {
        &self.binder
    }

    /// Gate selected bytes through validation and decode dimensions once.
    pub fn acquire_from_bytes(
        &self,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<ImageAsset, AcquireError> {
        let file_name = file_name.into();
        let mime_type = crate::models::detect_mime_type(&bytes, &file_name);

        self.pipeline
            .validator()
            .validate(&mime_type, bytes.len() as u64)?;

        Ok(ImageAsset::new(file_name, mime_type, bytes)?)
    }

    /// Download a remote image through the same validation gate.
    pub async fn acquire_from_url(&self, url: &str) -> Result<ImageAsset, AcquireError> {
        let response = reqwest::get(url)
            .await
            .map_err(|e| AcquireError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AcquireError::Network(format!("HTTP {}", response.status())));
        }

        let file_name = url
            .rsplit('/')
            .next()
            .map(|s| s.split('?').next().unwrap_or(s).to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "download".to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AcquireError::Network(e.to_string()))?
            .to_vec();

        self.acquire_from_bytes(file_name, bytes)
    }

    /// Open an editing session over an acquired asset.
    pub fn open_session(&self, asset: ImageAsset) -> EditSession {
        let transform = TransformState::new(self.settings.zoom, self.settings.tuning());
        EditSession::new(asset, transform)
    }

    /// Open a session restoring the framing bound to a slot, when present.
    pub async fn open_session_for_slot(
        &self,
        asset: ImageAsset,
        slot: &LogicalSlot,
    ) -> Result<EditSession, BindError> {
        let transform = TransformState::new(self.settings.zoom, self.settings.tuning());

        let session = match self.binder.load(slot).await?.and_then(|r| r.metadata) {
            Some(metadata) => EditSession::with_restored_framing(asset, transform, metadata),
            None => EditSession::new(asset, transform),
        };

        Ok(session)
    }

    /// Upload the session's file, bind the reference to the slot, and hand
    /// back an immediately-fresh display URL.
    ///
    /// One logical operation from the host's perspective; on any failure the
    /// session keeps its file and transform so a retry needs no re-selection.
    pub async fn confirm(
        &self,
        session: &mut EditSession,
        target: &UploadTarget,
        slot: &LogicalSlot,
    ) -> Result<ConfirmOutcome, ConfirmError> {
        if session.is_uploading() {
            return Err(ConfirmError::Busy);
        }
        session.set_uploading(true);

        let upload_result = match session.asset() {
            Some(asset) => self.pipeline.upload(asset, target).await,
            None => {
                session.set_uploading(false);
                return Err(ConfirmError::NoAsset);
            }
        };

        let reference = match upload_result {
            Ok(reference) => reference,
            Err(e) => {
                session.set_uploading(false);
                return Err(e.into());
            }
        };

        let outcome = self.bind_reference(session, slot, reference).await;
        session.set_uploading(false);
        outcome
    }

    /// Re-attempt only the bind after a [`ConfirmError::Bind`] failure.
    pub async fn retry_bind(
        &self,
        session: &mut EditSession,
        slot: &LogicalSlot,
    ) -> Result<ConfirmOutcome, ConfirmError> {
        let reference = session
            .pending_bind()
            .cloned()
            .ok_or(ConfirmError::NothingPending)?;

        self.bind_reference(session, slot, reference).await
    }

    async fn bind_reference(
        &self,
        session: &mut EditSession,
        slot: &LogicalSlot,
        reference: StoredImageReference,
    ) -> Result<ConfirmOutcome, ConfirmError> {
        let metadata = session.transform().metadata();

        match self.binder.bind(slot, &reference, Some(metadata)).await {
            Ok(record) => {
                let display_url =
                    with_freshness_token(&reference.base_url, &self.settings.freshness_options());
                session.complete();
                Ok(ConfirmOutcome {
                    reference,
                    record,
                    display_url,
                })
            }
            Err(source) => {
                session.set_pending_bind(reference.clone());
                Err(ConfirmError::Bind { reference, source })
            }
        }
    }

    /// Load the record bound to a slot together with a fresh display URL.
    pub async fn load_bound(
        &self,
        slot: &LogicalSlot,
    ) -> Result<Option<(BoundRecord, String)>, BindError> {
        let record = self.binder.load(slot).await?;

        Ok(record.map(|record| {
            let display_url =
                with_freshness_token(&record.url, &self.settings.freshness_options());
            (record, display_url)
        }))
    }

    /// Remove a slot's binding and opportunistically delete its object.
    pub async fn unbind(&self, slot: &LogicalSlot) -> Result<BoundRecord, BindError> {
        self.binder.unbind(slot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::asset::png_bytes;
    use crate::services::binder::MemoryRecordStore;
    use crate::services::storage::FsStorage;
    use crate::services::validator::ValidationPolicy;
    use tempfile::tempdir;

    fn engine(dir: &std::path::Path) -> MediaEngine {
        MediaEngine::new(
            Arc::new(FsStorage::new(dir.to_path_buf(), "https://cdn.example.com")),
            Arc::new(MemoryRecordStore::new()),
        )
    }

    #[test]
    fn acquire_validates_before_decoding() {
        let dir = tempdir().unwrap();
        let mut engine = engine(dir.path());

        let mut settings = StudioSettings::default();
        settings.max_upload_bytes = 16;
        engine.update_settings(settings);

        let result = engine.acquire_from_bytes("big.png", png_bytes(64, 64));
        assert!(matches!(
            result,
            Err(AcquireError::Validation(ValidationError::TooLarge { .. }))
        ));
    }

    #[test]
    fn acquire_rejects_disallowed_type() {
        let dir = tempdir().unwrap();
        let mut engine = engine(dir.path());

        let mut settings = StudioSettings::default();
        settings.allowed_mime_types = ValidationPolicy::compact().allowed_mime_types;
        engine.update_settings(settings);

        let result = engine.acquire_from_bytes("anim.gif", b"GIF89a...".to_vec());
        assert!(matches!(
            result,
            Err(AcquireError::Validation(ValidationError::TypeNotAllowed(_)))
        ));
    }

    #[tokio::test]
    async fn acquire_from_url_rejects_unreachable_url() {
        let dir = tempdir().unwrap();
        let engine = engine(dir.path());

        let result = engine.acquire_from_url("not a url").await;

        assert!(matches!(result, Err(AcquireError::Network(_))));
    }

    #[test]
    fn open_session_uses_configured_zoom_range() {
        let dir = tempdir().unwrap();
        let mut engine = engine(dir.path());

        let mut settings = StudioSettings::default();
        settings.zoom = crate::models::ZoomRange::compact();
        engine.update_settings(settings);

        let asset = engine
            .acquire_from_bytes("photo.png", png_bytes(10, 10))
            .unwrap();
        let mut session = engine.open_session(asset);

        session.apply(crate::models::TransformEvent::SetScale(5.0));
        assert_eq!(session.transform().scale(), 2.0);
    }
}
