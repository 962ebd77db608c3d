//! Asset Validator
//!
//! Pre-upload gating of candidate files by size and MIME type.

use serde::{Deserialize, Serialize};

use crate::models::ImageAsset;

/// Validation error
///
/// Rejections are values meant for user-facing display; they never unwind
/// editing state and no network call is made before they are raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("file is too large: {size} bytes (max: {max})")]
    TooLarge { size: u64, max: u64 },
    #[error("file type not allowed: {0}")]
    TypeNotAllowed(String),
}

/// Per-call-site validation limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    /// Maximum file size in bytes.
    pub max_bytes: u64,
    /// Allowed MIME types.
    pub allowed_mime_types: Vec<String>,
}

impl ValidationPolicy {
    pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024; // 10 MiB

    pub fn new(max_bytes: u64, allowed_mime_types: Vec<String>) -> Self {
        Self {
            max_bytes,
            allowed_mime_types,
        }
    }

    /// Narrower variant used by editors that cap uploads at 5 MiB and
    /// exclude animated formats.
    pub fn compact() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024,
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/webp".to_string(),
            ],
        }
    }

    pub fn is_mime_type_allowed(&self, mime: &str) -> bool {
        self.allowed_mime_types.iter().any(|m| m == mime)
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: Self::DEFAULT_MAX_BYTES,
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
            ],
        }
    }
}

/// Pure predicate over candidate files.
#[derive(Debug, Clone, Default)]
pub struct AssetValidator {
    policy: ValidationPolicy,
}

impl AssetValidator {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Validate a candidate by MIME type and byte size.
    pub fn validate(&self, mime_type: &str, size: u64) -> Result<(), ValidationError> {
        if size > self.policy.max_bytes {
            return Err(ValidationError::TooLarge {
                size,
                max: self.policy.max_bytes,
            });
        }

        if !self.policy.is_mime_type_allowed(mime_type) {
            return Err(ValidationError::TypeNotAllowed(mime_type.to_string()));
        }

        Ok(())
    }

    /// Validate an already-acquired asset.
    pub fn validate_asset(&self, asset: &ImageAsset) -> Result<(), ValidationError> {
        self.validate(asset.mime_type(), asset.size_bytes())
    }
}
