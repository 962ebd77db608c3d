//! Reference Models
//!
//! Upload destinations, logical slots, and durable stored references.

use serde::{Deserialize, Serialize};

/// Destination for one upload.
///
/// The bucket is a logical namespace chosen by the calling context, never by
/// the user; every path is namespaced under the authenticated owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTarget {
    /// Logical bucket name, e.g. `product-images`.
    pub bucket: String,
    /// Identifier of the authenticated actor; prefixes every path.
    pub owner_id: String,
    /// Optional subfolder under the owner, sanitized before use.
    pub subfolder: Option<String>,
}

impl UploadTarget {
    /// Bucket for product photos.
    pub const PRODUCT_IMAGES: &'static str = "product-images";
    /// Bucket for category tiles.
    pub const CATEGORY_IMAGES: &'static str = "category-images";
    /// Bucket for store banners.
    pub const BANNERS: &'static str = "banners";

    pub fn new(bucket: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            owner_id: owner_id.into(),
            subfolder: None,
        }
    }

    pub fn with_subfolder(mut self, subfolder: impl Into<String>) -> Self {
        self.subfolder = Some(subfolder.into());
        self
    }
}

/// The `(owner, purpose)` key under which exactly one stored reference is
/// bound at a time, e.g. one banner per store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalSlot {
    pub owner_id: String,
    pub purpose: String,
}

impl LogicalSlot {
    pub fn new(owner_id: impl Into<String>, purpose: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            purpose: purpose.into(),
        }
    }
}

impl std::fmt::Display for LogicalSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner_id, self.purpose)
    }
}

/// Durable reference to an uploaded object.
///
/// `base_url` is the bare, protocol-qualified location; freshness tokens are
/// a presentation concern applied when the URL is handed out, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImageReference {
    pub bucket: String,
    pub path: String,
    pub base_url: String,
}

impl StoredImageReference {
    pub fn new(
        bucket: impl Into<String>,
        path: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            path: path.into(),
            base_url: base_url.into(),
        }
    }
}

/// Sanitize a string for use as a storage path segment.
///
/// Any run of characters outside `[A-Za-z0-9._-]` collapses to a single `_`,
/// keeping the result safe for provider keys and URL construction.
pub fn sanitize_for_path(segment: &str) -> String {
    let re = regex::Regex::new(r"[^A-Za-z0-9._-]+").unwrap();
    re.replace_all(segment, "_").to_string()
}
