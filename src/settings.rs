//! Storemedia Settings

use serde::{Deserialize, Serialize};

use crate::models::{TransformTuning, ZoomRange};
use crate::services::renderer::AspectRatio;
use crate::services::urls::FreshnessOptions;
use crate::services::validator::ValidationPolicy;

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioSettings {
    // Upload limits
    /// Maximum file size in bytes.
    pub max_upload_bytes: u64,
    /// Allowed MIME types.
    pub allowed_mime_types: Vec<String>,

    // Positioning
    /// Zoom domain for the editor.
    pub zoom: ZoomRange,
    /// Scale delta applied by zoom buttons.
    pub zoom_step: f32,
    /// Multiplier applied to raw pointer deltas.
    pub drag_sensitivity: f32,
    /// Pixel-equivalent distance moved by one nudge.
    pub nudge_step_px: f32,

    // Containers
    /// Aspect ratio presets offered by editor screens.
    pub aspect_presets: Vec<AspectRatio>,

    // Delivery
    /// Append a random numeric suffix to freshness tokens.
    pub freshness_random_suffix: bool,
    /// On-the-fly transcoding format hint, e.g. `webp`.
    pub delivery_format: Option<String>,
    /// Transcoding quality hint (1-100).
    pub delivery_quality: Option<u8>,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            max_upload_bytes: ValidationPolicy::DEFAULT_MAX_BYTES,
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
            ],
            zoom: ZoomRange::full(),
            zoom_step: 0.1,
            drag_sensitivity: 0.5,
            nudge_step_px: 10.0,
            aspect_presets: vec![
                AspectRatio::SQUARE,
                AspectRatio::STANDARD,
                AspectRatio::WIDE,
                AspectRatio::BANNER,
            ],
            freshness_random_suffix: true,
            delivery_format: None,
            delivery_quality: None,
        }
    }
}

impl StudioSettings {
    /// Load settings from file
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Save settings to file
    pub fn save(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validation limits derived from these settings.
    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy::new(self.max_upload_bytes, self.allowed_mime_types.clone())
    }

    /// Gesture tuning derived from these settings.
    pub fn tuning(&self) -> TransformTuning {
        TransformTuning {
            drag_sensitivity: self.drag_sensitivity,
            zoom_step: self.zoom_step,
            nudge_step_px: self.nudge_step_px,
        }
    }

    /// Freshness parameters derived from these settings.
    pub fn freshness_options(&self) -> FreshnessOptions {
        FreshnessOptions {
            random_suffix: self.freshness_random_suffix,
            format: self.delivery_format.clone(),
            quality: self.delivery_quality,
        }
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_upload_bytes == 0 {
            errors.push("Max upload size must be greater than 0".to_string());
        }

        if self.allowed_mime_types.is_empty() {
            errors.push("At least one MIME type must be allowed".to_string());
        }

        if self.zoom.min <= 0.0 || self.zoom.max < self.zoom.min {
            errors.push("Zoom range must be positive and ordered".to_string());
        }

        if self.zoom_step <= 0.0 {
            errors.push("Zoom step must be greater than 0".to_string());
        }

        if self.drag_sensitivity <= 0.0 {
            errors.push("Drag sensitivity must be greater than 0".to_string());
        }

        if let Some(quality) = self.delivery_quality {
            if quality == 0 || quality > 100 {
                errors.push("Delivery quality must be between 1 and 100".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
