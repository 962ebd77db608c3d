//! Transform Models
//!
//! Position, zoom, rotation, and fit-mode state for the positioning editor.

use serde::{Deserialize, Serialize};

/// Percentage-space focal point used to pan a cover-fit image.
///
/// Both coordinates live in `[0, 100]`. `{50, 50}` is the centered default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

impl Anchor {
    /// Centered default.
    pub const CENTER: Self = Self { x: 50.0, y: 50.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: x.clamp(0.0, 100.0),
            y: y.clamp(0.0, 100.0),
        }
    }

    /// Shift by a percentage delta, clamping to the valid range.
    pub fn shifted(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Policy for mapping a source image onto a differently-shaped container.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FitMode {
    /// Fill the container, clipping overflow; anchor and scale apply.
    Cover,
    /// Letterbox inside the container, preserving intrinsic aspect ratio.
    Contain,
    /// Stretch to the container's exact aspect ratio (may distort).
    Fill,
    /// Intrinsic size, clipped to the container.
    Center,
    /// Intrinsic size, shrinking only when larger than the container.
    ScaleDown,
}

impl FitMode {
    /// Whether anchor panning and zooming are meaningful in this mode.
    pub fn supports_framing(&self) -> bool {
        matches!(self, Self::Cover)
    }

    /// CSS `object-fit` keyword equivalent.
    pub fn css_keyword(&self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::Contain => "contain",
            Self::Fill => "fill",
            Self::Center => "none",
            Self::ScaleDown => "scale-down",
        }
    }
}

impl Default for FitMode {
    fn default() -> Self {
        Self::Cover
    }
}

impl std::fmt::Display for FitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cover => write!(f, "cover"),
            Self::Contain => write!(f, "contain"),
            Self::Fill => write!(f, "fill"),
            Self::Center => write!(f, "center"),
            Self::ScaleDown => write!(f, "scale-down"),
        }
    }
}

/// Inclusive zoom domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: f32,
    pub max: f32,
}

impl ZoomRange {
    /// Full range used by the advanced editor.
    pub fn full() -> Self {
        Self { min: 0.5, max: 3.0 }
    }

    /// Narrow range used by fixed-position editors.
    pub fn compact() -> Self {
        Self { min: 1.0, max: 2.0 }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self::full()
    }
}

/// Rendered bounding box of the editing container, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerBox {
    pub width: f32,
    pub height: f32,
}

impl ContainerBox {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }
}

/// Direction for discrete keyboard/button nudges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Tuning constants for gesture-to-transform conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformTuning {
    /// Multiplier applied to raw pointer deltas; halves pointer speed by default.
    pub drag_sensitivity: f32,
    /// Scale delta applied by zoom buttons.
    pub zoom_step: f32,
    /// Pixel-equivalent distance moved by one nudge.
    pub nudge_step_px: f32,
}

impl Default for TransformTuning {
    fn default() -> Self {
        Self {
            drag_sensitivity: 0.5,
            zoom_step: 0.1,
            nudge_step_px: 10.0,
        }
    }
}

/// Events the editing surface feeds into the transform reducer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformEvent {
    /// Set the scale directly; clamps to the zoom range.
    SetScale(f32),
    /// Step the scale up by the configured zoom step.
    ZoomIn,
    /// Step the scale down by the configured zoom step.
    ZoomOut,
    /// Add a rotation delta in degrees; wraps modulo 360.
    Rotate(i32),
    /// Pan by a pointer delta in pixels against the rendered container.
    Pan {
        dx: f32,
        dy: f32,
        container: ContainerBox,
    },
    /// Discrete fixed-step move; requires cover mode and scale above 1.
    Nudge {
        direction: NudgeDirection,
        container: ContainerBox,
    },
    /// Switch the fit policy.
    SetFitMode(FitMode),
    /// Return anchor and scale to their defaults.
    ResetFraming,
}

/// Framing values stashed while the editor is outside cover mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct SavedFraming {
    anchor: Anchor,
    scale: f32,
}

/// Snapshot of a transform at confirmation time, persisted alongside the
/// stored URL so a later editing session can restore the exact framing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformMetadata {
    pub anchor: Anchor,
    pub scale: f32,
    pub rotation: i32,
    pub fit_mode: FitMode,
}

/// Mutable positioning state for one editing session.
///
/// All mutation goes through [`TransformState::apply`], a reducer over
/// [`TransformEvent`] values, so the interaction layer stays a thin adapter
/// over raw input events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformState {
    anchor: Anchor,
    scale: f32,
    rotation: i32,
    fit_mode: FitMode,
    zoom: ZoomRange,
    tuning: TransformTuning,
    saved: Option<SavedFraming>,
}

impl TransformState {
    pub fn new(zoom: ZoomRange, tuning: TransformTuning) -> Self {
        Self {
            anchor: Anchor::CENTER,
            scale: 1.0,
            rotation: 0,
            fit_mode: FitMode::Cover,
            zoom,
            tuning,
            saved: None,
        }
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Rotation in degrees, always in `[0, 360)`.
    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    pub fn fit_mode(&self) -> FitMode {
        self.fit_mode
    }

    pub fn zoom_range(&self) -> ZoomRange {
        self.zoom
    }

    pub fn tuning(&self) -> TransformTuning {
        self.tuning
    }

    /// Whether the zoom-in affordance should be enabled.
    pub fn can_zoom_in(&self) -> bool {
        self.fit_mode.supports_framing() && self.scale < self.zoom.max
    }

    /// Whether the zoom-out affordance should be enabled.
    pub fn can_zoom_out(&self) -> bool {
        self.fit_mode.supports_framing() && self.scale > self.zoom.min
    }

    /// Whether nudge affordances should be enabled.
    pub fn can_nudge(&self) -> bool {
        self.fit_mode.supports_framing() && self.scale > 1.0
    }

    /// Apply one event to the state.
    ///
    /// Pan, zoom, and nudge events are inert outside cover mode; the last
    /// framing values are kept so returning to cover restores them.
    pub fn apply(&mut self, event: TransformEvent) {
        match event {
            TransformEvent::SetScale(value) => {
                if self.fit_mode.supports_framing() {
                    self.scale = self.zoom.clamp(value);
                }
            }
            TransformEvent::ZoomIn => {
                if self.fit_mode.supports_framing() {
                    self.scale = self.zoom.clamp(self.scale + self.tuning.zoom_step);
                }
            }
            TransformEvent::ZoomOut => {
                if self.fit_mode.supports_framing() {
                    self.scale = self.zoom.clamp(self.scale - self.tuning.zoom_step);
                }
            }
            TransformEvent::Rotate(delta) => {
                self.rotation = (self.rotation + delta).rem_euclid(360);
            }
            TransformEvent::Pan { dx, dy, container } => {
                if self.fit_mode.supports_framing() {
                    self.pan_px(dx, dy, container);
                }
            }
            TransformEvent::Nudge {
                direction,
                container,
            } => {
                if self.can_nudge() {
                    let step = self.tuning.nudge_step_px;
                    let (dx, dy) = match direction {
                        NudgeDirection::Up => (0.0, -step),
                        NudgeDirection::Down => (0.0, step),
                        NudgeDirection::Left => (-step, 0.0),
                        NudgeDirection::Right => (step, 0.0),
                    };
                    self.pan_px(dx, dy, container);
                }
            }
            TransformEvent::SetFitMode(mode) => self.set_fit_mode(mode),
            TransformEvent::ResetFraming => {
                self.anchor = Anchor::CENTER;
                self.scale = self.zoom.clamp(1.0);
                self.saved = None;
            }
        }
    }

    /// Convert a pixel delta to percentage space and shift the anchor.
    fn pan_px(&mut self, dx: f32, dy: f32, container: ContainerBox) {
        let sensitivity = self.tuning.drag_sensitivity;
        let dx_pct = dx / container.width * 100.0 * sensitivity;
        let dy_pct = dy / container.height * 100.0 * sensitivity;
        self.anchor = self.anchor.shifted(dx_pct, dy_pct);
    }

    /// Switch fit mode, stashing cover framing on the way out and restoring
    /// it on the way back in.
    fn set_fit_mode(&mut self, mode: FitMode) {
        if mode == self.fit_mode {
            return;
        }

        if self.fit_mode.supports_framing() {
            self.saved = Some(SavedFraming {
                anchor: self.anchor,
                scale: self.scale,
            });
            self.anchor = Anchor::CENTER;
        }

        if mode.supports_framing() {
            if let Some(saved) = self.saved.take() {
                self.anchor = saved.anchor;
                self.scale = saved.scale;
            }
        }

        self.fit_mode = mode;
    }

    /// Snapshot for persistence.
    pub fn metadata(&self) -> TransformMetadata {
        TransformMetadata {
            anchor: self.anchor,
            scale: self.scale,
            rotation: self.rotation,
            fit_mode: self.fit_mode,
        }
    }

    /// Restore a previously persisted framing.
    pub fn restore(&mut self, metadata: TransformMetadata) {
        self.fit_mode = metadata.fit_mode;
        self.anchor = Anchor::new(metadata.anchor.x, metadata.anchor.y);
        self.scale = self.zoom.clamp(metadata.scale);
        self.rotation = metadata.rotation.rem_euclid(360);
        self.saved = None;
    }
}

impl Default for TransformState {
    fn default() -> Self {
        Self::new(ZoomRange::default(), TransformTuning::default())
    }
}
