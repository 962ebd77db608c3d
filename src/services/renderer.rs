//! Preview Renderer
//!
//! Pure computation of CSS-equivalent style values from transform state.

use serde::{Deserialize, Serialize};

use crate::models::{ContainerBox, FitMode, NaturalSize, TransformState};

/// Target shape of the editing container, expressed as `width:height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    /// Square tiles (product photos).
    pub const SQUARE: Self = Self {
        width: 1,
        height: 1,
    };
    /// Classic photo ratio (category tiles).
    pub const STANDARD: Self = Self {
        width: 4,
        height: 3,
    };
    /// Widescreen (hero images).
    pub const WIDE: Self = Self {
        width: 16,
        height: 9,
    };
    /// Store banners.
    pub const BANNER: Self = Self {
        width: 16,
        height: 5,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Width over height.
    pub fn ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Human-readable label, e.g. `16:9`.
    pub fn label(&self) -> String {
        format!("{}:{}", self.width, self.height)
    }

    /// Pixel box for a container rendered at the given width.
    pub fn box_for_width(&self, width_px: f32) -> ContainerBox {
        ContainerBox::new(width_px, width_px / self.ratio() as f32)
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

/// CSS-equivalent draw instructions for the current transform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderInstructions {
    /// `object-fit` keyword.
    pub object_fit: &'static str,
    /// `object-position`, percentage pair.
    pub object_position: String,
    /// `transform` value; empty when no scale or rotation applies.
    pub transform: String,
    /// `transform-origin`, percentage pair.
    pub transform_origin: String,
}

impl RenderInstructions {
    /// Joined inline-style fragment for hosts that splice strings.
    pub fn style_fragment(&self) -> String {
        let mut parts = vec![
            format!("object-fit: {}", self.object_fit),
            format!("object-position: {}", self.object_position),
        ];
        if !self.transform.is_empty() {
            parts.push(format!("transform: {}", self.transform));
            parts.push(format!("transform-origin: {}", self.transform_origin));
        }
        parts.join("; ")
    }
}

/// Compute render instructions for a transform.
///
/// Anchor and scale only shape the output in cover mode; rotation applies in
/// every mode.
pub fn render(transform: &TransformState) -> RenderInstructions {
    let framing = transform.fit_mode().supports_framing();

    let position = if framing {
        format!("{}% {}%", transform.anchor().x, transform.anchor().y)
    } else {
        "50% 50%".to_string()
    };

    let mut ops = Vec::new();
    if transform.rotation() != 0 {
        ops.push(format!("rotate({}deg)", transform.rotation()));
    }
    if framing && transform.scale() != 1.0 {
        ops.push(format!("scale({})", transform.scale()));
    }

    RenderInstructions {
        object_fit: transform.fit_mode().css_keyword(),
        object_position: position.clone(),
        transform: ops.join(" "),
        transform_origin: position,
    }
}

/// Effective output resolution the asset occupies in the container, rounded
/// to whole pixels.
pub fn effective_resolution(
    fit_mode: FitMode,
    natural: NaturalSize,
    container: ContainerBox,
) -> (u32, u32) {
    let cw = container.width as f64;
    let ch = container.height as f64;
    let nw = natural.width as f64;
    let nh = natural.height as f64;

    let (w, h) = match fit_mode {
        FitMode::Cover | FitMode::Fill => (cw, ch),
        FitMode::Contain => contain_box(nw, nh, cw, ch),
        FitMode::Center => (nw.min(cw), nh.min(ch)),
        FitMode::ScaleDown => {
            if nw <= cw && nh <= ch {
                (nw, nh)
            } else {
                contain_box(nw, nh, cw, ch)
            }
        }
    };

    (w.round() as u32, h.round() as u32)
}

fn contain_box(nw: f64, nh: f64, cw: f64, ch: f64) -> (f64, f64) {
    let scale = (cw / nw).min(ch / nh);
    (nw * scale, nh * scale)
}
