//! Interaction Controller
//!
//! Translates pointer and keyboard input into transform updates.

use crate::models::{ContainerBox, NudgeDirection, TransformEvent, TransformState};

/// A pointer position in container-local pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPoint {
    pub x: f32,
    pub y: f32,
}

impl PointerPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Gesture phase of the positioning surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Dragging,
}

/// Handle for a global listener registration made when a drag starts.
///
/// The release hook runs exactly once: on pointer-up, on pointer-leave, or
/// when the controller is torn down mid-drag.
pub struct ListenerGuard {
    release: Option<Box<dyn FnOnce()>>,
}

impl ListenerGuard {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Guard for hosts that manage listeners themselves.
    pub fn noop() -> Self {
        Self { release: None }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("armed", &self.release.is_some())
            .finish()
    }
}

/// An in-progress drag.
#[derive(Debug)]
struct ActiveDrag {
    /// Last pointer position already folded into the transform.
    applied: PointerPoint,
    _guard: ListenerGuard,
}

/// State machine turning raw gesture streams into reducer calls.
///
/// Pointer moves are coalesced: they only record the most recent position,
/// and [`InteractionController::frame_tick`] folds the pending movement into
/// the transform at most once per animation frame.
#[derive(Debug, Default)]
pub struct InteractionController {
    drag: Option<ActiveDrag>,
    pending: Option<PointerPoint>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DragPhase {
        if self.drag.is_some() {
            DragPhase::Dragging
        } else {
            DragPhase::Idle
        }
    }

    /// Enter `Dragging` if the transform is in a frameable mode.
    ///
    /// Returns whether the drag started; the guard is dropped immediately
    /// when it did not.
    pub fn pointer_down(
        &mut self,
        transform: &TransformState,
        at: PointerPoint,
        guard: ListenerGuard,
    ) -> bool {
        if !transform.fit_mode().supports_framing() || self.drag.is_some() {
            return false;
        }

        self.drag = Some(ActiveDrag {
            applied: at,
            _guard: guard,
        });
        self.pending = None;
        true
    }

    /// Record a pointer move; cheap enough for every raw event.
    pub fn pointer_move(&mut self, at: PointerPoint) {
        if self.drag.is_some() {
            self.pending = Some(at);
        }
    }

    /// Fold the latest pending movement into the transform.
    ///
    /// Call once per animation frame. Returns whether the transform changed.
    pub fn frame_tick(&mut self, transform: &mut TransformState, container: ContainerBox) -> bool {
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        let Some(at) = self.pending.take() else {
            return false;
        };

        let dx = at.x - drag.applied.x;
        let dy = at.y - drag.applied.y;
        drag.applied = at;

        if dx == 0.0 && dy == 0.0 {
            return false;
        }

        transform.apply(TransformEvent::Pan { dx, dy, container });
        true
    }

    /// Leave `Dragging`, releasing the drag's listener registration.
    pub fn pointer_up(&mut self) {
        self.drag = None;
        self.pending = None;
    }

    /// Pointer left the surface; treated as the end of the gesture.
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }

    /// Discrete fixed-step move, available without entering `Dragging`.
    pub fn nudge(
        &self,
        transform: &mut TransformState,
        direction: NudgeDirection,
        container: ContainerBox,
    ) {
        transform.apply(TransformEvent::Nudge {
            direction,
            container,
        });
    }
}
