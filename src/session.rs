//! Editing Session
//!
//! Per-editor state: the selected asset, its transform, and gesture handling.

use crate::models::{
    ContainerBox, ImageAsset, NudgeDirection, StoredImageReference, TransformEvent,
    TransformMetadata, TransformState,
};
use crate::services::interaction::{DragPhase, InteractionController, ListenerGuard, PointerPoint};
use crate::services::renderer::{self, RenderInstructions};

/// One interactive editing session over a selected image.
///
/// The session owns the source file exclusively. Failure paths leave the
/// file and transform untouched so a retry never forces re-selection or
/// re-positioning; the asset is released on cancel or after a successful
/// hand-off to the upload pipeline.
pub struct EditSession {
    asset: Option<ImageAsset>,
    transform: TransformState,
    controller: InteractionController,
    uploading: bool,
    pending_bind: Option<StoredImageReference>,
}

impl EditSession {
    pub fn new(asset: ImageAsset, transform: TransformState) -> Self {
        Self {
            asset: Some(asset),
            transform,
            controller: InteractionController::new(),
            uploading: false,
            pending_bind: None,
        }
    }

    /// Restore a previously persisted framing into a new session.
    pub fn with_restored_framing(
        asset: ImageAsset,
        mut transform: TransformState,
        metadata: TransformMetadata,
    ) -> Self {
        transform.restore(metadata);
        Self::new(asset, transform)
    }

    pub fn asset(&self) -> Option<&ImageAsset> {
        self.asset.as_ref()
    }

    pub fn has_asset(&self) -> bool {
        self.asset.is_some()
    }

    pub fn transform(&self) -> &TransformState {
        &self.transform
    }

    /// Whether a confirm-and-upload operation is outstanding; hosts disable
    /// re-submission while this is set.
    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    /// Reference uploaded but not yet attached to its owning record.
    pub fn pending_bind(&self) -> Option<&StoredImageReference> {
        self.pending_bind.as_ref()
    }

    pub fn drag_phase(&self) -> DragPhase {
        self.controller.phase()
    }

    /// Feed a reducer event directly (zoom buttons, rotation, fit switch).
    pub fn apply(&mut self, event: TransformEvent) {
        self.transform.apply(event);
    }

    pub fn pointer_down(&mut self, at: PointerPoint, guard: ListenerGuard) -> bool {
        self.controller.pointer_down(&self.transform, at, guard)
    }

    pub fn pointer_move(&mut self, at: PointerPoint) {
        self.controller.pointer_move(at);
    }

    /// Fold pending pointer movement into the transform; call once per
    /// animation frame. Returns whether the preview needs a re-render.
    pub fn frame_tick(&mut self, container: ContainerBox) -> bool {
        self.controller.frame_tick(&mut self.transform, container)
    }

    pub fn pointer_up(&mut self) {
        self.controller.pointer_up();
    }

    pub fn pointer_leave(&mut self) {
        self.controller.pointer_leave();
    }

    pub fn nudge(&mut self, direction: NudgeDirection, container: ContainerBox) {
        self.controller
            .nudge(&mut self.transform, direction, container);
    }

    /// Current CSS-equivalent preview instructions.
    pub fn preview(&self) -> RenderInstructions {
        renderer::render(&self.transform)
    }

    /// Effective output resolution for the session's asset in a container.
    pub fn effective_resolution(&self, container: ContainerBox) -> Option<(u32, u32)> {
        self.asset.as_ref().map(|asset| {
            renderer::effective_resolution(self.transform.fit_mode(), asset.natural(), container)
        })
    }

    /// Discard the selected file and any pending bind, ending the session's
    /// claim on its resources.
    pub fn cancel(&mut self) {
        self.asset = None;
        self.pending_bind = None;
        self.controller.pointer_up();
    }

    pub(crate) fn set_uploading(&mut self, uploading: bool) {
        self.uploading = uploading;
    }

    pub(crate) fn set_pending_bind(&mut self, reference: StoredImageReference) {
        self.pending_bind = Some(reference);
    }

    /// Hand the asset off after a successful confirm.
    pub(crate) fn complete(&mut self) -> Option<ImageAsset> {
        self.pending_bind = None;
        self.asset.take()
    }
}
