//! Keyboard focus shared by all viewports of an application

use super::ViewportId;
use crate::scene::NodeId;

/// Slot naming the one viewport that receives keyboard input
///
/// The application owns a single slot and passes it to every viewport call that
/// touches focus. The root of the holder's branch is stored with it so the
/// holder can be notified when another viewport takes the focus away.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FocusSlot {
    holder: Option<(ViewportId, NodeId)>,
}

impl FocusSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Viewport currently holding the focus
    pub fn holder(&self) -> Option<ViewportId> {
        self.holder.map(|(id, _)| id)
    }

    /// Clear the slot without notifying anybody
    pub fn reset(&mut self) {
        self.holder = None;
    }

    pub(super) fn take(&mut self) -> Option<(ViewportId, NodeId)> {
        self.holder.take()
    }

    pub(super) fn set(&mut self, viewport: ViewportId, branch: NodeId) {
        self.holder = Some((viewport, branch));
    }
}
