//! Event registration and traversal over the scene graph

use super::{NodeId, SceneGraph, SceneResult};
use crate::events::{Event, EventContext, EventType, Listener, Phase};

impl SceneGraph {
    /// Register a handler on a node for the given type
    ///
    /// Capture handlers run while an event travels down towards its target and
    /// during broadcasts, the others at the target and while bubbling up.
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: EventType,
        listener: Listener,
        capture: bool,
    ) -> SceneResult<()> {
        self.node_mut(node)?.listeners.add(event_type, listener, capture);
        Ok(())
    }

    /// Unregister a handler, matching type, listener identity and phase exactly
    ///
    /// Returns whether a registration was removed.
    pub fn remove_event_listener(
        &mut self,
        node: NodeId,
        event_type: &EventType,
        listener: &Listener,
        capture: bool,
    ) -> SceneResult<bool> {
        Ok(self.node_mut(node)?.listeners.remove(event_type, listener, capture))
    }

    /// Dispatch an event to `target`, running capture, target and bubble phases
    ///
    /// Handler lists are copied before they run, so handlers may add or remove
    /// listeners without affecting the handlers invoked for the current node.
    /// The path to the root is fixed when dispatch starts; nodes dropped from
    /// the arena by a handler are skipped. The first handler error aborts the
    /// traversal and is returned.
    pub fn dispatch_event(&mut self, target: NodeId, event: &Event) -> SceneResult<()> {
        self.node(target)?;
        let mut ancestors = Vec::new();
        let mut upcoming = target;
        while let Some(parent) = self.get_parent(upcoming) {
            ancestors.push(parent);
            upcoming = parent;
        }

        for ancestor in ancestors.iter().rev() {
            self.invoke(*ancestor, target, event, Phase::Capture, true)?;
        }

        self.invoke(target, target, event, Phase::Target, true)?;
        self.invoke(target, target, event, Phase::Target, false)?;

        if !event.bubbles() {
            return Ok(());
        }
        for ancestor in &ancestors {
            self.invoke(*ancestor, target, event, Phase::Bubble, false)?;
        }
        Ok(())
    }

    /// Broadcast an event to `root` and every descendant, pre-order
    ///
    /// Only capture handlers are invoked, regardless of the bubbling flag.
    /// Children are read when their parent is visited, so nodes appended by a
    /// handler below the current node are visited as well.
    pub fn broadcast_event(&mut self, root: NodeId, event: &Event) -> SceneResult<()> {
        self.node(root)?;
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            self.invoke(current, root, event, Phase::Capture, true)?;
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children.iter().rev());
            }
        }
        Ok(())
    }

    fn invoke(
        &mut self,
        current: NodeId,
        target: NodeId,
        event: &Event,
        phase: Phase,
        capture: bool,
    ) -> SceneResult<()> {
        let handlers = match self.nodes.get(current) {
            Some(node) => node.listeners.snapshot(event.event_type(), capture),
            None => return Ok(()),
        };
        let context = EventContext { target, current_target: current, phase };
        for handler in handlers {
            handler.call(self, event, &context)?;
        }
        Ok(())
    }
}
