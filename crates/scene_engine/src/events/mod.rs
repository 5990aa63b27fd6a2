//! Structural event system for the scene graph
//!
//! Events travel through the node hierarchy in three phases:
//! - Capture: from the root ancestor down to (excluding) the target
//! - Target: the target node itself
//! - Bubble: from the target's parent up to the root, bubbling events only
//!
//! The [`Event`] itself is immutable. Where the event currently is in its
//! traversal is described by an [`EventContext`] passed to each handler next to it.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::render::input::{KeyboardData, PointerData, WheelData};
use crate::render::viewport::ViewportId;
use crate::scene::{ComponentId, ComponentKind, NodeId, SceneError, SceneGraph};

/// Event type identification
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    /// A node was appended to a parent, dispatched to the child
    ChildAppend,
    /// A node is about to be removed from its parent, dispatched to the child
    ChildRemove,
    /// A component was attached, dispatched to its node
    ComponentAdd,
    /// A component was detached, dispatched to its former node
    ComponentRemove,
    /// A node was written into a record
    NodeSerialized,
    /// A node was rebuilt from a record
    NodeDeserialized,
    /// A node was switched active, dispatched to the node
    NodeActivate,
    /// A node was switched inactive, dispatched to the node
    NodeDeactivate,
    /// A viewport received the keyboard focus
    FocusIn,
    /// A viewport lost the keyboard focus
    FocusOut,
    /// Pointer button released
    PointerUp,
    /// Pointer button pressed
    PointerDown,
    /// Pointer moved
    PointerMove,
    /// Key released
    KeyUp,
    /// Key pressed
    KeyDown,
    /// Dragged element moved
    Drag,
    /// Dragged element dropped
    Drop,
    /// Drag operation started
    DragStart,
    /// Drag operation ended
    DragEnd,
    /// Dragged element moved over a drop target
    DragOver,
    /// Mouse wheel turned
    Wheel,
    /// Application defined event type
    Custom(String),
}

/// Traversal phase an event is in when a handler sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Travelling from the root towards the target
    Capture,
    /// At the target node
    Target,
    /// Travelling from the target back to the root
    Bubble,
}

/// Data carried by an event
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EventPayload {
    /// No additional data
    #[default]
    None,
    /// The node that was appended or removed
    Child(NodeId),
    /// The component that was attached or detached
    Component {
        /// Handle of the component
        component: ComponentId,
        /// Kind of the component
        kind: ComponentKind,
    },
    /// The viewport gaining or losing focus
    Focus(ViewportId),
    /// Pointer position data
    Pointer(PointerData),
    /// Drag and drop position data
    DragDrop(PointerData),
    /// Keyboard data
    Keyboard(KeyboardData),
    /// Wheel deltas
    Wheel(WheelData),
}

/// Immutable event passed through the hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    event_type: EventType,
    bubbles: bool,
    payload: EventPayload,
}

impl Event {
    /// Create a non-bubbling event
    pub fn new(event_type: EventType) -> Self {
        Self { event_type, bubbles: false, payload: EventPayload::None }
    }

    /// Create a bubbling event
    pub fn bubbling(event_type: EventType) -> Self {
        Self { event_type, bubbles: true, payload: EventPayload::None }
    }

    /// Attach a payload (builder pattern)
    pub fn with_payload(mut self, payload: EventPayload) -> Self {
        self.payload = payload;
        self
    }

    /// Type of event
    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    /// Whether the event continues into the bubble phase
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Data carried by the event
    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }
}

/// Where an event currently is in its traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventContext {
    /// Node the event was dispatched to, or the root of a broadcast
    pub target: NodeId,
    /// Node whose handlers are being invoked
    pub current_target: NodeId,
    /// Current phase
    pub phase: Phase,
}

type HandlerFn = dyn Fn(&mut SceneGraph, &Event, &EventContext) -> Result<(), SceneError>;

/// Registered event handler
///
/// Cloning a listener yields the same handler; two listeners are equal only if
/// they are clones of each other, which is what removal matches against.
/// An `Err` returned by the handler aborts the remaining traversal and is
/// handed back to whoever dispatched the event.
#[derive(Clone)]
pub struct Listener(Rc<HandlerFn>);

impl Listener {
    /// Wrap a handler closure
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&mut SceneGraph, &Event, &EventContext) -> Result<(), SceneError> + 'static,
    {
        Self(Rc::new(handler))
    }

    /// Invoke the handler
    pub fn call(
        &self,
        scene: &mut SceneGraph,
        event: &Event,
        context: &EventContext,
    ) -> Result<(), SceneError> {
        (self.0)(scene, event, context)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener").field(&Rc::as_ptr(&self.0).cast::<()>()).finish()
    }
}

/// Per-node handler registrations, split into capture and target/bubble lists
#[derive(Debug, Default, Clone)]
pub struct ListenerTable {
    captures: HashMap<EventType, Vec<Listener>>,
    listeners: HashMap<EventType, Vec<Listener>>,
}

impl ListenerTable {
    fn list(&self, capture: bool) -> &HashMap<EventType, Vec<Listener>> {
        if capture {
            &self.captures
        } else {
            &self.listeners
        }
    }

    fn list_mut(&mut self, capture: bool) -> &mut HashMap<EventType, Vec<Listener>> {
        if capture {
            &mut self.captures
        } else {
            &mut self.listeners
        }
    }

    /// Append a handler for the given type and phase
    pub fn add(&mut self, event_type: EventType, listener: Listener, capture: bool) {
        self.list_mut(capture).entry(event_type).or_default().push(listener);
    }

    /// Remove the first registration matching exactly, returns whether one was found
    pub fn remove(&mut self, event_type: &EventType, listener: &Listener, capture: bool) -> bool {
        let list = self.list_mut(capture);
        let Some(handlers) = list.get_mut(event_type) else {
            return false;
        };
        let Some(found) = handlers.iter().position(|registered| registered == listener) else {
            return false;
        };
        handlers.remove(found);
        if handlers.is_empty() {
            list.remove(event_type);
        }
        true
    }

    /// Copy of the handlers for a type and phase, in registration order
    pub fn snapshot(&self, event_type: &EventType, capture: bool) -> Vec<Listener> {
        self.list(capture).get(event_type).cloned().unwrap_or_default()
    }

    /// Number of handlers for a type and phase
    pub fn count(&self, event_type: &EventType, capture: bool) -> usize {
        self.list(capture).get(event_type).map_or(0, Vec::len)
    }
}
