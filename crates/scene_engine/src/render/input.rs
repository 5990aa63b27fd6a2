//! Input wiring between a host surface and a viewport's branch
//!
//! The host translates raw device input into [`NativeInput`] and hands it to
//! [`Viewport::handle_native_input`](super::Viewport::handle_native_input). The
//! viewport filters by its [`InputActivation`] flags, adds canvas coordinates and
//! dispatches the result as a bubbling event at the root of its branch.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::events::EventType;
use crate::foundation::math::{Vec2, Vec3};
use crate::framing::Rectangle;

bitflags! {
    /// Native input types a viewport forwards into its branch
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct InputActivation: u32 {
        /// Pointer button released
        const POINTER_UP = 1 << 0;
        /// Pointer button pressed
        const POINTER_DOWN = 1 << 1;
        /// Pointer moved
        const POINTER_MOVE = 1 << 2;
        /// Key released
        const KEY_UP = 1 << 3;
        /// Key pressed
        const KEY_DOWN = 1 << 4;
        /// Dragged element moved
        const DRAG = 1 << 5;
        /// Dragged element dropped
        const DROP = 1 << 6;
        /// Drag started
        const DRAG_START = 1 << 7;
        /// Drag ended
        const DRAG_END = 1 << 8;
        /// Dragged element over the surface
        const DRAG_OVER = 1 << 9;
        /// Wheel turned
        const WHEEL = 1 << 10;

        /// All pointer types
        const POINTER = Self::POINTER_UP.bits()
            | Self::POINTER_DOWN.bits()
            | Self::POINTER_MOVE.bits();
        /// All keyboard types
        const KEYBOARD = Self::KEY_UP.bits() | Self::KEY_DOWN.bits();
        /// All drag and drop types
        const DRAG_DROP = Self::DRAG.bits()
            | Self::DROP.bits()
            | Self::DRAG_START.bits()
            | Self::DRAG_END.bits()
            | Self::DRAG_OVER.bits();
    }
}

impl InputActivation {
    /// Flag matching an input event type, `None` for structural and custom types
    pub fn from_event_type(event_type: &EventType) -> Option<Self> {
        let flag = match event_type {
            EventType::PointerUp => Self::POINTER_UP,
            EventType::PointerDown => Self::POINTER_DOWN,
            EventType::PointerMove => Self::POINTER_MOVE,
            EventType::KeyUp => Self::KEY_UP,
            EventType::KeyDown => Self::KEY_DOWN,
            EventType::Drag => Self::DRAG,
            EventType::Drop => Self::DROP,
            EventType::DragStart => Self::DRAG_START,
            EventType::DragEnd => Self::DRAG_END,
            EventType::DragOver => Self::DRAG_OVER,
            EventType::Wheel => Self::WHEEL,
            _ => return None,
        };
        Some(flag)
    }
}

/// Pointer position in every coordinate system of the frame chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerData {
    /// Position relative to the client rectangle, as delivered by the host
    pub pointer: Vec2,
    /// Client rectangle of the surface at the time of the input
    pub client_rect: Rectangle,
    /// Position in canvas pixels
    pub canvas: Vec2,
    /// Position on the render surface
    pub render: Vec2,
    /// Pressed button, 0 for the primary button
    pub button: u32,
}

/// Keyboard input
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyboardData {
    /// Logical key value, e.g. `"a"` or `"Enter"`
    pub key: String,
    /// Physical key code, e.g. `"KeyA"`
    pub code: String,
    /// Shift held
    pub shift: bool,
    /// Control held
    pub ctrl: bool,
    /// Alt held
    pub alt: bool,
    /// Key held down and auto repeating
    pub repeat: bool,
}

/// Wheel input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelData {
    /// Position relative to the client rectangle
    pub pointer: Vec2,
    /// Scroll amounts along x, y and z
    pub delta: Vec3,
}

/// Raw input delivered by the host surface
#[derive(Debug, Clone, PartialEq)]
pub enum NativeInput {
    /// Pointer press, release or motion
    Pointer {
        /// One of [`EventType::PointerUp`], [`EventType::PointerDown`], [`EventType::PointerMove`]
        event_type: EventType,
        /// Position relative to the client rectangle
        position: Vec2,
        /// Pressed button
        button: u32,
    },
    /// Key press or release
    Keyboard {
        /// [`EventType::KeyUp`] or [`EventType::KeyDown`]
        event_type: EventType,
        /// Key data
        data: KeyboardData,
    },
    /// Drag and drop over the surface
    DragDrop {
        /// One of the drag and drop event types
        event_type: EventType,
        /// Position relative to the client rectangle
        position: Vec2,
    },
    /// Wheel turned over the surface
    Wheel(WheelData),
}

impl NativeInput {
    /// Event type this input is dispatched as
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Pointer { event_type, .. }
            | Self::Keyboard { event_type, .. }
            | Self::DragDrop { event_type, .. } => event_type.clone(),
            Self::Wheel(_) => EventType::Wheel,
        }
    }
}

/// Map a client position into canvas pixels
///
/// With an empty client rectangle the position is returned unchanged.
pub fn client_to_canvas(pointer: Vec2, client_rect: &Rectangle, canvas_size: (u32, u32)) -> Vec2 {
    let scale = |value: f32, canvas: u32, client: f32| {
        if client == 0.0 {
            value
        } else {
            canvas as f32 * value / client
        }
    };
    Vec2::new(
        scale(pointer.x, canvas_size.0, client_rect.width),
        scale(pointer.y, canvas_size.1, client_rect.height),
    )
}
