//! Viewport: binds a branch and a camera to a canvas
//!
//! Every draw derives its rectangles through a chain of [`Framing`] policies:
//!
//! ```text
//! client --(client_to_canvas)--> canvas size
//! canvas --(canvas_to_destination)--> destination   region of the canvas painted into
//! destination --(destination_to_source)--> source   region read from the offscreen buffer
//! source --(source_to_render)--> render surface     pushed to the render back end
//! ```
//!
//! Points travel the same chain: [`Viewport::point_client_to_render`] turns a
//! pointer position into render surface coordinates for picking.

use std::cell::RefCell;
use std::fmt;
use std::fmt::Write as _;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::backend::{Canvas, LightIndex, RenderBackend};
use super::focus::FocusSlot;
use super::input::{client_to_canvas, InputActivation, NativeInput, PointerData};
use crate::config::ViewportConfig;
use crate::events::{Event, EventPayload, EventType, Listener};
use crate::foundation::math::Vec2;
use crate::framing::{Framing, Rectangle};
use crate::scene::{ComponentId, ComponentKind, NodeId, SceneError, SceneGraph};

/// Result type for viewport operations
pub type ViewportResult<T> = Result<T, ViewportError>;

/// Errors raised by viewport operations
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ViewportError {
    /// The viewport has no canvas or branch yet
    #[error("viewport is not initialized")]
    NotInitialized,

    /// The camera handle does not refer to a camera component
    #[error("viewport camera is missing or not a camera component")]
    CameraMissing,

    /// A scene operation failed
    #[error(transparent)]
    Scene(#[from] SceneError),
}

static NEXT_VIEWPORT_ID: AtomicU64 = AtomicU64::new(1);

/// Process wide unique identity of a viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewportId(u64);

impl ViewportId {
    fn next() -> Self {
        Self(NEXT_VIEWPORT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Events on the bound branch root that rebuild the light index
const LIGHT_INDEX_EVENTS: [EventType; 4] = [
    EventType::ComponentAdd,
    EventType::ComponentRemove,
    EventType::NodeActivate,
    EventType::NodeDeactivate,
];

/// Collect the light components of a branch, keyed by light kind in pre-order
///
/// Inactive nodes and their descendants contribute no lights.
pub fn collect_lights(scene: &SceneGraph, root: NodeId) -> LightIndex {
    let mut lights = LightIndex::new();
    for node in scene.branch_active(root) {
        for id in scene.get_components(node, &ComponentKind::Light) {
            if let Some(light) = scene.light(id) {
                lights.entry(light.kind).or_default().push(id);
            }
        }
    }
    lights
}

/// A view onto a branch of the scene, drawn through a render back end onto a canvas
///
/// Binding a branch registers a capture listener on its root that keeps the
/// light index current. The scene graph holds that listener, not the viewport,
/// so call [`release`](Self::release) before dropping a viewport whose branch
/// lives on.
pub struct Viewport {
    id: ViewportId,
    /// Display name
    pub name: String,
    /// Client rectangle to canvas size
    pub frame_client_to_canvas: Framing,
    /// Canvas to the painted destination rectangle
    pub frame_canvas_to_destination: Framing,
    /// Destination to the region read from the offscreen buffer
    pub frame_destination_to_source: Framing,
    /// Source to the render surface
    pub frame_source_to_render: Framing,
    /// Re-derive the frames before every draw
    pub adjusting_frames: bool,
    /// Re-project the camera before every draw
    pub adjusting_camera: bool,

    camera: Option<ComponentId>,
    branch: Option<NodeId>,
    canvas: Option<Box<dyn Canvas>>,
    rect_source: Rectangle,
    rect_destination: Rectangle,
    lights: Rc<RefCell<LightIndex>>,
    light_listener: Listener,
    input: InputActivation,
}

impl fmt::Debug for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewport")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("camera", &self.camera)
            .field("branch", &self.branch)
            .field("rect_source", &self.rect_source)
            .field("rect_destination", &self.rect_destination)
            .field("input", &self.input)
            .finish_non_exhaustive()
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new("Viewport")
    }
}

impl Viewport {
    /// Create an uninitialized viewport with the default frame chain
    pub fn new(name: impl Into<String>) -> Self {
        let lights = Rc::new(RefCell::new(LightIndex::new()));
        let index = Rc::clone(&lights);
        let light_listener = Listener::new(move |scene, event, context| {
            let refresh = match event.event_type() {
                EventType::NodeActivate | EventType::NodeDeactivate => true,
                _ => matches!(
                    event.payload(),
                    EventPayload::Component { kind: ComponentKind::Light, .. }
                ),
            };
            if refresh {
                *index.borrow_mut() = collect_lights(scene, context.current_target);
                log::trace!("Light index refreshed after {:?}", event.event_type());
            }
            Ok(())
        });

        Self {
            id: ViewportId::next(),
            name: name.into(),
            frame_client_to_canvas: Framing::identity(),
            frame_canvas_to_destination: Framing::complex(),
            frame_destination_to_source: Framing::identity(),
            frame_source_to_render: Framing::identity(),
            adjusting_frames: true,
            adjusting_camera: true,
            camera: None,
            branch: None,
            canvas: None,
            rect_source: Rectangle::default(),
            rect_destination: Rectangle::default(),
            lights,
            light_listener,
            input: InputActivation::empty(),
        }
    }

    /// Identity of this viewport
    pub fn id(&self) -> ViewportId {
        self.id
    }

    /// Bind name, branch, camera and canvas, then derive the frames once
    ///
    /// # Errors
    /// [`ViewportError::CameraMissing`] if `camera` is not a camera component.
    pub fn initialize(
        &mut self,
        scene: &mut SceneGraph,
        name: impl Into<String>,
        branch: Option<NodeId>,
        camera: ComponentId,
        canvas: Box<dyn Canvas>,
        backend: &mut dyn RenderBackend,
    ) -> ViewportResult<()> {
        if scene.camera(camera).is_none() {
            return Err(ViewportError::CameraMissing);
        }
        self.name = name.into();
        self.camera = Some(camera);
        self.canvas = Some(canvas);
        self.rect_destination = self.client_rectangle();
        self.rect_source = backend.viewport_rectangle();
        self.set_branch(scene, branch)?;
        self.adjust_frames(backend)?;
        log::info!("Viewport '{}' initialized", self.name);
        Ok(())
    }

    /// Install name, frame chain, flags and input activation from a configuration
    pub fn apply_config(&mut self, config: &ViewportConfig) {
        self.name.clone_from(&config.name);
        self.frame_client_to_canvas = config.frame_client_to_canvas.clone();
        self.frame_canvas_to_destination = config.frame_canvas_to_destination.clone();
        self.frame_destination_to_source = config.frame_destination_to_source.clone();
        self.frame_source_to_render = config.frame_source_to_render.clone();
        self.adjusting_frames = config.adjusting_frames;
        self.adjusting_camera = config.adjusting_camera;
        self.input = config.input;
    }

    /// Camera component used for drawing
    pub fn camera(&self) -> Option<ComponentId> {
        self.camera
    }

    /// Switch to another camera component
    pub fn set_camera(&mut self, scene: &SceneGraph, camera: ComponentId) -> ViewportResult<()> {
        if scene.camera(camera).is_none() {
            return Err(ViewportError::CameraMissing);
        }
        self.camera = Some(camera);
        Ok(())
    }

    /// Root of the bound branch
    pub fn branch(&self) -> Option<NodeId> {
        self.branch
    }

    /// Bind a branch, or unbind with `None`
    ///
    /// Moves the light index listeners from the previous root to the new one and
    /// rebuilds the light index. The index follows light components being
    /// attached or detached and nodes being switched active or inactive inside
    /// the branch. Lights entering the branch with an appended subtree show up
    /// at the next rebind.
    pub fn set_branch(
        &mut self,
        scene: &mut SceneGraph,
        branch: Option<NodeId>,
    ) -> ViewportResult<()> {
        if let Some(previous) = self.branch.take() {
            if scene.contains(previous) {
                for event_type in &LIGHT_INDEX_EVENTS {
                    scene.remove_event_listener(previous, event_type, &self.light_listener, true)?;
                }
            }
        }
        if let Some(root) = branch {
            for event_type in LIGHT_INDEX_EVENTS {
                scene.add_event_listener(root, event_type, self.light_listener.clone(), true)?;
            }
            log::info!("Viewport '{}' bound to branch '{}'", self.name, scene.name(root)?);
        }
        self.branch = branch;
        self.collect_lights(scene);
        Ok(())
    }

    /// Unbind the branch, removing this viewport's listeners from the scene graph
    ///
    /// Teardown counterpart of [`initialize`](Self::initialize). The camera and
    /// canvas stay bound; a later [`set_branch`](Self::set_branch) binds again.
    pub fn release(&mut self, scene: &mut SceneGraph) -> ViewportResult<()> {
        if self.branch.is_some() {
            log::info!("Viewport '{}' released its branch", self.name);
        }
        self.set_branch(scene, None)
    }

    /// Rebuild the light index from the bound branch
    pub fn collect_lights(&self, scene: &SceneGraph) {
        let lights = self.branch.map(|root| collect_lights(scene, root)).unwrap_or_default();
        *self.lights.borrow_mut() = lights;
    }

    /// Copy of the light index
    pub fn lights(&self) -> LightIndex {
        self.lights.borrow().clone()
    }

    /// Canvas backing store as rectangle at the origin
    pub fn canvas_rectangle(&self) -> Rectangle {
        self.canvas.as_ref().map_or_else(Rectangle::default, |canvas| {
            let (width, height) = canvas.size();
            Rectangle::from_size(width as f32, height as f32)
        })
    }

    /// Size of the on-screen client area as rectangle at the origin
    pub fn client_rectangle(&self) -> Rectangle {
        self.canvas.as_ref().map_or_else(Rectangle::default, |canvas| {
            let client = canvas.client_rectangle();
            Rectangle::from_size(client.width, client.height)
        })
    }

    /// Region read from the offscreen buffer, always at the origin
    pub fn rect_source(&self) -> Rectangle {
        self.rect_source
    }

    /// Region of the canvas painted into
    pub fn rect_destination(&self) -> Rectangle {
        self.rect_destination
    }

    /// Draw the branch through the back end and blit the result onto the canvas
    ///
    /// The back end's framebuffer is claimed first. An inactive camera ends the
    /// draw right after that without error.
    pub fn draw(
        &mut self,
        scene: &mut SceneGraph,
        backend: &mut dyn RenderBackend,
    ) -> ViewportResult<()> {
        let (Some(camera), Some(branch)) = (self.camera, self.branch) else {
            return Err(ViewportError::NotInitialized);
        };
        if self.canvas.is_none() {
            return Err(ViewportError::NotInitialized);
        }

        backend.reset_frame_buffer();
        let active = scene.camera(camera).ok_or(ViewportError::CameraMissing)?.active;
        if !active {
            return Ok(());
        }

        if self.adjusting_frames {
            self.adjust_frames(backend)?;
        }
        if self.adjusting_camera {
            self.adjust_camera(scene, backend)?;
        }

        let background = scene.camera(camera).ok_or(ViewportError::CameraMissing)?.background;
        backend.clear(background);
        if backend.add_branch(scene, branch) {
            log::debug!("Viewport '{}' registered its branch, full update", self.name);
            backend.update(scene);
        }
        backend.set_lights(scene, &self.lights.borrow());
        let view = scene.camera(camera).ok_or(ViewportError::CameraMissing)?;
        backend.draw_branch(scene, branch, view);

        let image = backend.canvas();
        let canvas = self.canvas.as_mut().ok_or(ViewportError::NotInitialized)?;
        canvas.set_image_smoothing(false);
        canvas.draw_image(image, &self.rect_source, &self.rect_destination);
        Ok(())
    }

    /// Re-derive canvas size, destination, source and render rectangles from the client rectangle
    pub fn adjust_frames(&mut self, backend: &mut dyn RenderBackend) -> ViewportResult<()> {
        let client = self.client_rectangle();
        let rect_canvas = self.frame_client_to_canvas.map_rect(&client);
        let canvas = self.canvas.as_mut().ok_or(ViewportError::NotInitialized)?;
        canvas.set_size(to_pixels(rect_canvas.width), to_pixels(rect_canvas.height));

        self.rect_destination = self.frame_canvas_to_destination.map_rect(&self.canvas_rectangle());
        let source = self.frame_destination_to_source.map_rect(&self.rect_destination);
        // partial sources of a shared offscreen buffer are not supported
        self.rect_source = Rectangle::from_size(source.width, source.height);

        let rect_render = self.frame_source_to_render.map_rect(&self.rect_source);
        backend.set_viewport_rectangle(rect_render);
        backend.set_canvas_size(to_pixels(rect_render.width), to_pixels(rect_render.height));

        if rect_render.is_degenerate() {
            log::debug!(
                "Viewport '{}' has a degenerate render rectangle {:?}",
                self.name,
                rect_render
            );
        }
        log::debug!(
            "Viewport '{}' frames: client {:?}, destination {:?}, source {:?}, render {:?}",
            self.name,
            client,
            self.rect_destination,
            self.rect_source,
            rect_render
        );
        Ok(())
    }

    /// Re-project the camera for the aspect ratio of the render rectangle
    ///
    /// A render rectangle without height projects with aspect ratio one.
    pub fn adjust_camera(
        &self,
        scene: &mut SceneGraph,
        backend: &dyn RenderBackend,
    ) -> ViewportResult<()> {
        let id = self.camera.ok_or(ViewportError::NotInitialized)?;
        let rect = backend.viewport_rectangle();
        let aspect = if rect.height == 0.0 { 1.0 } else { rect.width / rect.height };
        let camera = scene.camera_mut(id).ok_or(ViewportError::CameraMissing)?;
        let field_of_view = camera.field_of_view;
        camera.project_central(aspect, field_of_view);
        Ok(())
    }

    /// Map a client position to the offscreen source region
    pub fn point_client_to_source(&self, client: Vec2) -> Vec2 {
        let mut point = self.frame_client_to_canvas.map_point(client, &self.client_rectangle());
        point = self.frame_canvas_to_destination.map_point(point, &self.canvas_rectangle());
        self.frame_destination_to_source.map_point(point, &self.destination_at_origin())
    }

    /// Map a position in the source region to the render surface
    pub fn point_source_to_render(&self, source: Vec2) -> Vec2 {
        self.frame_source_to_render.map_point(source, &self.rect_source)
    }

    /// Map a client position to the render surface
    pub fn point_client_to_render(&self, client: Vec2) -> Vec2 {
        self.point_source_to_render(self.point_client_to_source(client))
    }

    /// Map a position in the source region back to the client area
    pub fn point_source_to_client(&self, source: Vec2) -> Vec2 {
        let destination = self.destination_at_origin();
        let mut point = self.frame_destination_to_source.map_point_inverse(source, &destination);
        point = self.frame_canvas_to_destination.map_point_inverse(point, &self.canvas_rectangle());
        self.frame_client_to_canvas.map_point_inverse(point, &self.client_rectangle())
    }

    fn destination_at_origin(&self) -> Rectangle {
        Rectangle::from_size(self.rect_destination.width, self.rect_destination.height)
    }

    /// True if this viewport holds the focus
    pub fn has_focus(&self, focus: &FocusSlot) -> bool {
        focus.holder() == Some(self.id)
    }

    /// Take or give up the keyboard focus
    ///
    /// Taking the focus fires a [`EventType::FocusOut`] at the previous holder's
    /// branch and a [`EventType::FocusIn`] at this viewport's branch. Giving it up
    /// only has an effect while this viewport holds it.
    pub fn set_focus(
        &self,
        scene: &mut SceneGraph,
        focus: &mut FocusSlot,
        on: bool,
    ) -> ViewportResult<()> {
        if on {
            if self.has_focus(focus) {
                return Ok(());
            }
            let branch = self.branch.ok_or(ViewportError::NotInitialized)?;
            if let Some((loser, loser_branch)) = focus.take() {
                if scene.contains(loser_branch) {
                    scene.dispatch_event(
                        loser_branch,
                        &Event::new(EventType::FocusOut).with_payload(EventPayload::Focus(loser)),
                    )?;
                }
            }
            focus.set(self.id, branch);
            let focus_in =
                Event::new(EventType::FocusIn).with_payload(EventPayload::Focus(self.id));
            scene.dispatch_event(branch, &focus_in)?;
        } else {
            if !self.has_focus(focus) {
                return Ok(());
            }
            if let Some((_, branch)) = focus.take() {
                if scene.contains(branch) {
                    scene.dispatch_event(
                        branch,
                        &Event::new(EventType::FocusOut).with_payload(EventPayload::Focus(self.id)),
                    )?;
                }
            }
        }
        log::debug!("Viewport '{}' focus {}", self.name, if on { "in" } else { "out" });
        Ok(())
    }

    /// Input types currently forwarded
    pub fn input_activation(&self) -> InputActivation {
        self.input
    }

    /// Turn forwarding of the given input types on or off
    pub fn activate(&mut self, types: InputActivation, on: bool) {
        self.input.set(types, on);
    }

    /// Turn forwarding of pointer input types on or off, other types in `types` are ignored
    pub fn activate_pointer_event(&mut self, types: InputActivation, on: bool) {
        self.activate(types & InputActivation::POINTER, on);
    }

    /// Turn forwarding of keyboard input types on or off, other types in `types` are ignored
    pub fn activate_keyboard_event(&mut self, types: InputActivation, on: bool) {
        self.activate(types & InputActivation::KEYBOARD, on);
    }

    /// Turn forwarding of drag and drop input types on or off, other types in `types` are ignored
    pub fn activate_drag_drop_event(&mut self, types: InputActivation, on: bool) {
        self.activate(types & InputActivation::DRAG_DROP, on);
    }

    /// Turn forwarding of wheel input on or off
    pub fn activate_wheel_event(&mut self, on: bool) {
        self.activate(InputActivation::WHEEL, on);
    }

    /// Translate native input into an event dispatched at the branch root
    ///
    /// Returns whether the input was dispatched. Input of inactive types is
    /// ignored, as is keyboard input while another viewport holds the focus.
    pub fn handle_native_input(
        &self,
        scene: &mut SceneGraph,
        focus: &FocusSlot,
        input: NativeInput,
    ) -> ViewportResult<bool> {
        let event_type = input.event_type();
        let Some(flag) = InputActivation::from_event_type(&event_type) else {
            return Ok(false);
        };
        if !self.input.contains(flag) {
            return Ok(false);
        }
        let branch = self.branch.ok_or(ViewportError::NotInitialized)?;

        let payload = match input {
            NativeInput::Pointer { position, button, .. } => {
                EventPayload::Pointer(self.pointer_data(position, button))
            }
            NativeInput::DragDrop { position, .. } => {
                EventPayload::DragDrop(self.pointer_data(position, 0))
            }
            NativeInput::Keyboard { data, .. } => {
                if !self.has_focus(focus) {
                    return Ok(false);
                }
                EventPayload::Keyboard(data)
            }
            NativeInput::Wheel(data) => EventPayload::Wheel(data),
        };
        scene.dispatch_event(branch, &Event::bubbling(event_type).with_payload(payload))?;
        Ok(true)
    }

    fn pointer_data(&self, pointer: Vec2, button: u32) -> PointerData {
        let client_rect =
            self.canvas.as_ref().map_or_else(Rectangle::default, |c| c.client_rectangle());
        let canvas_size = self.canvas.as_ref().map_or((0, 0), |c| c.size());
        PointerData {
            pointer,
            client_rect,
            canvas: client_to_canvas(pointer, &client_rect, canvas_size),
            render: self.point_client_to_render(pointer),
            button,
        }
    }

    /// Text tree of the bound branch, one line per node with its component counts
    pub fn scene_graph_string(&self, scene: &SceneGraph) -> String {
        let mut output = String::new();
        if let Some(root) = self.branch {
            write_hierarchy(scene, root, 0, &mut output);
        }
        output
    }

    /// Log [`scene_graph_string`](Self::scene_graph_string) at info level
    pub fn show_scene_graph(&self, scene: &SceneGraph) {
        log::info!("Scene graph of viewport '{}':\n{}", self.name, self.scene_graph_string(scene));
    }
}

fn write_hierarchy(scene: &SceneGraph, node: NodeId, level: usize, output: &mut String) {
    let Ok(entry) = scene.node(node) else {
        return;
    };
    let counts: Vec<String> = entry
        .component_kinds()
        .map(|kind| format!("{} {}", scene.get_components(node, kind).len(), kind))
        .collect();
    let _ = writeln!(output, "{} {} | {}", "+".repeat(level), entry.name, counts.join(", "));
    for child in entry.children() {
        write_hierarchy(scene, *child, level + 1, output);
    }
}

fn to_pixels(length: f32) -> u32 {
    length.max(0.0).round() as u32
}

