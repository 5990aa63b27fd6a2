//! Viewport pipeline tests against a recording back end and canvas

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use approx::assert_relative_eq;

use super::*;
use crate::config::ViewportConfig;
use crate::events::{EventPayload, EventType, Listener};
use crate::foundation::color::Color;
use crate::foundation::math::Vec2;
use crate::framing::{Border, Framing, Rectangle};
use crate::scene::{
    CameraComponent, ComponentData, ComponentId, LightComponent, LightKind, NodeId, SceneGraph,
};

#[derive(Debug, Default)]
struct RecordingBackend {
    calls: Vec<String>,
    rect: Rectangle,
    size: (u32, u32),
    registered: HashSet<NodeId>,
    lights: LightIndex,
}

impl RenderBackend for RecordingBackend {
    fn reset_frame_buffer(&mut self) {
        self.calls.push("reset".into());
    }

    fn clear(&mut self, _color: Color) {
        self.calls.push("clear".into());
    }

    fn add_branch(&mut self, _scene: &SceneGraph, root: NodeId) -> bool {
        self.calls.push("add_branch".into());
        self.registered.insert(root)
    }

    fn update(&mut self, _scene: &mut SceneGraph) {
        self.calls.push("update".into());
    }

    fn set_lights(&mut self, _scene: &SceneGraph, lights: &LightIndex) {
        self.calls.push("set_lights".into());
        self.lights = lights.clone();
    }

    fn draw_branch(&mut self, _scene: &SceneGraph, _root: NodeId, _camera: &CameraComponent) {
        self.calls.push("draw_branch".into());
    }

    fn canvas(&self) -> SurfaceHandle {
        SurfaceHandle(7)
    }

    fn set_canvas_size(&mut self, width: u32, height: u32) {
        self.calls.push("set_canvas_size".into());
        self.size = (width, height);
    }

    fn set_viewport_rectangle(&mut self, rect: Rectangle) {
        self.calls.push("set_viewport_rectangle".into());
        self.rect = rect;
    }

    fn viewport_rectangle(&self) -> Rectangle {
        self.rect
    }
}

#[derive(Debug, Default)]
struct CanvasState {
    client: Rectangle,
    size: (u32, u32),
    smoothing: Option<bool>,
    blits: Vec<(SurfaceHandle, Rectangle, Rectangle)>,
}

#[derive(Debug, Clone, Default)]
struct FakeCanvas(Rc<RefCell<CanvasState>>);

impl FakeCanvas {
    fn with_client(width: f32, height: f32) -> Self {
        let canvas = Self::default();
        canvas.0.borrow_mut().client = Rectangle::new(25.0, 40.0, width, height);
        canvas
    }
}

impl Canvas for FakeCanvas {
    fn client_rectangle(&self) -> Rectangle {
        self.0.borrow().client
    }

    fn size(&self) -> (u32, u32) {
        self.0.borrow().size
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.0.borrow_mut().size = (width, height);
    }

    fn set_image_smoothing(&mut self, enabled: bool) {
        self.0.borrow_mut().smoothing = Some(enabled);
    }

    fn draw_image(&mut self, image: SurfaceHandle, source: &Rectangle, destination: &Rectangle) {
        self.0.borrow_mut().blits.push((image, *source, *destination));
    }
}

struct Fixture {
    scene: SceneGraph,
    root: NodeId,
    camera: ComponentId,
    canvas: FakeCanvas,
    backend: RecordingBackend,
    viewport: Viewport,
}

fn fixture(width: f32, height: f32, configure: impl FnOnce(&mut Viewport)) -> Fixture {
    let mut scene = SceneGraph::new();
    let root = scene.create_node("Root");
    let camera_node = scene.create_node("Camera");
    scene.append_child(root, camera_node).unwrap();
    let camera = scene.create_component(ComponentData::Camera(CameraComponent::new(45.0)));
    scene.add_component(camera_node, camera).unwrap();

    let canvas = FakeCanvas::with_client(width, height);
    let mut backend = RecordingBackend::default();
    let mut viewport = Viewport::new("Test");
    configure(&mut viewport);
    viewport
        .initialize(&mut scene, "Test", Some(root), camera, Box::new(canvas.clone()), &mut backend)
        .unwrap();
    backend.calls.clear();
    Fixture { scene, root, camera, canvas, backend, viewport }
}

fn identity_chain(viewport: &mut Viewport) {
    viewport.frame_canvas_to_destination = Framing::identity();
}

fn light(scene: &mut SceneGraph, kind: LightKind) -> ComponentId {
    scene.create_component(ComponentData::Light(LightComponent::new(kind, Color::WHITE)))
}

#[test]
fn test_identity_chain_keeps_client_size() {
    let f = fixture(800.0, 600.0, identity_chain);
    assert_eq!(f.viewport.rect_source(), Rectangle::new(0.0, 0.0, 800.0, 600.0));
    assert_eq!(f.viewport.rect_destination(), Rectangle::new(0.0, 0.0, 800.0, 600.0));
    assert_eq!(f.canvas.0.borrow().size, (800, 600));
    assert_eq!(f.backend.size, (800, 600));
    assert_eq!(f.backend.rect, Rectangle::new(0.0, 0.0, 800.0, 600.0));

    let render = f.viewport.point_client_to_render(Vec2::new(400.0, 300.0));
    assert_relative_eq!(render.x, 400.0);
    assert_relative_eq!(render.y, 300.0);
}

#[test]
fn test_default_chain_matches_identity() {
    let f = fixture(800.0, 600.0, |_| {});
    assert_eq!(f.viewport.rect_source(), Rectangle::new(0.0, 0.0, 800.0, 600.0));
    assert_eq!(f.backend.size, (800, 600));
}

#[test]
fn test_scaled_destination_doubles_points() {
    let f = fixture(800.0, 600.0, |viewport| {
        viewport.frame_canvas_to_destination = Framing::scaled(2.0, 2.0);
    });
    let render = f.viewport.point_client_to_render(Vec2::new(100.0, 100.0));
    assert_relative_eq!(render.x, 200.0);
    assert_relative_eq!(render.y, 200.0);

    let source = f.viewport.point_client_to_source(Vec2::new(123.0, 45.5));
    let back = f.viewport.point_source_to_client(source);
    assert_relative_eq!(back.x, 123.0, epsilon = 1e-4);
    assert_relative_eq!(back.y, 45.5, epsilon = 1e-4);
}

#[test]
fn test_source_origin_is_forced_to_zero() {
    let f = fixture(800.0, 600.0, |viewport| {
        viewport.frame_canvas_to_destination = Framing::Complex {
            margin: Border::uniform(0.0),
            padding: Border::new(10.0, 20.0, 10.0, 20.0),
        };
    });
    assert_eq!(f.viewport.rect_destination(), Rectangle::new(10.0, 20.0, 780.0, 560.0));
    assert_eq!(f.viewport.rect_source(), Rectangle::new(0.0, 0.0, 780.0, 560.0));
    assert_eq!(f.backend.size, (780, 560));
}

#[test]
fn test_zero_client_is_tolerated() {
    let mut f = fixture(0.0, 0.0, |_| {});
    assert!(f.viewport.rect_source().is_degenerate());
    assert_eq!(f.backend.size, (0, 0));
    f.viewport.draw(&mut f.scene, &mut f.backend).unwrap();
    let camera = f.scene.camera(f.camera).unwrap();
    assert_relative_eq!(camera.aspect, 1.0);
    let point = f.viewport.point_client_to_render(Vec2::new(3.0, 4.0));
    assert!(point.x.is_finite() && point.y.is_finite());
}

#[test]
fn test_inactive_camera_only_resets() {
    let mut f = fixture(800.0, 600.0, |_| {});
    f.scene.camera_mut(f.camera).unwrap().active = false;
    f.viewport.draw(&mut f.scene, &mut f.backend).unwrap();
    assert_eq!(f.backend.calls, vec!["reset"]);
    assert!(f.canvas.0.borrow().blits.is_empty());
}

#[test]
fn test_draw_sequence() {
    let mut f = fixture(800.0, 400.0, |_| {});
    f.viewport.draw(&mut f.scene, &mut f.backend).unwrap();
    assert_eq!(
        f.backend.calls,
        vec![
            "reset",
            "set_viewport_rectangle",
            "set_canvas_size",
            "clear",
            "add_branch",
            "update",
            "set_lights",
            "draw_branch",
        ]
    );

    let state = f.canvas.0.borrow();
    assert_eq!(state.smoothing, Some(false));
    assert_eq!(
        state.blits,
        vec![(
            SurfaceHandle(7),
            Rectangle::new(0.0, 0.0, 800.0, 400.0),
            Rectangle::new(0.0, 0.0, 800.0, 400.0)
        )]
    );
    drop(state);
    assert_relative_eq!(f.scene.camera(f.camera).unwrap().aspect, 2.0);

    f.backend.calls.clear();
    f.viewport.draw(&mut f.scene, &mut f.backend).unwrap();
    assert!(!f.backend.calls.contains(&"update".to_string()));
}

#[test]
fn test_draw_without_adjusting_skips_frames() {
    let mut f = fixture(800.0, 600.0, |viewport| {
        viewport.adjusting_frames = false;
        viewport.adjusting_camera = false;
    });
    f.viewport.draw(&mut f.scene, &mut f.backend).unwrap();
    assert_eq!(f.backend.calls[..2], ["reset", "clear"]);
}

#[test]
fn test_resize_is_picked_up_on_next_draw() {
    let mut f = fixture(800.0, 600.0, |_| {});
    f.canvas.0.borrow_mut().client = Rectangle::new(0.0, 0.0, 300.0, 100.0);
    f.viewport.draw(&mut f.scene, &mut f.backend).unwrap();
    assert_eq!(f.viewport.rect_source(), Rectangle::new(0.0, 0.0, 300.0, 100.0));
    assert_relative_eq!(f.scene.camera(f.camera).unwrap().aspect, 3.0);
}

#[test]
fn test_uninitialized_viewport() {
    let mut scene = SceneGraph::new();
    let mut backend = RecordingBackend::default();
    let mut viewport = Viewport::new("Empty");
    assert_eq!(viewport.draw(&mut scene, &mut backend), Err(ViewportError::NotInitialized));
    assert!(backend.calls.is_empty());
    assert_eq!(viewport.adjust_frames(&mut backend), Err(ViewportError::NotInitialized));
}

#[test]
fn test_initialize_requires_camera() {
    let mut scene = SceneGraph::new();
    let root = scene.create_node("Root");
    let not_a_camera = light(&mut scene, LightKind::Ambient);
    let mut backend = RecordingBackend::default();
    let mut viewport = Viewport::default();
    let result = viewport.initialize(
        &mut scene,
        "Broken",
        Some(root),
        not_a_camera,
        Box::new(FakeCanvas::with_client(10.0, 10.0)),
        &mut backend,
    );
    assert_eq!(result, Err(ViewportError::CameraMissing));
}

#[test]
fn test_lights_collected_on_bind() {
    let mut scene = SceneGraph::new();
    let root = scene.create_node("Root");
    let lamp = scene.create_node("Lamp");
    scene.append_child(root, lamp).unwrap();
    let sun = light(&mut scene, LightKind::Directional);
    let bulb = light(&mut scene, LightKind::Point);
    scene.add_component(root, sun).unwrap();
    scene.add_component(lamp, bulb).unwrap();

    let mut viewport = Viewport::new("Lights");
    viewport.set_branch(&mut scene, Some(root)).unwrap();
    let lights = viewport.lights();
    assert_eq!(lights.get(&LightKind::Directional), Some(&vec![sun]));
    assert_eq!(lights.get(&LightKind::Point), Some(&vec![bulb]));
    assert_eq!(collect_lights(&scene, lamp).len(), 1);
}

#[test]
fn test_light_index_follows_component_events() {
    let mut f = fixture(800.0, 600.0, |_| {});
    let lamp = f.scene.create_node("Lamp");
    f.scene.append_child(f.root, lamp).unwrap();
    assert!(f.viewport.lights().is_empty());

    let bulb = light(&mut f.scene, LightKind::Point);
    f.scene.add_component(lamp, bulb).unwrap();
    assert_eq!(f.viewport.lights().get(&LightKind::Point), Some(&vec![bulb]));

    let ambient = light(&mut f.scene, LightKind::Ambient);
    f.scene.add_component(f.root, ambient).unwrap();
    assert_eq!(f.viewport.lights().len(), 2);

    f.scene.remove_component(lamp, bulb).unwrap();
    assert_eq!(f.viewport.lights().get(&LightKind::Point), None);

    f.viewport.draw(&mut f.scene, &mut f.backend).unwrap();
    assert_eq!(f.backend.lights.get(&LightKind::Ambient), Some(&vec![ambient]));
}

#[test]
fn test_lit_subtree_appended_waits_for_rebind() {
    let mut f = fixture(800.0, 600.0, |_| {});
    let lamp = f.scene.create_node("Lamp");
    let bulb = light(&mut f.scene, LightKind::Point);
    f.scene.add_component(lamp, bulb).unwrap();

    f.scene.append_child(f.root, lamp).unwrap();
    assert!(f.viewport.lights().is_empty());

    f.viewport.set_branch(&mut f.scene, Some(f.root)).unwrap();
    assert_eq!(f.viewport.lights().get(&LightKind::Point), Some(&vec![bulb]));
}

#[test]
fn test_rebind_moves_light_listener() {
    let mut f = fixture(800.0, 600.0, |_| {});
    let other = f.scene.create_node("Other");
    f.viewport.set_branch(&mut f.scene, Some(other)).unwrap();
    assert_eq!(f.scene.node(f.root).unwrap().listeners().count(&EventType::ComponentAdd, true), 0);

    let bulb = light(&mut f.scene, LightKind::Point);
    f.scene.add_component(f.root, bulb).unwrap();
    assert!(f.viewport.lights().is_empty());

    let spot = light(&mut f.scene, LightKind::Spot);
    f.scene.add_component(other, spot).unwrap();
    assert_eq!(f.viewport.lights().get(&LightKind::Spot), Some(&vec![spot]));
}

#[test]
fn test_release_unregisters_light_listener() {
    let mut f = fixture(800.0, 600.0, |_| {});
    let listeners = f.scene.node(f.root).unwrap().listeners();
    assert_eq!(listeners.count(&EventType::ComponentAdd, true), 1);
    assert_eq!(listeners.count(&EventType::NodeDeactivate, true), 1);

    f.viewport.release(&mut f.scene).unwrap();
    assert_eq!(f.viewport.branch(), None);
    for event_type in [
        EventType::ComponentAdd,
        EventType::ComponentRemove,
        EventType::NodeActivate,
        EventType::NodeDeactivate,
    ] {
        assert_eq!(f.scene.node(f.root).unwrap().listeners().count(&event_type, true), 0);
    }

    let bulb = light(&mut f.scene, LightKind::Point);
    f.scene.add_component(f.root, bulb).unwrap();
    assert!(f.viewport.lights().is_empty());
}

#[test]
fn test_deactivated_subtree_leaves_light_index() {
    let mut f = fixture(800.0, 600.0, |_| {});
    let lamp = f.scene.create_node("Lamp");
    f.scene.append_child(f.root, lamp).unwrap();
    let bulb = light(&mut f.scene, LightKind::Point);
    f.scene.add_component(lamp, bulb).unwrap();
    assert_eq!(f.viewport.lights().get(&LightKind::Point), Some(&vec![bulb]));

    f.scene.activate(lamp, false).unwrap();
    assert!(f.viewport.lights().is_empty());
    assert!(collect_lights(&f.scene, f.root).is_empty());

    f.scene.activate(lamp, true).unwrap();
    assert_eq!(f.viewport.lights().get(&LightKind::Point), Some(&vec![bulb]));
}

fn focus_recorder(scene: &mut SceneGraph, node: NodeId, log: &Rc<RefCell<Vec<String>>>) {
    for (event_type, label) in [(EventType::FocusIn, "in"), (EventType::FocusOut, "out")] {
        let log = Rc::clone(log);
        let name = scene.name(node).unwrap().to_string();
        let listener = Listener::new(move |_, _, _| {
            log.borrow_mut().push(format!("{name}-{label}"));
            Ok(())
        });
        scene.add_event_listener(node, event_type, listener, false).unwrap();
    }
}

#[test]
fn test_focus_moves_between_viewports() {
    let mut scene = SceneGraph::new();
    let first_root = scene.create_node("First");
    let second_root = scene.create_node("Second");
    let log = Rc::new(RefCell::new(Vec::new()));
    focus_recorder(&mut scene, first_root, &log);
    focus_recorder(&mut scene, second_root, &log);

    let mut first = Viewport::new("First");
    let mut second = Viewport::new("Second");
    first.set_branch(&mut scene, Some(first_root)).unwrap();
    second.set_branch(&mut scene, Some(second_root)).unwrap();
    let mut focus = FocusSlot::new();

    first.set_focus(&mut scene, &mut focus, true).unwrap();
    first.set_focus(&mut scene, &mut focus, true).unwrap();
    assert!(first.has_focus(&focus));

    second.set_focus(&mut scene, &mut focus, true).unwrap();
    assert!(!first.has_focus(&focus));
    assert!(second.has_focus(&focus));

    first.set_focus(&mut scene, &mut focus, false).unwrap();
    assert!(second.has_focus(&focus));

    second.set_focus(&mut scene, &mut focus, false).unwrap();
    assert_eq!(focus.holder(), None);
    assert_eq!(*log.borrow(), vec!["First-in", "First-out", "Second-in", "Second-out"]);

    first.set_focus(&mut scene, &mut focus, true).unwrap();
    focus.reset();
    assert!(!first.has_focus(&focus));
}

fn input_log(scene: &mut SceneGraph, node: NodeId) -> Rc<RefCell<Vec<EventPayload>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let event_types =
        [EventType::PointerDown, EventType::KeyDown, EventType::Wheel, EventType::Drop];
    for event_type in event_types {
        let sink = Rc::clone(&log);
        let listener = Listener::new(move |_, event, _| {
            sink.borrow_mut().push(event.payload().clone());
            Ok(())
        });
        scene.add_event_listener(node, event_type, listener, false).unwrap();
    }
    log
}

#[test]
fn test_inactive_input_is_ignored() {
    let mut f = fixture(400.0, 300.0, |_| {});
    let log = input_log(&mut f.scene, f.root);
    let focus = FocusSlot::new();
    let input = NativeInput::Pointer {
        event_type: EventType::PointerDown,
        position: Vec2::new(10.0, 10.0),
        button: 0,
    };
    assert!(!f.viewport.handle_native_input(&mut f.scene, &focus, input).unwrap());
    assert!(log.borrow().is_empty());
}

#[test]
fn test_pointer_input_carries_canvas_position() {
    let mut f = fixture(400.0, 300.0, |viewport| {
        viewport.frame_client_to_canvas = Framing::scaled(2.0, 2.0);
    });
    f.viewport
        .activate_pointer_event(InputActivation::POINTER_DOWN | InputActivation::KEY_DOWN, true);
    assert_eq!(f.viewport.input_activation(), InputActivation::POINTER_DOWN);
    let log = input_log(&mut f.scene, f.root);

    let input = NativeInput::Pointer {
        event_type: EventType::PointerDown,
        position: Vec2::new(100.0, 50.0),
        button: 2,
    };
    assert!(f.viewport.handle_native_input(&mut f.scene, &FocusSlot::new(), input).unwrap());

    let log = log.borrow();
    let EventPayload::Pointer(data) = &log[0] else {
        panic!("expected pointer payload, got {:?}", log[0]);
    };
    assert_eq!(data.button, 2);
    assert_eq!(data.client_rect, Rectangle::new(25.0, 40.0, 400.0, 300.0));
    assert_relative_eq!(data.canvas.x, 200.0);
    assert_relative_eq!(data.canvas.y, 100.0);
    assert_relative_eq!(data.render.x, 200.0);
    assert_relative_eq!(data.render.y, 100.0);
}

#[test]
fn test_keyboard_input_requires_focus() {
    let mut f = fixture(400.0, 300.0, |_| {});
    f.viewport.activate_keyboard_event(InputActivation::KEYBOARD, true);
    let log = input_log(&mut f.scene, f.root);
    let mut focus = FocusSlot::new();
    let key = || NativeInput::Keyboard {
        event_type: EventType::KeyDown,
        data: KeyboardData { key: "a".into(), code: "KeyA".into(), ..Default::default() },
    };

    assert!(!f.viewport.handle_native_input(&mut f.scene, &focus, key()).unwrap());
    f.viewport.set_focus(&mut f.scene, &mut focus, true).unwrap();
    assert!(f.viewport.handle_native_input(&mut f.scene, &focus, key()).unwrap());
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn test_wheel_and_drop_input() {
    let mut f = fixture(400.0, 300.0, |_| {});
    f.viewport.activate_wheel_event(true);
    f.viewport.activate_drag_drop_event(InputActivation::DROP, true);
    let log = input_log(&mut f.scene, f.root);
    let focus = FocusSlot::new();

    let delta = crate::foundation::math::Vec3::new(0.0, -3.0, 0.0);
    let wheel = WheelData { pointer: Vec2::new(1.0, 2.0), delta };
    let input = NativeInput::Wheel(wheel);
    assert!(f.viewport.handle_native_input(&mut f.scene, &focus, input).unwrap());
    let position = Vec2::new(4.0, 3.0);
    let drop = NativeInput::DragDrop { event_type: EventType::Drop, position };
    assert!(f.viewport.handle_native_input(&mut f.scene, &focus, drop).unwrap());
    let drag = NativeInput::DragDrop { event_type: EventType::DragOver, position };
    assert!(!f.viewport.handle_native_input(&mut f.scene, &focus, drag).unwrap());

    let log = log.borrow();
    assert_eq!(log[0], EventPayload::Wheel(wheel));
    assert!(matches!(log[1], EventPayload::DragDrop(_)));

    f.viewport.activate_wheel_event(false);
    assert!(!f.viewport.input_activation().contains(InputActivation::WHEEL));
}

#[test]
fn test_scene_graph_string() {
    crate::foundation::logging::init();
    let mut f = fixture(10.0, 10.0, |_| {});
    let lamp = f.scene.create_node("Lamp");
    f.scene.append_child(f.root, lamp).unwrap();
    for kind in [LightKind::Point, LightKind::Spot] {
        let id = light(&mut f.scene, kind);
        f.scene.add_component(lamp, id).unwrap();
    }
    assert_eq!(
        f.viewport.scene_graph_string(&f.scene),
        " Root | \n+ Camera | 1 Camera\n+ Lamp | 2 Light\n"
    );
    f.viewport.show_scene_graph(&f.scene);
}

#[test]
fn test_apply_config() {
    let mut viewport = Viewport::new("Before");
    let config = ViewportConfig {
        name: "After".into(),
        frame_source_to_render: Framing::fixed(64.0, 64.0),
        adjusting_camera: false,
        input: InputActivation::WHEEL,
        ..Default::default()
    };
    viewport.apply_config(&config);
    assert_eq!(viewport.name, "After");
    assert_eq!(viewport.frame_source_to_render, Framing::fixed(64.0, 64.0));
    assert!(!viewport.adjusting_camera);
    assert!(viewport.adjusting_frames);
    assert_eq!(viewport.input_activation(), InputActivation::WHEEL);
}

#[test]
fn test_viewport_ids_are_unique() {
    assert_ne!(Viewport::new("A").id(), Viewport::new("B").id());
}
