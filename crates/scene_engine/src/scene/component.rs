//! Components: behavior and data objects attached to nodes
//!
//! Component kinds form a closed enumeration. Application specific kinds use
//! [`ComponentData::Custom`], keyed by their type name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::NodeId;
use crate::foundation::color::Color;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// Key under which components are grouped on a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Local transformation
    Transform,
    /// Camera
    Camera,
    /// Light source
    Light,
    /// Reference to a mesh resource
    Mesh,
    /// Reference to a material resource
    Material,
    /// Application defined kind
    Custom(String),
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transform => write!(f, "Transform"),
            Self::Camera => write!(f, "Camera"),
            Self::Light => write!(f, "Light"),
            Self::Mesh => write!(f, "Mesh"),
            Self::Material => write!(f, "Material"),
            Self::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// Local transformation of a node relative to its parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformComponent {
    /// Local matrix
    pub local: Mat4,
}

impl TransformComponent {
    /// Transform that only translates
    pub fn from_translation(translation: Vec3) -> Self {
        Self { local: Mat4::new_translation(&translation) }
    }
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self { local: Mat4::identity() }
    }
}

/// Camera component
///
/// Holds the view parameters used to render a branch. The projection is
/// recomputed by [`project_central`](Self::project_central) whenever the render
/// surface changes its aspect ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraComponent {
    /// Vertical field of view in degrees
    pub field_of_view: f32,
    /// Aspect ratio (width / height) of the last projection
    pub aspect: f32,
    /// Distance to near clipping plane
    pub near: f32,
    /// Distance to far clipping plane
    pub far: f32,
    /// Color the render surface is cleared to
    pub background: Color,
    /// Inactive cameras draw nothing
    pub active: bool,
    /// Projection matrix of the last projection
    pub projection: Mat4,
}

impl CameraComponent {
    /// Create an active camera with the given field of view in degrees
    pub fn new(field_of_view: f32) -> Self {
        let mut camera = Self {
            field_of_view,
            aspect: 1.0,
            near: 1.0,
            far: 2000.0,
            background: Color::BLACK,
            active: true,
            projection: Mat4::identity(),
        };
        camera.project_central(1.0, field_of_view);
        camera
    }

    /// Recompute the central perspective projection
    pub fn project_central(&mut self, aspect: f32, field_of_view: f32) {
        if (self.aspect - aspect).abs() > 0.01 {
            log::debug!("Camera aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
        self.field_of_view = field_of_view;
        self.projection =
            Mat4::perspective(utils::deg_to_rad(field_of_view), aspect, self.near, self.far);
    }
}

impl Default for CameraComponent {
    fn default() -> Self {
        Self::new(45.0)
    }
}

/// Types of lights supported by the lighting system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LightKind {
    /// Uniform light from all directions
    Ambient,
    /// Directional light (like sunlight) with parallel rays
    Directional,
    /// Point light that radiates in all directions from a position
    Point,
    /// Spot light that creates a cone of light from a position
    Spot,
}

/// Light source component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightComponent {
    /// The type of light
    pub kind: LightKind,
    /// Color of the light
    pub color: Color,
    /// Intensity multiplier
    pub intensity: f32,
}

impl LightComponent {
    /// Create a light of the given kind with full intensity
    pub fn new(kind: LightKind, color: Color) -> Self {
        Self { kind, color, intensity: 1.0 }
    }
}

/// Reference to a mesh resource, constructed elsewhere
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MeshComponent {
    /// Resource identifier
    pub resource: String,
}

/// Reference to a material resource, constructed elsewhere
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialComponent {
    /// Resource identifier
    pub resource: String,
    /// Base color tint
    pub color: Color,
}

/// Application defined component
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomComponent {
    /// Type name used as the grouping key
    pub type_name: String,
    /// At most one instance per node when set
    pub singleton: bool,
    /// Free form properties
    pub properties: BTreeMap<String, String>,
}

/// Data of a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComponentData {
    /// Local transformation
    Transform(TransformComponent),
    /// Camera
    Camera(CameraComponent),
    /// Light source
    Light(LightComponent),
    /// Mesh reference
    Mesh(MeshComponent),
    /// Material reference
    Material(MaterialComponent),
    /// Application defined
    Custom(CustomComponent),
}

impl ComponentData {
    /// Grouping key of this data
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Transform(_) => ComponentKind::Transform,
            Self::Camera(_) => ComponentKind::Camera,
            Self::Light(_) => ComponentKind::Light,
            Self::Mesh(_) => ComponentKind::Mesh,
            Self::Material(_) => ComponentKind::Material,
            Self::Custom(custom) => ComponentKind::Custom(custom.type_name.clone()),
        }
    }

    /// Whether at most one component of this kind may be attached to a node
    pub fn is_singleton(&self) -> bool {
        match self {
            Self::Transform(_) | Self::Camera(_) | Self::Mesh(_) | Self::Material(_) => true,
            Self::Light(_) => false,
            Self::Custom(custom) => custom.singleton,
        }
    }
}

/// A component instance living in the scene graph's component arena
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    data: ComponentData,
    container: Option<NodeId>,
}

impl Component {
    pub(crate) fn new(data: ComponentData) -> Self {
        Self { data, container: None }
    }

    /// Data of this component
    pub fn data(&self) -> &ComponentData {
        &self.data
    }

    /// Mutable data of this component
    ///
    /// Crate private: replacing the variant would change the kind the component
    /// is grouped under on its node.
    pub(crate) fn data_mut(&mut self) -> &mut ComponentData {
        &mut self.data
    }

    /// Node this component is attached to
    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    pub(crate) fn set_container(&mut self, container: Option<NodeId>) {
        self.container = container;
    }

    /// Grouping key
    pub fn kind(&self) -> ComponentKind {
        self.data.kind()
    }
}
