//! # Scene Camera
//!
//! A camera with a set of named configurations (e.g. cockpit, chase, free) it can
//! switch between with a timed transition. A configuration may follow a scene node,
//! in which case its position and orientation are relative to that node.
//!
//! ## Coordinate System
//!
//! Right-handed, the camera looks down its local -Z axis with +Y up. Projections map
//! to OpenGL clip space.
//!
//! ## Bands
//!
//! The front pass uses the camera as configured. The distance pass uses the
//! *extended* view returned by [`Camera::extended_view`]: same pose, near plane
//! pushed out to (just before) the view distance and far plane at
//! `view_distance * extension_factor`.

use crate::core::config::{CameraConfig, CameraConfigurationDesc, ProjectionMode, TransitionStyle};
use crate::foundation::collections::NodeKey;
use crate::foundation::math::{slerp_orientation, utils, Mat4, Mat4Ext, Vec3, Vec4};
use crate::spatial::{CameraView, TransformLookup, Transformable};

/// Near plane of the extended view relative to the view distance
///
/// Slightly below one so the two bands overlap instead of leaving a seam.
pub const EXTENDED_NEAR_FACTOR: f32 = 0.95;

/// A named camera placement with its field of view and span limits
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfiguration {
    name: String,
    position: Vec3,
    orientation: Mat4,
    followed_object: Option<NodeKey>,
    default_fov: f32,
    fov_range: [f32; 2],
    default_span: f32,
    span_range: [f32; 2],
}

impl CameraConfiguration {
    /// Create a configuration from its serialized description (angles in degrees)
    pub fn from_desc(desc: &CameraConfigurationDesc) -> Self {
        Self {
            name: desc.name.clone(),
            position: Vec3::from(desc.position),
            orientation: Mat4::looking_towards(&Vec3::from(desc.direction)),
            followed_object: None,
            default_fov: utils::deg_to_rad(desc.fov),
            fov_range: [utils::deg_to_rad(desc.fov_range[0]), utils::deg_to_rad(desc.fov_range[1])],
            default_span: desc.span,
            span_range: desc.span_range,
        }
    }

    /// Builder pattern: make position and direction relative to a scene node
    pub fn following(mut self, key: NodeKey) -> Self {
        self.followed_object = Some(key);
        self
    }

    /// Unique name of the configuration
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The followed scene node, if any
    pub fn followed_object(&self) -> Option<NodeKey> {
        self.followed_object
    }

    /// Default vertical field of view in radians
    pub fn default_fov(&self) -> f32 {
        self.default_fov
    }

    /// Default span in world units
    pub fn default_span(&self) -> f32 {
        self.default_span
    }

    /// World-space pose of the configuration
    ///
    /// A configuration whose followed node is gone falls back to its own
    /// position and orientation taken as world space.
    fn pose<L: TransformLookup + ?Sized>(&self, lookup: &L) -> (Vec3, Mat4) {
        let followed = self.followed_object.and_then(|key| lookup.transformable(key));
        match followed {
            Some(transform) => {
                let orientation = transform.world_orientation(lookup);
                let offset = orientation * Vec4::new(self.position.x, self.position.y, self.position.z, 0.0);
                (transform.world_position(lookup) + offset.xyz(), orientation * self.orientation)
            }
            None => (self.position, self.orientation),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Transition {
    from_position: Vec3,
    from_orientation: Mat4,
    from_fov: f32,
    from_span: f32,
    elapsed: f32,
    duration: f32,
    style: TransitionStyle,
}

impl Transition {
    /// Blend factor in [0, 1] after the style's easing
    fn progress(&self) -> f32 {
        let t = if self.duration > 0.0 { (self.elapsed / self.duration).min(1.0) } else { 1.0 };
        match self.style {
            TransitionStyle::Instant => 1.0,
            TransitionStyle::Linear => t,
            TransitionStyle::Smooth => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// The scene camera
#[derive(Debug, Clone)]
pub struct Camera {
    transform: Transformable,
    fov: f32,
    span: f32,
    current_fov: f32,
    current_span: f32,
    aspect: f32,
    view_distance: f32,
    projection: ProjectionMode,
    extension_factor: f32,
    transition_duration: f32,
    transition_style: TransitionStyle,
    configurations: Vec<CameraConfiguration>,
    current: usize,
    transition: Option<Transition>,
}

impl Camera {
    /// Create a camera in the configuration described by `config`
    ///
    /// # Arguments
    /// * `config` - Projection, view distance and transition settings plus the
    ///   initial configuration
    ///
    /// # Returns
    /// A camera posed by its initial configuration; call [`Self::update`] once per
    /// frame to follow nodes and advance transitions.
    pub fn new(config: &CameraConfig) -> Self {
        let initial = CameraConfiguration::from_desc(&config.initial_configuration);
        let transform = Transformable::from_position(initial.position).with_orientation(initial.orientation);
        Self {
            transform,
            fov: initial.default_fov,
            span: initial.default_span,
            current_fov: initial.default_fov,
            current_span: initial.default_span,
            aspect: config.aspect,
            view_distance: config.view_distance,
            projection: config.projection,
            extension_factor: config.extension_factor,
            transition_duration: config.transition_duration,
            transition_style: config.transition_style,
            configurations: vec![initial],
            current: 0,
            transition: None,
        }
    }

    /// Register another configuration; one with the same name is replaced
    pub fn add_configuration(&mut self, configuration: CameraConfiguration) {
        match self.configurations.iter().position(|existing| existing.name == configuration.name) {
            Some(index) => self.configurations[index] = configuration,
            None => self.configurations.push(configuration),
        }
    }

    /// All registered configurations
    pub fn configurations(&self) -> &[CameraConfiguration] {
        &self.configurations
    }

    /// The active configuration
    pub fn current_configuration(&self) -> &CameraConfiguration {
        &self.configurations[self.current]
    }

    /// Switch to a registered configuration, starting a transition
    ///
    /// FOV and span are reset to the new configuration's defaults.
    ///
    /// # Panics
    ///
    /// Panics when no configuration named `name` is registered; selecting an
    /// unknown configuration is a caller bug.
    pub fn set_configuration(&mut self, name: &str) {
        let Some(index) = self.configurations.iter().position(|configuration| configuration.name == name) else {
            panic!("camera configuration '{name}' is not registered");
        };
        if index == self.current {
            return;
        }
        self.transition = match self.transition_style {
            TransitionStyle::Instant => None,
            style => Some(Transition {
                from_position: self.transform.position(),
                from_orientation: *self.transform.orientation_matrix(),
                from_fov: self.current_fov,
                from_span: self.current_span,
                elapsed: 0.0,
                duration: self.transition_duration,
                style,
            }),
        };
        self.current = index;
        self.fov = self.configurations[index].default_fov;
        self.span = self.configurations[index].default_span;
        log::info!("Camera switched to configuration '{name}'");
    }

    /// Whether a configuration transition is in progress
    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Widen (positive) or narrow the field of view, within the configuration's range
    pub fn change_fov(&mut self, delta_radians: f32) {
        let [min, max] = self.current_configuration().fov_range;
        self.fov = (self.fov + delta_radians).clamp(min, max);
    }

    /// Grow or shrink the span, within the configuration's range
    pub fn change_span(&mut self, delta: f32) {
        let [min, max] = self.current_configuration().span_range;
        self.span = (self.span + delta).clamp(min, max);
    }

    /// Resolve the pose of the active configuration and advance the transition
    pub fn update<L: TransformLookup + ?Sized>(&mut self, dt: f32, lookup: &L) {
        let (position, orientation) = self.configurations[self.current].pose(lookup);
        let (position, orientation, fov, span) = match &mut self.transition {
            Some(transition) => {
                transition.elapsed += dt;
                let t = transition.progress();
                let blended = (
                    transition.from_position.lerp(&position, t),
                    slerp_orientation(&transition.from_orientation, &orientation, t),
                    utils::lerp(transition.from_fov, self.fov, t),
                    utils::lerp(transition.from_span, self.span, t),
                );
                if t >= 1.0 {
                    self.transition = None;
                }
                blended
            }
            None => (position, orientation, self.fov, self.span),
        };
        self.transform.set_position(position);
        self.transform.set_orientation_matrix(orientation);
        self.current_fov = fov;
        self.current_span = span;
    }

    // === Parameters ===

    /// World position resolved by the last update
    pub fn position(&self) -> Vec3 {
        self.transform.position()
    }

    /// World orientation resolved by the last update
    pub fn orientation(&self) -> Mat4 {
        *self.transform.orientation_matrix()
    }

    /// Unit viewing direction in world space
    pub fn forward(&self) -> Vec3 {
        (self.transform.orientation_matrix() * Vec4::new(0.0, 0.0, -1.0, 0.0)).xyz()
    }

    /// Vertical field of view in radians as currently displayed
    pub fn fov(&self) -> f32 {
        self.current_fov
    }

    /// Span in world units as currently displayed
    pub fn span(&self) -> f32 {
        self.current_span
    }

    /// Viewport aspect ratio (width / height)
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Update the aspect ratio, e.g. after a window resize
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Far plane of the front view
    pub fn view_distance(&self) -> f32 {
        self.view_distance
    }

    /// Set the far plane of the front view
    pub fn set_view_distance(&mut self, view_distance: f32) {
        self.view_distance = view_distance;
    }

    /// Far plane of the extended view
    pub fn extended_view_distance(&self) -> f32 {
        self.view_distance * self.extension_factor
    }

    /// Near plane distance; for perspective cameras the span is the near plane width
    pub fn near(&self) -> f32 {
        match self.projection {
            ProjectionMode::Perspective => self.current_span / (2.0 * self.aspect * (self.current_fov / 2.0).tan()),
            ProjectionMode::Orthographic => 0.0,
        }
    }

    // === Matrices ===

    /// World to camera space
    pub fn view_matrix(&self) -> Mat4 {
        self.transform.orientation_matrix().transpose() * Mat4::translation(&-self.transform.position())
    }

    fn projection_between(&self, near: f32, far: f32) -> Mat4 {
        match self.projection {
            ProjectionMode::Perspective => Mat4::perspective(self.current_fov, self.aspect, near, far),
            ProjectionMode::Orthographic => {
                let half_width = self.current_span / 2.0;
                Mat4::orthographic(half_width, half_width / self.aspect, near, far)
            }
        }
    }

    /// Camera to clip space for the front view
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_between(self.near(), self.view_distance)
    }

    /// Combined view-projection matrix of the front view
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    fn view_between(&self, near: f32, far: f32, viewport: (u32, u32)) -> CameraView {
        CameraView {
            view_matrix: self.view_matrix(),
            projection_matrix: self.projection_between(near, far),
            position: self.position(),
            orientation: self.orientation(),
            near,
            view_distance: far,
            viewport,
        }
    }

    /// Snapshot of the front view for one frame
    pub fn camera_view(&self, viewport: (u32, u32)) -> CameraView {
        self.view_between(self.near(), self.view_distance, viewport)
    }

    /// Snapshot of the extended view used by the distance pass
    pub fn extended_view(&self, viewport: (u32, u32)) -> CameraView {
        self.view_between(
            self.view_distance * EXTENDED_NEAR_FACTOR,
            self.extended_view_distance(),
            viewport,
        )
    }
}
