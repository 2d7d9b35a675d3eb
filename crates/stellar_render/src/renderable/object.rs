//! Renderable objects of all kinds
//!
//! Every node of the scene tree holds one [`RenderableObject`]: the shared
//! [`Renderable`] state, the optional 3D state and an [`ObjectKind`] tag with the
//! variant data. The traversal and the render passes only talk to this type, which
//! dispatches on the kind where the variants differ.

use std::mem;
use std::rc::Rc;

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::api::{GpuContext, Model, UniformValue, UniformValues};
use crate::scene::RenderQueueBits;
use crate::spatial::{CameraView, Transformable};

use super::base::Renderable;
use super::billboard::Billboard;
use super::lod::LodContext;
use super::mesh::ShadedLodMesh;
use super::particle::{Particle, PointCloud, PointParticle};
use super::spatial::{Spatial, SpatialLookup};
use super::ui::UiElement;

/// The camera, LOD settings and parent lookup objects are evaluated against
#[derive(Clone, Copy)]
pub struct ViewContext<'a> {
    /// Resolves parents of 3D objects
    pub lookup: &'a dyn SpatialLookup,
    /// The camera of the current pass
    pub camera: &'a CameraView,
    /// LOD settings of the scene
    pub lod: &'a LodContext,
}

impl ViewContext<'_> {
    /// Size ratio floor for objects sized through their parent
    pub fn min_relative_size(&self) -> f32 {
        self.lod.min_relative_size()
    }
}

/// Variant data of a renderable object
#[derive(Debug)]
pub enum ObjectKind {
    /// Model with LOD selection
    Mesh(ShadedLodMesh),
    /// Camera-facing quad
    Billboard(Billboard),
    /// Animated quad
    Particle(Particle),
    /// Instanced point sprite
    PointParticle(PointParticle),
    /// Container of point particles
    PointCloud(PointCloud),
    /// Screen-space overlay quad
    Ui(UiElement),
    /// Empty 3D container
    Group,
}

impl ObjectKind {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mesh(_) => "mesh",
            Self::Billboard(_) => "billboard",
            Self::Particle(_) => "particle",
            Self::PointParticle(_) => "point particle",
            Self::PointCloud(_) => "point cloud",
            Self::Ui(_) => "ui element",
            Self::Group => "group",
        }
    }
}

/// Result of one draw, collected into the scene's render statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawStats {
    /// Number of draw calls issued
    pub draw_calls: usize,
    /// Number of triangles submitted
    pub triangles: usize,
}

/// An object of the scene tree
#[derive(Debug)]
pub struct RenderableObject {
    base: Renderable,
    spatial: Option<Spatial>,
    kind: ObjectKind,
}

impl RenderableObject {
    /// Create an object from its parts
    pub fn new(base: Renderable, spatial: Option<Spatial>, kind: ObjectKind) -> Self {
        Self { base, spatial, kind }
    }

    /// A 3D mesh
    pub fn mesh(base: Renderable, transform: Transformable, mesh: ShadedLodMesh) -> Self {
        Self::new(base, Some(Spatial::new(transform)), ObjectKind::Mesh(mesh))
    }

    /// A billboard; the transform's size follows the billboard size
    pub fn billboard(base: Renderable, transform: Transformable, billboard: Billboard) -> Self {
        let transform = transform.with_size(billboard.size());
        Self::new(base, Some(Spatial::new(transform)), ObjectKind::Billboard(billboard))
    }

    /// A particle; the transform's size follows the particle size
    pub fn particle(base: Renderable, transform: Transformable, particle: Particle) -> Self {
        let transform = transform.with_size(particle.size());
        Self::new(base, Some(Spatial::new(transform)), ObjectKind::Particle(particle))
    }

    /// A point particle
    pub fn point_particle(base: Renderable, transform: Transformable, particle: PointParticle) -> Self {
        Self::new(base, Some(Spatial::new(transform)), ObjectKind::PointParticle(particle))
    }

    /// A point cloud container (never drawn itself)
    pub fn point_cloud(transform: Transformable, cloud: PointCloud) -> Self {
        let base = Renderable::new(None).without_shadows();
        Self::new(base, Some(Spatial::new(transform)), ObjectKind::PointCloud(cloud))
    }

    /// An overlay element
    pub fn ui(base: Renderable, element: UiElement) -> Self {
        Self::new(base.without_shadows(), None, ObjectKind::Ui(element))
    }

    /// An empty 3D container
    pub fn group(transform: Transformable) -> Self {
        Self::new(Renderable::new(None).without_shadows(), Some(Spatial::new(transform)), ObjectKind::Group)
    }

    /// An empty container without 3D state (tree roots)
    pub fn root() -> Self {
        Self::new(Renderable::new(None).without_shadows(), None, ObjectKind::Group)
    }

    /// Shared renderable state
    pub fn base(&self) -> &Renderable {
        &self.base
    }

    /// Mutable shared renderable state
    pub fn base_mut(&mut self) -> &mut Renderable {
        &mut self.base
    }

    /// 3D state, `None` for overlay elements and tree roots
    pub fn spatial(&self) -> Option<&Spatial> {
        self.spatial.as_ref()
    }

    /// Mutable 3D state
    pub fn spatial_mut(&mut self) -> Option<&mut Spatial> {
        self.spatial.as_mut()
    }

    /// The object's transform, if it is a 3D object
    pub fn transform(&self) -> Option<&Transformable> {
        self.spatial.as_ref().map(Spatial::transform)
    }

    /// Mutable transform, if it is a 3D object
    pub fn transform_mut(&mut self) -> Option<&mut Transformable> {
        self.spatial.as_mut().map(Spatial::transform_mut)
    }

    /// Variant data
    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    /// Mutable variant data
    pub fn kind_mut(&mut self) -> &mut ObjectKind {
        &mut self.kind
    }

    /// The model drawn by the object, if any
    pub fn model(&self) -> Option<&Rc<dyn Model>> {
        match &self.kind {
            ObjectKind::Mesh(mesh) => Some(mesh.model()),
            ObjectKind::Billboard(billboard) => Some(billboard.model()),
            ObjectKind::Particle(particle) => Some(particle.model()),
            ObjectKind::PointParticle(particle) => Some(particle.model()),
            ObjectKind::Ui(element) => Some(element.model()),
            ObjectKind::PointCloud(_) | ObjectKind::Group => None,
        }
    }

    /// Clear all per-frame caches and flags
    pub fn reset_for_new_frame(&self) {
        self.base.reset_for_new_frame();
        if let Some(spatial) = &self.spatial {
            spatial.reset_for_new_frame();
        }
        if let ObjectKind::Mesh(mesh) = &self.kind {
            mesh.reset_for_new_frame();
        }
    }

    /// Advance the object's animation by `dt` seconds
    pub fn animate(&mut self, dt: f32) {
        match &mut self.kind {
            ObjectKind::Particle(particle) => {
                let update = particle.animate(dt);
                let size = particle.size();
                if let Some(transform) = self.spatial.as_mut().map(Spatial::transform_mut) {
                    if let Some(displacement) = update.displacement {
                        transform.translate(&displacement);
                    }
                    transform.set_size(size);
                }
                if update.finished {
                    self.base.mark_as_reusable();
                }
            }
            ObjectKind::PointCloud(PointCloud { drift: Some(drift) }) => {
                let displacement = *drift * dt;
                if let Some(transform) = self.spatial.as_mut().map(Spatial::transform_mut) {
                    transform.translate(&displacement);
                }
            }
            _ => {}
        }
    }

    /// The LOD the object is drawn with in this frame (meshes only)
    pub fn current_lod(&self, view: &ViewContext<'_>) -> Option<usize> {
        let ObjectKind::Mesh(mesh) = &self.kind else {
            return None;
        };
        if let Some(lod) = mesh.cached_lod() {
            return Some(lod);
        }
        let (size_in_pixels, scaled_size) = match &self.spatial {
            Some(spatial) => (
                spatial.visible_size_in_pixels(view.lookup, view.camera, view.min_relative_size()),
                spatial.transform().scaled_size(view.lookup),
            ),
            None => (0.0, 0.0),
        };
        Some(mesh.current_lod(size_in_pixels, scaled_size, view.lod))
    }

    /// Whether the object has parts drawn with depth writes (opaque parts)
    pub fn renders_with_depth_mask(&self, view: &ViewContext<'_>) -> bool {
        match &self.kind {
            ObjectKind::Mesh(mesh) => self.current_lod(view).is_some_and(|lod| mesh.renders_opaque(lod)),
            ObjectKind::PointParticle(_) => true,
            ObjectKind::Billboard(_)
            | ObjectKind::Particle(_)
            | ObjectKind::Ui(_)
            | ObjectKind::PointCloud(_)
            | ObjectKind::Group => false,
        }
    }

    /// Whether the object has parts drawn without depth writes (blended parts)
    pub fn renders_without_depth_mask(&self, view: &ViewContext<'_>) -> bool {
        match &self.kind {
            ObjectKind::Mesh(mesh) => self.current_lod(view).is_some_and(|lod| mesh.renders_transparent(lod)),
            ObjectKind::Billboard(_) | ObjectKind::Particle(_) | ObjectKind::Ui(_) => true,
            ObjectKind::PointParticle(_) | ObjectKind::PointCloud(_) | ObjectKind::Group => false,
        }
    }

    /// Which camera-distance band(s) the object falls into
    ///
    /// Objects without 3D state always go to the front band.
    pub fn render_queue_bits(&self, view: &ViewContext<'_>, extended_view_distance: f32) -> RenderQueueBits {
        let Some(spatial) = &self.spatial else {
            return RenderQueueBits::FRONT;
        };
        let transform = spatial.transform();
        let depth = -transform.position_in_camera_space(view.lookup, &view.camera.view_matrix).z;
        let radius = transform.scaled_size(view.lookup);
        let mut bits = RenderQueueBits::empty();
        if depth - radius < view.camera.view_distance && depth + radius > view.camera.near {
            bits |= RenderQueueBits::FRONT;
        }
        if depth + radius > view.camera.view_distance && depth - radius < extended_view_distance {
            bits |= RenderQueueBits::DISTANCE;
        }
        bits
    }

    /// Whether the object is drawn in a pass with (`depth_mask`) or without depth writes
    ///
    /// Dead and hidden objects are never drawn; 3D objects must also be inside the
    /// frustum and larger on screen than their minimum size.
    pub fn should_be_rendered(&self, view: &ViewContext<'_>, depth_mask: bool) -> bool {
        if self.base.can_be_reused() || !self.base.is_visible() {
            return false;
        }
        let in_pass = if depth_mask {
            self.renders_with_depth_mask(view)
        } else {
            self.renders_without_depth_mask(view)
        };
        if !in_pass {
            return false;
        }
        match &self.spatial {
            Some(spatial) => spatial.is_large_enough(view.lookup, view.camera, view.min_relative_size()),
            None => true,
        }
    }

    /// Uniforms describing this object (model matrices and variant data)
    pub fn uniform_values(&self, view: &ViewContext<'_>) -> UniformValues {
        let mut values = UniformValues::new();
        if let Some(transform) = self.transform() {
            let model_matrix = transform.model_matrix(view.lookup);
            values.insert("u_modelMatrix".to_string(), UniformValue::Mat4(model_matrix));
            values.insert(
                "u_normalMatrix".to_string(),
                UniformValue::Mat4(transform.model_matrix_inverse(view.lookup).transpose()),
            );
            values.insert("u_position".to_string(), UniformValue::Vec3(model_matrix.translation_vector()));
        }
        match &self.kind {
            ObjectKind::Mesh(mesh) => {
                if let Some(lod) = self.current_lod(view) {
                    mesh.uniform_values(lod, &mut values);
                }
            }
            ObjectKind::Billboard(billboard) => billboard.uniform_values(&mut values),
            ObjectKind::Particle(particle) => particle.uniform_values(&mut values),
            ObjectKind::PointParticle(particle) => particle.uniform_values(&mut values),
            ObjectKind::Ui(element) => element.uniform_values(&mut values),
            ObjectKind::PointCloud(_) | ObjectKind::Group => {}
        }
        values
    }

    /// Per-instance attribute values when drawn as part of an instanced group
    pub fn instance_uniform_values(&self, view: &ViewContext<'_>) -> UniformValues {
        let mut values = self.uniform_values(view);
        values.remove("u_normalMatrix");
        values
    }

    fn draw_stats(&self, lod: Option<usize>, depth_mask: bool, instances: usize) -> DrawStats {
        let triangles = self.model().map_or(0, |model| {
            if depth_mask {
                model.opaque_triangle_count(lod)
            } else {
                model.transparent_triangle_count(lod)
            }
        });
        DrawStats { draw_calls: 1, triangles: triangles * instances }
    }

    /// Draw the object on its own
    pub fn perform_render(
        &self,
        context: &mut dyn GpuContext,
        view: &ViewContext<'_>,
        depth_mask: bool,
        force_wireframe: bool,
    ) -> DrawStats {
        let Some(model) = self.model() else {
            return DrawStats::default();
        };
        let lod = self.current_lod(view);
        self.base.bind_textures(context);
        model.render(context, lod, force_wireframe || self.base.wireframe(), depth_mask);
        self.base.mark_rendered();
        self.draw_stats(lod, depth_mask, 1)
    }

    /// Draw `instance_count` instances with this object as the group head
    ///
    /// The instance buffers must already be filled and bound.
    pub fn perform_instanced_render(
        &self,
        context: &mut dyn GpuContext,
        view: &ViewContext<'_>,
        depth_mask: bool,
        force_wireframe: bool,
        instance_count: usize,
    ) -> DrawStats {
        let Some(model) = self.model() else {
            return DrawStats::default();
        };
        let lod = self.current_lod(view);
        self.base.bind_textures(context);
        model.render_instances(context, lod, force_wireframe || self.base.wireframe(), instance_count);
        self.base.mark_rendered();
        self.draw_stats(lod, depth_mask, instance_count)
    }

    /// Grouping predicate of the non-instanced queues
    pub fn should_go_in_same_render_queue(&self, other: &Self) -> bool {
        self.base.shader() == other.base.shader()
    }

    /// Grouping predicate of the instanced queues
    ///
    /// Instances share one draw call, so everything that affects the draw must
    /// match: variant, shader, textures and model.
    pub fn should_go_in_same_render_queue_instanced(&self, other: &Self) -> bool {
        mem::discriminant(&self.kind) == mem::discriminant(&other.kind)
            && self.base.shader() == other.base.shader()
            && self.base.has_same_textures(&other.base)
            && match (self.model(), other.model()) {
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
    }

    // === Shadow maps ===

    /// Whether the object is drawn into shadow maps at all
    pub fn casts_shadows(&self) -> bool {
        self.base.casts_shadows() && self.spatial.is_some() && matches!(self.kind, ObjectKind::Mesh(_))
    }

    /// Whether the object overlaps the square area a shadow map range covers
    ///
    /// `light_matrix` transforms world space into the light space of the range.
    pub fn is_in_shadow_range(&self, lookup: &dyn SpatialLookup, light_matrix: &Mat4, range: f32) -> bool {
        let Some(transform) = self.transform() else {
            return false;
        };
        let position = light_matrix.transform_point4(&transform.world_position(lookup));
        let size = transform.scaled_size(lookup);
        position.x.abs() - size < range && position.y.abs() - size < range
    }

    /// Whether the object should be drawn into the shadow map of a range
    pub fn should_be_rendered_to_shadow_map(&self, lookup: &dyn SpatialLookup, light_matrix: &Mat4, range: f32) -> bool {
        !self.base.can_be_reused()
            && self.base.is_visible()
            && self.casts_shadows()
            && self.is_in_shadow_range(lookup, light_matrix, range)
    }

    /// Draw depth information into the current shadow map
    pub fn render_to_shadow_map(&self, context: &mut dyn GpuContext, view: &ViewContext<'_>) -> DrawStats {
        let Some(model) = self.model() else {
            return DrawStats::default();
        };
        let lod = self.current_lod(view);
        model.render(context, lod, false, true);
        self.base.mark_rendered_to_shadow_map();
        self.draw_stats(lod, true, 1)
    }

    /// World position of a 3D object
    pub fn world_position(&self, lookup: &dyn SpatialLookup) -> Option<Vec3> {
        self.transform().map(|transform| transform.world_position(lookup))
    }
}
