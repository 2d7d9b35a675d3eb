//! Position, orientation and scaling of scene objects
//!
//! A [`Transformable`] keeps its three component matrices separately and derives
//! the model matrix lazily. Derived values are cached at two levels:
//!
//! - **object-local** caches (the local matrix and its inverse) only depend on the
//!   object's own fields and are invalidated by its setters;
//! - **frame** caches (the model matrix composed with the parent chain, the cascaded
//!   scaling, the camera-space position, the inside-parent test) depend on other
//!   objects or on the camera. They are cleared by [`Transformable::reset_for_new_frame`]
//!   and additionally remember the input they were computed from, so a parent that
//!   moves in the middle of a frame is picked up by the next query.
//!
//! Parents are referenced by [`NodeKey`] and resolved through a [`TransformLookup`],
//! normally the scene tree.

use std::cell::Cell;

use crate::foundation::collections::{NodeKey, NodeMap};
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// Resolves the transformable of a parent object
pub trait TransformLookup {
    /// The transformable of the object stored under `key`, if it has one
    fn transformable(&self, key: NodeKey) -> Option<&Transformable>;
}

impl TransformLookup for NodeMap<Transformable> {
    fn transformable(&self, key: NodeKey) -> Option<&Transformable> {
        self.get(key)
    }
}

/// Spatial state of an object: position, orientation, scaling, size and parent
#[derive(Debug, Clone)]
pub struct Transformable {
    position_matrix: Mat4,
    orientation_matrix: Mat4,
    scaling_matrix: Mat4,
    /// Bounding sphere radius in model space
    size: f32,
    parent: Option<NodeKey>,
    /// Children of this object are treated as inside it without testing their position
    children_always_inside: bool,

    local_matrix: Cell<Option<Mat4>>,
    local_matrix_inverse: Cell<Option<Mat4>>,

    // (input, output) pairs valid for the current frame
    model_matrix: Cell<Option<(Mat4, Mat4)>>,
    model_matrix_inverse: Cell<Option<(Mat4, Mat4)>>,
    cascade_scaling: Cell<Option<(Mat4, Mat4)>>,
    camera_space_position: Cell<Option<(Mat4, Vec3)>>,
    inside_parent: Cell<Option<bool>>,
}

impl Default for Transformable {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transformable {
    /// Create a transformable from its component matrices
    pub fn new(position_matrix: Mat4, orientation_matrix: Mat4, scaling_matrix: Mat4) -> Self {
        Self {
            position_matrix,
            orientation_matrix,
            scaling_matrix,
            size: 1.0,
            parent: None,
            children_always_inside: false,
            local_matrix: Cell::new(None),
            local_matrix_inverse: Cell::new(None),
            model_matrix: Cell::new(None),
            model_matrix_inverse: Cell::new(None),
            cascade_scaling: Cell::new(None),
            camera_space_position: Cell::new(None),
            inside_parent: Cell::new(None),
        }
    }

    /// Identity transform with unit size
    pub fn identity() -> Self {
        Self::new(Mat4::identity(), Mat4::identity(), Mat4::identity())
    }

    /// Transform with only a position
    pub fn from_position(position: Vec3) -> Self {
        Self::new(Mat4::translation(&position), Mat4::identity(), Mat4::identity())
    }

    /// Builder pattern: set the bounding size
    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    /// Builder pattern: set the parent
    pub fn with_parent(mut self, parent: NodeKey) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Builder pattern: set the orientation matrix
    pub fn with_orientation(mut self, orientation_matrix: Mat4) -> Self {
        self.orientation_matrix = orientation_matrix;
        self
    }

    /// Builder pattern: set a uniform scale
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scaling_matrix = Mat4::new_scaling(scale);
        self
    }

    /// Builder pattern: treat all children as inside this object
    pub fn with_children_always_inside(mut self) -> Self {
        self.children_always_inside = true;
        self
    }

    fn invalidate_local(&mut self) {
        self.local_matrix.set(None);
        self.local_matrix_inverse.set(None);
        self.model_matrix.set(None);
        self.model_matrix_inverse.set(None);
        self.camera_space_position.set(None);
        self.inside_parent.set(None);
    }

    /// Clear the caches that depend on other objects or on the camera
    ///
    /// The object-local caches survive; they only change through the setters.
    pub fn reset_for_new_frame(&self) {
        self.model_matrix.set(None);
        self.model_matrix_inverse.set(None);
        self.cascade_scaling.set(None);
        self.camera_space_position.set(None);
        self.inside_parent.set(None);
    }

    // === Position ===

    /// The translation matrix
    pub fn position_matrix(&self) -> &Mat4 {
        &self.position_matrix
    }

    /// Position relative to the parent
    pub fn position(&self) -> Vec3 {
        self.position_matrix.translation_vector()
    }

    /// Replace the translation matrix
    pub fn set_position_matrix(&mut self, position_matrix: Mat4) {
        self.position_matrix = position_matrix;
        self.invalidate_local();
    }

    /// Move to `position` (relative to the parent)
    pub fn set_position(&mut self, position: Vec3) {
        self.set_position_matrix(Mat4::translation(&position));
    }

    /// Move by `delta`
    pub fn translate(&mut self, delta: &Vec3) {
        self.set_position_matrix(Mat4::translation(delta) * self.position_matrix);
    }

    /// Move by the translation of `matrix`
    pub fn translate_by_matrix(&mut self, matrix: &Mat4) {
        self.set_position_matrix(matrix * self.position_matrix);
    }

    // === Orientation ===

    /// The rotation matrix
    pub fn orientation_matrix(&self) -> &Mat4 {
        &self.orientation_matrix
    }

    /// Replace the rotation matrix
    pub fn set_orientation_matrix(&mut self, orientation_matrix: Mat4) {
        self.orientation_matrix = orientation_matrix;
        self.invalidate_local();
    }

    /// Rotate around an axis given in the parent's space
    pub fn rotate(&mut self, axis: &Vec3, angle: f32) {
        self.rotate_by_matrix(&Mat4::rotation(axis, angle));
    }

    /// Apply an additional rotation (in the parent's space)
    pub fn rotate_by_matrix(&mut self, rotation: &Mat4) {
        self.set_orientation_matrix(rotation * self.orientation_matrix);
    }

    // === Scaling ===

    /// The scaling matrix
    pub fn scaling_matrix(&self) -> &Mat4 {
        &self.scaling_matrix
    }

    /// Replace the scaling matrix
    pub fn set_scaling_matrix(&mut self, scaling_matrix: Mat4) {
        self.scaling_matrix = scaling_matrix;
        self.invalidate_local();
        self.cascade_scaling.set(None);
    }

    /// Set per-axis scale factors
    pub fn set_scale(&mut self, factors: &Vec3) {
        self.set_scaling_matrix(Mat4::scaling(factors));
    }

    // === Size and parent ===

    /// Bounding sphere radius in model space
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Set the bounding sphere radius
    pub fn set_size(&mut self, size: f32) {
        self.size = size;
        self.inside_parent.set(None);
    }

    /// The parent object, if any
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Attach to (or detach from) a parent object
    pub fn set_parent(&mut self, parent: Option<NodeKey>) {
        self.parent = parent;
        self.invalidate_local();
        self.cascade_scaling.set(None);
    }

    /// Whether children of this object skip the inside-parent position test
    pub fn children_always_inside(&self) -> bool {
        self.children_always_inside
    }

    /// Set whether children of this object skip the inside-parent position test
    pub fn set_children_always_inside(&mut self, value: bool) {
        self.children_always_inside = value;
    }

    // === Derived matrices ===

    /// `position * orientation * scaling`, relative to the parent
    pub fn local_matrix(&self) -> Mat4 {
        if let Some(matrix) = self.local_matrix.get() {
            return matrix;
        }
        let matrix = self.position_matrix * self.orientation_matrix * self.scaling_matrix;
        self.local_matrix.set(Some(matrix));
        matrix
    }

    /// Inverse of the local matrix (NaN filled when singular)
    pub fn local_matrix_inverse(&self) -> Mat4 {
        if let Some(matrix) = self.local_matrix_inverse.get() {
            return matrix;
        }
        let inverse = invert_or_nan(&self.local_matrix());
        self.local_matrix_inverse.set(Some(inverse));
        inverse
    }

    /// World model matrix: the local matrix composed with the parent chain
    pub fn model_matrix<L: TransformLookup + ?Sized>(&self, lookup: &L) -> Mat4 {
        let parent_matrix = match self.parent.and_then(|key| lookup.transformable(key)) {
            Some(parent) => parent.model_matrix(lookup),
            None => Mat4::identity(),
        };
        if let Some((input, matrix)) = self.model_matrix.get() {
            if input == parent_matrix {
                return matrix;
            }
        }
        let matrix = parent_matrix * self.local_matrix();
        self.model_matrix.set(Some((parent_matrix, matrix)));
        matrix
    }

    /// Inverse of the world model matrix (NaN filled when singular)
    pub fn model_matrix_inverse<L: TransformLookup + ?Sized>(&self, lookup: &L) -> Mat4 {
        let model = self.model_matrix(lookup);
        if let Some((input, inverse)) = self.model_matrix_inverse.get() {
            if input == model {
                return inverse;
            }
        }
        let inverse = invert_or_nan(&model);
        self.model_matrix_inverse.set(Some((model, inverse)));
        inverse
    }

    /// World-space position of the object's origin
    pub fn world_position<L: TransformLookup + ?Sized>(&self, lookup: &L) -> Vec3 {
        self.model_matrix(lookup).translation_vector()
    }

    /// World-space orientation (own orientation composed with the parents')
    pub fn world_orientation<L: TransformLookup + ?Sized>(&self, lookup: &L) -> Mat4 {
        match self.parent.and_then(|key| lookup.transformable(key)) {
            Some(parent) => parent.world_orientation(lookup) * self.orientation_matrix,
            None => self.orientation_matrix,
        }
    }

    /// Own scaling composed with the scaling of every ancestor
    pub fn cascade_scaling_matrix<L: TransformLookup + ?Sized>(&self, lookup: &L) -> Mat4 {
        let parent_scaling = match self.parent.and_then(|key| lookup.transformable(key)) {
            Some(parent) => parent.cascade_scaling_matrix(lookup),
            None => Mat4::identity(),
        };
        if let Some((input, scaling)) = self.cascade_scaling.get() {
            if input == parent_scaling {
                return scaling;
            }
        }
        let scaling = parent_scaling * self.scaling_matrix;
        self.cascade_scaling.set(Some((parent_scaling, scaling)));
        scaling
    }

    /// Bounding radius in world units (size times the cascaded X scale)
    pub fn scaled_size<L: TransformLookup + ?Sized>(&self, lookup: &L) -> f32 {
        self.size * self.cascade_scaling_matrix(lookup)[(0, 0)]
    }

    /// Position of the object's origin in the space of a camera with the given view matrix
    pub fn position_in_camera_space<L: TransformLookup + ?Sized>(&self, lookup: &L, view_matrix: &Mat4) -> Vec3 {
        if let Some((input, position)) = self.camera_space_position.get() {
            if input == *view_matrix {
                return position;
            }
        }
        let world = self.world_position(lookup);
        let position = view_matrix.transform_point4(&world).xyz();
        self.camera_space_position.set(Some((*view_matrix, position)));
        position
    }

    /// Bounding-sphere-in-bounding-sphere approximation
    ///
    /// True when the parent treats all children as inside, or when the local position
    /// is within the parent's size on all three axes. Objects without a parent are
    /// never inside one.
    pub fn is_inside_parent<L: TransformLookup + ?Sized>(&self, lookup: &L) -> bool {
        if let Some(inside) = self.inside_parent.get() {
            return inside;
        }
        let inside = match self.parent.and_then(|key| lookup.transformable(key)) {
            Some(parent) if parent.children_always_inside => true,
            Some(parent) => {
                let position = self.position();
                position.x.abs() < parent.size
                    && position.y.abs() < parent.size
                    && position.z.abs() < parent.size
            }
            None => false,
        };
        self.inside_parent.set(Some(inside));
        inside
    }
}

fn invert_or_nan(matrix: &Mat4) -> Mat4 {
    matrix.try_inverse().unwrap_or_else(|| Mat4::from_element(f32::NAN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn arena() -> NodeMap<Transformable> {
        NodeMap::with_key()
    }

    #[test]
    fn test_model_matrix_is_cached_bit_identical() {
        let mut objects = arena();
        let mut transform = Transformable::from_position(Vec3::new(1.0, 2.0, 3.0));
        transform.rotate(&Vec3::new(0.3, 1.0, 0.2), 0.7);
        let key = objects.insert(transform);

        let first = objects[key].model_matrix(&objects);
        let second = objects[key].model_matrix(&objects);
        assert_eq!(first, second);
    }

    #[test]
    fn test_setter_invalidates_model_matrix() {
        let mut objects = arena();
        let key = objects.insert(Transformable::from_position(Vec3::new(1.0, 0.0, 0.0)));
        let before = objects[key].model_matrix(&objects);

        objects[key].set_position(Vec3::new(5.0, 0.0, 0.0));
        let after = objects[key].model_matrix(&objects);
        assert_ne!(before, after);
        assert_relative_eq!(after.translation_vector(), Vec3::new(5.0, 0.0, 0.0));

        objects[key].set_scale(&Vec3::new(2.0, 2.0, 2.0));
        assert_relative_eq!(objects[key].model_matrix(&objects)[(0, 0)], 2.0);
    }

    #[test]
    fn test_parent_setter_reflected_without_frame_reset() {
        let mut objects = arena();
        let parent = objects.insert(Transformable::from_position(Vec3::new(10.0, 0.0, 0.0)));
        let child = objects.insert(Transformable::from_position(Vec3::new(1.0, 0.0, 0.0)).with_parent(parent));

        assert_relative_eq!(objects[child].world_position(&objects), Vec3::new(11.0, 0.0, 0.0));

        objects[parent].set_position(Vec3::new(20.0, 0.0, 0.0));
        assert_relative_eq!(objects[child].world_position(&objects), Vec3::new(21.0, 0.0, 0.0));
    }

    #[test]
    fn test_model_matrix_composes_parent_rotation_and_scale() {
        let mut objects = arena();
        let mut parent_transform = Transformable::from_position(Vec3::new(0.0, 0.0, -10.0)).with_uniform_scale(2.0);
        parent_transform.rotate(&Vec3::y(), std::f32::consts::FRAC_PI_2);
        let parent = objects.insert(parent_transform);
        let child = objects.insert(Transformable::from_position(Vec3::new(1.0, 0.0, 0.0)).with_parent(parent));

        // The child's offset is scaled by 2 and rotated so +X points towards -Z
        assert_relative_eq!(
            objects[child].world_position(&objects),
            Vec3::new(0.0, 0.0, -12.0),
            epsilon = 1e-5
        );
        assert_relative_eq!(objects[child].scaled_size(&objects), 2.0);
    }

    #[test]
    fn test_inverse_of_singular_matrix_is_nan() {
        let mut transform = Transformable::identity();
        transform.set_scale(&Vec3::new(0.0, 1.0, 1.0));
        assert!(transform.local_matrix_inverse()[(0, 0)].is_nan());
    }

    #[test]
    fn test_model_matrix_inverse() {
        let mut objects = arena();
        let key = objects.insert(Transformable::from_position(Vec3::new(3.0, -2.0, 1.0)).with_uniform_scale(4.0));
        let product = objects[key].model_matrix(&objects) * objects[key].model_matrix_inverse(&objects);
        assert_relative_eq!(product, Mat4::identity(), epsilon = 1e-5);
    }

    #[test]
    fn test_inside_parent_position_test() {
        let mut objects = arena();
        let parent = objects.insert(Transformable::identity().with_size(10.0));
        let inside = objects.insert(Transformable::from_position(Vec3::new(9.0, -9.0, 9.0)).with_parent(parent));
        let outside = objects.insert(Transformable::from_position(Vec3::new(0.0, 0.0, 11.0)).with_parent(parent));
        let orphan = objects.insert(Transformable::identity());

        assert!(objects[inside].is_inside_parent(&objects));
        assert!(!objects[outside].is_inside_parent(&objects));
        assert!(!objects[orphan].is_inside_parent(&objects));
    }

    #[test]
    fn test_children_always_inside() {
        let mut objects = arena();
        let parent = objects.insert(Transformable::identity().with_size(1.0).with_children_always_inside());
        let turret = objects.insert(Transformable::from_position(Vec3::new(50.0, 0.0, 0.0)).with_parent(parent));
        assert!(objects[turret].is_inside_parent(&objects));
    }

    #[test]
    fn test_camera_space_position_follows_view_matrix() {
        let mut objects = arena();
        let key = objects.insert(Transformable::from_position(Vec3::new(0.0, 0.0, -5.0)));
        let view = Mat4::identity();
        assert_relative_eq!(objects[key].position_in_camera_space(&objects, &view), Vec3::new(0.0, 0.0, -5.0));

        let moved_view = Mat4::translation(&Vec3::new(0.0, 0.0, -5.0));
        assert_relative_eq!(
            objects[key].position_in_camera_space(&objects, &moved_view),
            Vec3::new(0.0, 0.0, -10.0)
        );
    }
}
