//! 3D state of renderable objects
//!
//! Adds a [`Transformable`] and on-screen size culling to a renderable. Objects that
//! sit inside their parent skip the frustum test and derive their size from the
//! parent's instead.

use std::cell::Cell;

use crate::foundation::collections::NodeKey;
use crate::spatial::{CameraView, TransformLookup, Transformable, ViewKey, VisibleSize};

/// Resolves the 3D state of parent objects
pub trait SpatialLookup: TransformLookup {
    /// The 3D state of the object stored under `key`, if it is a 3D object
    fn spatial(&self, key: NodeKey) -> Option<&Spatial>;
}

/// Transform plus visibility state of a 3D object
#[derive(Debug, Clone, Default)]
pub struct Spatial {
    transform: Transformable,
    /// Objects smaller than this on screen (pixels) are not drawn
    smallest_size_when_drawn: f32,
    /// Sizes of this frame, one slot per camera view (front and extended)
    visible_sizes: Cell<[Option<(ViewKey, VisibleSize)>; 2]>,
}

impl Spatial {
    /// Create the 3D state from a transform
    pub fn new(transform: Transformable) -> Self {
        Self {
            transform,
            smallest_size_when_drawn: 0.0,
            visible_sizes: Cell::new([None; 2]),
        }
    }

    /// Builder pattern: set the minimum on-screen size in pixels
    pub fn with_smallest_size_when_drawn(mut self, pixels: f32) -> Self {
        self.smallest_size_when_drawn = pixels;
        self
    }

    /// The object's transform
    pub fn transform(&self) -> &Transformable {
        &self.transform
    }

    /// Mutable access to the object's transform
    pub fn transform_mut(&mut self) -> &mut Transformable {
        &mut self.transform
    }

    /// Minimum on-screen size in pixels
    pub fn smallest_size_when_drawn(&self) -> f32 {
        self.smallest_size_when_drawn
    }

    /// Set the minimum on-screen size in pixels
    pub fn set_smallest_size_when_drawn(&mut self, pixels: f32) {
        self.smallest_size_when_drawn = pixels;
    }

    /// Clear the frame caches of the transform and the visible size
    pub fn reset_for_new_frame(&self) {
        self.transform.reset_for_new_frame();
        self.visible_sizes.set([None; 2]);
    }

    fn enclosing_parent<'a, L: SpatialLookup + ?Sized>(&self, lookup: &'a L) -> Option<&'a Self> {
        if !self.transform.is_inside_parent(lookup) {
            return None;
        }
        self.transform.parent().and_then(|key| lookup.spatial(key))
    }

    /// On-screen half-extents of the object for the given camera, cached for the frame
    /// per camera view
    ///
    /// Objects inside their parent reuse the parent's size scaled by
    /// `max(own size / parent size, min_relative_size)`.
    pub fn visible_size<L: SpatialLookup + ?Sized>(
        &self,
        lookup: &L,
        camera: &CameraView,
        min_relative_size: f32,
    ) -> VisibleSize {
        let key = camera.key();
        let mut cached = self.visible_sizes.get();
        if let Some((_, size)) = cached.iter().flatten().find(|(view, _)| *view == key) {
            return *size;
        }
        let size = if let Some(parent) = self.enclosing_parent(lookup) {
            let parent_size = parent.visible_size(lookup, camera, min_relative_size);
            let relative = self.transform.scaled_size(lookup) / parent.transform.scaled_size(lookup);
            parent_size.scaled(relative.max(min_relative_size))
        } else {
            let position = self.transform.position_in_camera_space(lookup, &camera.view_matrix);
            camera.size_of(&position, self.transform.scaled_size(lookup))
        };
        cached.rotate_right(1);
        cached[0] = Some((key, size));
        self.visible_sizes.set(cached);
        size
    }

    /// Larger on-screen extent in pixels
    pub fn visible_size_in_pixels<L: SpatialLookup + ?Sized>(
        &self,
        lookup: &L,
        camera: &CameraView,
        min_relative_size: f32,
    ) -> f32 {
        let (width, height) = camera.viewport;
        self.visible_size(lookup, camera, min_relative_size).size_in_pixels(width, height)
    }

    /// Whether the object is big enough on screen to be drawn
    pub fn is_large_enough<L: SpatialLookup + ?Sized>(
        &self,
        lookup: &L,
        camera: &CameraView,
        min_relative_size: f32,
    ) -> bool {
        let size = self.visible_size(lookup, camera, min_relative_size);
        size.is_visible()
            && size.size_in_pixels(camera.viewport.0, camera.viewport.1) > self.smallest_size_when_drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::NodeMap;
    use crate::foundation::math::{utils::deg_to_rad, Mat4, Mat4Ext, Vec3};
    use approx::assert_relative_eq;

    impl TransformLookup for NodeMap<Spatial> {
        fn transformable(&self, key: NodeKey) -> Option<&Transformable> {
            self.get(key).map(Spatial::transform)
        }
    }

    impl SpatialLookup for NodeMap<Spatial> {
        fn spatial(&self, key: NodeKey) -> Option<&Spatial> {
            self.get(key)
        }
    }

    fn camera(aspect: f32) -> CameraView {
        CameraView {
            view_matrix: Mat4::identity(),
            projection_matrix: Mat4::perspective(deg_to_rad(90.0), aspect, 0.1, 1000.0),
            position: Vec3::zeros(),
            orientation: Mat4::identity(),
            near: 0.1,
            view_distance: 1000.0,
            viewport: (1000, 1000),
        }
    }

    #[test]
    fn test_nested_object_uses_parent_size() {
        // aspect 0.5 with a 90° vertical fov makes x twice as large as y in NDC
        let view = camera(0.5);
        let mut objects: NodeMap<Spatial> = NodeMap::with_key();
        let parent = objects.insert(Spatial::new(
            Transformable::from_position(Vec3::new(0.0, 0.0, -500.0)).with_size(50.0),
        ));
        let child = objects.insert(Spatial::new(
            Transformable::from_position(Vec3::new(1.0, 2.0, 3.0)).with_size(5.0).with_parent(parent),
        ));

        let parent_size = objects[parent].visible_size(&objects, &view, 0.1);
        assert_relative_eq!(parent_size.width, 0.2, epsilon = 1e-5);
        assert_relative_eq!(parent_size.height, 0.1, epsilon = 1e-5);

        let child_size = objects[child].visible_size(&objects, &view, 0.1);
        assert_relative_eq!(child_size.width, 0.02, epsilon = 1e-5);
        assert_relative_eq!(child_size.height, 0.01, epsilon = 1e-5);
    }

    #[test]
    fn test_min_relative_size_floor() {
        let view = camera(1.0);
        let mut objects: NodeMap<Spatial> = NodeMap::with_key();
        let parent = objects.insert(Spatial::new(
            Transformable::from_position(Vec3::new(0.0, 0.0, -100.0)).with_size(100.0),
        ));
        let child = objects.insert(Spatial::new(Transformable::identity().with_size(1.0).with_parent(parent)));

        let parent_size = objects[parent].visible_size(&objects, &view, 0.25);
        let child_size = objects[child].visible_size(&objects, &view, 0.25);
        assert_relative_eq!(child_size.height, parent_size.height * 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_smallest_size_when_drawn() {
        let view = camera(1.0);
        let mut objects: NodeMap<Spatial> = NodeMap::with_key();
        // 0.01 NDC half-extent → 10 pixels on a 1000 pixel viewport
        let small = objects.insert(
            Spatial::new(Transformable::from_position(Vec3::new(0.0, 0.0, -100.0)))
                .with_smallest_size_when_drawn(20.0),
        );
        let large = objects.insert(
            Spatial::new(Transformable::from_position(Vec3::new(0.0, 0.0, -100.0)))
                .with_smallest_size_when_drawn(5.0),
        );
        assert!(!objects[small].is_large_enough(&objects, &view, 0.05));
        assert!(objects[large].is_large_enough(&objects, &view, 0.05));
    }

    #[test]
    fn test_visible_size_cached_per_camera() {
        let narrow = CameraView {
            projection_matrix: Mat4::perspective(deg_to_rad(45.0), 1.0, 0.1, 1000.0),
            ..camera(1.0)
        };
        let wide = camera(1.0);
        let mut objects: NodeMap<Spatial> = NodeMap::with_key();
        let key = objects.insert(Spatial::new(Transformable::from_position(Vec3::new(0.0, 0.0, -10.0))));

        let wide_size = objects[key].visible_size(&objects, &wide, 0.05);
        let narrow_size = objects[key].visible_size(&objects, &narrow, 0.05);
        assert!(narrow_size.height > wide_size.height);
        assert_relative_eq!(
            narrow_size.height,
            1.0 / (10.0 * deg_to_rad(22.5).tan()),
            epsilon = 1e-4
        );
        // Both stay cached
        assert_eq!(objects[key].visible_size(&objects, &wide, 0.05), wide_size);
        assert_eq!(objects[key].visible_size(&objects, &narrow, 0.05), narrow_size);
    }

    #[test]
    fn test_visible_size_cached_until_reset() {
        let view = camera(1.0);
        let mut objects: NodeMap<Spatial> = NodeMap::with_key();
        let key = objects.insert(Spatial::new(Transformable::from_position(Vec3::new(0.0, 0.0, -10.0))));
        let before = objects[key].visible_size(&objects, &view, 0.05);

        objects[key].transform_mut().set_position(Vec3::new(0.0, 0.0, -20.0));
        assert_eq!(objects[key].visible_size(&objects, &view, 0.05), before);

        objects[key].reset_for_new_frame();
        assert_relative_eq!(objects[key].visible_size(&objects, &view, 0.05).height, 0.05, epsilon = 1e-5);
    }
}
