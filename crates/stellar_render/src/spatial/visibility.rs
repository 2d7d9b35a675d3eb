//! View frustum culling and on-screen size estimation

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// The camera state objects are measured against in one render pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    /// World to camera space
    pub view_matrix: Mat4,
    /// Camera to clip space
    pub projection_matrix: Mat4,
    /// World-space camera position
    pub position: Vec3,
    /// World-space camera orientation (local -Z is the viewing direction)
    pub orientation: Mat4,
    /// Near plane distance
    pub near: f32,
    /// Far plane distance
    pub view_distance: f32,
    /// Viewport size in pixels
    pub viewport: (u32, u32),
}

impl CameraView {
    /// Combined view-projection matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    /// Identifies the projection of this view
    ///
    /// Sizes measured within one frame only depend on the projection, so views with
    /// equal keys measure equal sizes.
    pub fn key(&self) -> ViewKey {
        ViewKey([
            self.projection_matrix[(0, 0)].to_bits(),
            self.projection_matrix[(1, 1)].to_bits(),
            self.near.to_bits(),
            self.view_distance.to_bits(),
        ])
    }

    /// On-screen size of a bounding sphere given in this camera's space
    pub fn size_of(&self, position: &Vec3, size: f32) -> VisibleSize {
        size_inside_view_frustum(position, size, &self.projection_matrix, self.near, self.view_distance)
    }
}

/// Cache key of a [`CameraView`], see [`CameraView::key`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewKey([u32; 4]);

/// On-screen half-extents of an object in normalized device coordinates
///
/// A zero size means the object is outside the view frustum.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VisibleSize {
    /// Horizontal half-extent
    pub width: f32,
    /// Vertical half-extent
    pub height: f32,
}

impl VisibleSize {
    /// Size of an object that is not visible at all
    pub const ZERO: Self = Self { width: 0.0, height: 0.0 };

    /// Size of an object that covers the whole screen
    pub const FULL_SCREEN: Self = Self { width: 1.0, height: 1.0 };

    /// Create a new visible size
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether any part of the object is inside the frustum
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// The larger of the two extents converted to pixels
    pub fn size_in_pixels(&self, viewport_width: u32, viewport_height: u32) -> f32 {
        (self.width * viewport_width as f32).max(self.height * viewport_height as f32)
    }

    /// Both extents multiplied by `factor`
    pub fn scaled(&self, factor: f32) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }
}

/// Estimate the on-screen size of a bounding sphere given in camera space
///
/// `position` is the sphere center in the camera's space (the camera looks down -Z)
/// and `size` its radius. Objects entirely in front of the near plane or beyond
/// `view_distance`, or projected completely off one side of the screen, get
/// [`VisibleSize::ZERO`].
///
/// A center at or behind the camera plane (`w <= 0` after projection) cannot be
/// projected meaningfully; since the depth test already established that the sphere
/// intersects the frustum, such objects are reported as covering the whole screen.
pub fn size_inside_view_frustum(
    position: &Vec3,
    size: f32,
    projection: &Mat4,
    near: f32,
    view_distance: f32,
) -> VisibleSize {
    // Depth range first: the sphere must intersect the slab between near and far
    if !(position.z - size < -near && position.z + size > -view_distance) {
        return VisibleSize::ZERO;
    }

    let center = projection.transform_point4(position);
    if center.w <= 0.0 {
        return VisibleSize::FULL_SCREEN;
    }

    let right_edge = projection.transform_point4(&Vec3::new(position.x + size, position.y, position.z));
    let top_edge = projection.transform_point4(&Vec3::new(position.x, position.y + size, position.z));

    let center_x = center.x / center.w;
    let center_y = center.y / center.w;
    let width = right_edge.x / right_edge.w - center_x;
    let height = top_edge.y / top_edge.w - center_y;

    // Side culling in NDC
    if center_x - width >= 1.0 || center_x + width <= -1.0 || center_y - height >= 1.0 || center_y + height <= -1.0 {
        return VisibleSize::ZERO;
    }

    VisibleSize::new(width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::utils::deg_to_rad;
    use approx::assert_relative_eq;

    fn projection() -> Mat4 {
        Mat4::perspective(deg_to_rad(90.0), 1.0, 0.1, 1000.0)
    }

    #[test]
    fn test_centered_object_size() {
        // tan(45°) = 1, so a radius 1 sphere at distance 10 spans 0.1 in NDC
        let size = size_inside_view_frustum(&Vec3::new(0.0, 0.0, -10.0), 1.0, &projection(), 0.1, 1000.0);
        assert!(size.is_visible());
        assert_relative_eq!(size.width, 0.1, epsilon = 1e-5);
        assert_relative_eq!(size.height, 0.1, epsilon = 1e-5);
        assert_relative_eq!(size.size_in_pixels(800, 600), 80.0, epsilon = 1e-3);
    }

    #[test]
    fn test_depth_culling() {
        let behind = size_inside_view_frustum(&Vec3::new(0.0, 0.0, 5.0), 1.0, &projection(), 0.1, 1000.0);
        assert_eq!(behind, VisibleSize::ZERO);

        let too_far = size_inside_view_frustum(&Vec3::new(0.0, 0.0, -2000.0), 1.0, &projection(), 0.1, 1000.0);
        assert_eq!(too_far, VisibleSize::ZERO);
    }

    #[test]
    fn test_side_culling() {
        let left = size_inside_view_frustum(&Vec3::new(-50.0, 0.0, -10.0), 1.0, &projection(), 0.1, 1000.0);
        assert!(!left.is_visible());

        let partially_visible = size_inside_view_frustum(&Vec3::new(10.5, 0.0, -10.0), 1.0, &projection(), 0.1, 1000.0);
        assert!(partially_visible.is_visible());
    }

    #[test]
    fn test_object_around_camera_covers_screen() {
        let size = size_inside_view_frustum(&Vec3::new(0.0, 0.0, 0.5), 3.0, &projection(), 0.1, 1000.0);
        assert_eq!(size, VisibleSize::FULL_SCREEN);
    }

    #[test]
    fn test_scaled() {
        let size = VisibleSize::new(0.2, 0.1).scaled(0.1);
        assert_relative_eq!(size.width, 0.02);
        assert_relative_eq!(size.height, 0.01);
    }
}
