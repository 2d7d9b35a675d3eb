//! Directional lights and their shadow map light spaces
//!
//! A directional light has a fixed orientation. Its shadow maps are not centered at
//! the world origin but ahead of the camera: the light space of a range is the light
//! orientation applied after moving the camera position `range` units along the
//! camera's forward axis. Shaders get a single base matrix per light (camera
//! centered) plus a translation vector and reconstruct every range from those.

use std::cell::Cell;

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// GPU layout of a directional light
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DirectionalLightData {
    /// Light color [r, g, b, casts shadows (0 or 1)]
    pub color: [f32; 4],
    /// Direction the light travels [x, y, z, 0]
    pub direction: [f32; 4],
}

/// Light with parallel rays (sun, distant star)
#[derive(Debug, Clone)]
pub struct DirectionalLight {
    color: Vec3,
    direction: Vec3,
    /// World to light space rotation
    orientation: Mat4,
    casts_shadows: bool,
    base_matrix: Cell<Option<Mat4>>,
    translation_vector: Cell<Option<Vec3>>,
}

impl DirectionalLight {
    /// Create a light shining along `direction`
    pub fn new(color: Vec3, direction: Vec3) -> Self {
        let direction = direction.normalize();
        Self {
            color,
            direction,
            orientation: Mat4::looking_towards(&direction).transpose(),
            casts_shadows: true,
            base_matrix: Cell::new(None),
            translation_vector: Cell::new(None),
        }
    }

    /// Builder pattern: set whether the light casts shadows
    pub fn with_shadows(mut self, casts_shadows: bool) -> Self {
        self.casts_shadows = casts_shadows;
        self
    }

    /// Light color
    pub fn color(&self) -> Vec3 {
        self.color
    }

    /// Set the light color
    pub fn set_color(&mut self, color: Vec3) {
        self.color = color;
    }

    /// Normalized direction the light travels
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Change the direction the light travels
    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = direction.normalize();
        self.orientation = Mat4::looking_towards(&self.direction).transpose();
        self.reset_for_new_frame();
    }

    /// World to light space rotation
    pub fn orientation_matrix(&self) -> &Mat4 {
        &self.orientation
    }

    /// Whether shadow maps are rendered for this light
    pub fn casts_shadows(&self) -> bool {
        self.casts_shadows
    }

    /// Forget the light space computed for the previous frame
    pub fn reset_for_new_frame(&self) {
        self.base_matrix.set(None);
        self.translation_vector.set(None);
    }

    /// Light space matrix of one shadow map range
    ///
    /// The first call of a frame also computes the base matrix and the translation
    /// vector, which stay valid until [`Self::reset_for_new_frame`].
    pub fn light_space_matrix(&self, camera_position: &Vec3, camera_forward: &Vec3, range: f32) -> Mat4 {
        if self.base_matrix.get().is_none() {
            self.base_matrix
                .set(Some(self.orientation * Mat4::translation(&-camera_position)));
            self.translation_vector
                .set(Some(self.orientation.transform_vector(camera_forward).normalize()));
        }
        let center = camera_position + camera_forward * range;
        self.orientation * Mat4::translation(&-center)
    }

    /// Camera-centered light space matrix of the current frame
    pub fn base_matrix(&self) -> Option<Mat4> {
        self.base_matrix.get()
    }

    /// Light space direction from the base position towards the range centers
    pub fn translation_vector(&self) -> Option<Vec3> {
        self.translation_vector.get()
    }

    /// Orthographic projection of a range: `range` wide on each side, `depth_ratio * range` deep
    pub fn shadow_projection(range: f32, depth_ratio: f32) -> Mat4 {
        Mat4::orthographic(range, range, -depth_ratio * range, depth_ratio * range)
    }

    /// GPU data of the light
    pub fn data(&self) -> DirectionalLightData {
        DirectionalLightData {
            color: [self.color.x, self.color.y, self.color.z, if self.casts_shadows { 1.0 } else { 0.0 }],
            direction: [self.direction.x, self.direction.y, self.direction.z, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_light_direction_maps_to_negative_z() {
        let light = DirectionalLight::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.0, -1.0, -1.0));
        let in_light_space = light.orientation_matrix().transform_vector(&light.direction());
        assert_relative_eq!(in_light_space, -Vec3::z(), epsilon = 1e-5);
    }

    #[test]
    fn test_range_matrix_reconstructed_from_base() {
        let light = DirectionalLight::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.3, -1.0, 0.2));
        let camera = Vec3::new(10.0, 5.0, -3.0);
        let forward = Vec3::new(0.0, 0.0, -1.0);
        let range_matrix = light.light_space_matrix(&camera, &forward, 50.0);

        let base = light.base_matrix().unwrap();
        let translation = light.translation_vector().unwrap();
        let point = Vec3::new(4.0, -7.0, 30.0);
        let from_range = range_matrix.transform_point(&point.into());
        let from_base = base.transform_point(&point.into()) - translation * 50.0;
        assert_relative_eq!(from_range, from_base, epsilon = 1e-3);
    }

    #[test]
    fn test_reset_clears_frame_cache() {
        let light = DirectionalLight::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.0, -1.0, 0.0));
        light.light_space_matrix(&Vec3::zeros(), &-Vec3::z(), 10.0);
        assert!(light.base_matrix().is_some());
        light.reset_for_new_frame();
        assert!(light.base_matrix().is_none());
        assert!(light.translation_vector().is_none());
    }

    #[test]
    fn test_gpu_data_layout() {
        let light = DirectionalLight::new(Vec3::new(0.5, 0.25, 1.0), Vec3::new(0.0, 0.0, -2.0)).with_shadows(false);
        let data = [light.data()];
        let packed: &[[f32; 4]] = bytemuck::cast_slice(&data);
        assert_eq!(packed, &[[0.5, 0.25, 1.0, 0.0], [0.0, 0.0, -1.0, 0.0]]);
    }
}
