//! Spot lights

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Mat4, Vec3};

use super::point::{EmitterLookup, PointLight};

/// GPU layout of a spot light
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpotLightData {
    /// World position and falloff range [x, y, z, range]
    pub position: [f32; 4],
    /// Direction [x, y, z, 0]
    pub direction: [f32; 4],
    /// Color and total intensity [r, g, b, intensity]
    pub color: [f32; 4],
    /// Cone cosines [inner, outer, 0, 0]
    pub cone: [f32; 4],
}

/// Point light restricted to a cone
///
/// Position, emitters and animation behave like a [`PointLight`].
#[derive(Debug, Clone)]
pub struct SpotLight {
    light: PointLight,
    direction: Vec3,
    cos_inner: f32,
    cos_outer: f32,
}

impl SpotLight {
    /// Create a spot light; cone angles are half-angles in radians
    pub fn new(light: PointLight, direction: Vec3, inner_angle: f32, outer_angle: f32) -> Self {
        Self {
            light,
            direction: direction.normalize(),
            cos_inner: inner_angle.cos(),
            cos_outer: outer_angle.cos(),
        }
    }

    /// The underlying point light
    pub fn light(&self) -> &PointLight {
        &self.light
    }

    /// Mutable access to the underlying point light
    pub fn light_mut(&mut self) -> &mut PointLight {
        &mut self.light
    }

    /// Normalized cone axis
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Point the cone along `direction`
    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = direction.normalize();
    }

    /// Advance the color/intensity animation
    pub fn update_state(&mut self, dt: f32) {
        self.light.update_state(dt);
    }

    /// Recompute position and intensity from the emitters
    pub fn update_position<L: EmitterLookup + ?Sized>(&mut self, lookup: &L) {
        self.light.update_position(lookup);
    }

    /// Whether the light can affect anything the camera sees
    pub fn is_eligible(&self, view_matrix: &Mat4, view_distance: f32) -> bool {
        self.light.is_eligible(view_matrix, view_distance)
    }

    /// GPU data of the light
    pub fn data(&self) -> SpotLightData {
        let point = self.light.data();
        SpotLightData {
            position: point.position,
            direction: [self.direction.x, self.direction.y, self.direction.z, 0.0],
            color: point.color,
            cone: [self.cos_inner, self.cos_outer, 0.0, 0.0],
        }
    }
}
