//! Particles, point particles and point clouds
//!
//! A [`Particle`] is a billboard-like quad whose color and size follow a list of
//! timed states. When a non-looping list runs out the particle is done and its node
//! can be reused for the next particle of the same kind.

use std::fmt;
use std::rc::Rc;

use crate::foundation::math::{utils, Vec3, Vec4};
use crate::foundation::time::{Keyframe, StateSequence};
use crate::render::api::{Model, UniformValue, UniformValues};

/// One keyframe of a particle animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleState {
    /// RGBA color
    pub color: [f32; 4],
    /// World size of the quad
    pub size: f32,
    /// Seconds to reach this state from the previous one
    pub time_to_reach: f32,
}

impl ParticleState {
    /// Create a particle state
    pub const fn new(color: [f32; 4], size: f32, time_to_reach: f32) -> Self {
        Self { color, size, time_to_reach }
    }
}

impl Keyframe for ParticleState {
    fn time_to_reach(&self) -> f32 {
        self.time_to_reach
    }

    fn interpolate(&self, target: &Self, t: f32) -> Self {
        Self {
            color: utils::lerp_array(self.color, target.color, t),
            size: utils::lerp(self.size, target.size, t),
            time_to_reach: target.time_to_reach,
        }
    }
}

/// Result of advancing a particle by one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParticleUpdate {
    /// How far the particle moved (dynamic particles only)
    pub displacement: Option<Vec3>,
    /// The state list ran out; the particle should be marked reusable
    pub finished: bool,
}

/// Animated, optionally moving quad
pub struct Particle {
    model: Rc<dyn Model>,
    states: StateSequence<ParticleState>,
    color: [f32; 4],
    size: f32,
    velocity: Option<Vec3>,
}

impl fmt::Debug for Particle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Particle")
            .field("color", &self.color)
            .field("size", &self.size)
            .field("velocity", &self.velocity)
            .finish_non_exhaustive()
    }
}

impl Particle {
    /// Create a particle going through `states`
    ///
    /// The particle starts out with the first state's color and size.
    pub fn new(model: Rc<dyn Model>, states: Vec<ParticleState>, looping: bool) -> Self {
        let (color, size) = states.first().map_or(([1.0; 4], 1.0), |state| (state.color, state.size));
        Self {
            model,
            states: StateSequence::new(states, looping),
            color,
            size,
            velocity: None,
        }
    }

    /// Builder pattern: move with a constant velocity (world units per second)
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = Some(velocity);
        self
    }

    /// The quad model
    pub fn model(&self) -> &Rc<dyn Model> {
        &self.model
    }

    /// Current RGBA color
    pub fn color(&self) -> [f32; 4] {
        self.color
    }

    /// Current world size
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Velocity of a dynamic particle
    pub fn velocity(&self) -> Option<Vec3> {
        self.velocity
    }

    /// Change the velocity (`None` makes the particle static)
    pub fn set_velocity(&mut self, velocity: Option<Vec3>) {
        self.velocity = velocity;
    }

    /// Whether a non-looping state list ran out
    pub fn is_finished(&self) -> bool {
        self.states.is_finished()
    }

    /// Replace the state list, used when the particle's node is reused
    pub fn restart(&mut self, states: Vec<ParticleState>, looping: bool) {
        if let Some(first) = states.first() {
            self.color = first.color;
            self.size = first.size;
        }
        self.states = StateSequence::new(states, looping);
    }

    /// Advance the state animation and the movement by `dt` seconds
    pub fn animate(&mut self, dt: f32) -> ParticleUpdate {
        if let Some(state) = self.states.advance(dt) {
            self.color = state.color;
            self.size = state.size;
        }
        ParticleUpdate {
            displacement: self.velocity.map(|velocity| velocity * dt),
            finished: self.states.is_finished(),
        }
    }

    /// Particle specific uniforms (also used as instance attributes)
    pub fn uniform_values(&self, values: &mut UniformValues) {
        values.insert("u_color".to_string(), UniformValue::Vec4(Vec4::from(self.color)));
        values.insert("u_billboardSize".to_string(), UniformValue::Float(self.size));
    }
}

/// Single-point sprite, drawn instanced as part of a [`PointCloud`]
pub struct PointParticle {
    model: Rc<dyn Model>,
    color: Vec4,
    point_size: f32,
}

impl fmt::Debug for PointParticle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointParticle")
            .field("color", &self.color)
            .field("point_size", &self.point_size)
            .finish_non_exhaustive()
    }
}

impl PointParticle {
    /// Create a point particle; `point_size` is in pixels
    pub fn new(model: Rc<dyn Model>, color: Vec4, point_size: f32) -> Self {
        Self { model, color, point_size }
    }

    /// The single-point model
    pub fn model(&self) -> &Rc<dyn Model> {
        &self.model
    }

    /// RGBA color
    pub fn color(&self) -> Vec4 {
        self.color
    }

    /// Set the RGBA color
    pub fn set_color(&mut self, color: Vec4) {
        self.color = color;
    }

    /// Point size in pixels
    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    /// Point particle specific uniforms
    pub fn uniform_values(&self, values: &mut UniformValues) {
        values.insert("u_color".to_string(), UniformValue::Vec4(self.color));
        values.insert("u_pointSize".to_string(), UniformValue::Float(self.point_size));
    }
}

/// Container of homogeneous point particles
///
/// Its node is created with instanced subnodes, so the children are queued as one
/// batch instead of one by one.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointCloud {
    /// Per-frame drift applied to the whole cloud (e.g. dust moving past the camera)
    pub drift: Option<Vec3>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeModel;
    use approx::assert_relative_eq;

    fn states() -> Vec<ParticleState> {
        vec![
            ParticleState::new([1.0, 1.0, 1.0, 1.0], 2.0, 0.0),
            ParticleState::new([1.0, 0.0, 0.0, 0.0], 4.0, 1.0),
        ]
    }

    #[test]
    fn test_particle_follows_states() {
        let mut particle = Particle::new(Rc::new(FakeModel::new(1.0)), states(), false);
        let update = particle.animate(0.5);
        assert!(!update.finished);
        assert_relative_eq!(particle.size(), 3.0);
        assert_relative_eq!(particle.color()[1], 0.5);
    }

    #[test]
    fn test_non_looping_particle_finishes() {
        let mut particle = Particle::new(Rc::new(FakeModel::new(1.0)), states(), false);
        assert!(particle.animate(2.0).finished);
        assert_relative_eq!(particle.size(), 4.0);

        particle.restart(states(), true);
        assert!(!particle.is_finished());
        assert_relative_eq!(particle.size(), 2.0);
    }

    #[test]
    fn test_dynamic_particle_moves() {
        let mut particle = Particle::new(Rc::new(FakeModel::new(1.0)), states(), true)
            .with_velocity(Vec3::new(0.0, 2.0, 0.0));
        let update = particle.animate(0.25);
        assert_eq!(update.displacement, Some(Vec3::new(0.0, 0.5, 0.0)));
    }
}
