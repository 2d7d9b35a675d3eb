//! Point lights
//!
//! A point light either sits at a fixed world position or follows a set of
//! emitting objects (e.g. the engine flames of a ship). In the latter case its
//! position is the average position of the visible emitters and its total intensity
//! scales with their count, so a light whose emitters are all hidden goes dark.

use bytemuck::{Pod, Zeroable};

use crate::foundation::collections::NodeKey;
use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};
use crate::foundation::time::{Keyframe, StateSequence};

/// Resolves the world position of light emitting objects
pub trait EmitterLookup {
    /// World position of an emitter, `None` if it is gone, hidden or dead
    fn emitter_position(&self, key: NodeKey) -> Option<Vec3>;
}

/// One keyframe of a light animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    /// RGB color
    pub color: [f32; 3],
    /// Intensity per emitting object
    pub intensity: f32,
    /// Seconds to reach this state from the previous one
    pub time_to_reach: f32,
}

impl LightState {
    /// Create a light state
    pub const fn new(color: [f32; 3], intensity: f32, time_to_reach: f32) -> Self {
        Self { color, intensity, time_to_reach }
    }
}

impl Keyframe for LightState {
    fn time_to_reach(&self) -> f32 {
        self.time_to_reach
    }

    fn interpolate(&self, target: &Self, t: f32) -> Self {
        Self {
            color: utils::lerp_array(self.color, target.color, t),
            intensity: utils::lerp(self.intensity, target.intensity, t),
            time_to_reach: target.time_to_reach,
        }
    }
}

/// GPU layout of a point light
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLightData {
    /// World position and falloff range [x, y, z, range]
    pub position: [f32; 4],
    /// Color and total intensity [r, g, b, intensity]
    pub color: [f32; 4],
}

/// Omnidirectional light
#[derive(Debug, Clone)]
pub struct PointLight {
    color: Vec3,
    intensity: f32,
    position: Vec3,
    emitting_objects: Vec<NodeKey>,
    states: Option<StateSequence<LightState>>,
    world_position: Vec3,
    total_intensity: f32,
}

impl PointLight {
    /// Create a light at a fixed world position
    pub fn new(position: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            position,
            emitting_objects: Vec::new(),
            states: None,
            world_position: position,
            total_intensity: intensity,
        }
    }

    /// Builder pattern: follow the visible objects among `emitters`
    pub fn with_emitting_objects(mut self, emitters: Vec<NodeKey>) -> Self {
        self.emitting_objects = emitters;
        self
    }

    /// Builder pattern: animate color and intensity through `states`
    pub fn with_states(mut self, states: Vec<LightState>, looping: bool) -> Self {
        if let Some(first) = states.first() {
            self.color = Vec3::from(first.color);
            self.intensity = first.intensity;
        }
        self.states = Some(StateSequence::new(states, looping));
        self
    }

    /// Current color
    pub fn color(&self) -> Vec3 {
        self.color
    }

    /// Current intensity per emitter
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Set the intensity per emitter
    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
    }

    /// Move a fixed light
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Objects the light follows
    pub fn emitting_objects(&self) -> &[NodeKey] {
        &self.emitting_objects
    }

    /// Start following one more object
    pub fn add_emitting_object(&mut self, key: NodeKey) {
        self.emitting_objects.push(key);
    }

    /// Stop following an object
    pub fn remove_emitting_object(&mut self, key: NodeKey) {
        self.emitting_objects.retain(|emitter| *emitter != key);
    }

    /// Advance the color/intensity animation by `dt` seconds
    pub fn update_state(&mut self, dt: f32) {
        if let Some(state) = self.states.as_mut().and_then(|states| states.advance(dt)) {
            self.color = Vec3::from(state.color);
            self.intensity = state.intensity;
        }
    }

    /// Recompute the world position and total intensity from the emitters
    pub fn update_position<L: EmitterLookup + ?Sized>(&mut self, lookup: &L) {
        if self.emitting_objects.is_empty() {
            self.world_position = self.position;
            self.total_intensity = self.intensity;
            return;
        }
        let (sum, count) = self
            .emitting_objects
            .iter()
            .filter_map(|key| lookup.emitter_position(*key))
            .fold((Vec3::zeros(), 0_usize), |(sum, count), position| (sum + position, count + 1));
        if count > 0 {
            self.world_position = sum / count as f32;
        }
        self.total_intensity = self.intensity * count as f32;
    }

    /// World position computed by the last [`Self::update_position`]
    pub fn world_position(&self) -> Vec3 {
        self.world_position
    }

    /// Intensity of all visible emitters together
    pub fn total_intensity(&self) -> f32 {
        self.total_intensity
    }

    /// Distance beyond which the light is ignored
    ///
    /// Uses the total intensity as a cutoff distance; not physically exact.
    pub fn range(&self) -> f32 {
        self.total_intensity
    }

    /// Whether the light can affect anything the camera sees
    pub fn is_eligible(&self, view_matrix: &Mat4, view_distance: f32) -> bool {
        if self.total_intensity <= 0.0 {
            return false;
        }
        let depth = -view_matrix.transform_point4(&self.world_position).z;
        let range = self.range();
        depth > -range && depth < view_distance + range
    }

    /// GPU data of the light
    pub fn data(&self) -> PointLightData {
        let position = self.world_position;
        PointLightData {
            position: [position.x, position.y, position.z, self.range()],
            color: [self.color.x, self.color.y, self.color.z, self.total_intensity],
        }
    }
}
