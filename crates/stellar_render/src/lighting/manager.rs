//! Per-frame light selection
//!
//! Point lights live in priority buckets (bucket 0 first). Every frame the buckets
//! are drained in order and eligible lights are collected until the configured
//! maximum is reached. Lights past the cap still advance their animation so they
//! are consistent when they get promoted later. Spot lights follow the same pattern
//! without buckets.

use crate::core::config::LightLimits;
use crate::foundation::math::Mat4;

use super::directional::{DirectionalLight, DirectionalLightData};
use super::point::{EmitterLookup, PointLight, PointLightData};
use super::spot::{SpotLight, SpotLightData};

/// Handle of a point light registered with the [`LightManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointLightHandle {
    /// Priority bucket
    pub priority: usize,
    /// Position inside the bucket
    pub index: usize,
}

/// Owns the scene's lights and selects the ones rendered each frame
#[derive(Debug, Clone)]
pub struct LightManager {
    limits: LightLimits,
    directional: Vec<DirectionalLight>,
    point_buckets: Vec<Vec<PointLight>>,
    spot: Vec<SpotLight>,
    point_data: Vec<PointLightData>,
    spot_data: Vec<SpotLightData>,
}

impl LightManager {
    /// Create an empty manager
    pub fn new(limits: LightLimits) -> Self {
        let bucket_count = limits.point_light_priority_count.max(1);
        Self {
            limits,
            directional: Vec::new(),
            point_buckets: vec![Vec::new(); bucket_count],
            spot: Vec::new(),
            point_data: Vec::new(),
            spot_data: Vec::new(),
        }
    }

    /// The configured limits
    pub fn limits(&self) -> &LightLimits {
        &self.limits
    }

    /// Add a directional light and get its index
    pub fn add_directional_light(&mut self, light: DirectionalLight) -> usize {
        self.directional.push(light);
        self.directional.len() - 1
    }

    /// All directional lights
    pub fn directional_lights(&self) -> &[DirectionalLight] {
        &self.directional
    }

    /// Mutable access to a directional light
    pub fn directional_light_mut(&mut self, index: usize) -> Option<&mut DirectionalLight> {
        self.directional.get_mut(index)
    }

    /// The directional lights that are rendered (and cast shadows)
    pub fn rendered_directional_lights(&self) -> &[DirectionalLight] {
        let count = self.directional.len().min(self.limits.max_directional_lights);
        &self.directional[..count]
    }

    /// Add a point light to a priority bucket
    ///
    /// Priorities beyond the configured bucket count go to the last bucket.
    pub fn add_point_light(&mut self, light: PointLight, priority: usize) -> PointLightHandle {
        let last = self.point_buckets.len() - 1;
        if priority > last {
            log::warn!("Point light priority {priority} exceeds the {} buckets, using {last}", last + 1);
        }
        let priority = priority.min(last);
        let bucket = &mut self.point_buckets[priority];
        bucket.push(light);
        PointLightHandle { priority, index: bucket.len() - 1 }
    }

    /// A point light by handle
    pub fn point_light(&self, handle: PointLightHandle) -> Option<&PointLight> {
        self.point_buckets.get(handle.priority)?.get(handle.index)
    }

    /// Mutable access to a point light
    pub fn point_light_mut(&mut self, handle: PointLightHandle) -> Option<&mut PointLight> {
        self.point_buckets.get_mut(handle.priority)?.get_mut(handle.index)
    }

    /// Total number of point lights in all buckets
    pub fn point_light_count(&self) -> usize {
        self.point_buckets.iter().map(Vec::len).sum()
    }

    /// Add a spot light and get its index
    pub fn add_spot_light(&mut self, light: SpotLight) -> usize {
        self.spot.push(light);
        self.spot.len() - 1
    }

    /// A spot light by index
    pub fn spot_light(&self, index: usize) -> Option<&SpotLight> {
        self.spot.get(index)
    }

    /// Mutable access to a spot light
    pub fn spot_light_mut(&mut self, index: usize) -> Option<&mut SpotLight> {
        self.spot.get_mut(index)
    }

    /// Remove every light
    pub fn clear(&mut self) {
        self.directional.clear();
        self.point_buckets.iter_mut().for_each(Vec::clear);
        self.spot.clear();
        self.point_data.clear();
        self.spot_data.clear();
    }

    /// Animate the lights and select the ones rendered in this frame
    pub fn update<L: EmitterLookup + ?Sized>(&mut self, dt: f32, lookup: &L, view_matrix: &Mat4, view_distance: f32) {
        self.point_data.clear();
        let max_point_lights = self.limits.max_point_lights;
        for light in self.point_buckets.iter_mut().flatten() {
            light.update_state(dt);
            if self.point_data.len() >= max_point_lights {
                continue;
            }
            light.update_position(lookup);
            if light.is_eligible(view_matrix, view_distance) {
                self.point_data.push(light.data());
            }
        }

        self.spot_data.clear();
        let max_spot_lights = self.limits.max_spot_lights;
        for light in &mut self.spot {
            light.update_state(dt);
            if self.spot_data.len() >= max_spot_lights {
                continue;
            }
            light.update_position(lookup);
            if light.is_eligible(view_matrix, view_distance) {
                self.spot_data.push(light.data());
            }
        }
        log::trace!(
            "Rendering {} of {} point lights and {} of {} spot lights",
            self.point_data.len(),
            self.point_light_count(),
            self.spot_data.len(),
            self.spot.len()
        );
    }

    /// Data of the point lights selected by the last update
    pub fn point_light_data(&self) -> &[PointLightData] {
        &self.point_data
    }

    /// Data of the spot lights selected by the last update
    pub fn spot_light_data(&self) -> &[SpotLightData] {
        &self.spot_data
    }

    /// Data of the rendered directional lights
    pub fn directional_light_data(&self) -> Vec<DirectionalLightData> {
        self.rendered_directional_lights().iter().map(DirectionalLight::data).collect()
    }

    /// Rendered directional lights packed as `vec4`s (two per light)
    pub fn packed_directional_lights(&self) -> Vec<[f32; 4]> {
        bytemuck::cast_slice(&self.directional_light_data()).to_vec()
    }

    /// Selected point lights packed as `vec4`s (two per light)
    ///
    /// Empty when `dynamic_lights` is false (distance pass).
    pub fn packed_point_lights(&self, dynamic_lights: bool) -> Vec<[f32; 4]> {
        if dynamic_lights {
            bytemuck::cast_slice(&self.point_data).to_vec()
        } else {
            Vec::new()
        }
    }

    /// Selected spot lights packed as `vec4`s (four per light)
    ///
    /// Empty when `dynamic_lights` is false (distance pass).
    pub fn packed_spot_lights(&self, dynamic_lights: bool) -> Vec<[f32; 4]> {
        if dynamic_lights {
            bytemuck::cast_slice(&self.spot_data).to_vec()
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::{NodeKey, NodeMap};
    use crate::foundation::math::Vec3;
    use crate::lighting::point::LightState;
    use approx::assert_relative_eq;

    struct NoEmitters;

    impl EmitterLookup for NoEmitters {
        fn emitter_position(&self, _key: NodeKey) -> Option<Vec3> {
            None
        }
    }

    /// Every emitter sits at the same spot
    struct EmittersAt(Vec3);

    impl EmitterLookup for EmittersAt {
        fn emitter_position(&self, _key: NodeKey) -> Option<Vec3> {
            Some(self.0)
        }
    }

    fn animated_light(x: f32) -> PointLight {
        PointLight::new(Vec3::new(x, 0.0, -10.0), Vec3::new(1.0, 1.0, 1.0), 0.0).with_states(
            vec![
                LightState::new([1.0, 1.0, 1.0], 0.0, 0.0),
                LightState::new([1.0, 1.0, 1.0], 100.0, 10.0),
            ],
            false,
        )
    }

    #[test]
    fn test_point_light_cap_follows_priority() {
        let limits = LightLimits { max_point_lights: 3, point_light_priority_count: 3, ..LightLimits::default() };
        let mut manager = LightManager::new(limits);
        let low = manager.add_point_light(animated_light(100.0), 2);
        let high_a = manager.add_point_light(animated_light(1.0), 0);
        let mid = manager.add_point_light(animated_light(10.0), 1);
        let high_b = manager.add_point_light(animated_light(2.0), 0);
        let mid_b = manager.add_point_light(animated_light(20.0), 1);

        manager.update(1.0, &NoEmitters, &Mat4::identity(), 1000.0);

        let rendered: Vec<f32> = manager.point_light_data().iter().map(|data| data.position[0]).collect();
        assert_eq!(rendered, vec![1.0, 2.0, 10.0]);

        // Every light advanced its animation exactly once
        for handle in [low, high_a, mid, high_b, mid_b] {
            assert_relative_eq!(manager.point_light(handle).unwrap().intensity(), 10.0);
        }
    }

    #[test]
    fn test_spot_light_cap() {
        let limits = LightLimits { max_spot_lights: 2, ..LightLimits::default() };
        let mut manager = LightManager::new(limits);
        for x in [1.0, 2.0, 3.0] {
            manager.add_spot_light(SpotLight::new(animated_light(x), Vec3::new(0.0, 0.0, -1.0), 0.2, 0.4));
        }

        manager.update(1.0, &NoEmitters, &Mat4::identity(), 1000.0);

        let rendered: Vec<f32> = manager.spot_light_data().iter().map(|data| data.position[0]).collect();
        assert_eq!(rendered, vec![1.0, 2.0]);
        assert_eq!(manager.packed_spot_lights(true).len(), 8);
        for index in 0..3 {
            assert_relative_eq!(manager.spot_light(index).unwrap().light().intensity(), 10.0);
        }
    }

    #[test]
    fn test_lights_past_cap_only_update_state() {
        let mut emitters: NodeMap<()> = NodeMap::with_key();
        let emitter = emitters.insert(());
        let lookup = EmittersAt(Vec3::new(0.0, 0.0, -20.0));
        let limits = LightLimits { max_point_lights: 1, max_spot_lights: 1, ..LightLimits::default() };
        let mut manager = LightManager::new(limits);

        manager.add_point_light(animated_light(1.0), 0);
        let skipped_point =
            manager.add_point_light(animated_light(5.0).with_emitting_objects(vec![emitter]), 1);
        manager.add_spot_light(SpotLight::new(animated_light(1.0), Vec3::new(0.0, 0.0, -1.0), 0.2, 0.4));
        let skipped_spot = manager.add_spot_light(SpotLight::new(
            animated_light(5.0).with_emitting_objects(vec![emitter]),
            Vec3::new(0.0, 0.0, -1.0),
            0.2,
            0.4,
        ));

        manager.update(1.0, &lookup, &Mat4::identity(), 1000.0);

        let point = manager.point_light(skipped_point).unwrap();
        let spot = manager.spot_light(skipped_spot).unwrap().light();
        for light in [point, spot] {
            // Animated, but still where it was created and never counted its emitters
            assert_relative_eq!(light.intensity(), 10.0);
            assert_eq!(light.world_position(), Vec3::new(5.0, 0.0, -10.0));
            assert_relative_eq!(light.total_intensity(), 0.0);
        }
        assert_eq!(manager.point_light_data().len(), 1);
        assert_eq!(manager.spot_light_data().len(), 1);
    }

    #[test]
    fn test_ineligible_lights_do_not_count_towards_cap() {
        let limits = LightLimits { max_point_lights: 1, ..LightLimits::default() };
        let mut manager = LightManager::new(limits);
        manager.add_point_light(PointLight::new(Vec3::new(0.0, 0.0, -5000.0), Vec3::new(1.0, 1.0, 1.0), 1.0), 0);
        manager.add_point_light(PointLight::new(Vec3::new(0.0, 0.0, -50.0), Vec3::new(1.0, 1.0, 1.0), 1.0), 1);

        manager.update(0.1, &NoEmitters, &Mat4::identity(), 1000.0);
        assert_eq!(manager.point_light_data().len(), 1);
        assert_eq!(manager.point_light_data()[0].position[2], -50.0);
    }

    #[test]
    fn test_priority_beyond_buckets_is_clamped() {
        let mut manager = LightManager::new(LightLimits::default());
        let handle = manager.add_point_light(PointLight::new(Vec3::zeros(), Vec3::zeros(), 1.0), 99);
        assert_eq!(handle.priority, LightLimits::default().point_light_priority_count - 1);
    }

    #[test]
    fn test_distance_pass_has_no_dynamic_lights() {
        let mut manager = LightManager::new(LightLimits::default());
        manager.add_directional_light(DirectionalLight::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.0, -1.0, 0.0)));
        manager.add_point_light(PointLight::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(1.0, 1.0, 1.0), 10.0), 0);
        manager.update(0.1, &NoEmitters, &Mat4::identity(), 1000.0);

        assert!(manager.packed_point_lights(false).is_empty());
        assert_eq!(manager.packed_directional_lights().len(), 2);

        let points = manager.packed_point_lights(true);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], [0.0, 0.0, -5.0, 10.0]);
    }
}
