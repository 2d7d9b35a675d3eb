//! Scene-level uniforms
//!
//! Uniforms shared by every object drawn in a pass (camera matrices, lights, time)
//! are produced by named providers evaluated once per pass and assigned whenever a
//! shader becomes current. The scene registers the standard providers; callers may
//! add their own or replace standard ones.

use std::collections::BTreeMap;
use std::fmt;

use crate::lighting::LightManager;
use crate::render::api::{UniformValue, UniformValues};
use crate::spatial::CameraView;

use super::shadow::ShadowFrameData;

/// What scene uniform providers can read
#[derive(Clone, Copy)]
pub struct FrameUniformContext<'a> {
    /// Camera of the current pass
    pub camera: &'a CameraView,
    /// Lights of the scene, already updated for the frame
    pub lights: &'a LightManager,
    /// Whether point and spot lights are active in this pass
    pub dynamic_lights: bool,
    /// Shadow maps of this frame, if any were rendered
    pub shadows: Option<&'a ShadowFrameData>,
    /// Seconds since the scene started
    pub time: f32,
}

/// Computes one uniform value from the frame state
pub type UniformProvider = Box<dyn Fn(&FrameUniformContext<'_>) -> UniformValue>;

/// Named scene uniform providers
#[derive(Default)]
pub struct UniformRegistry {
    providers: BTreeMap<String, UniformProvider>,
}

impl fmt::Debug for UniformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniformRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl UniformRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the camera, light and time uniforms
    pub fn with_standard_uniforms() -> Self {
        let mut registry = Self::new();
        registry.register("u_viewMatrix", |frame| UniformValue::Mat4(frame.camera.view_matrix));
        registry.register("u_projectionMatrix", |frame| UniformValue::Mat4(frame.camera.projection_matrix));
        registry.register("u_viewProjectionMatrix", |frame| {
            UniformValue::Mat4(frame.camera.view_projection_matrix())
        });
        registry.register("u_eyePos", |frame| UniformValue::Vec3(frame.camera.position));
        registry.register("u_viewDistance", |frame| UniformValue::Float(frame.camera.view_distance));
        registry.register("u_aspect", |frame| {
            let (width, height) = frame.camera.viewport;
            UniformValue::Float(width as f32 / height.max(1) as f32)
        });
        registry.register("u_viewportSize", |frame| {
            let (width, height) = frame.camera.viewport;
            UniformValue::Vec2([width as f32, height as f32])
        });
        registry.register("u_time", |frame| UniformValue::Float(frame.time));

        registry.register("u_numDirLights", |frame| {
            UniformValue::Int(frame.lights.rendered_directional_lights().len() as i32)
        });
        registry.register("u_dirLights", |frame| UniformValue::Vec4Array(frame.lights.packed_directional_lights()));
        registry.register("u_numPointLights", |frame| {
            let count = if frame.dynamic_lights { frame.lights.point_light_data().len() } else { 0 };
            UniformValue::Int(count as i32)
        });
        registry.register("u_pointLights", |frame| {
            UniformValue::Vec4Array(frame.lights.packed_point_lights(frame.dynamic_lights))
        });
        registry.register("u_numSpotLights", |frame| {
            let count = if frame.dynamic_lights { frame.lights.spot_light_data().len() } else { 0 };
            UniformValue::Int(count as i32)
        });
        registry.register("u_spotLights", |frame| {
            UniformValue::Vec4Array(frame.lights.packed_spot_lights(frame.dynamic_lights))
        });
        registry
    }

    /// Add a provider, replacing any provider with the same name
    pub fn register(&mut self, name: &str, provider: impl Fn(&FrameUniformContext<'_>) -> UniformValue + 'static) {
        self.providers.insert(name.to_string(), Box::new(provider));
    }

    /// Remove a provider; returns whether it existed
    pub fn remove(&mut self, name: &str) -> bool {
        self.providers.remove(name).is_some()
    }

    /// Whether a provider is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Evaluate every provider, then add the shadow-mapping uniforms of the frame
    pub fn values(&self, frame: &FrameUniformContext<'_>) -> UniformValues {
        let mut values: UniformValues = self
            .providers
            .iter()
            .map(|(name, provider)| (name.clone(), provider(frame)))
            .collect();
        match frame.shadows {
            Some(shadows) => shadows.uniform_values(&mut values),
            None => {
                values.insert("u_shadows".to_string(), UniformValue::Bool(false));
            }
        }
        values
    }
}
