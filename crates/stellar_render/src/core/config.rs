//! # Scene Configuration
//!
//! The configuration surface consumed by the [`Scene`](crate::scene::Scene): level of
//! detail thresholds, shadow-mapping parameters, light limits, camera settings and
//! general rendering switches.
//!
//! ## Design Goals
//!
//! - **Serializable**: every struct round-trips through TOML and RON via [`Config`]
//! - **Defaults**: a default scene renders without any configuration file
//! - **Validated**: [`SceneConfig::validate`] reports inconsistent values before they
//!   reach the per-frame code

use serde::{Serialize, Deserialize};

use crate::foundation::collections::ShaderId;

pub use crate::config::{Config, ConfigError};

/// # Level of Detail Configuration
///
/// Pixel-size thresholds per LOD level. A LOD is eligible when the on-screen size of
/// an object is at least its threshold, so thresholds must not decrease with the LOD
/// index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LodConfig {
    /// Highest LOD index that may be selected
    pub max_enabled_lod: usize,
    /// Minimum on-screen size (pixels) per LOD index
    pub thresholds: Vec<f32>,
    /// Whether to flatten the size range with logarithmic compensation
    pub compensated: bool,
    /// Object size that the compensation maps to a factor of one
    pub reference_size: f32,
    /// Lower bound of the size ratio used for objects sized through their parent
    pub min_relative_size: f32,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            max_enabled_lod: 4,
            thresholds: vec![0.0, 30.0, 60.0, 250.0, 400.0],
            compensated: false,
            reference_size: 100.0,
            min_relative_size: 0.05,
        }
    }
}

impl LodConfig {
    /// Set the highest selectable LOD
    pub fn with_max_enabled_lod(mut self, lod: usize) -> Self {
        self.max_enabled_lod = lod;
        self
    }

    /// Set the per-LOD thresholds
    pub fn with_thresholds(mut self, thresholds: Vec<f32>) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Enable logarithmic size compensation
    pub fn with_compensation(mut self, reference_size: f32) -> Self {
        self.compensated = true;
        self.reference_size = reference_size;
        self
    }

    /// Set the minimum relative size of nested objects
    pub fn with_min_relative_size(mut self, min_relative_size: f32) -> Self {
        self.min_relative_size = min_relative_size;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(window) = self.thresholds.windows(2).find(|pair| pair[1] < pair[0]) {
            return Err(format!(
                "LOD thresholds must not decrease with the LOD index ({} is followed by {})",
                window[0], window[1]
            ));
        }
        if self.compensated && self.reference_size <= 0.0 {
            return Err("LOD reference size must be positive when compensation is on".to_string());
        }
        Ok(())
    }
}

/// # Shadow Mapping Configuration
///
/// Shadow maps are rendered per directional light and per range, largest range first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowMappingConfig {
    /// Whether shadow maps are rendered at all
    pub enabled: bool,
    /// Shader used to render depth information into the maps
    pub shader: Option<ShaderId>,
    /// Width and height of every shadow map, in texels
    pub texture_size: u32,
    /// World-space half extents of the shadow maps of one light
    pub ranges: Vec<f32>,
    /// Depth half extent of a map relative to its range
    pub depth_ratio: f32,
    /// Number of offset samples used for soft shadow edges
    pub num_samples: u32,
}

impl Default for ShadowMappingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            shader: None,
            texture_size: 2048,
            ranges: Vec::new(),
            depth_ratio: 1.5,
            num_samples: 3,
        }
    }
}

impl ShadowMappingConfig {
    /// Create an enabled configuration
    pub fn new(shader: ShaderId, ranges: Vec<f32>) -> Self {
        Self {
            enabled: true,
            shader: Some(shader),
            ranges,
            ..Default::default()
        }
    }

    /// Set the shadow map resolution
    pub fn with_texture_size(mut self, texture_size: u32) -> Self {
        self.texture_size = texture_size;
        self
    }

    /// Set the depth ratio
    pub fn with_depth_ratio(mut self, depth_ratio: f32) -> Self {
        self.depth_ratio = depth_ratio;
        self
    }

    /// Set the number of soft shadow samples
    pub fn with_num_samples(mut self, num_samples: u32) -> Self {
        self.num_samples = num_samples;
        self
    }

    /// The configured ranges, largest first (the order maps are rendered in)
    pub fn ranges_descending(&self) -> Vec<f32> {
        let mut ranges = self.ranges.clone();
        ranges.sort_by(|a, b| b.total_cmp(a));
        ranges
    }

    /// Validate the configuration
    ///
    /// A disabled configuration is always valid.
    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }
        if self.shader.is_none() {
            return Err("shadow mapping is enabled but no shadow mapping shader is set".to_string());
        }
        if self.ranges.is_empty() {
            return Err("shadow mapping is enabled but no shadow map ranges are set".to_string());
        }
        if self.ranges.iter().any(|range| *range <= 0.0) {
            return Err("shadow map ranges must be positive".to_string());
        }
        if self.texture_size == 0 {
            return Err("shadow map texture size must be positive".to_string());
        }
        Ok(())
    }
}

/// # Light Limits
///
/// Caps on the number of lights whose data is uploaded in one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightLimits {
    /// Directional lights rendered (and shadow mapped) per frame
    pub max_directional_lights: usize,
    /// Point lights rendered per frame
    pub max_point_lights: usize,
    /// Spot lights rendered per frame
    pub max_spot_lights: usize,
    /// Number of point light priority buckets (bucket 0 is the highest priority)
    pub point_light_priority_count: usize,
}

impl Default for LightLimits {
    fn default() -> Self {
        Self {
            max_directional_lights: 2,
            max_point_lights: 64,
            max_spot_lights: 7,
            point_light_priority_count: 5,
        }
    }
}

/// Projection used by the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionMode {
    /// Perspective projection; the span sets the width of the near plane
    Perspective,
    /// Orthographic projection; the span sets the visible width
    Orthographic,
}

/// How the camera blends between two configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionStyle {
    /// Jump to the new configuration at once
    Instant,
    /// Constant blending speed
    Linear,
    /// Ease in and out
    Smooth,
}

/// Description of one named camera configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfigurationDesc {
    /// Unique name of the configuration
    pub name: String,
    /// Position (world space, or relative to the followed object)
    pub position: [f32; 3],
    /// Viewing direction (world space, or relative to the followed object)
    pub direction: [f32; 3],
    /// Default vertical field of view in degrees
    pub fov: f32,
    /// Allowed field of view range in degrees
    pub fov_range: [f32; 2],
    /// Default span in world units
    pub span: f32,
    /// Allowed span range in world units
    pub span_range: [f32; 2],
}

impl Default for CameraConfigurationDesc {
    fn default() -> Self {
        Self {
            name: "free".to_string(),
            position: [0.0, 0.0, 0.0],
            direction: [0.0, 0.0, -1.0],
            fov: 60.0,
            fov_range: [5.0, 120.0],
            span: 0.2,
            span_range: [0.001, 100.0],
        }
    }
}

/// # Camera Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Far plane of the front camera
    pub view_distance: f32,
    /// Width / height of the viewport
    pub aspect: f32,
    /// Projection mode
    pub projection: ProjectionMode,
    /// Far plane of the extended (distance) camera relative to `view_distance`
    pub extension_factor: f32,
    /// Duration of configuration transitions in seconds
    pub transition_duration: f32,
    /// Style of configuration transitions
    pub transition_style: TransitionStyle,
    /// Configuration the camera starts in
    pub initial_configuration: CameraConfigurationDesc,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            view_distance: 5000.0,
            aspect: 16.0 / 9.0,
            projection: ProjectionMode::Perspective,
            extension_factor: 5.0,
            transition_duration: 1.0,
            transition_style: TransitionStyle::Smooth,
            initial_configuration: CameraConfigurationDesc::default(),
        }
    }
}

/// # Rendering Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderingConfig {
    /// Use instanced draw calls where the GPU supports them
    pub instancing: bool,
    /// Draw meshes as wireframes
    pub wireframe: bool,
    /// Render the UI overlay pass
    pub render_ui: bool,
    /// Color the frame is cleared to
    pub clear_color: [f32; 4],
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            instancing: true,
            wireframe: false,
            render_ui: true,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// # Complete Scene Configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Level of detail settings
    pub lod: LodConfig,
    /// Shadow mapping settings
    pub shadows: ShadowMappingConfig,
    /// Light limits
    pub lights: LightLimits,
    /// Camera settings
    pub camera: CameraConfig,
    /// Rendering switches
    pub rendering: RenderingConfig,
}

impl SceneConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.lod.validate().map_err(ConfigError::Invalid)?;
        self.shadows.validate().map_err(ConfigError::Invalid)?;
        if self.lights.point_light_priority_count == 0 {
            return Err(ConfigError::Invalid(
                "at least one point light priority bucket is required".to_string(),
            ));
        }
        if self.camera.view_distance <= 0.0 || self.camera.extension_factor < 1.0 {
            return Err(ConfigError::Invalid(
                "camera view distance must be positive and the extension factor at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config for SceneConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFormat;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SceneConfig::default().validate().is_ok());
    }

    #[test]
    fn test_decreasing_lod_thresholds_rejected() {
        let lod = LodConfig::default().with_thresholds(vec![0.0, 50.0, 20.0]);
        assert!(lod.validate().is_err());
    }

    #[test]
    fn test_shadow_mapping_requires_shader_and_ranges() {
        let mut shadows = ShadowMappingConfig::new(ShaderId(3), Vec::new());
        assert!(shadows.validate().is_err());

        shadows.ranges = vec![10.0, 50.0];
        shadows.shader = None;
        assert!(shadows.validate().is_err());

        shadows.shader = Some(ShaderId(3));
        assert!(shadows.validate().is_ok());
        assert_eq!(shadows.ranges_descending(), vec![50.0, 10.0]);
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = SceneConfig::default();
        config.shadows = ShadowMappingConfig::new(ShaderId(1), vec![20.0, 80.0]);
        config.lights.max_point_lights = 12;

        let text = config.to_string_with_format(ConfigFormat::Toml).unwrap();
        let parsed = SceneConfig::from_str_with_format(&text, ConfigFormat::Toml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_ron_partial_config_rejected() {
        let result = SceneConfig::from_str_with_format("(lod: ())", ConfigFormat::Ron);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
