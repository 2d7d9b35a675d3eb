//! Shadow mapping
//!
//! Every rendered directional light gets one shadow map per configured range. Maps
//! are rendered largest range first; each is centered `range` units ahead of the
//! camera, so the texel budget goes to what the viewer sees. Shaders receive a
//! single base matrix and translation vector per light and rebuild the matrix of any
//! range from them.
//!
//! ## Texel contract
//!
//! A shadow map texel holds four 8-bit channels:
//!
//! | channel | content |
//! |---|---|
//! | 0, 1 | object identifier (high byte, low byte) |
//! | 2 | fine depth |
//! | 3 | coarse depth |
//!
//! Depth is the light-space height (towards the light) normalized from [-1, 1] to
//! [0, 1] and decoded as `channel3 + channel2 / 256`. The CPU side of this contract
//! lives here so the constants the shaders use are defined and tested in one place.

use crate::core::config::ShadowMappingConfig;
use crate::foundation::collections::{node_index, NodeKey, ShaderId, TextureId};
use crate::foundation::math::{Mat4, Vec3};
use crate::render::api::{GpuContext, UniformValue, UniformValues};

use super::error::SceneError;

/// Value of one step of an 8-bit channel
pub const CHANNEL_PRECISION: f32 = 1.0 / 255.0;

/// Normalized depth difference below which a texel never shadows a fragment
///
/// Derived from the 8-bit channel precision; another bit depth needs another value.
pub const DEPTH_TOLERANCE: f32 = 0.55 * CHANNEL_PRECISION;

/// Fraction of the largest range over which shadows fade out towards its edge
pub const EDGE_FADE_FRACTION: f32 = 0.1;

/// Normalized depth difference over which very thin shadows fade in
pub const DEPTH_FADE_SPAN: f32 = 4.0 * CHANNEL_PRECISION;

/// Name of the framebuffer of a light's shadow map for one range
pub fn shadow_map_name(light_index: usize, range_index: usize) -> String {
    format!("shadow-map-buffer-{light_index}-{range_index}")
}

/// Largest object identifier a texel can hold
///
/// Identifiers are node slot indices truncated to 16 bits, so in a tree with more
/// than `MAX_OBJECT_ID + 1` slots two nodes can share one and a node may then miss
/// the shadow of the other.
pub const MAX_OBJECT_ID: u32 = 0xFFFF;

/// Identifier of a node in shadow-map texels
///
/// The shadow pass writes it and the main pass passes it to the fragment shader,
/// which ignores texels carrying its own identifier.
pub fn object_id(key: NodeKey) -> u16 {
    (node_index(key) & MAX_OBJECT_ID) as u16
}

fn quantize(value: f32) -> f32 {
    (value.clamp(0.0, 1.0) * 255.0).round() / 255.0
}

/// Pack an object identifier and a light-space depth in [-1, 1] into a texel
pub fn encode_texel(object_id: u16, depth: f32) -> [f32; 4] {
    let normalized = (0.5 + depth / 2.0).clamp(0.0, 1.0);
    let coarse = (normalized * 255.0).floor() / 255.0;
    let fine = quantize((normalized - coarse) * 256.0);
    [
        f32::from(object_id >> 8) / 255.0,
        f32::from(object_id & 0xFF) / 255.0,
        fine,
        coarse,
    ]
}

/// Normalized [0, 1] depth stored in a texel
fn stored_depth(texel: &[f32; 4]) -> f32 {
    texel[3] + texel[2] / 256.0
}

/// Unpack the object identifier and the light-space depth in [-1, 1] of a texel
pub fn decode_texel(texel: &[f32; 4]) -> (u16, f32) {
    let high = (texel[0] * 255.0).round() as u16;
    let low = (texel[1] * 255.0).round() as u16;
    ((high << 8) | low, (stored_depth(texel) - 0.5) * 2.0)
}

/// Whether a texel shadows a fragment with the given identifier and light-space depth
///
/// Texels written by the fragment's own object never shadow it. `extra_tolerance`
/// is added to [`DEPTH_TOLERANCE`] (both in normalized [0, 1] units).
pub fn is_obscured(texel: &[f32; 4], object_id: u16, depth: f32, extra_tolerance: f32) -> bool {
    let (stored_id, _) = decode_texel(texel);
    if stored_id == object_id {
        return false;
    }
    let own = 0.5 + depth / 2.0;
    stored_depth(texel) > own + DEPTH_TOLERANCE + extra_tolerance
}

/// Fade factor in [0, 1] applied to a shadow
///
/// `edge_distance` is the fragment's larger light-space |x| or |y| offset from the
/// center of the largest range; `depth_difference` is by how much (normalized units)
/// the texel depth exceeds the fragment depth plus tolerance.
pub fn fade_factor(edge_distance: f32, largest_range: f32, depth_difference: f32) -> f32 {
    let edge = ((largest_range - edge_distance) / (largest_range * EDGE_FADE_FRACTION)).clamp(0.0, 1.0);
    let depth = (depth_difference / DEPTH_FADE_SPAN).clamp(0.0, 1.0);
    edge * depth
}

/// Soft-shadow sample offsets on the unit disc
///
/// The first sample is the center, the rest follow a golden-angle spiral so any
/// prefix of the list is spread evenly.
pub fn sample_offsets(count: usize) -> Vec<[f32; 2]> {
    let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
    (0..count)
        .map(|i| {
            let radius = (i as f32 / count as f32).sqrt();
            let angle = i as f32 * golden_angle;
            [radius * angle.cos(), radius * angle.sin()]
        })
        .collect()
}

/// Tracks the light-space depth band a fragment was already tested against
///
/// Ranges are tested smallest (most precise) first. A texel of a larger map whose
/// depth falls inside a band a smaller map already covered is skipped, so no depth
/// is tested twice. Call [`ShadowRegion::finish_range`] after all samples of a range.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShadowRegion {
    excluded: Option<(f32, f32)>,
}

impl ShadowRegion {
    /// A region with nothing tested yet
    pub fn new() -> Self {
        Self::default()
    }

    /// The band (base light-space heights) already tested
    pub fn excluded_band(&self) -> Option<(f32, f32)> {
        self.excluded
    }

    fn band(range: f32, depth_ratio: f32, translation: &Vec3) -> (f32, f32, f32) {
        let center = translation.z * range;
        let half_depth = depth_ratio * range;
        (center, center - half_depth, center + half_depth)
    }

    /// Test a fragment against one texel of the map of `range`
    ///
    /// `fragment_height` is the fragment's height in the light's base space and
    /// `translation` the light's translation vector; the map of `range` is centered at
    /// `translation * range` and spans `depth_ratio * range` above and below.
    pub fn check(
        &self,
        texel: &[f32; 4],
        object_id: u16,
        fragment_height: f32,
        range: f32,
        depth_ratio: f32,
        translation: &Vec3,
    ) -> bool {
        let (center, _, high) = Self::band(range, depth_ratio, translation);
        let half_depth = high - center;
        let (_, stored) = decode_texel(texel);
        let stored_height = center + stored * half_depth;
        if self.excluded.is_some_and(|(low, high)| stored_height > low && stored_height < high) {
            return false;
        }
        is_obscured(texel, object_id, (fragment_height - center) / half_depth, 0.0)
    }

    /// Mark the depth band of the map of `range` as tested
    pub fn finish_range(&mut self, range: f32, depth_ratio: f32, translation: &Vec3) {
        let (_, low, high) = Self::band(range, depth_ratio, translation);
        self.excluded = Some(match self.excluded {
            Some((excluded_low, excluded_high)) => (excluded_low.min(low), excluded_high.max(high)),
            None => (low, high),
        });
    }
}

/// Shadow-mapping state of a scene
#[derive(Debug, Clone)]
pub struct ShadowMapping {
    shader: ShaderId,
    ranges: Vec<f32>,
    texture_size: u32,
    depth_ratio: f32,
    sample_offsets: Vec<[f32; 2]>,
    textures: Vec<Vec<TextureId>>,
}

impl ShadowMapping {
    /// Create the state from a validated, enabled configuration
    pub fn new(config: &ShadowMappingConfig) -> Result<Self, SceneError> {
        if !config.enabled {
            return Err(SceneError::ShadowMappingConfig("shadow mapping is disabled".to_string()));
        }
        config.validate().map_err(SceneError::ShadowMappingConfig)?;
        let shader = config
            .shader
            .ok_or_else(|| SceneError::ShadowMappingConfig("no shadow mapping shader is set".to_string()))?;
        Ok(Self {
            shader,
            ranges: config.ranges_descending(),
            texture_size: config.texture_size,
            depth_ratio: config.depth_ratio,
            sample_offsets: sample_offsets(config.num_samples as usize),
            textures: Vec::new(),
        })
    }

    /// Shader rendering depth information into the maps
    pub fn shader(&self) -> ShaderId {
        self.shader
    }

    /// Ranges in rendering order (largest first)
    pub fn ranges(&self) -> &[f32] {
        &self.ranges
    }

    /// Width and height of every map in texels
    pub fn texture_size(&self) -> u32 {
        self.texture_size
    }

    /// Depth half extent of a map relative to its range
    pub fn depth_ratio(&self) -> f32 {
        self.depth_ratio
    }

    /// Soft-shadow sample offsets
    pub fn sample_offsets(&self) -> &[[f32; 2]] {
        &self.sample_offsets
    }

    /// Create the framebuffers of `light_count` lights that do not exist yet
    pub fn ensure_framebuffers(&mut self, context: &mut dyn GpuContext, light_count: usize) {
        while self.textures.len() < light_count {
            let light = self.textures.len();
            let textures = (0..self.ranges.len())
                .map(|range| context.register_framebuffer(&shadow_map_name(light, range), self.texture_size, self.texture_size))
                .collect();
            log::debug!("Created {} shadow map framebuffers for light {light}", self.ranges.len());
            self.textures.push(textures);
        }
    }

    /// Texture of a light's map for one range
    pub fn texture(&self, light_index: usize, range_index: usize) -> Option<TextureId> {
        self.textures.get(light_index)?.get(range_index).copied()
    }

    /// Orthographic projection of the map of `range`
    pub fn projection(&self, range: f32) -> Mat4 {
        crate::lighting::DirectionalLight::shadow_projection(range, self.depth_ratio)
    }
}

/// Shadow information published to the shaders of the main passes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShadowFrameData {
    /// Base matrix per light
    pub base_matrices: Vec<Mat4>,
    /// Translation vector per light
    pub translations: Vec<Vec3>,
    /// Map textures, light-major
    pub textures: Vec<TextureId>,
    /// Ranges in rendering order
    pub ranges: Vec<f32>,
    /// Depth half extent relative to the range
    pub depth_ratio: f32,
    /// Map size in texels
    pub texture_size: u32,
    /// Soft-shadow sample offsets
    pub sample_offsets: Vec<[f32; 2]>,
}

impl ShadowFrameData {
    /// Whether any shadow map was rendered this frame
    pub fn is_active(&self) -> bool {
        !self.base_matrices.is_empty()
    }

    /// Shadow uniforms for the main passes
    pub fn uniform_values(&self, values: &mut UniformValues) {
        values.insert("u_shadows".to_string(), UniformValue::Bool(self.is_active()));
        values.insert("u_numRanges".to_string(), UniformValue::Int(self.ranges.len() as i32));
        values.insert("u_shadowMapRanges".to_string(), UniformValue::FloatArray(self.ranges.clone()));
        values.insert("u_shadowMapDepthRatio".to_string(), UniformValue::Float(self.depth_ratio));
        values.insert("u_shadowMapTextureSize".to_string(), UniformValue::Float(self.texture_size as f32));
        values.insert(
            "u_shadowMapSampleOffsets".to_string(),
            UniformValue::FloatArray(self.sample_offsets.iter().flatten().copied().collect()),
        );
        values.insert("u_lightSpaceMatrices".to_string(), UniformValue::Mat4Array(self.base_matrices.clone()));
        values.insert("u_shadowMapTranslations".to_string(), UniformValue::Vec3Array(self.translations.clone()));
        for (index, texture) in self.textures.iter().enumerate() {
            values.insert(format!("u_shadowMaps[{index}]"), UniformValue::Sampler(*texture));
        }
    }
}
