//! Level of detail selection context

use crate::core::config::LodConfig;
use crate::scene::SceneError;

/// LOD index used when an object never qualified for any level
pub const DEFAULT_LOD: usize = 0;

/// Validated LOD configuration of a scene
///
/// Thresholds are pixel sizes per LOD index; a level qualifies when the object's
/// on-screen size is at least its threshold. Levels without a threshold never
/// qualify.
#[derive(Debug, Clone, PartialEq)]
pub struct LodContext {
    max_enabled_lod: usize,
    thresholds: Vec<f32>,
    compensated: bool,
    reference_size: f32,
    min_relative_size: f32,
}

impl Default for LodContext {
    fn default() -> Self {
        let config = LodConfig::default();
        Self {
            max_enabled_lod: config.max_enabled_lod,
            thresholds: config.thresholds,
            compensated: config.compensated,
            reference_size: config.reference_size,
            min_relative_size: config.min_relative_size,
        }
    }
}

impl LodContext {
    /// Build a context from configuration, rejecting decreasing thresholds
    pub fn new(config: &LodConfig) -> Result<Self, SceneError> {
        config.validate().map_err(SceneError::InvalidLodThresholds)?;
        Ok(Self {
            max_enabled_lod: config.max_enabled_lod,
            thresholds: config.thresholds.clone(),
            compensated: config.compensated,
            reference_size: config.reference_size,
            min_relative_size: config.min_relative_size,
        })
    }

    /// Highest LOD index that may be selected
    pub fn max_enabled_lod(&self) -> usize {
        self.max_enabled_lod
    }

    /// Pixel threshold of a LOD level, `None` when the level has none configured
    pub fn threshold(&self, lod: usize) -> Option<f32> {
        self.thresholds.get(lod).copied()
    }

    /// Whether logarithmic size compensation is applied
    pub fn compensated(&self) -> bool {
        self.compensated
    }

    /// Lower bound of the size ratio of objects sized through their parent
    pub fn min_relative_size(&self) -> f32 {
        self.min_relative_size
    }

    /// Compensation factor for an object of the given world size
    ///
    /// `log10(reference + 10) / log10(size + 10)`: objects larger than the reference
    /// are treated as smaller on screen and vice versa.
    pub fn compensation_factor(&self, scaled_size: f32) -> f32 {
        (self.reference_size + 10.0).log10() / (scaled_size + 10.0).log10()
    }

    /// Effective on-screen size used for the threshold comparison
    pub fn effective_size(&self, size_in_pixels: f32, scaled_size: f32) -> f32 {
        if self.compensated {
            size_in_pixels * self.compensation_factor(scaled_size)
        } else {
            size_in_pixels
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_decreasing_thresholds_rejected() {
        let config = LodConfig::default().with_thresholds(vec![0.0, 50.0, 20.0]);
        assert!(matches!(LodContext::new(&config), Err(SceneError::InvalidLodThresholds(_))));
    }

    #[test]
    fn test_compensation_factor() {
        let context = LodContext::new(&LodConfig::default().with_compensation(90.0)).unwrap();
        assert_relative_eq!(context.compensation_factor(90.0), 1.0);
        // log10(100) / log10(1000)
        assert_relative_eq!(context.compensation_factor(990.0), 2.0 / 3.0, epsilon = 1e-6);
        assert_relative_eq!(context.effective_size(300.0, 990.0), 200.0, epsilon = 1e-3);
    }

    #[test]
    fn test_uncompensated_size_passes_through() {
        let context = LodContext::default();
        assert_relative_eq!(context.effective_size(123.0, 5000.0), 123.0);
        assert_eq!(context.threshold(4), Some(400.0));
        assert_eq!(context.threshold(5), None);
    }
}
