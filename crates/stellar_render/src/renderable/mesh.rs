//! Shaded meshes with level of detail selection

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::render::api::{Model, UniformValue, UniformValues};
use super::lod::{LodContext, DEFAULT_LOD};

/// A model drawn at the LOD that fits its on-screen size
pub struct ShadedLodMesh {
    model: Rc<dyn Model>,
    static_lod: Option<usize>,
    current_lod: Cell<Option<usize>>,
    last_lod: Cell<Option<usize>>,
    luminosity_factors: Vec<f32>,
}

impl fmt::Debug for ShadedLodMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadedLodMesh")
            .field("static_lod", &self.static_lod)
            .field("current_lod", &self.current_lod.get())
            .field("last_lod", &self.last_lod.get())
            .finish_non_exhaustive()
    }
}

impl ShadedLodMesh {
    /// Create a mesh drawing `model`
    pub fn new(model: Rc<dyn Model>) -> Self {
        Self {
            model,
            static_lod: None,
            current_lod: Cell::new(None),
            last_lod: Cell::new(None),
            luminosity_factors: Vec::new(),
        }
    }

    /// Builder pattern: always use (the closest available level to) `lod`
    pub fn with_static_lod(mut self, lod: usize) -> Self {
        self.static_lod = Some(lod);
        self
    }

    /// Builder pattern: set the luminosity factors uniform array
    pub fn with_luminosity_factors(mut self, factors: Vec<f32>) -> Self {
        self.luminosity_factors = factors;
        self
    }

    /// The drawn model
    pub fn model(&self) -> &Rc<dyn Model> {
        &self.model
    }

    /// The static LOD override, if any
    pub fn static_lod(&self) -> Option<usize> {
        self.static_lod
    }

    /// Set or clear the static LOD override
    pub fn set_static_lod(&mut self, lod: Option<usize>) {
        self.static_lod = lod;
        self.current_lod.set(None);
    }

    /// Set one luminosity factor, growing the array as needed
    pub fn set_luminosity_factor(&mut self, index: usize, factor: f32) {
        if self.luminosity_factors.len() <= index {
            self.luminosity_factors.resize(index + 1, 0.0);
        }
        self.luminosity_factors[index] = factor;
    }

    /// Luminosity factors per model group
    pub fn luminosity_factors(&self) -> &[f32] {
        &self.luminosity_factors
    }

    /// Forget the LOD chosen in the previous frame (a static override stays cached)
    pub fn reset_for_new_frame(&self) {
        if self.static_lod.is_none() {
            self.current_lod.set(None);
        }
    }

    /// The LOD cached for this frame, if it was already chosen
    pub fn cached_lod(&self) -> Option<usize> {
        self.current_lod.get()
    }

    /// Choose the LOD for this frame
    ///
    /// `size_in_pixels` is the object's on-screen size (zero when culled) and
    /// `scaled_size` its world size, used by the logarithmic compensation. Levels are
    /// scanned from the highest enabled one down; the first whose threshold is not
    /// above the effective size wins. When no level qualifies the last chosen LOD is
    /// kept, or [`DEFAULT_LOD`] if there never was one.
    pub fn current_lod(&self, size_in_pixels: f32, scaled_size: f32, context: &LodContext) -> usize {
        if let Some(lod) = self.current_lod.get() {
            return lod;
        }
        if let Some(lod) = self.static_lod {
            let lod = self.model.closest_available_lod(lod);
            self.current_lod.set(Some(lod));
            return lod;
        }

        let chosen = if size_in_pixels > 0.0 {
            let size = context.effective_size(size_in_pixels, scaled_size);
            let highest = self.model.max_lod().min(context.max_enabled_lod());
            (self.model.min_lod()..=highest)
                .rev()
                .find(|&lod| context.threshold(lod).is_some_and(|threshold| threshold <= size))
                .map(|lod| self.model.closest_available_lod(lod))
        } else {
            None
        };

        let lod = match chosen {
            Some(lod) => {
                self.last_lod.set(Some(lod));
                lod
            }
            None => self.last_lod.get().unwrap_or(DEFAULT_LOD),
        };
        self.current_lod.set(Some(lod));
        lod
    }

    /// Whether the model has opaque triangles at `lod`
    pub fn renders_opaque(&self, lod: usize) -> bool {
        self.model.opaque_triangle_count(Some(lod)) > 0
    }

    /// Whether the model has transparent triangles at `lod`
    pub fn renders_transparent(&self, lod: usize) -> bool {
        self.model.transparent_triangle_count(Some(lod)) > 0
    }

    /// Mesh specific uniforms
    pub fn uniform_values(&self, lod: usize, values: &mut UniformValues) {
        values.insert("u_lod".to_string(), UniformValue::Int(lod as i32));
        if !self.luminosity_factors.is_empty() {
            values.insert(
                "u_luminosityFactors".to_string(),
                UniformValue::FloatArray(self.luminosity_factors.clone()),
            );
        }
    }
}
