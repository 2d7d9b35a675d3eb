//! Camera-facing quads

use std::fmt;
use std::rc::Rc;

use crate::foundation::math::Vec4;
use crate::render::api::{Model, UniformValue, UniformValues};

/// A quad that always faces the camera, drawn with blending
pub struct Billboard {
    model: Rc<dyn Model>,
    size: f32,
    color: Vec4,
}

impl fmt::Debug for Billboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Billboard")
            .field("size", &self.size)
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

impl Billboard {
    /// Create a billboard drawing the quad `model` with the given world size
    pub fn new(model: Rc<dyn Model>, size: f32, color: Vec4) -> Self {
        Self { model, size, color }
    }

    /// The quad model
    pub fn model(&self) -> &Rc<dyn Model> {
        &self.model
    }

    /// World-space size of the quad
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Set the world-space size of the quad
    pub fn set_size(&mut self, size: f32) {
        self.size = size;
    }

    /// RGBA color
    pub fn color(&self) -> Vec4 {
        self.color
    }

    /// Set the RGBA color
    pub fn set_color(&mut self, color: Vec4) {
        self.color = color;
    }

    /// Billboard specific uniforms
    pub fn uniform_values(&self, values: &mut UniformValues) {
        values.insert("u_billboardSize".to_string(), UniformValue::Float(self.size));
        values.insert("u_color".to_string(), UniformValue::Vec4(self.color));
    }
}
