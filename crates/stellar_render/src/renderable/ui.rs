//! Overlay elements drawn in screen space

use std::fmt;
use std::rc::Rc;

use crate::foundation::math::Vec4;
use crate::render::api::{Model, UniformValue, UniformValues};

/// A 2D quad drawn over the scene without depth testing
///
/// Position and size are given in normalized device coordinates.
pub struct UiElement {
    model: Rc<dyn Model>,
    position: [f32; 2],
    size: [f32; 2],
    color: Vec4,
}

impl fmt::Debug for UiElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiElement")
            .field("position", &self.position)
            .field("size", &self.size)
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

impl UiElement {
    /// Create an overlay element
    pub fn new(model: Rc<dyn Model>, position: [f32; 2], size: [f32; 2], color: Vec4) -> Self {
        Self { model, position, size, color }
    }

    /// The quad model
    pub fn model(&self) -> &Rc<dyn Model> {
        &self.model
    }

    /// Center in NDC
    pub fn position(&self) -> [f32; 2] {
        self.position
    }

    /// Move the element
    pub fn set_position(&mut self, position: [f32; 2]) {
        self.position = position;
    }

    /// Half-extents in NDC
    pub fn size(&self) -> [f32; 2] {
        self.size
    }

    /// Resize the element
    pub fn set_size(&mut self, size: [f32; 2]) {
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

    /// Element specific uniforms
    pub fn uniform_values(&self, values: &mut UniformValues) {
        values.insert("u_position".to_string(), UniformValue::Vec2(self.position));
        values.insert("u_size".to_string(), UniformValue::Vec2(self.size));
        values.insert("u_color".to_string(), UniformValue::Vec4(self.color));
    }
}
