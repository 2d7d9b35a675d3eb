//! Uniform values passed to shaders
//!
//! The scene never talks to the GPU directly: objects and the scene produce
//! name → value maps which the [`Shader`](super::Shader) collaborator uploads.

use std::collections::HashMap;

use crate::foundation::collections::TextureId;
use crate::foundation::math::{Mat4, Vec3, Vec4};

/// A single value assignable to a shader uniform
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// `float`
    Float(f32),
    /// `int`
    Int(i32),
    /// `bool`
    Bool(bool),
    /// `vec2`
    Vec2([f32; 2]),
    /// `vec3`
    Vec3(Vec3),
    /// `vec4`
    Vec4(Vec4),
    /// `mat4`
    Mat4(Mat4),
    /// `float[]`
    FloatArray(Vec<f32>),
    /// `vec3[]`
    Vec3Array(Vec<Vec3>),
    /// `vec4[]`, also used for packed light structures
    Vec4Array(Vec<[f32; 4]>),
    /// `mat4[]`
    Mat4Array(Vec<Mat4>),
    /// `sampler2D` / `samplerCube`
    Sampler(TextureId),
}

impl UniformValue {
    /// Number of array elements, `None` for scalar values
    pub fn array_len(&self) -> Option<usize> {
        match self {
            Self::FloatArray(values) => Some(values.len()),
            Self::Vec3Array(values) => Some(values.len()),
            Self::Vec4Array(values) => Some(values.len()),
            Self::Mat4Array(values) => Some(values.len()),
            _ => None,
        }
    }

    /// Shortens an array value to at most `len` elements; scalars are left untouched
    pub fn truncate_array(&mut self, len: usize) {
        match self {
            Self::FloatArray(values) => values.truncate(len),
            Self::Vec3Array(values) => values.truncate(len),
            Self::Vec4Array(values) => values.truncate(len),
            Self::Mat4Array(values) => values.truncate(len),
            _ => {}
        }
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        Self::Vec3(value)
    }
}

impl From<Vec4> for UniformValue {
    fn from(value: Vec4) -> Self {
        Self::Vec4(value)
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        Self::Mat4(value)
    }
}

/// Uniform name → value mapping
pub type UniformValues = HashMap<String, UniformValue>;
