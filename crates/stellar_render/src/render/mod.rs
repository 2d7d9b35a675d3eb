//! # Rendering Interfaces
//!
//! The scene core is API agnostic: everything that touches the graphics API goes
//! through the collaborator traits in [`api`]. Concrete backends implement them
//! outside of this crate.

pub mod api;

pub use api::{
    BlendMode, GpuContext, InstanceQueueId, Model, Shader, UniformValue, UniformValues,
};
