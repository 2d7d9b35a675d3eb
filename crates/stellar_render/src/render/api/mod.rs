//! Collaborator interfaces
//!
//! The scene core does not manage GPU resources itself. It drives three
//! collaborators through the traits in this module:
//!
//! - [`GpuContext`]: framebuffers, shader selection, depth/blend state
//! - [`Shader`]: uniform upload and instance attribute buffers
//! - [`Model`]: vertex data per LOD, draw call issuance and triangle counts

pub mod context;
pub mod model;
pub mod shader;
pub mod uniforms;

pub use context::{BlendMode, GpuContext};
pub use model::Model;
pub use shader::{InstanceQueueId, Shader};
pub use uniforms::{UniformValue, UniformValues};
