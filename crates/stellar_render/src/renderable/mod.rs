//! Renderable objects
//!
//! The object model of the scene tree. Shared state lives in [`Renderable`], 3D
//! state in [`Spatial`], and the variants (meshes, billboards, particles, overlay
//! elements, containers) are tags of [`ObjectKind`] inside a [`RenderableObject`].

pub mod base;
pub mod spatial;
pub mod lod;
pub mod mesh;
pub mod billboard;
pub mod particle;
pub mod ui;
pub mod object;

pub use base::{Renderable, ResourceRef};
pub use spatial::{Spatial, SpatialLookup};
pub use lod::{LodContext, DEFAULT_LOD};
pub use mesh::ShadedLodMesh;
pub use billboard::Billboard;
pub use particle::{Particle, ParticleState, ParticleUpdate, PointCloud, PointParticle};
pub use ui::UiElement;
pub use object::{DrawStats, ObjectKind, RenderableObject, ViewContext};
