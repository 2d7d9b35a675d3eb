//! # Stellar Render
//!
//! Scene core of a real-time 3D renderer for space scenes.
//!
//! ## Features
//!
//! - **Scene Tree**: Hierarchical renderable objects with inherited visibility and node reuse
//! - **Render Queues**: Front/distance and opaque/transparent classification with instancing
//! - **Level of Detail**: Screen-size based LOD selection with size compensation
//! - **Shadow Mapping**: Cascaded directional shadow maps with object-id self-exclusion
//! - **Lights**: Prioritized point lights, spot lights and shadow-casting directional lights
//! - **Camera**: Named configurations with smooth transitions and object following
//!
//! The crate does not talk to a graphics API itself: draw calls and state changes
//! go through the traits in [`render::api`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use stellar_render::prelude::*;
//!
//! fn build(context: &mut dyn GpuContext, ship: Rc<dyn Model>) {
//!     stellar_render::foundation::logging::init();
//!
//!     let mut scene = Scene::new(SceneConfig::default());
//!     let shader = context.register_shader("mesh");
//!     scene.add_object(RenderableObject::mesh(
//!         Renderable::new(Some(shader)),
//!         Transformable::from_position(Vec3::new(0.0, 0.0, -50.0)),
//!         ShadedLodMesh::new(ship),
//!     ));
//!     scene
//!         .lights_mut()
//!         .add_directional_light(DirectionalLight::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.0, -1.0, 0.0)));
//!
//!     let stats = scene.render(context, 1.0 / 60.0);
//!     log::info!("{} draw calls", stats.draw_calls);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core modules
pub mod core;
pub mod config;
pub mod foundation;

// Scene object model
pub mod spatial;
pub mod renderable;
pub mod lighting;
pub mod scene;

// Collaborators
pub mod render;
pub mod assets;

#[cfg(test)]
mod test_support;

/// Common imports for renderer users
pub mod prelude {
    pub use crate::{
        assets::{LoadCache, LoadRequest},
        core::config::{CameraConfig, LodConfig, RenderingConfig, SceneConfig, ShadowMappingConfig},
        foundation::{
            collections::{NodeKey, ShaderId, TextureId},
            math::{Mat4, Mat4Ext, Vec3, Vec4},
        },
        lighting::{DirectionalLight, LightManager, PointLight, SpotLight},
        render::{GpuContext, Model, Shader, UniformValue, UniformValues},
        renderable::{Billboard, ObjectKind, Renderable, RenderableObject, ShadedLodMesh, UiElement},
        scene::{Camera, CameraConfiguration, RenderableNode, RenderStats, Scene, SceneError, SceneTree},
        spatial::Transformable,
    };
}
