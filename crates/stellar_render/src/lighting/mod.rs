//! Light sources
//!
//! Directional lights (which also drive the shadow maps), point lights following
//! emitting objects, spot lights, and the [`LightManager`] that picks the lights
//! rendered in a frame. Light data is uploaded as packed `vec4` arrays; the
//! `*Data` structs define the layout.

pub mod directional;
pub mod point;
pub mod spot;
pub mod manager;

pub use directional::{DirectionalLight, DirectionalLightData};
pub use point::{EmitterLookup, LightState, PointLight, PointLightData};
pub use spot::{SpotLight, SpotLightData};
pub use manager::{LightManager, PointLightHandle};
