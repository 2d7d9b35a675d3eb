//! Spatial state of scene objects and visibility estimation

pub mod transformable;
pub mod visibility;

pub use transformable::{TransformLookup, Transformable};
pub use visibility::{size_inside_view_frustum, CameraView, ViewKey, VisibleSize};
