//! # Core Module
//!
//! Shared configuration types consumed by the scene and its subsystems.
//!
//! ## Organization
//!
//! - **Config**: Scene configuration (LOD, shadows, lights, camera, rendering)
//! - **Foundation**: Low-level utilities (math, handles, logging), re-exported here

pub mod config;

pub use crate::foundation;

pub use config::{
    SceneConfig,
    LodConfig,
    ShadowMappingConfig,
    LightLimits,
    CameraConfig,
    CameraConfigurationDesc,
    RenderingConfig,
    ProjectionMode,
    TransitionStyle,
    Config,
    ConfigError,
};
