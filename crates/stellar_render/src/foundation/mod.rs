//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the renderer:
//! - Math types and matrix helpers
//! - Arena handles for scene nodes and GPU-side ids
//! - Frame timing and keyframe sequences
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod time;
pub mod logging;
