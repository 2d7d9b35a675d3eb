//! Recoverable scene errors
//!
//! These are reported where they are detected (and logged); the affected feature
//! or resource is skipped and rendering continues. Caller bugs such as selecting an
//! unregistered camera configuration panic instead.

use crate::foundation::collections::NodeKey;

/// Errors reported by scene operations
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Shadow mapping was enabled with an incomplete configuration
    #[error("Cannot enable shadow mapping: {0}")]
    ShadowMappingConfig(String),

    /// A renderable was given a resource that cannot be bound as a texture
    #[error("Unsupported texture resource for sampler '{sampler}': {kind}")]
    UnsupportedTextureResource {
        /// Sampler the resource was meant for
        sampler: String,
        /// Kind of the rejected resource
        kind: String,
    },

    /// LOD thresholds decrease with the LOD index
    #[error("Invalid LOD thresholds: {0}")]
    InvalidLodThresholds(String),

    /// A node key that is not (or no longer) part of the tree
    #[error("Unknown scene node {0:?}")]
    UnknownNode(NodeKey),
}
