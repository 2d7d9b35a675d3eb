//! Asset management system
//!
//! Resources (models, textures, shaders) are loaded outside of this crate; the
//! [`LoadCache`] deduplicates concurrent requests and serves loaded values.

mod load_cache;

pub use load_cache::{LoadCache, LoadCallback, LoadRequest};
