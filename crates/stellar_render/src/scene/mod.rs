//! Scene management system
//!
//! Following Game Engine Architecture Chapter 11.2.7 - Scene Graphs.
//!
//! ## Architecture
//!
//! ```text
//! Scene (owner)
//!   ├── SceneTree      nodes, visibility, reuse, traversal
//!   ├── Camera         configurations and transitions
//!   ├── LightManager   light selection
//!   ├── ShadowMapping  shadow map framebuffers
//!   └── SceneRenderer  render queues and passes
//! ```
//!
//! Every frame the tree is traversed once: objects animate and are sorted into
//! four render queues (front/distance × opaque/transparent). The renderer then
//! draws shadow maps, the distance queues and the front queues in that order.

mod camera;
mod error;
mod node;
mod render_queue;
mod scene_manager;
mod scene_renderer;
mod shadow;
mod tree;
mod uniforms;

pub use camera::{Camera, CameraConfiguration, EXTENDED_NEAR_FACTOR};
pub use error::SceneError;
pub use node::RenderableNode;
pub use render_queue::{QueueCategory, RenderGroup, RenderQueueBits, RenderQueues};
pub use scene_manager::Scene;
pub use scene_renderer::{RenderStats, SceneFrame, SceneRenderer, ShadowPass};
pub use shadow::{
    decode_texel, encode_texel, fade_factor, is_obscured, object_id, sample_offsets, shadow_map_name,
    ShadowFrameData, ShadowMapping, ShadowRegion, CHANNEL_PRECISION, DEPTH_FADE_SPAN, DEPTH_TOLERANCE,
    EDGE_FADE_FRACTION, MAX_OBJECT_ID,
};
pub use tree::{SceneTree, TraversalParams};
pub use uniforms::{FrameUniformContext, UniformProvider, UniformRegistry};
