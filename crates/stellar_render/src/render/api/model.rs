//! Model collaborator interface
//!
//! Models own the vertex data of a mesh at one or more levels of detail and issue
//! the actual draw calls. Coverage of LOD levels may be sparse: a model can for
//! example only provide LOD 0, 2 and 4.

use super::context::GpuContext;

/// Mesh data with optional levels of detail
pub trait Model {
    /// Draw the model once
    ///
    /// With `depth_mask` set only opaque triangles are drawn, otherwise only
    /// transparent ones.
    fn render(&self, context: &mut dyn GpuContext, lod: Option<usize>, wireframe: bool, depth_mask: bool);

    /// Draw `instance_count` instances using the currently bound instance buffers
    fn render_instances(&self, context: &mut dyn GpuContext, lod: Option<usize>, wireframe: bool, instance_count: usize);

    /// Number of opaque triangles at the given LOD
    fn opaque_triangle_count(&self, lod: Option<usize>) -> usize;

    /// Number of transparent triangles at the given LOD
    fn transparent_triangle_count(&self, lod: Option<usize>) -> usize;

    /// Radius of the bounding sphere in model space
    fn size(&self) -> f32;

    /// Lowest available LOD index
    fn min_lod(&self) -> usize;

    /// Highest available LOD index
    fn max_lod(&self) -> usize;

    /// The available LOD closest to `lod`
    fn closest_available_lod(&self, lod: usize) -> usize;
}
