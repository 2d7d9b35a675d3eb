//! Shader collaborator interface

use super::uniforms::UniformValues;

/// Identifies the instance attribute buffers of one instanced render-queue group
///
/// The scene builds one id per (queue, group) pair so a shader can keep separate
/// buffers for every instanced group it draws in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceQueueId {
    /// Index of the render queue (see [`QueueCategory`](crate::scene::QueueCategory))
    pub queue: u8,
    /// Index of the group inside the queue
    pub group: u32,
}

/// A compiled shader program owned by the GPU context
pub trait Shader {
    /// Upload uniform values; names the program does not declare are ignored
    fn assign_uniforms(&mut self, values: &UniformValues);

    /// Create (or resize) the instance attribute buffers for a queue group
    fn create_instance_buffers(&mut self, queue: InstanceQueueId, instance_count: usize);

    /// Write the attribute values of one instance
    fn add_instance_data(&mut self, queue: InstanceQueueId, index: usize, values: &UniformValues);

    /// Upload and bind the filled instance buffers of a queue group
    fn bind_instance_buffers(&mut self, queue: InstanceQueueId);

    /// Declared length of a uniform array, `None` when the program has no such array
    fn uniform_array_length(&self, name: &str) -> Option<usize>;

    /// Whether the program declares the named uniform array
    fn has_uniform_array(&self, name: &str) -> bool {
        self.uniform_array_length(name).is_some()
    }
}
