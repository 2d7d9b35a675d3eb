//! Nodes of the scene tree

use crate::foundation::collections::NodeKey;
use crate::renderable::RenderableObject;

/// A node of the [`SceneTree`](super::SceneTree): one renderable object plus its links
#[derive(Debug)]
pub struct RenderableNode {
    pub(crate) object: RenderableObject,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
    minimum_count_for_instancing: usize,
    has_instanced_subnodes: bool,
}

impl RenderableNode {
    /// Create a detached node
    pub fn new(object: RenderableObject) -> Self {
        Self {
            object,
            parent: None,
            children: Vec::new(),
            minimum_count_for_instancing: 0,
            has_instanced_subnodes: false,
        }
    }

    /// Builder pattern: draw with instancing once `count` compatible siblings exist
    ///
    /// Zero disables instancing for the node.
    pub fn with_minimum_count_for_instancing(mut self, count: usize) -> Self {
        self.minimum_count_for_instancing = count;
        self
    }

    /// Builder pattern: children are homogeneous and queued as one batch
    pub fn with_instanced_subnodes(mut self) -> Self {
        self.has_instanced_subnodes = true;
        self
    }

    /// The object of the node
    pub fn object(&self) -> &RenderableObject {
        &self.object
    }

    /// Mutable access to the object of the node
    pub fn object_mut(&mut self) -> &mut RenderableObject {
        &mut self.object
    }

    /// The parent node, `None` for roots
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    /// Minimum number of compatible siblings for instanced drawing (0 = never)
    pub fn minimum_count_for_instancing(&self) -> usize {
        self.minimum_count_for_instancing
    }

    /// Set the minimum number of compatible siblings for instanced drawing
    pub fn set_minimum_count_for_instancing(&mut self, count: usize) {
        self.minimum_count_for_instancing = count;
    }

    /// Whether the children are queued as one homogeneous batch
    pub fn has_instanced_subnodes(&self) -> bool {
        self.has_instanced_subnodes
    }

    /// Set whether the children are queued as one homogeneous batch
    pub fn set_instanced_subnodes(&mut self, value: bool) {
        self.has_instanced_subnodes = value;
    }

    /// Whether the node takes part in rendering (own flag only)
    pub(crate) fn is_alive_and_shown(&self) -> bool {
        self.object.base().is_visible() && !self.object.base().can_be_reused()
    }
}
