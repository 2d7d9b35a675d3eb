//! Render queues
//!
//! Nodes are sorted into four queues per frame: front/distance (camera distance
//! band) × opaque/transparent. Each queue is a list of groups; a group is a list of
//! nodes drawn back to back with one shader (non-instanced) or with one draw call
//! (instanced). Groups keep insertion order, so the draw order is stable from frame
//! to frame.
//! Following Game Engine Architecture Chapter 11.3 - Render Queues.

use bitflags::bitflags;

use crate::foundation::collections::NodeKey;

bitflags! {
    /// Camera distance bands an object falls into
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderQueueBits: u8 {
        /// Between the near plane and the view distance
        const FRONT = 0b01;
        /// Between the view distance and the extended view distance
        const DISTANCE = 0b10;
    }
}

/// One of the four render queues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueCategory {
    /// Front band, drawn with depth writes
    FrontOpaque,
    /// Front band, blended
    FrontTransparent,
    /// Distance band, drawn with depth writes
    DistanceOpaque,
    /// Distance band, blended
    DistanceTransparent,
}

impl QueueCategory {
    /// All categories in queue index order
    pub const ALL: [Self; 4] = [
        Self::FrontOpaque,
        Self::FrontTransparent,
        Self::DistanceOpaque,
        Self::DistanceTransparent,
    ];

    /// Index of the queue
    pub const fn index(self) -> usize {
        match self {
            Self::FrontOpaque => 0,
            Self::FrontTransparent => 1,
            Self::DistanceOpaque => 2,
            Self::DistanceTransparent => 3,
        }
    }

    /// Whether the queue is drawn with depth writes
    pub const fn is_opaque(self) -> bool {
        matches!(self, Self::FrontOpaque | Self::DistanceOpaque)
    }

    /// The categories an object with the given bands and opacity goes into
    pub fn matching(bits: RenderQueueBits, opaque: bool, transparent: bool) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(move |category| {
            let band = match category {
                Self::FrontOpaque | Self::FrontTransparent => RenderQueueBits::FRONT,
                Self::DistanceOpaque | Self::DistanceTransparent => RenderQueueBits::DISTANCE,
            };
            bits.contains(band) && if category.is_opaque() { opaque } else { transparent }
        })
    }
}

/// Nodes drawn together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderGroup {
    nodes: Vec<NodeKey>,
    instanced: bool,
}

impl RenderGroup {
    /// First node of the group; its object decides compatibility
    pub fn head(&self) -> NodeKey {
        self.nodes[0]
    }

    /// All nodes of the group in insertion order
    pub fn nodes(&self) -> &[NodeKey] {
        &self.nodes
    }

    /// Whether the group is drawn with one instanced draw call
    pub fn is_instanced(&self) -> bool {
        self.instanced
    }

    /// Number of nodes in the group
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the group has no nodes (never true for a queued group)
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// The four render queues of a frame
#[derive(Debug, Clone, Default)]
pub struct RenderQueues {
    queues: [Vec<RenderGroup>; 4],
}

impl RenderQueues {
    /// Create empty queues
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty all queues, keeping their allocations
    pub fn clear(&mut self) {
        self.queues.iter_mut().for_each(Vec::clear);
    }

    /// Append nodes to the first compatible group of a queue, or start a new group
    ///
    /// `is_compatible` is asked about the head of every existing group with the same
    /// instancing mode, in order.
    pub fn add(
        &mut self,
        category: QueueCategory,
        nodes: &[NodeKey],
        instanced: bool,
        mut is_compatible: impl FnMut(NodeKey) -> bool,
    ) {
        if nodes.is_empty() {
            return;
        }
        let queue = &mut self.queues[category.index()];
        match queue
            .iter_mut()
            .find(|group| group.instanced == instanced && is_compatible(group.head()))
        {
            Some(group) => group.nodes.extend_from_slice(nodes),
            None => queue.push(RenderGroup { nodes: nodes.to_vec(), instanced }),
        }
    }

    /// The groups of a queue
    pub fn groups(&self, category: QueueCategory) -> &[RenderGroup] {
        &self.queues[category.index()]
    }

    /// Number of nodes in a queue
    pub fn node_count(&self, category: QueueCategory) -> usize {
        self.groups(category).iter().map(RenderGroup::len).sum()
    }

    /// Whether a queue has no nodes
    pub fn is_empty(&self, category: QueueCategory) -> bool {
        self.queues[category.index()].is_empty()
    }

    /// Whether the front band has anything to draw
    pub fn has_front_objects(&self) -> bool {
        !self.is_empty(QueueCategory::FrontOpaque) || !self.is_empty(QueueCategory::FrontTransparent)
    }

    /// Whether a node is in any group of a queue
    pub fn contains(&self, category: QueueCategory, key: NodeKey) -> bool {
        self.groups(category).iter().any(|group| group.nodes.contains(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::NodeMap;

    fn keys(count: usize) -> Vec<NodeKey> {
        let mut map: NodeMap<()> = NodeMap::with_key();
        (0..count).map(|_| map.insert(())).collect()
    }

    #[test]
    fn test_matching_categories() {
        let both = RenderQueueBits::FRONT | RenderQueueBits::DISTANCE;
        let categories: Vec<_> = QueueCategory::matching(both, true, false).collect();
        assert_eq!(categories, vec![QueueCategory::FrontOpaque, QueueCategory::DistanceOpaque]);

        let categories: Vec<_> = QueueCategory::matching(RenderQueueBits::DISTANCE, true, true).collect();
        assert_eq!(categories, vec![QueueCategory::DistanceOpaque, QueueCategory::DistanceTransparent]);

        assert_eq!(QueueCategory::matching(RenderQueueBits::empty(), true, true).count(), 0);
    }

    #[test]
    fn test_groups_by_compatible_head() {
        let nodes = keys(4);
        let mut queues = RenderQueues::new();
        // nodes 0 and 2 are compatible, 1 and 3 are compatible
        let shader_of = |key: NodeKey| nodes.iter().position(|node| *node == key).map(|index| index % 2);

        for node in &nodes {
            let shader = shader_of(*node);
            queues.add(QueueCategory::FrontOpaque, &[*node], false, |head| shader_of(head) == shader);
        }
        let groups = queues.groups(QueueCategory::FrontOpaque);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].nodes(), &[nodes[0], nodes[2]]);
        assert_eq!(groups[1].nodes(), &[nodes[1], nodes[3]]);
    }

    #[test]
    fn test_instanced_and_plain_groups_stay_apart() {
        let nodes = keys(3);
        let mut queues = RenderQueues::new();
        queues.add(QueueCategory::FrontOpaque, &nodes[..1], false, |_| true);
        queues.add(QueueCategory::FrontOpaque, &nodes[1..], true, |_| true);
        let groups = queues.groups(QueueCategory::FrontOpaque);
        assert_eq!(groups.len(), 2);
        assert!(groups[1].is_instanced());
        assert_eq!(groups[1].len(), 2);
    }

    #[test]
    fn test_clear_empties_queues() {
        let nodes = keys(1);
        let mut queues = RenderQueues::new();
        queues.add(QueueCategory::FrontTransparent, &nodes, false, |_| true);
        assert!(queues.has_front_objects());
        queues.clear();
        assert!(!queues.has_front_objects());
        assert_eq!(queues.node_count(QueueCategory::FrontTransparent), 0);
    }
}
