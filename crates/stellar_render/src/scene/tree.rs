//! The renderable node tree
//!
//! All nodes live in one slot map owned by the [`SceneTree`]; parents and children
//! refer to each other by [`NodeKey`]. The tree has two roots: one for the 3D scene
//! and one for the UI overlay.
//!
//! Every frame [`SceneTree::animate_and_classify`] walks a root depth-first
//! (children in insertion order), animates the visible nodes and sorts them into the
//! render queues. Hidden and dead nodes prune their whole subtree.
//! Following Game Engine Architecture Chapter 11.1 - Scene Graphs.

use crate::foundation::collections::{node_index, NodeKey, NodeMap};
use crate::foundation::math::Vec3;
use crate::lighting::EmitterLookup;
use crate::renderable::{LodContext, RenderableObject, Spatial, SpatialLookup, ViewContext};
use crate::spatial::{CameraView, TransformLookup, Transformable};

use super::error::SceneError;
use super::node::RenderableNode;
use super::render_queue::{QueueCategory, RenderQueueBits, RenderQueues};
use super::shadow::MAX_OBJECT_ID;

/// Per-frame inputs of the traversal
#[derive(Clone, Copy)]
pub struct TraversalParams<'a> {
    /// Seconds since the previous frame
    pub dt: f32,
    /// Whether objects advance their animations this frame
    pub animate: bool,
    /// Camera of the front pass
    pub camera: &'a CameraView,
    /// Camera of the distance pass
    pub extended_camera: &'a CameraView,
    /// LOD settings of the scene
    pub lod: &'a LodContext,
    /// Whether instanced draw calls may be used
    pub instancing: bool,
}

/// Owner of all renderable nodes
#[derive(Debug)]
pub struct SceneTree {
    nodes: NodeMap<RenderableNode>,
    root: NodeKey,
    ui_root: NodeKey,
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneTree {
    /// Create a tree with empty scene and UI roots
    pub fn new() -> Self {
        let mut nodes = NodeMap::with_key();
        let root = nodes.insert(RenderableNode::new(RenderableObject::root()));
        let ui_root = nodes.insert(RenderableNode::new(RenderableObject::root()));
        Self { nodes, root, ui_root }
    }

    /// Root of the 3D scene
    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Root of the UI overlay
    pub fn ui_root(&self) -> NodeKey {
        self.ui_root
    }

    /// A node by key
    pub fn node(&self, key: NodeKey) -> Option<&RenderableNode> {
        self.nodes.get(key)
    }

    /// Mutable access to a node
    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut RenderableNode> {
        self.nodes.get_mut(key)
    }

    /// The object of a node
    pub fn object(&self, key: NodeKey) -> Option<&RenderableObject> {
        self.nodes.get(key).map(RenderableNode::object)
    }

    /// Mutable access to the object of a node
    pub fn object_mut(&mut self, key: NodeKey) -> Option<&mut RenderableObject> {
        self.nodes.get_mut(key).map(RenderableNode::object_mut)
    }

    /// Number of nodes, roots included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds nothing but its roots
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 2
    }

    fn unknown(key: NodeKey) -> SceneError {
        let error = SceneError::UnknownNode(key);
        log::error!("{error}");
        error
    }

    /// Attach a node under `parent`
    ///
    /// A 3D object added under a 3D parent gets that parent as its transform parent.
    pub fn add_node(&mut self, parent: NodeKey, mut node: RenderableNode) -> Result<NodeKey, SceneError> {
        let parent_is_spatial = match self.nodes.get(parent) {
            Some(parent_node) => parent_node.object.spatial().is_some(),
            None => return Err(Self::unknown(parent)),
        };
        node.parent = Some(parent);
        if parent_is_spatial {
            if let Some(transform) = node.object.transform_mut() {
                transform.set_parent(Some(parent));
            }
        }
        let key = self.nodes.insert(node);
        if node_index(key) == MAX_OBJECT_ID + 1 {
            log::warn!("Scene tree exceeds {} node slots; shadow object ids start to repeat", MAX_OBJECT_ID + 1);
        }
        self.nodes[parent].children.push(key);
        Ok(key)
    }

    /// Attach an object under `parent` with default node settings
    pub fn add(&mut self, parent: NodeKey, object: RenderableObject) -> Result<NodeKey, SceneError> {
        self.add_node(parent, RenderableNode::new(object))
    }

    /// Attach an object to the scene root
    pub fn add_to_root(&mut self, object: RenderableObject) -> NodeKey {
        let root = self.root;
        self.insert_child(root, RenderableNode::new(object))
    }

    /// Attach an object to the UI root
    pub fn add_to_ui(&mut self, object: RenderableObject) -> NodeKey {
        let ui_root = self.ui_root;
        self.insert_child(ui_root, RenderableNode::new(object))
    }

    fn insert_child(&mut self, parent: NodeKey, node: RenderableNode) -> NodeKey {
        match self.add_node(parent, node) {
            Ok(key) => key,
            Err(error) => panic!("tree roots are never removed: {error}"),
        }
    }

    /// Attach a node under `parent`, reusing the slot of a dead child when `reuse` is set
    ///
    /// The reused child keeps its key and its position among the siblings; its
    /// previous subtree is released.
    pub fn add_subnode(&mut self, parent: NodeKey, mut node: RenderableNode, reuse: bool) -> Result<NodeKey, SceneError> {
        if !reuse {
            return self.add_node(parent, node);
        }
        let (parent_is_spatial, reusable) = match self.nodes.get(parent) {
            Some(parent_node) => (
                parent_node.object.spatial().is_some(),
                parent_node
                    .children
                    .iter()
                    .copied()
                    .find(|child| self.nodes.get(*child).is_some_and(|c| c.object.base().can_be_reused())),
            ),
            None => return Err(Self::unknown(parent)),
        };
        let Some(key) = reusable else {
            return self.add_node(parent, node);
        };

        let released = self.nodes.get_mut(key).map(|old| std::mem::take(&mut old.children)).unwrap_or_default();
        for child in released {
            self.remove_subtree(child);
        }
        node.parent = Some(parent);
        if parent_is_spatial {
            if let Some(transform) = node.object.transform_mut() {
                transform.set_parent(Some(parent));
            }
        }
        node.object.base_mut().mark_as_used();
        self.nodes[key] = node;
        Ok(key)
    }

    /// Set the minimum number of compatible siblings for instanced drawing
    pub fn set_minimum_count_for_instancing(&mut self, key: NodeKey, count: usize) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(key).ok_or_else(|| Self::unknown(key))?;
        node.set_minimum_count_for_instancing(count);
        Ok(())
    }

    /// Mark the children of a node as one homogeneous batch
    pub fn set_instanced_subnodes(&mut self, key: NodeKey, value: bool) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(key).ok_or_else(|| Self::unknown(key))?;
        node.set_instanced_subnodes(value);
        Ok(())
    }

    // === Visibility ===

    /// Set the node's own visibility flag
    pub fn set_visible(&mut self, key: NodeKey, visible: bool) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(key).ok_or_else(|| Self::unknown(key))?;
        node.object.base_mut().set_visible(visible);
        Ok(())
    }

    /// Flip the node's own visibility flag
    pub fn toggle_visibility(&mut self, key: NodeKey) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(key).ok_or_else(|| Self::unknown(key))?;
        node.object.base_mut().toggle_visibility();
        Ok(())
    }

    /// Effective visibility: the node and all its ancestors are visible
    pub fn is_visible(&self, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(key) = current {
            let Some(node) = self.nodes.get(key) else {
                return false;
            };
            if !node.object.base().is_visible() {
                return false;
            }
            current = node.parent;
        }
        true
    }

    // === Pooling ===

    /// Flag a node and its whole subtree for reuse
    pub fn mark_as_reusable(&mut self, key: NodeKey) {
        let mut stack = vec![key];
        while let Some(key) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(key) {
                node.object.base_mut().mark_as_reusable();
                stack.extend_from_slice(&node.children);
            }
        }
    }

    /// Remove every subtree whose root was flagged reusable; returns the number of
    /// nodes released
    pub fn clean_up(&mut self) -> usize {
        let mut released = 0;
        let mut stack = vec![self.root, self.ui_root];
        while let Some(key) = stack.pop() {
            let children = match self.nodes.get_mut(key) {
                Some(node) => std::mem::take(&mut node.children),
                None => continue,
            };
            let (dead, alive): (Vec<NodeKey>, Vec<NodeKey>) = children
                .into_iter()
                .partition(|child| self.nodes.get(*child).is_some_and(|c| c.object.base().can_be_reused()));
            for child in dead {
                released += self.remove_subtree(child);
            }
            stack.extend_from_slice(&alive);
            if let Some(node) = self.nodes.get_mut(key) {
                node.children = alive;
            }
        }
        if released > 0 {
            log::debug!("Released {released} scene nodes");
        }
        released
    }

    /// Detach and drop a node with its subtree
    ///
    /// # Panics
    ///
    /// Removing one of the two roots is a caller bug and panics.
    pub fn remove_node(&mut self, key: NodeKey) -> Result<usize, SceneError> {
        assert!(key != self.root && key != self.ui_root, "the tree roots cannot be removed");
        let parent = self.nodes.get(key).ok_or_else(|| Self::unknown(key))?.parent;
        if let Some(parent) = parent.and_then(|parent| self.nodes.get_mut(parent)) {
            parent.children.retain(|child| *child != key);
        }
        Ok(self.remove_subtree(key))
    }

    fn remove_subtree(&mut self, key: NodeKey) -> usize {
        let mut removed = 0;
        let mut stack = vec![key];
        while let Some(key) = stack.pop() {
            if let Some(node) = self.nodes.remove(key) {
                removed += 1;
                stack.extend(node.children);
            }
        }
        removed
    }

    // === Queries ===

    /// Keys of a subtree in depth-first order, `key` first
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut result = Vec::new();
        let mut stack = vec![key];
        while let Some(key) = stack.pop() {
            if let Some(node) = self.nodes.get(key) {
                result.push(key);
                stack.extend(node.children.iter().rev());
            }
        }
        result
    }

    /// Number of nodes in the subtree of `key` (excluding `key`) matching `predicate`
    pub fn count(&self, key: NodeKey, mut predicate: impl FnMut(&RenderableNode) -> bool) -> usize {
        self.descendants(key)
            .into_iter()
            .skip(1)
            .filter(|key| predicate(&self.nodes[*key]))
            .count()
    }

    /// First node in the subtree of `key` (excluding `key`) matching `predicate`
    pub fn find(&self, key: NodeKey, mut predicate: impl FnMut(&RenderableNode) -> bool) -> Option<NodeKey> {
        self.descendants(key)
            .into_iter()
            .skip(1)
            .find(|key| predicate(&self.nodes[*key]))
    }

    /// Clear the per-frame caches of every object
    pub fn reset_for_new_frame(&self) {
        for node in self.nodes.values() {
            node.object.reset_for_new_frame();
        }
    }

    /// Clear the shadow-map flags of every object
    pub fn reset_for_new_shadow_map(&self) {
        for node in self.nodes.values() {
            node.object.base().reset_for_new_shadow_map();
        }
    }

    // === Traversal ===

    /// Animate the scene subtree and sort it into `queues` (which are cleared first)
    pub fn animate_and_classify(&mut self, params: &TraversalParams<'_>, queues: &mut RenderQueues) {
        queues.clear();
        let root = self.root;
        self.traverse(root, params, queues);
        log::trace!(
            "Render queues: front {}/{}, distance {}/{} (opaque/transparent)",
            queues.node_count(QueueCategory::FrontOpaque),
            queues.node_count(QueueCategory::FrontTransparent),
            queues.node_count(QueueCategory::DistanceOpaque),
            queues.node_count(QueueCategory::DistanceTransparent),
        );
    }

    /// Animate the UI subtree and sort it into `queues` (which are cleared first)
    pub fn animate_and_classify_ui(&mut self, params: &TraversalParams<'_>, queues: &mut RenderQueues) {
        queues.clear();
        let ui_root = self.ui_root;
        self.traverse(ui_root, params, queues);
    }

    fn traverse(&mut self, start: NodeKey, params: &TraversalParams<'_>, queues: &mut RenderQueues) {
        let mut stack = vec![start];
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get_mut(key) else {
                continue;
            };
            if !node.is_alive_and_shown() {
                continue;
            }
            if params.animate {
                node.object.animate(params.dt);
            }
            let batched = node.has_instanced_subnodes();
            let children = node.children.clone();

            self.classify(key, params, queues);

            if batched && params.instancing {
                let minimum = children
                    .first()
                    .and_then(|first| self.nodes.get(*first))
                    .map_or(0, RenderableNode::minimum_count_for_instancing);
                if minimum > 0 && children.len() >= minimum {
                    self.classify_batch(&children, params, queues);
                    continue;
                }
            }
            stack.extend(children.iter().rev());
        }
    }

    /// The view an object is measured with: the front camera when it reaches into
    /// the front band, the extended camera otherwise
    fn view_for<'a>(&'a self, bits: RenderQueueBits, params: &TraversalParams<'a>) -> ViewContext<'a> {
        let camera = if bits.contains(RenderQueueBits::FRONT) || bits.is_empty() {
            params.camera
        } else {
            params.extended_camera
        };
        ViewContext { lookup: self, camera, lod: params.lod }
    }

    fn classify(&self, key: NodeKey, params: &TraversalParams<'_>, queues: &mut RenderQueues) {
        let object = &self.nodes[key].object;
        if object.model().is_none() {
            return;
        }
        let front = ViewContext { lookup: self, camera: params.camera, lod: params.lod };
        let bits = object.render_queue_bits(&front, params.extended_camera.view_distance);
        if bits.is_empty() {
            return;
        }
        let view = self.view_for(bits, params);
        let opaque = object.renders_with_depth_mask(&view);
        let transparent = object.renders_without_depth_mask(&view);
        if !opaque && !transparent {
            return;
        }
        let instanced = self.is_instanced(key, params);
        for category in QueueCategory::matching(bits, opaque, transparent) {
            queues.add(category, &[key], instanced, |head| self.is_compatible(head, key, instanced));
        }
    }

    /// Queue the children of an instanced-subnodes container as one batch, classified
    /// by the first child
    fn classify_batch(&mut self, children: &[NodeKey], params: &TraversalParams<'_>, queues: &mut RenderQueues) {
        if params.animate {
            for child in children {
                if let Some(node) = self.nodes.get_mut(*child) {
                    if node.is_alive_and_shown() {
                        node.object.animate(params.dt);
                    }
                }
            }
        }
        let alive: Vec<NodeKey> = children
            .iter()
            .copied()
            .filter(|child| self.nodes.get(*child).is_some_and(RenderableNode::is_alive_and_shown))
            .collect();
        let Some(&first) = alive.first() else {
            return;
        };
        let object = &self.nodes[first].object;
        let front = ViewContext { lookup: self, camera: params.camera, lod: params.lod };
        let bits = object.render_queue_bits(&front, params.extended_camera.view_distance);
        let view = self.view_for(bits, params);
        let opaque = object.renders_with_depth_mask(&view);
        let transparent = object.renders_without_depth_mask(&view);
        for category in QueueCategory::matching(bits, opaque, transparent) {
            queues.add(category, &alive, true, |head| self.is_compatible(head, first, true));
        }
    }

    fn is_instanced(&self, key: NodeKey, params: &TraversalParams<'_>) -> bool {
        let node = &self.nodes[key];
        let minimum = node.minimum_count_for_instancing();
        if !params.instancing || minimum == 0 {
            return false;
        }
        let Some(parent) = node.parent.and_then(|parent| self.nodes.get(parent)) else {
            return minimum <= 1;
        };
        let compatible = parent
            .children
            .iter()
            .filter_map(|sibling| self.nodes.get(*sibling))
            .filter(|sibling| {
                sibling.is_alive_and_shown() && sibling.object.should_go_in_same_render_queue_instanced(&node.object)
            })
            .count();
        compatible >= minimum
    }

    fn is_compatible(&self, head: NodeKey, key: NodeKey, instanced: bool) -> bool {
        let (Some(head), Some(node)) = (self.nodes.get(head), self.nodes.get(key)) else {
            return false;
        };
        if instanced {
            head.object.should_go_in_same_render_queue_instanced(&node.object)
        } else {
            head.object.should_go_in_same_render_queue(&node.object)
        }
    }
}

impl TransformLookup for SceneTree {
    fn transformable(&self, key: NodeKey) -> Option<&Transformable> {
        self.nodes.get(key)?.object.transform()
    }
}

impl SpatialLookup for SceneTree {
    fn spatial(&self, key: NodeKey) -> Option<&Spatial> {
        self.nodes.get(key)?.object.spatial()
    }
}

impl EmitterLookup for SceneTree {
    fn emitter_position(&self, key: NodeKey) -> Option<Vec3> {
        let node = self.nodes.get(key)?;
        if node.object.base().can_be_reused() || !self.is_visible(key) {
            return None;
        }
        node.object.world_position(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use crate::foundation::collections::ShaderId;
    use crate::foundation::math::{utils::deg_to_rad, Mat4, Mat4Ext, Vec4};
    use crate::render::api::Model;
    use crate::renderable::{Billboard, PointCloud, PointParticle, Renderable, ShadedLodMesh};
    use crate::test_support::FakeModel;
    use approx::assert_relative_eq;

    fn camera(view_distance: f32, near: f32) -> CameraView {
        CameraView {
            view_matrix: Mat4::identity(),
            projection_matrix: Mat4::perspective(deg_to_rad(90.0), 1.0, near, view_distance),
            position: Vec3::zeros(),
            orientation: Mat4::identity(),
            near,
            view_distance,
            viewport: (1000, 1000),
        }
    }

    struct Frame {
        camera: CameraView,
        extended: CameraView,
        lod: LodContext,
    }

    impl Frame {
        fn new() -> Self {
            Self { camera: camera(1000.0, 0.1), extended: camera(5000.0, 1000.0), lod: LodContext::default() }
        }

        fn params(&self, animate: bool) -> TraversalParams<'_> {
            TraversalParams {
                dt: 0.1,
                animate,
                camera: &self.camera,
                extended_camera: &self.extended,
                lod: &self.lod,
                instancing: true,
            }
        }
    }

    fn mesh(shader: u32, model: &Rc<dyn Model>, z: f32) -> RenderableObject {
        RenderableObject::mesh(
            Renderable::new(Some(ShaderId(shader))),
            Transformable::from_position(Vec3::new(0.0, 0.0, z)).with_size(5.0),
            ShadedLodMesh::new(model.clone()),
        )
    }

    #[test]
    fn test_visibility_is_inherited() {
        let model: Rc<dyn Model> = Rc::new(FakeModel::new(1.0));
        let mut tree = SceneTree::new();
        let a = tree.add_to_root(mesh(1, &model, -10.0));
        let b = tree.add(a, mesh(1, &model, -1.0)).unwrap();
        let c = tree.add(b, mesh(1, &model, -1.0)).unwrap();
        tree.set_visible(c, false).unwrap();
        assert!(!tree.is_visible(c));

        tree.set_visible(a, false).unwrap();
        assert!(!tree.is_visible(b));
        assert!(!tree.is_visible(c));
        // Descendant flags are untouched
        assert!(tree.object(b).unwrap().base().is_visible());

        tree.toggle_visibility(a).unwrap();
        assert!(tree.is_visible(b));
        assert!(!tree.is_visible(c));
    }

    #[test]
    fn test_instancing_needs_enough_compatible_siblings() {
        let frame = Frame::new();
        let model: Rc<dyn Model> = Rc::new(FakeModel::new(1.0));
        let mut tree = SceneTree::new();
        let child = tree.add_to_root(mesh(1, &model, -50.0));
        let first = tree
            .add_node(child, RenderableNode::new(mesh(1, &model, 0.0)).with_minimum_count_for_instancing(2))
            .unwrap();

        let mut queues = RenderQueues::new();
        tree.animate_and_classify(&frame.params(false), &mut queues);
        let groups = queues.groups(QueueCategory::FrontOpaque);
        assert_eq!(groups.len(), 1);
        assert!(!groups[0].is_instanced());
        assert_eq!(groups[0].nodes(), &[child, first]);

        let second = tree
            .add_node(child, RenderableNode::new(mesh(1, &model, 1.0)).with_minimum_count_for_instancing(2))
            .unwrap();
        tree.reset_for_new_frame();
        tree.animate_and_classify(&frame.params(false), &mut queues);
        let groups = queues.groups(QueueCategory::FrontOpaque);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].nodes(), &[child]);
        assert!(groups[1].is_instanced());
        assert_eq!(groups[1].head(), first);
        assert_eq!(groups[1].nodes(), &[first, second]);
    }

    #[test]
    fn test_classification_does_not_accumulate() {
        let frame = Frame::new();
        let model: Rc<dyn Model> = Rc::new(FakeModel::new(1.0));
        let mut tree = SceneTree::new();
        tree.add_to_root(mesh(1, &model, -50.0));
        tree.add_to_root(mesh(2, &model, -60.0));

        let mut queues = RenderQueues::new();
        tree.animate_and_classify(&frame.params(false), &mut queues);
        let first = queues.groups(QueueCategory::FrontOpaque).to_vec();
        tree.animate_and_classify(&frame.params(false), &mut queues);
        assert_eq!(queues.groups(QueueCategory::FrontOpaque), first.as_slice());
        assert_eq!(queues.node_count(QueueCategory::FrontOpaque), 2);
    }

    #[test]
    fn test_hidden_subtree_is_pruned_but_groups_still_animate() {
        let frame = Frame::new();
        let model: Rc<dyn Model> = Rc::new(FakeModel::new(1.0));
        let mut tree = SceneTree::new();
        let hidden = tree.add_to_root(mesh(1, &model, -50.0));
        tree.add(hidden, mesh(1, &model, 0.0)).unwrap();
        tree.set_visible(hidden, false).unwrap();

        let drifting = tree.add_to_root(RenderableObject::point_cloud(
            Transformable::identity(),
            PointCloud { drift: Some(Vec3::new(1.0, 0.0, 0.0)) },
        ));

        let mut queues = RenderQueues::new();
        tree.animate_and_classify(&frame.params(true), &mut queues);
        assert!(!queues.has_front_objects());
        assert_relative_eq!(tree.object(drifting).unwrap().transform().unwrap().position().x, 0.1);
    }

    #[test]
    fn test_instanced_subnodes_are_queued_as_one_batch() {
        let frame = Frame::new();
        let model: Rc<dyn Model> = Rc::new(FakeModel::new(1.0));
        let mut tree = SceneTree::new();
        let cloud = tree.add_to_root(RenderableObject::point_cloud(
            Transformable::from_position(Vec3::new(0.0, 0.0, -100.0)),
            PointCloud::default(),
        ));
        tree.set_instanced_subnodes(cloud, true).unwrap();
        let particles: Vec<NodeKey> = (0..3)
            .map(|i| {
                let particle = RenderableObject::point_particle(
                    Renderable::new(Some(ShaderId(4))),
                    Transformable::from_position(Vec3::new(i as f32, 0.0, 0.0)),
                    PointParticle::new(model.clone(), Vec4::new(1.0, 1.0, 1.0, 1.0), 2.0),
                );
                tree.add_node(cloud, RenderableNode::new(particle).with_minimum_count_for_instancing(3))
                    .unwrap()
            })
            .collect();

        let mut queues = RenderQueues::new();
        tree.animate_and_classify(&frame.params(false), &mut queues);
        let groups = queues.groups(QueueCategory::FrontOpaque);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].is_instanced());
        assert_eq!(groups[0].nodes(), particles.as_slice());
    }

    #[test]
    fn test_distance_band_objects_use_the_extended_camera() {
        let frame = Frame::new();
        let model: Rc<dyn Model> = Rc::new(FakeModel::new(1.0));
        let mut tree = SceneTree::new();
        let far = tree.add_to_root(RenderableObject::billboard(
            Renderable::new(Some(ShaderId(1))),
            Transformable::from_position(Vec3::new(0.0, 0.0, -3000.0)),
            Billboard::new(model, 50.0, Vec4::new(1.0, 1.0, 1.0, 1.0)),
        ));

        let mut queues = RenderQueues::new();
        tree.animate_and_classify(&frame.params(false), &mut queues);
        assert!(queues.contains(QueueCategory::DistanceTransparent, far));
        assert!(!queues.has_front_objects());
    }

    #[test]
    fn test_clean_up_and_reuse() {
        let model: Rc<dyn Model> = Rc::new(FakeModel::new(1.0));
        let mut tree = SceneTree::new();
        let parent = tree.add_to_root(mesh(1, &model, -10.0));
        let a = tree.add(parent, mesh(1, &model, 0.0)).unwrap();
        let b = tree.add(parent, mesh(1, &model, 0.0)).unwrap();
        tree.add(a, mesh(1, &model, 0.0)).unwrap();

        tree.mark_as_reusable(a);
        let reused = tree.add_subnode(parent, RenderableNode::new(mesh(2, &model, 0.0)), true).unwrap();
        assert_eq!(reused, a);
        assert_eq!(tree.node(parent).unwrap().children(), &[a, b]);
        assert_eq!(tree.object(a).unwrap().base().shader(), Some(ShaderId(2)));
        assert!(tree.node(a).unwrap().children().is_empty());

        tree.mark_as_reusable(b);
        assert_eq!(tree.clean_up(), 1);
        assert_eq!(tree.node(parent).unwrap().children(), &[a]);
        assert_eq!(tree.count(tree.root(), |_| true), 2);
    }

    #[test]
    fn test_transform_parent_and_emitters() {
        let model: Rc<dyn Model> = Rc::new(FakeModel::new(1.0));
        let mut tree = SceneTree::new();
        let ship = tree.add_to_root(mesh(1, &model, -10.0));
        let engine = tree.add(ship, mesh(1, &model, 2.0)).unwrap();
        assert_eq!(tree.object(engine).unwrap().transform().unwrap().parent(), Some(ship));
        // Roots have no 3D state, so top-level objects have no transform parent
        assert_eq!(tree.object(ship).unwrap().transform().unwrap().parent(), None);

        assert_relative_eq!(tree.emitter_position(engine).unwrap(), Vec3::new(0.0, 0.0, -8.0));
        tree.set_visible(ship, false).unwrap();
        assert!(tree.emitter_position(engine).is_none());
    }

    #[test]
    fn test_unknown_parent_is_reported() {
        let mut tree = SceneTree::new();
        let model: Rc<dyn Model> = Rc::new(FakeModel::new(1.0));
        let node = tree.add_to_root(mesh(1, &model, 0.0));
        tree.remove_node(node).unwrap();
        assert_eq!(tree.add(node, mesh(1, &model, 0.0)), Err(SceneError::UnknownNode(node)));
    }
}
