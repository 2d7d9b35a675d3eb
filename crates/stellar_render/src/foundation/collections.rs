//! Handle types shared by the scene graph and the GPU collaborators

use serde::{Deserialize, Serialize};
pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable handle of a node (and its renderable object) in the scene tree
    pub struct NodeKey;
}

/// Arena holding values addressed by [`NodeKey`]
pub type NodeMap<T> = SlotMap<NodeKey, T>;

/// Handle of a shader program registered with the GPU context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShaderId(pub u32);

/// Handle of a texture (2D or cubemap) registered with the GPU context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub u32);

/// Compact numeric id of a node, used where a node has to be identified inside GPU data
/// (e.g. the object identifier stored in shadow-map texels).
pub fn node_index(key: NodeKey) -> u32 {
    use slotmap::Key;
    // The low 32 bits of the ffi representation are the slot index
    (key.data().as_ffi() & 0xFFFF_FFFF) as u32
}
