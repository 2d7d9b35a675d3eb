//! State shared by every renderable object
//!
//! Per frame a renderable goes through reset → classify → prepare → perform →
//! mark rendered, and in parallel through the same steps for the shadow maps. The
//! base part keeps the shader, the bound textures and the flags those steps read.

use std::cell::Cell;
use std::collections::BTreeMap;

use crate::foundation::collections::{ShaderId, TextureId};
use crate::render::api::GpuContext;
use crate::scene::SceneError;

/// A resource handed to a renderable to be used as a texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRef {
    /// 2D texture
    Texture(TextureId),
    /// Cube map texture
    Cubemap(TextureId),
    /// Model resource (not bindable)
    Model(String),
    /// Shader resource (not bindable)
    Shader(ShaderId),
    /// Anything else the loader produced
    Other(String),
}

impl ResourceRef {
    fn kind(&self) -> String {
        match self {
            Self::Texture(_) => "texture".to_string(),
            Self::Cubemap(_) => "cubemap".to_string(),
            Self::Model(name) => format!("model '{name}'"),
            Self::Shader(id) => format!("shader {}", id.0),
            Self::Other(kind) => kind.clone(),
        }
    }
}

/// Shader, textures and per-frame flags of a renderable object
#[derive(Debug, Clone)]
pub struct Renderable {
    shader: Option<ShaderId>,
    // Sorted by sampler name so texture sets compare deterministically
    textures: BTreeMap<String, TextureId>,
    visible: bool,
    reusable: bool,
    casts_shadows: bool,
    wireframe: bool,
    was_rendered: Cell<bool>,
    was_rendered_to_shadow_map: Cell<bool>,
}

impl Renderable {
    /// Create a renderable drawn with `shader` (`None` for containers)
    pub fn new(shader: Option<ShaderId>) -> Self {
        Self {
            shader,
            textures: BTreeMap::new(),
            visible: true,
            reusable: false,
            casts_shadows: true,
            wireframe: false,
            was_rendered: Cell::new(false),
            was_rendered_to_shadow_map: Cell::new(false),
        }
    }

    /// Builder pattern: bind a texture to a sampler
    pub fn with_texture(mut self, sampler: &str, texture: TextureId) -> Self {
        self.textures.insert(sampler.to_string(), texture);
        self
    }

    /// Builder pattern: exclude the object from shadow maps
    pub fn without_shadows(mut self) -> Self {
        self.casts_shadows = false;
        self
    }

    /// Builder pattern: draw as wireframe
    pub fn with_wireframe(mut self) -> Self {
        self.wireframe = true;
        self
    }

    /// The shader the object is drawn with
    pub fn shader(&self) -> Option<ShaderId> {
        self.shader
    }

    /// Change the shader the object is drawn with
    pub fn set_shader(&mut self, shader: Option<ShaderId>) {
        self.shader = shader;
    }

    /// Bind a resource to a sampler
    ///
    /// Only textures and cube maps can be bound. Other resources are logged and
    /// skipped; the object keeps rendering without them.
    pub fn add_texture(&mut self, sampler: &str, resource: ResourceRef) -> Result<(), SceneError> {
        match resource {
            ResourceRef::Texture(texture) | ResourceRef::Cubemap(texture) => {
                self.textures.insert(sampler.to_string(), texture);
                Ok(())
            }
            other => {
                let error = SceneError::UnsupportedTextureResource {
                    sampler: sampler.to_string(),
                    kind: other.kind(),
                };
                log::error!("{error}");
                Err(error)
            }
        }
    }

    /// Sampler name → texture bindings
    pub fn textures(&self) -> &BTreeMap<String, TextureId> {
        &self.textures
    }

    /// Whether both objects bind exactly the same textures to the same samplers
    pub fn has_same_textures(&self, other: &Self) -> bool {
        self.textures == other.textures
    }

    /// Bind all textures of the object
    pub fn bind_textures(&self, context: &mut dyn GpuContext) {
        for (sampler, texture) in &self.textures {
            context.bind_texture(sampler, *texture);
        }
    }

    /// The object's own visibility flag (ancestors are not considered)
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Set the object's own visibility flag
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Flip the object's own visibility flag
    pub fn toggle_visibility(&mut self) {
        self.visible = !self.visible;
    }

    /// Flag the object as dead, so its slot can be reused or cleaned up
    pub fn mark_as_reusable(&mut self) {
        self.reusable = true;
    }

    /// Bring a reusable object back to life
    pub fn mark_as_used(&mut self) {
        self.reusable = false;
    }

    /// Whether the object is dead and its slot may be reused
    pub fn can_be_reused(&self) -> bool {
        self.reusable
    }

    /// Whether the object is drawn into shadow maps
    pub fn casts_shadows(&self) -> bool {
        self.casts_shadows
    }

    /// Set whether the object is drawn into shadow maps
    pub fn set_casts_shadows(&mut self, casts_shadows: bool) {
        self.casts_shadows = casts_shadows;
    }

    /// Whether the object is drawn as wireframe
    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    /// Set whether the object is drawn as wireframe
    pub fn set_wireframe(&mut self, wireframe: bool) {
        self.wireframe = wireframe;
    }

    /// Clear the rendered flags at the start of a frame
    pub fn reset_for_new_frame(&self) {
        self.was_rendered.set(false);
        self.was_rendered_to_shadow_map.set(false);
    }

    /// Reset only the shadow map flag (before every shadow map range)
    pub fn reset_for_new_shadow_map(&self) {
        self.was_rendered_to_shadow_map.set(false);
    }

    /// Record that the object was drawn in this frame
    pub fn mark_rendered(&self) {
        self.was_rendered.set(true);
    }

    /// Whether the object was drawn in this frame
    pub fn was_rendered(&self) -> bool {
        self.was_rendered.get()
    }

    /// Record that the object was drawn into the current shadow map
    pub fn mark_rendered_to_shadow_map(&self) {
        self.was_rendered_to_shadow_map.set(true);
    }

    /// Whether the object was drawn into the current shadow map
    pub fn was_rendered_to_shadow_map(&self) -> bool {
        self.was_rendered_to_shadow_map.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_texture_resource_is_skipped() {
        let mut renderable = Renderable::new(Some(ShaderId(1)));
        assert!(renderable.add_texture("diffuse", ResourceRef::Texture(TextureId(3))).is_ok());

        let result = renderable.add_texture("specular", ResourceRef::Model("ship".to_string()));
        assert!(matches!(result, Err(SceneError::UnsupportedTextureResource { .. })));
        assert_eq!(renderable.textures().len(), 1);
        assert_eq!(renderable.textures()["diffuse"], TextureId(3));
    }

    #[test]
    fn test_texture_set_comparison() {
        let a = Renderable::new(Some(ShaderId(1)))
            .with_texture("diffuse", TextureId(1))
            .with_texture("normal", TextureId(2));
        let b = Renderable::new(Some(ShaderId(1)))
            .with_texture("normal", TextureId(2))
            .with_texture("diffuse", TextureId(1));
        let c = Renderable::new(Some(ShaderId(1))).with_texture("diffuse", TextureId(1));
        assert!(a.has_same_textures(&b));
        assert!(!a.has_same_textures(&c));
    }

    #[test]
    fn test_frame_flags_reset() {
        let renderable = Renderable::new(None);
        renderable.mark_rendered();
        renderable.mark_rendered_to_shadow_map();
        assert!(renderable.was_rendered());

        renderable.reset_for_new_shadow_map();
        assert!(renderable.was_rendered());
        assert!(!renderable.was_rendered_to_shadow_map());

        renderable.reset_for_new_frame();
        assert!(!renderable.was_rendered());
    }
}
