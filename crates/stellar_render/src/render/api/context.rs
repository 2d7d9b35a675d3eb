//! GPU context collaborator interface

use crate::foundation::collections::{ShaderId, TextureId};

use super::shader::Shader;

/// Blending applied to the color output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// No blending (opaque passes)
    None,
    /// Standard alpha blending
    Mixed,
    /// Additive blending
    Additive,
}

/// Abstraction over the graphics API state the scene drives
///
/// Implementations own the compiled shaders, textures and framebuffers; the scene
/// refers to them through the ids handed out at registration.
pub trait GpuContext {
    /// Register a shader program and get its id
    fn register_shader(&mut self, name: &str) -> ShaderId;

    /// Register a texture and get its id
    fn register_texture(&mut self, name: &str) -> TextureId;

    /// Register (create) an offscreen framebuffer and get the id of its color texture
    ///
    /// Registering an existing name returns the texture of that framebuffer.
    fn register_framebuffer(&mut self, name: &str, width: u32, height: u32) -> TextureId;

    /// Render into the named framebuffer, or into the screen for `None`
    fn set_current_framebuffer(&mut self, name: Option<&str>);

    /// The shader currently in use
    fn current_shader(&self) -> Option<ShaderId>;

    /// Make `shader` current; returns whether a switch occurred
    fn set_current_shader(&mut self, shader: ShaderId) -> bool;

    /// Access a registered shader
    fn shader_mut(&mut self, shader: ShaderId) -> Option<&mut dyn Shader>;

    /// Bind a texture to a sampler of the current shader
    fn bind_texture(&mut self, sampler: &str, texture: TextureId);

    /// Enable or disable depth writes
    fn set_depth_mask(&mut self, enabled: bool);

    /// Enable or disable depth testing
    fn set_depth_test(&mut self, enabled: bool);

    /// Select the blending mode
    fn set_blend_mode(&mut self, mode: BlendMode);

    /// Clear the color and depth buffers of the current framebuffer
    fn clear(&mut self, color: [f32; 4]);

    /// Clear only the depth buffer of the current framebuffer
    fn clear_depth(&mut self);

    /// Size of the screen viewport in pixels
    fn viewport_size(&self) -> (u32, u32);

    /// Whether instanced draw calls are available
    fn supports_instancing(&self) -> bool;
}
