//! Scene - owner of everything a frame is rendered from
//!
//! Following Game Engine Architecture Chapter 11.2.7 - Scene Graphs.
//!
//! The scene holds the node tree, the camera, the lights, LOD and shadow settings
//! and the renderer. Configuration problems found at construction are logged and
//! the affected feature falls back to its default (or is disabled), so a scene can
//! always be created.

use crate::core::config::{LodConfig, RenderingConfig, SceneConfig, ShadowMappingConfig};
use crate::foundation::collections::NodeKey;
use crate::foundation::time::FrameTimer;
use crate::lighting::LightManager;
use crate::render::api::GpuContext;
use crate::renderable::{LodContext, RenderableObject};

use super::camera::Camera;
use super::error::SceneError;
use super::render_queue::RenderQueues;
use super::scene_renderer::{RenderStats, SceneFrame, SceneRenderer, ShadowPass};
use super::shadow::ShadowMapping;
use super::tree::SceneTree;
use super::uniforms::UniformRegistry;

/// A renderable scene
#[derive(Debug)]
pub struct Scene {
    rendering: RenderingConfig,
    tree: SceneTree,
    camera: Camera,
    lights: LightManager,
    lod: LodContext,
    shadows: Option<ShadowMapping>,
    uniforms: UniformRegistry,
    renderer: SceneRenderer,
    timer: FrameTimer,
    animating: bool,
}

impl Scene {
    /// Create a scene from its configuration
    pub fn new(config: SceneConfig) -> Self {
        let lod = LodContext::new(&config.lod).unwrap_or_else(|error| {
            log::error!("{error}; using the default LOD settings");
            LodContext::default()
        });
        let shadows = if config.shadows.enabled {
            ShadowMapping::new(&config.shadows)
                .map_err(|error| log::error!("{error}; shadows are disabled"))
                .ok()
        } else {
            None
        };

        log::info!(
            "Scene created (instancing: {}, shadows: {})",
            config.rendering.instancing,
            shadows.is_some()
        );
        Self {
            rendering: config.rendering,
            tree: SceneTree::new(),
            camera: Camera::new(&config.camera),
            lights: LightManager::new(config.lights),
            lod,
            shadows,
            uniforms: UniformRegistry::with_standard_uniforms(),
            renderer: SceneRenderer::new(),
            timer: FrameTimer::new(),
            animating: true,
        }
    }

    // === Parts ===

    /// The node tree
    pub fn tree(&self) -> &SceneTree {
        &self.tree
    }

    /// The node tree, for adding and changing objects
    pub fn tree_mut(&mut self) -> &mut SceneTree {
        &mut self.tree
    }

    /// The camera
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The camera, for switching configurations
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// The lights
    pub fn lights(&self) -> &LightManager {
        &self.lights
    }

    /// The lights, for adding and changing lights
    pub fn lights_mut(&mut self) -> &mut LightManager {
        &mut self.lights
    }

    /// Scene uniform providers
    pub fn uniforms_mut(&mut self) -> &mut UniformRegistry {
        &mut self.uniforms
    }

    /// Add an object under the 3D root
    pub fn add_object(&mut self, object: RenderableObject) -> NodeKey {
        self.tree.add_to_root(object)
    }

    /// Add an element under the UI root
    pub fn add_ui_element(&mut self, object: RenderableObject) -> NodeKey {
        self.tree.add_to_ui(object)
    }

    /// Remove every reusable node; returns how many were removed
    pub fn clean_up(&mut self) -> usize {
        self.tree.clean_up()
    }

    /// Remove all objects and lights
    pub fn clear(&mut self) {
        self.tree = SceneTree::new();
        self.lights.clear();
        log::info!("Scene cleared");
    }

    // === Settings ===

    /// LOD settings
    pub fn lod(&self) -> &LodContext {
        &self.lod
    }

    /// Replace the LOD settings; invalid settings keep the previous ones
    pub fn set_lod_config(&mut self, config: &LodConfig) -> Result<(), SceneError> {
        match LodContext::new(config) {
            Ok(lod) => {
                self.lod = lod;
                Ok(())
            }
            Err(error) => {
                log::error!("{error}; keeping the previous LOD settings");
                Err(error)
            }
        }
    }

    /// Enable, reconfigure or disable shadow mapping
    ///
    /// An invalid configuration disables shadow mapping and is returned as an error.
    pub fn set_shadow_mapping(&mut self, config: &ShadowMappingConfig) -> Result<(), SceneError> {
        if !config.enabled {
            self.shadows = None;
            log::info!("Shadow mapping disabled");
            return Ok(());
        }
        match ShadowMapping::new(config) {
            Ok(shadows) => {
                log::info!("Shadow mapping enabled with ranges {:?}", shadows.ranges());
                self.shadows = Some(shadows);
                Ok(())
            }
            Err(error) => {
                log::error!("{error}; shadows are disabled");
                self.shadows = None;
                Err(error)
            }
        }
    }

    /// Whether shadow maps are rendered
    pub fn shadow_mapping_enabled(&self) -> bool {
        self.shadows.is_some()
    }

    /// Rendering switches
    pub fn rendering(&self) -> &RenderingConfig {
        &self.rendering
    }

    /// Rendering switches, for toggling instancing, wireframe and the UI
    pub fn rendering_mut(&mut self) -> &mut RenderingConfig {
        &mut self.rendering
    }

    /// Whether objects animate when a frame is rendered
    pub fn is_animating(&self) -> bool {
        self.animating
    }

    /// Pause or resume object animation
    pub fn set_animating(&mut self, animating: bool) {
        self.animating = animating;
    }

    /// Seconds of rendered time since the scene was created
    pub fn time(&self) -> f32 {
        self.timer.total_time()
    }

    // === Rendering ===

    /// Advance the scene by `dt` seconds and render a frame
    pub fn render(&mut self, context: &mut dyn GpuContext, dt: f32) -> RenderStats {
        self.timer.advance(dt);
        self.camera.update(dt, &self.tree);
        let frame = SceneFrame {
            tree: &mut self.tree,
            camera: &self.camera,
            lights: &mut self.lights,
            lod: &self.lod,
            shadows: self.shadows.as_mut(),
            uniforms: &self.uniforms,
            rendering: &self.rendering,
            dt,
            time: self.timer.total_time(),
            animate: self.animating,
        };
        self.renderer.render_frame(frame, context)
    }

    /// Render queues of the last frame
    pub fn render_queues(&self) -> &RenderQueues {
        self.renderer.queues()
    }

    /// Statistics of the last frame
    pub fn render_stats(&self) -> RenderStats {
        self.renderer.stats()
    }

    /// Shadow map renders of the last frame
    pub fn shadow_passes(&self) -> &[ShadowPass] {
        self.renderer.shadow_passes()
    }
}
