//! Scene Renderer - drives the render passes of a frame
//!
//! Following Game Engine Architecture Chapter 11 - The Rendering Engine
//!
//! One frame runs these steps in order:
//! 1. Reset the per-frame caches, animate the tree and build the render queues
//! 2. Select the lights of the frame
//! 3. Render the shadow maps of every directional light, largest range first
//! 4. Distance pass: the distance queues with the extended camera and without
//!    dynamic lights, followed by a depth buffer reset
//! 5. Front pass: opaque queue with depth writes, then transparent queue blended
//! 6. UI pass without depth test

use std::collections::HashSet;

use crate::core::config::RenderingConfig;
use crate::foundation::collections::{NodeKey, ShaderId};
use crate::foundation::math::Mat4;
use crate::lighting::LightManager;
use crate::render::api::{BlendMode, GpuContext, InstanceQueueId, UniformValue, UniformValues};
use crate::renderable::{DrawStats, LodContext, RenderableObject, ViewContext};
use crate::spatial::CameraView;

use super::camera::Camera;
use super::render_queue::{QueueCategory, RenderQueues};
use super::shadow::{object_id, shadow_map_name, ShadowFrameData, ShadowMapping};
use super::tree::{SceneTree, TraversalParams};
use super::uniforms::{FrameUniformContext, UniformRegistry};

/// Packed light arrays, their count uniforms and the `vec4`s per light
const LIGHT_ARRAYS: [(&str, &str, usize); 3] = [
    ("u_dirLights", "u_numDirLights", 2),
    ("u_pointLights", "u_numPointLights", 2),
    ("u_spotLights", "u_numSpotLights", 4),
];

/// Draw statistics of the last frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Draw calls of the distance, front and UI passes
    pub draw_calls: usize,
    /// Triangles of the distance, front and UI passes
    pub triangles: usize,
    /// Draw calls into shadow maps
    pub shadow_draw_calls: usize,
    /// Triangles drawn into shadow maps
    pub shadow_triangles: usize,
}

impl RenderStats {
    fn add(&mut self, draw: DrawStats) {
        self.draw_calls += draw.draw_calls;
        self.triangles += draw.triangles;
    }

    fn add_shadow(&mut self, draw: DrawStats) {
        self.shadow_draw_calls += draw.draw_calls;
        self.shadow_triangles += draw.triangles;
    }
}

/// The candidate nodes of one shadow map render
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowPass {
    /// Index of the light among the rendered directional lights
    pub light: usize,
    /// World-space range of the map
    pub range: f32,
    /// Top-level nodes considered for the map
    pub nodes: Vec<NodeKey>,
}

/// Everything a frame is rendered from
pub struct SceneFrame<'a> {
    /// The node tree
    pub tree: &'a mut SceneTree,
    /// The camera, already updated for the frame
    pub camera: &'a Camera,
    /// The lights of the scene
    pub lights: &'a mut LightManager,
    /// LOD settings
    pub lod: &'a LodContext,
    /// Shadow mapping state, `None` when disabled
    pub shadows: Option<&'a mut ShadowMapping>,
    /// Scene uniform providers
    pub uniforms: &'a UniformRegistry,
    /// Rendering switches
    pub rendering: &'a RenderingConfig,
    /// Seconds since the previous frame
    pub dt: f32,
    /// Seconds since the scene started
    pub time: f32,
    /// Whether objects animate this frame
    pub animate: bool,
}

/// Per-pass state shared by the draw helpers
struct Pass<'a> {
    view: ViewContext<'a>,
    scene_values: UniformValues,
    wireframe: bool,
    assigned: HashSet<ShaderId>,
}

/// Renders frames of a scene and keeps the queues and statistics of the last one
#[derive(Debug, Default)]
pub struct SceneRenderer {
    queues: RenderQueues,
    ui_queues: RenderQueues,
    stats: RenderStats,
    shadow_passes: Vec<ShadowPass>,
    shadow_data: ShadowFrameData,
}

impl SceneRenderer {
    /// Create a renderer with empty queues
    pub fn new() -> Self {
        Self::default()
    }

    /// Render queues built in the last frame
    pub fn queues(&self) -> &RenderQueues {
        &self.queues
    }

    /// UI render queues built in the last frame
    pub fn ui_queues(&self) -> &RenderQueues {
        &self.ui_queues
    }

    /// Statistics of the last frame
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Shadow map renders of the last frame, in order
    pub fn shadow_passes(&self) -> &[ShadowPass] {
        &self.shadow_passes
    }

    /// Shadow data published to the shaders in the last frame
    pub fn shadow_data(&self) -> &ShadowFrameData {
        &self.shadow_data
    }

    /// Render one frame
    ///
    /// # Arguments
    /// * `frame` - The scene state to render
    /// * `context` - The GPU context draw calls are issued to
    ///
    /// # Returns
    /// Draw statistics of the frame
    pub fn render_frame(&mut self, frame: SceneFrame<'_>, context: &mut dyn GpuContext) -> RenderStats {
        let SceneFrame { tree, camera, lights, lod, shadows, uniforms, rendering, dt, time, animate } = frame;
        let viewport = context.viewport_size();
        let camera_view = camera.camera_view(viewport);
        let extended_view = camera.extended_view(viewport);
        self.stats = RenderStats::default();

        // Step 1: animate and classify
        tree.reset_for_new_frame();
        let params = TraversalParams {
            dt,
            animate,
            camera: &camera_view,
            extended_camera: &extended_view,
            lod,
            instancing: rendering.instancing && context.supports_instancing(),
        };
        tree.animate_and_classify(&params, &mut self.queues);
        if rendering.render_ui {
            tree.animate_and_classify_ui(&params, &mut self.ui_queues);
        } else {
            self.ui_queues.clear();
        }
        let tree: &SceneTree = tree;

        // Step 2: lights
        lights.update(dt, tree, &camera_view.view_matrix, camera_view.view_distance);
        let lights: &LightManager = lights;

        // Step 3: shadow maps
        self.shadow_passes.clear();
        self.shadow_data = ShadowFrameData::default();
        if let Some(shadows) = shadows {
            if self.queues.has_front_objects() {
                self.render_shadow_maps(tree, camera, &camera_view, lights, shadows, lod, context);
            }
        }

        context.set_current_framebuffer(None);
        context.set_depth_test(true);
        context.set_depth_mask(true);
        context.clear(rendering.clear_color);
        let shadow_data = self.shadow_data.is_active().then_some(&self.shadow_data);

        // Step 4: distance pass
        let distance_queues = [QueueCategory::DistanceOpaque, QueueCategory::DistanceTransparent];
        if distance_queues.iter().any(|category| !self.queues.is_empty(*category)) {
            let frame_uniforms = FrameUniformContext {
                camera: &extended_view,
                lights,
                dynamic_lights: false,
                shadows: None,
                time,
            };
            let mut pass = Pass {
                view: ViewContext { lookup: tree, camera: &extended_view, lod },
                scene_values: uniforms.values(&frame_uniforms),
                wireframe: rendering.wireframe,
                assigned: HashSet::new(),
            };
            for category in distance_queues {
                let draws = render_category(&self.queues, tree, category, &mut pass, context);
                self.stats.add(draws);
            }
            context.set_depth_mask(true);
            context.clear_depth();
        }

        // Step 5: front pass
        let frame_uniforms = FrameUniformContext {
            camera: &camera_view,
            lights,
            dynamic_lights: true,
            shadows: shadow_data,
            time,
        };
        let mut pass = Pass {
            view: ViewContext { lookup: tree, camera: &camera_view, lod },
            scene_values: uniforms.values(&frame_uniforms),
            wireframe: rendering.wireframe,
            assigned: HashSet::new(),
        };
        for category in [QueueCategory::FrontOpaque, QueueCategory::FrontTransparent] {
            let draws = render_category(&self.queues, tree, category, &mut pass, context);
            self.stats.add(draws);
        }

        // Step 6: UI
        if rendering.render_ui && self.ui_queues.has_front_objects() {
            context.set_depth_test(false);
            pass.wireframe = false;
            for category in [QueueCategory::FrontOpaque, QueueCategory::FrontTransparent] {
                let draws = render_category(&self.ui_queues, tree, category, &mut pass, context);
                self.stats.add(draws);
            }
            context.set_depth_test(true);
        }
        context.set_depth_mask(true);
        context.set_blend_mode(BlendMode::None);

        log::trace!(
            "Frame rendered: {} draw calls, {} triangles, {} shadow draw calls",
            self.stats.draw_calls,
            self.stats.triangles,
            self.stats.shadow_draw_calls
        );
        self.stats
    }

    fn render_shadow_maps(
        &mut self,
        tree: &SceneTree,
        camera: &Camera,
        camera_view: &CameraView,
        lights: &LightManager,
        shadows: &mut ShadowMapping,
        lod: &LodContext,
        context: &mut dyn GpuContext,
    ) {
        let rendered_lights = lights.rendered_directional_lights();
        shadows.ensure_framebuffers(context, rendered_lights.len());
        let position = camera.position();
        let forward = camera.forward();
        let view = ViewContext { lookup: tree, camera: camera_view, lod };
        let shader = shadows.shader();
        let root_children = tree.node(tree.root()).map(|root| root.children().to_vec()).unwrap_or_default();

        for (light_index, light) in rendered_lights.iter().enumerate() {
            light.reset_for_new_frame();
            if light.casts_shadows() {
                let mut queue: Vec<NodeKey> = root_children
                    .iter()
                    .copied()
                    .filter(|key| tree.node(*key).is_some_and(|node| node.is_alive_and_shown()))
                    .collect();
                for (range_index, &range) in shadows.ranges().iter().enumerate() {
                    let light_matrix = light.light_space_matrix(&position, &forward, range);
                    tree.reset_for_new_shadow_map();
                    context.set_current_framebuffer(Some(shadow_map_name(light_index, range_index).as_str()));
                    context.set_depth_test(true);
                    context.set_depth_mask(true);
                    context.set_blend_mode(BlendMode::None);
                    context.clear([1.0, 1.0, 1.0, 1.0]);
                    context.set_current_shader(shader);
                    if let Some(program) = context.shader_mut(shader) {
                        let mut values = UniformValues::new();
                        values.insert("u_lightMatrix".to_string(), UniformValue::Mat4(light_matrix));
                        values.insert("u_projMatrix".to_string(), UniformValue::Mat4(shadows.projection(range)));
                        values.insert("u_shadowMapRange".to_string(), UniformValue::Float(range));
                        values.insert("u_shadowMapDepthRatio".to_string(), UniformValue::Float(shadows.depth_ratio()));
                        program.assign_uniforms(&values);
                    }

                    self.shadow_passes.push(ShadowPass { light: light_index, range, nodes: queue.clone() });
                    queue.retain(|key| {
                        render_subtree_to_shadow_map(tree, *key, shader, &light_matrix, range, &view, context, &mut self.stats)
                    });
                    log::trace!("Shadow map {light_index}/{range}: {} nodes remain", queue.len());
                }
            } else if let Some(&range) = shadows.ranges().first() {
                // Keeps the base matrix defined for shaders indexing by light
                light.light_space_matrix(&position, &forward, range);
            }
            self.shadow_data.base_matrices.push(light.base_matrix().unwrap_or_else(Mat4::identity));
            self.shadow_data.translations.push(light.translation_vector().unwrap_or_default());
            self.shadow_data
                .textures
                .extend((0..shadows.ranges().len()).filter_map(|range_index| shadows.texture(light_index, range_index)));
        }
        self.shadow_data.ranges = shadows.ranges().to_vec();
        self.shadow_data.depth_ratio = shadows.depth_ratio();
        self.shadow_data.texture_size = shadows.texture_size();
        self.shadow_data.sample_offsets = shadows.sample_offsets().to_vec();
    }
}

/// Draw a node and its visible descendants into the current shadow map; returns
/// whether anything was drawn
fn render_subtree_to_shadow_map(
    tree: &SceneTree,
    key: NodeKey,
    shader: ShaderId,
    light_matrix: &Mat4,
    range: f32,
    view: &ViewContext<'_>,
    context: &mut dyn GpuContext,
    stats: &mut RenderStats,
) -> bool {
    let mut rendered = false;
    let mut stack = vec![key];
    while let Some(key) = stack.pop() {
        let Some(node) = tree.node(key) else {
            continue;
        };
        if !node.is_alive_and_shown() {
            continue;
        }
        let object = node.object();
        if object.should_be_rendered_to_shadow_map(tree, light_matrix, range) {
            if let Some(program) = context.shader_mut(shader) {
                program.assign_uniforms(&node_uniform_values(key, object, view, false));
            }
            stats.add_shadow(object.render_to_shadow_map(context, view));
            rendered = true;
        }
        stack.extend(node.children().iter().rev());
    }
    rendered
}

/// Uniforms of the object stored under `key` plus its shadow-map identifier
fn node_uniform_values(key: NodeKey, object: &RenderableObject, view: &ViewContext<'_>, instanced: bool) -> UniformValues {
    let mut values = if instanced { object.instance_uniform_values(view) } else { object.uniform_values(view) };
    values.insert("u_objectId".to_string(), UniformValue::Int(i32::from(object_id(key))));
    values
}

/// Make `shader` current and give it the pass's scene uniforms the first time it
/// is used in the pass
fn use_shader(shader: ShaderId, pass: &mut Pass<'_>, context: &mut dyn GpuContext) {
    context.set_current_shader(shader);
    if !pass.assigned.insert(shader) {
        return;
    }
    let Some(program) = context.shader_mut(shader) else {
        log::warn!("Shader {shader:?} is not registered with the context");
        return;
    };
    let mut values = pass.scene_values.clone();
    for (name, value) in &mut values {
        if let Some(length) = program.uniform_array_length(name) {
            value.truncate_array(length);
        }
    }
    // Light counts must not exceed what survived the truncation
    for (array, count_name, stride) in LIGHT_ARRAYS {
        let available = values.get(array).and_then(UniformValue::array_len).map(|len| (len / stride) as i32);
        if let (Some(available), Some(UniformValue::Int(count))) = (available, values.get_mut(count_name)) {
            *count = (*count).min(available);
        }
    }
    program.assign_uniforms(&values);
}

fn render_category(
    queues: &RenderQueues,
    tree: &SceneTree,
    category: QueueCategory,
    pass: &mut Pass<'_>,
    context: &mut dyn GpuContext,
) -> DrawStats {
    let depth_mask = category.is_opaque();
    context.set_depth_mask(depth_mask);
    context.set_blend_mode(if depth_mask { BlendMode::None } else { BlendMode::Mixed });

    let mut stats = DrawStats::default();
    for (group_index, group) in queues.groups(category).iter().enumerate() {
        let visible: Vec<NodeKey> = group
            .nodes()
            .iter()
            .copied()
            .filter(|key| tree.object(*key).is_some_and(|object| object.should_be_rendered(&pass.view, depth_mask)))
            .collect();
        if visible.is_empty() {
            continue;
        }

        if group.is_instanced() {
            let Some(head) = tree.object(visible[0]) else {
                continue;
            };
            let Some(shader) = head.base().shader() else {
                continue;
            };
            use_shader(shader, pass, context);
            let queue = InstanceQueueId { queue: category.index() as u8, group: group_index as u32 };
            if let Some(program) = context.shader_mut(shader) {
                program.create_instance_buffers(queue, visible.len());
                for (index, key) in visible.iter().enumerate() {
                    if let Some(object) = tree.object(*key) {
                        program.add_instance_data(queue, index, &node_uniform_values(*key, object, &pass.view, true));
                    }
                }
                program.bind_instance_buffers(queue);
            }
            let draw = head.perform_instanced_render(context, &pass.view, depth_mask, pass.wireframe, visible.len());
            stats.draw_calls += draw.draw_calls;
            stats.triangles += draw.triangles;
            for key in &visible[1..] {
                if let Some(object) = tree.object(*key) {
                    object.base().mark_rendered();
                }
            }
        } else {
            for key in &visible {
                let Some(object) = tree.object(*key) else {
                    continue;
                };
                let Some(shader) = object.base().shader() else {
                    continue;
                };
                use_shader(shader, pass, context);
                if let Some(program) = context.shader_mut(shader) {
                    program.assign_uniforms(&node_uniform_values(*key, object, &pass.view, false));
                }
                let draw = object.perform_render(context, &pass.view, depth_mask, pass.wireframe);
                stats.draw_calls += draw.draw_calls;
                stats.triangles += draw.triangles;
            }
        }
    }
    stats
}
