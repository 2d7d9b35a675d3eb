//! GPU-free collaborators for unit tests
//!
//! [`RecordingContext`] records the state changes the scene issues, [`FakeShader`]
//! keeps every uniform and instance upload, and [`FakeModel`] logs its draws and can
//! be given sparse LOD coverage.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::foundation::collections::{ShaderId, TextureId};
use crate::render::api::{BlendMode, GpuContext, InstanceQueueId, Model, Shader, UniformValue, UniformValues};

/// A state change issued to the [`RecordingContext`]
#[derive(Debug, Clone, PartialEq)]
pub enum GpuEvent {
    Framebuffer(Option<String>),
    UseShader(ShaderId),
    BindTexture(String, TextureId),
    DepthMask(bool),
    DepthTest(bool),
    Blend(BlendMode),
    Clear,
    ClearDepth,
}

/// Shader that stores what it was given
#[derive(Debug, Default)]
pub struct FakeShader {
    uniform_arrays: HashMap<String, usize>,
    pub assignments: Vec<UniformValues>,
    pub instance_data: HashMap<InstanceQueueId, Vec<UniformValues>>,
    pub bound_instance_queues: Vec<InstanceQueueId>,
}

impl FakeShader {
    pub fn with_uniform_array(mut self, name: &str, length: usize) -> Self {
        self.uniform_arrays.insert(name.to_string(), length);
        self
    }

    /// The most recent value assigned to `name`
    pub fn last_value(&self, name: &str) -> Option<&UniformValue> {
        self.assignments.iter().rev().find_map(|values| values.get(name))
    }
}

impl Shader for FakeShader {
    fn assign_uniforms(&mut self, values: &UniformValues) {
        self.assignments.push(values.clone());
    }

    fn create_instance_buffers(&mut self, queue: InstanceQueueId, instance_count: usize) {
        self.instance_data.insert(queue, vec![UniformValues::new(); instance_count]);
    }

    fn add_instance_data(&mut self, queue: InstanceQueueId, index: usize, values: &UniformValues) {
        if let Some(slot) = self.instance_data.get_mut(&queue).and_then(|data| data.get_mut(index)) {
            *slot = values.clone();
        }
    }

    fn bind_instance_buffers(&mut self, queue: InstanceQueueId) {
        self.bound_instance_queues.push(queue);
    }

    fn uniform_array_length(&self, name: &str) -> Option<usize> {
        self.uniform_arrays.get(name).copied()
    }
}

/// GPU context recording every state change
#[derive(Debug)]
pub struct RecordingContext {
    shaders: HashMap<ShaderId, FakeShader>,
    shader_names: HashMap<String, ShaderId>,
    texture_names: HashMap<String, TextureId>,
    current_shader: Option<ShaderId>,
    instancing: bool,
    viewport: (u32, u32),
    pub framebuffers: Vec<(String, u32, u32)>,
    pub events: Vec<GpuEvent>,
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingContext {
    pub fn new() -> Self {
        Self {
            shaders: HashMap::new(),
            shader_names: HashMap::new(),
            texture_names: HashMap::new(),
            current_shader: None,
            instancing: true,
            viewport: (1000, 1000),
            framebuffers: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn without_instancing(mut self) -> Self {
        self.instancing = false;
        self
    }

    /// Register a prepared fake shader under `name`
    pub fn add_shader(&mut self, name: &str, shader: FakeShader) -> ShaderId {
        let id = self.register_shader(name);
        self.shaders.insert(id, shader);
        id
    }

    pub fn shader(&self, id: ShaderId) -> &FakeShader {
        &self.shaders[&id]
    }

    /// Framebuffers made current, in order (`None` is the screen)
    pub fn framebuffer_switches(&self) -> Vec<Option<String>> {
        self.events
            .iter()
            .filter_map(|event| match event {
                GpuEvent::Framebuffer(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

impl GpuContext for RecordingContext {
    fn register_shader(&mut self, name: &str) -> ShaderId {
        if let Some(id) = self.shader_names.get(name) {
            return *id;
        }
        let id = ShaderId(self.shader_names.len() as u32 + 1);
        self.shader_names.insert(name.to_string(), id);
        self.shaders.insert(id, FakeShader::default());
        id
    }

    fn register_texture(&mut self, name: &str) -> TextureId {
        let next = TextureId(self.texture_names.len() as u32 + 1);
        *self.texture_names.entry(name.to_string()).or_insert(next)
    }

    fn register_framebuffer(&mut self, name: &str, width: u32, height: u32) -> TextureId {
        if !self.framebuffers.iter().any(|(existing, _, _)| existing == name) {
            self.framebuffers.push((name.to_string(), width, height));
        }
        self.register_texture(name)
    }

    fn set_current_framebuffer(&mut self, name: Option<&str>) {
        self.events.push(GpuEvent::Framebuffer(name.map(str::to_string)));
    }

    fn current_shader(&self) -> Option<ShaderId> {
        self.current_shader
    }

    fn set_current_shader(&mut self, shader: ShaderId) -> bool {
        if self.current_shader == Some(shader) {
            return false;
        }
        self.current_shader = Some(shader);
        self.events.push(GpuEvent::UseShader(shader));
        true
    }

    fn shader_mut(&mut self, shader: ShaderId) -> Option<&mut dyn Shader> {
        self.shaders.get_mut(&shader).map(|shader| shader as &mut dyn Shader)
    }

    fn bind_texture(&mut self, sampler: &str, texture: TextureId) {
        self.events.push(GpuEvent::BindTexture(sampler.to_string(), texture));
    }

    fn set_depth_mask(&mut self, enabled: bool) {
        self.events.push(GpuEvent::DepthMask(enabled));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.events.push(GpuEvent::DepthTest(enabled));
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.events.push(GpuEvent::Blend(mode));
    }

    fn clear(&mut self, _color: [f32; 4]) {
        self.events.push(GpuEvent::Clear);
    }

    fn clear_depth(&mut self) {
        self.events.push(GpuEvent::ClearDepth);
    }

    fn viewport_size(&self) -> (u32, u32) {
        self.viewport
    }

    fn supports_instancing(&self) -> bool {
        self.instancing
    }
}

/// One draw issued on a [`FakeModel`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDraw {
    pub lod: Option<usize>,
    pub instances: Option<usize>,
    pub wireframe: bool,
    pub depth_mask: bool,
}

/// Model with configurable LOD coverage and triangle counts
#[derive(Debug)]
pub struct FakeModel {
    size: f32,
    lods: Vec<usize>,
    opaque_triangles: usize,
    transparent_triangles: usize,
    pub draws: RefCell<Vec<ModelDraw>>,
}

impl FakeModel {
    /// Opaque model with LODs 0 to 4
    pub fn new(size: f32) -> Self {
        Self {
            size,
            lods: (0..=4).collect(),
            opaque_triangles: 12,
            transparent_triangles: 0,
            draws: RefCell::new(Vec::new()),
        }
    }

    pub fn with_lods(mut self, mut lods: Vec<usize>) -> Self {
        lods.sort_unstable();
        self.lods = lods;
        self
    }

    pub fn with_triangles(mut self, opaque: usize, transparent: usize) -> Self {
        self.opaque_triangles = opaque;
        self.transparent_triangles = transparent;
        self
    }

    pub fn draw_count(&self) -> usize {
        self.draws.borrow().len()
    }

    fn covers(&self, lod: Option<usize>) -> bool {
        lod.map_or(true, |lod| self.lods.contains(&lod))
    }
}

impl Model for FakeModel {
    fn render(&self, _context: &mut dyn GpuContext, lod: Option<usize>, wireframe: bool, depth_mask: bool) {
        self.draws.borrow_mut().push(ModelDraw { lod, instances: None, wireframe, depth_mask });
    }

    fn render_instances(&self, _context: &mut dyn GpuContext, lod: Option<usize>, wireframe: bool, instance_count: usize) {
        self.draws.borrow_mut().push(ModelDraw {
            lod,
            instances: Some(instance_count),
            wireframe,
            depth_mask: true,
        });
    }

    fn opaque_triangle_count(&self, lod: Option<usize>) -> usize {
        if self.covers(lod) { self.opaque_triangles } else { 0 }
    }

    fn transparent_triangle_count(&self, lod: Option<usize>) -> usize {
        if self.covers(lod) { self.transparent_triangles } else { 0 }
    }

    fn size(&self) -> f32 {
        self.size
    }

    fn min_lod(&self) -> usize {
        self.lods.first().copied().unwrap_or(0)
    }

    fn max_lod(&self) -> usize {
        self.lods.last().copied().unwrap_or(0)
    }

    fn closest_available_lod(&self, lod: usize) -> usize {
        self.lods
            .iter()
            .copied()
            .min_by_key(|available| available.abs_diff(lod))
            .unwrap_or(lod)
    }
}
