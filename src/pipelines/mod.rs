//! Render pipelines, built lazily per state combination.
//!
//! A frame may switch depth state and blending between draws. wgpu bakes
//! both into the pipeline, so every distinct [`PipelineKey`] gets its own
//! pipeline, created the first time a frame asks for it.

use std::collections::HashMap;

use crate::render::{DepthState, Geometry, Program};

pub mod basic;
pub mod globals;
pub mod skybox;
pub mod transparent;

/// Vertex buffer layout and primitive topology of a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    /// Indexed triangle lists of imported models.
    Mesh,
    /// Four-vertex strips of the hand-authored quads.
    Quad,
    /// The 36 skybox positions.
    Skybox,
}

impl VertexLayout {
    pub fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            VertexLayout::Quad => wgpu::PrimitiveTopology::TriangleStrip,
            VertexLayout::Mesh | VertexLayout::Skybox => wgpu::PrimitiveTopology::TriangleList,
        }
    }
}

impl From<Geometry> for VertexLayout {
    fn from(geometry: Geometry) -> Self {
        match geometry {
            Geometry::Skybox => VertexLayout::Skybox,
            Geometry::Road | Geometry::Grass | Geometry::Wheat | Geometry::Tree => {
                VertexLayout::Quad
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub program: Program,
    pub layout: VertexLayout,
    pub depth: DepthState,
    pub blend: bool,
}

impl PipelineKey {
    /// `None` when the program cannot consume the layout.
    pub fn validated(self) -> Option<Self> {
        match (self.program, self.layout) {
            (Program::Skybox, VertexLayout::Skybox) => Some(self),
            (Program::Scene, VertexLayout::Mesh | VertexLayout::Quad) => Some(self),
            _ => None,
        }
    }
}

/// Pipeline layouts of both programs plus every pipeline built so far.
#[derive(Debug)]
pub struct PipelineCache {
    color_format: wgpu::TextureFormat,
    scene_layout: wgpu::PipelineLayout,
    skybox_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        flat_texture_layout: &wgpu::BindGroupLayout,
        cube_texture_layout: &wgpu::BindGroupLayout,
        globals_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[Some(flat_texture_layout), Some(globals_layout)],
            immediate_size: 0,
        });
        let skybox_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Skybox Pipeline Layout"),
            bind_group_layouts: &[Some(cube_texture_layout), Some(globals_layout)],
            immediate_size: 0,
        });
        Self {
            color_format,
            scene_layout,
            skybox_layout,
            pipelines: HashMap::new(),
        }
    }

    /// Builds the pipeline for `key` unless it already exists.
    pub fn prepare(&mut self, device: &wgpu::Device, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        log::debug!("Building pipeline {key:?}");
        let pipeline = match key.program {
            Program::Skybox => skybox::mk_skybox_pipeline(
                device,
                &self.skybox_layout,
                self.color_format,
                key.blend.then_some(wgpu::BlendState::ALPHA_BLENDING),
                key.depth,
            ),
            Program::Scene if key.blend => transparent::mk_transparent_pipeline(
                device,
                &self.scene_layout,
                self.color_format,
                key.layout,
                key.depth,
            ),
            Program::Scene => basic::mk_basic_pipeline(
                device,
                &self.scene_layout,
                self.color_format,
                key.layout,
                key.depth,
            ),
        };
        self.pipelines.insert(key, pipeline);
    }

    pub fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }
}
