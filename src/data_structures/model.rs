use std::mem;

use anyhow::bail;
use wgpu::util::DeviceExt;

use crate::data_structures::texture::{TextureHandle, TextureRegistry};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// Vertex of an imported mesh. Normals are carried along but not shaded.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Vertex of the hand-authored ground, wheat and tree quads.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl QuadVertex {
    pub const fn new(position: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            tex_coords,
        }
    }
}

impl Vertex for QuadVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Skybox cube corner; doubles as the cubemap lookup direction.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyboxVertex {
    pub position: [f32; 3],
}

impl Vertex for SkyboxVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<SkyboxVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// CPU-side mesh batch: triangle indices into `vertices` plus one texture.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    vertices: Vec<ModelVertex>,
    indices: Vec<u32>,
    texture: TextureHandle,
}

impl MeshData {
    /// Fails if any index points past the vertex list.
    pub fn new(
        vertices: Vec<ModelVertex>,
        indices: Vec<u32>,
        texture: TextureHandle,
    ) -> anyhow::Result<Self> {
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            bail!(
                "index {bad} is out of range for {} vertices",
                vertices.len()
            );
        }
        Ok(Self {
            vertices,
            indices,
            texture,
        })
    }

    pub fn vertices(&self) -> &[ModelVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }
}

/// A mesh uploaded to the GPU. Owns its buffers exclusively.
#[derive(Debug)]
pub struct MeshBatch {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub texture: TextureHandle,
}

impl MeshBatch {
    pub fn new(device: &wgpu::Device, name: &str, data: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Vertex Buffer")),
            contents: bytemuck::cast_slice(data.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Index Buffer")),
            contents: bytemuck::cast_slice(data.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: data.indices().len() as u32,
            texture: data.texture(),
        }
    }

    /// Binds this batch's texture (group 0) and buffers, then draws every index.
    ///
    /// The globals (group 1), the instance slice (slot 1) and the pipeline are
    /// the caller's business.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, textures: &TextureRegistry) {
        if self.num_elements == 0 {
            return;
        }
        pass.set_bind_group(0, textures.bind_group(self.texture), &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.num_elements, 0, 0..1);
    }
}

/// Ordered batches of one scene file, drawn under one shared transform.
#[derive(Debug, Default)]
pub struct Model {
    pub name: String,
    pub batches: Vec<MeshBatch>,
}

impl Model {
    pub fn new(device: &wgpu::Device, name: &str, meshes: &[MeshData]) -> Self {
        let batches = meshes
            .iter()
            .enumerate()
            .map(|(i, data)| MeshBatch::new(device, &format!("{name}#{i}"), data))
            .collect();
        Self {
            name: name.to_string(),
            batches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f32) -> ModelVertex {
        ModelVertex {
            position: [x, 0.0, 0.0],
            ..Default::default()
        }
    }

    #[test]
    fn indices_must_stay_inside_vertex_list() {
        let vertices = vec![vertex(0.0), vertex(1.0), vertex(2.0)];
        assert!(MeshData::new(vertices.clone(), vec![0, 1, 2], TextureHandle::NONE).is_ok());
        assert!(MeshData::new(vertices, vec![0, 1, 3], TextureHandle::NONE).is_err());
    }

    #[test]
    fn uv_follows_normal_in_model_vertex() {
        let layout = ModelVertex::desc();
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes[1].offset, 24);
        assert_eq!(layout.attributes[1].shader_location, 1);
    }

    #[test]
    fn quad_vertex_is_tightly_packed() {
        assert_eq!(QuadVertex::desc().array_stride, 20);
        assert_eq!(SkyboxVertex::desc().array_stride, 12);
    }
}
