use crate::{
    data_structures::model::{SkyboxVertex, Vertex},
    pipelines::basic::mk_render_pipeline,
    render::DepthState,
};

/// Cubemap background. Only positions are read; there is no model matrix.
pub fn mk_skybox_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth: DepthState,
) -> wgpu::RenderPipeline {
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Skybox Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("skybox.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        layout,
        color_format,
        blend,
        Some(depth),
        wgpu::PrimitiveTopology::TriangleList,
        &[SkyboxVertex::desc()],
        shader,
    )
}
