use crate::{
    pipelines::{VertexLayout, basic::mk_scene_pipeline},
    render::DepthState,
};

/**
 * Scene program with straight alpha blending (src-alpha, one-minus-src-alpha).
 *
 * Used for the tree sprites, which have to be drawn after every opaque draw
 * and ordered far to near by the caller. Depth testing and writing stay on,
 * fully transparent texels are discarded in the shader.
 */
pub fn mk_transparent_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    vertex_layout: VertexLayout,
    depth: DepthState,
) -> wgpu::RenderPipeline {
    mk_scene_pipeline(
        device,
        layout,
        color_format,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        vertex_layout,
        depth,
    )
}
