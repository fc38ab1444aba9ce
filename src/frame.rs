//! GPU execution of a [`FramePlan`].
//!
//! The plan is resolved into draws first; each draw then picks the pipeline
//! for its program, vertex layout, depth state and blending, binds its
//! texture and globals, and reads its model matrix from a 64-byte slice of
//! the per-frame instance buffer.

use std::iter;

use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{instance::InstanceRaw, model::QuadVertex},
    pipelines::{
        PipelineCache, PipelineKey, VertexLayout,
        globals::{self, GlobalsResources},
    },
    render::{DrawKind, FramePlan, Geometry, Program, ResolvedDraw, ResolvedFrame},
    resources::SceneResources,
    scene::{GRASS_QUAD, ROAD_QUAD, SKYBOX_VERTICES, TREE_QUAD, WHEAT_QUAD},
};

#[derive(Debug)]
struct GeometryBuffers {
    skybox: wgpu::Buffer,
    road: wgpu::Buffer,
    grass: wgpu::Buffer,
    wheat: wgpu::Buffer,
    tree: wgpu::Buffer,
}

impl GeometryBuffers {
    fn new(device: &wgpu::Device) -> Self {
        Self {
            skybox: vertex_buffer(device, "Skybox", bytemuck::cast_slice(&SKYBOX_VERTICES)),
            road: quad_buffer(device, "Road", &ROAD_QUAD),
            grass: quad_buffer(device, "Grass", &GRASS_QUAD),
            wheat: quad_buffer(device, "Wheat", &WHEAT_QUAD),
            tree: quad_buffer(device, "Tree", &TREE_QUAD),
        }
    }

    fn get(&self, geometry: Geometry) -> &wgpu::Buffer {
        match geometry {
            Geometry::Skybox => &self.skybox,
            Geometry::Road => &self.road,
            Geometry::Grass => &self.grass,
            Geometry::Wheat => &self.wheat,
            Geometry::Tree => &self.tree,
        }
    }
}

fn quad_buffer(device: &wgpu::Device, label: &str, quad: &[QuadVertex; 4]) -> wgpu::Buffer {
    vertex_buffer(device, label, bytemuck::cast_slice(quad))
}

fn vertex_buffer(device: &wgpu::Device, label: &str, contents: &[u8]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label} Vertex Buffer")),
        contents,
        usage: wgpu::BufferUsages::VERTEX,
    })
}

/// Per-frame model matrices. Grows to the largest frame seen, never shrinks.
#[derive(Debug)]
struct InstanceBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
}

impl InstanceBuffer {
    fn new(device: &wgpu::Device, capacity: u64) -> Self {
        let capacity = capacity.max(1);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: capacity * InstanceRaw::SIZE,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { buffer, capacity }
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, instances: &[InstanceRaw]) {
        let needed = instances.len() as u64;
        if needed > self.capacity {
            log::debug!("Growing instance buffer from {} to {needed}", self.capacity);
            *self = Self::new(device, needed.next_power_of_two());
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(instances));
        }
    }

    fn slot(&self, index: u32) -> Option<wgpu::BufferSlice<'_>> {
        let index = u64::from(index);
        (index < self.capacity)
            .then(|| self.buffer.slice(index * InstanceRaw::SIZE..(index + 1) * InstanceRaw::SIZE))
    }
}

/// Long-lived GPU state of the renderer.
#[derive(Debug)]
pub struct FrameRenderer {
    pipelines: PipelineCache,
    scene_globals: GlobalsResources,
    skybox_globals: GlobalsResources,
    geometry: GeometryBuffers,
    instances: InstanceBuffer,
}

impl FrameRenderer {
    pub fn new(ctx: &Context, resources: &SceneResources) -> Self {
        let globals_layout = globals::mk_bind_group_layout(&ctx.device);
        let pipelines = PipelineCache::new(
            &ctx.device,
            ctx.config.format,
            resources.textures.flat_layout(),
            resources.textures.cube_layout(),
            &globals_layout,
        );
        Self {
            pipelines,
            scene_globals: GlobalsResources::new(&ctx.device, &globals_layout, "Scene"),
            skybox_globals: GlobalsResources::new(&ctx.device, &globals_layout, "Skybox"),
            geometry: GeometryBuffers::new(&ctx.device),
            // wheat, ground, models and trees of the default layout
            instances: InstanceBuffer::new(&ctx.device, 2048),
        }
    }

    fn globals(&self, program: Program) -> &GlobalsResources {
        match program {
            Program::Scene => &self.scene_globals,
            Program::Skybox => &self.skybox_globals,
        }
    }

    pub fn render(
        &mut self,
        ctx: &Context,
        plan: &FramePlan,
        resources: &SceneResources,
    ) -> Result<(), wgpu::SurfaceError> {
        let frame = plan.resolve();

        for (program, values) in &frame.globals {
            self.globals(*program).write(&ctx.queue, values);
        }
        self.instances.upload(&ctx.device, &ctx.queue, &frame.instances);
        for draw in &frame.draws {
            if let Some(key) = pipeline_key(draw) {
                self.pipelines.prepare(&ctx.device, key);
            }
        }

        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let (clear_colour, clear_depth) = frame.clear.unwrap_or((wgpu::Color::BLACK, 1.0));
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_depth),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            self.replay(&mut render_pass, &frame, resources);
        }

        ctx.queue.submit(iter::once(encoder.finish()));
        if !frame.presented {
            log::warn!("frame plan ended without a present; presenting anyway");
        }
        output.present();
        Ok(())
    }

    fn replay(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        frame: &ResolvedFrame,
        resources: &SceneResources,
    ) {
        let mut current: Option<PipelineKey> = None;

        for draw in &frame.draws {
            let Some(key) = pipeline_key(draw) else {
                log::error!("skipping draw without a usable program: {draw:?}");
                continue;
            };
            let Some(pipeline) = self.pipelines.get(&key) else {
                log::error!("no pipeline for {key:?}");
                continue;
            };
            if current != Some(key) {
                render_pass.set_pipeline(pipeline);
                current = Some(key);
            }
            render_pass.set_bind_group(1, &self.globals(key.program).bind_group, &[]);

            if key.program == Program::Scene {
                let Some(slice) = draw.state.instance.and_then(|slot| self.instances.slot(slot))
                else {
                    log::error!("skipping draw without a model matrix: {draw:?}");
                    continue;
                };
                render_pass.set_vertex_buffer(1, slice);
            }

            match draw.kind {
                DrawKind::Arrays { geometry, count } => {
                    let textures = &resources.textures;
                    let group = match key.program {
                        Program::Skybox => textures.cube_bind_group(draw.state.cubemap),
                        Program::Scene => textures.bind_group(draw.state.texture),
                    };
                    render_pass.set_bind_group(0, group, &[]);
                    render_pass.set_vertex_buffer(0, self.geometry.get(geometry).slice(..));
                    render_pass.draw(0..count.min(geometry.vertex_count()), 0..1);
                }
                DrawKind::Batch { model, batch } => {
                    match resources.model(model).batches.get(batch) {
                        Some(batch) => batch.draw(render_pass, &resources.textures),
                        None => log::error!("{model:?} has no batch {batch}"),
                    }
                }
            }
        }
    }
}

/// `None` when no program is bound or the program cannot draw this kind.
pub fn pipeline_key(draw: &ResolvedDraw) -> Option<PipelineKey> {
    let layout = match draw.kind {
        DrawKind::Arrays { geometry, .. } => VertexLayout::from(geometry),
        DrawKind::Batch { .. } => VertexLayout::Mesh,
    };
    PipelineKey {
        program: draw.state.program?,
        layout,
        depth: draw.state.depth,
        blend: draw.state.blend,
    }
    .validated()
}
