use wgpu::util::DeviceExt;

use crate::fog::ShadingGlobals;

/// Uniform buffer and bind group (group 1) of one shading program.
#[derive(Debug)]
pub struct GlobalsResources {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl GlobalsResources {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = mk_buffer(device, label);
        let bind_group = mk_bind_group(device, layout, &buffer, label);
        Self { buffer, bind_group }
    }

    pub fn write(&self, queue: &wgpu::Queue, globals: &ShadingGlobals) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[*globals]));
    }
}

pub fn mk_buffer(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label} Globals Buffer")),
        contents: bytemuck::cast_slice(&[<ShadingGlobals as bytemuck::Zeroable>::zeroed()]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("globals_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
        label: Some(&format!("{label} Globals Bind Group")),
    })
}
