//! GPU textures and the registry that hands out [`TextureHandle`]s.
//!
//! [`Texture`] wraps the wgpu texture, view and sampler triple. The
//! [`TextureRegistry`] owns every texture created while loading the scene,
//! pairs each with a bind group for the shading programs, and resolves the
//! sentinel handle `0` to a 1x1 black fallback so draws never lack a binding.

use image::imageops::{self, FilterType};

use crate::resources::texture::{DecodedImage, PixelLayout, TextureUpload};

/// Opaque identifier of a loaded texture or cubemap. `0` means "none / load failed".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(u32);

impl TextureHandle {
    pub const NONE: Self = Self(0);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Wrapping, filtering and mip policy of a 2D texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureSampling {
    /// Repeat wrapping, linear filtering across a full mip chain.
    Tiled,
    /// Clamp to edge, linear filtering, base level only.
    Cutout,
}

impl TextureSampling {
    pub fn mipmapped(self) -> bool {
        matches!(self, TextureSampling::Tiled)
    }
}

/// Number of levels in a full mip chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Whether a `width` x `height` image can become a texture on a device whose
/// largest 2D dimension is `max_dimension`.
pub fn fits_device(width: u32, height: u32, max_dimension: u32) -> bool {
    width > 0 && height > 0 && width <= max_dimension && height <= max_dimension
}

#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
    /// Texel values reach the fog blend untouched, as with a linear GL framebuffer.
    pub const COLOUR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size[0].max(1),
                height: size[1].max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            sampler: None,
        }
    }

    /// Uploads `image` as RGBA, generating the mip chain on the CPU for
    /// [`TextureSampling::Tiled`].
    pub fn from_decoded(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &DecodedImage,
        sampling: TextureSampling,
        label: &str,
    ) -> anyhow::Result<Self> {
        let max_dimension = device.limits().max_texture_dimension_2d;
        if !fits_device(image.width, image.height, max_dimension) {
            anyhow::bail!(
                "{label}: {}x{} does not fit the device limit of {max_dimension}",
                image.width,
                image.height
            );
        }
        let rgba = image::RgbaImage::from_raw(image.width, image.height, image.to_rgba8())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "{label}: pixel buffer does not match {}x{}",
                    image.width,
                    image.height
                )
            })?;
        let mip_level_count = if sampling.mipmapped() {
            mip_level_count(image.width, image.height)
        } else {
            1
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::COLOUR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for level in 0..mip_level_count {
            let width = (image.width >> level).max(1);
            let height = (image.height >> level).max(1);
            let pixels = if level == 0 {
                rgba.as_raw().clone()
            } else {
                imageops::resize(&rgba, width, height, FilterType::Triangle).into_raw()
            };
            write_layer(queue, &texture, level, 0, width, height, &pixels);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&match sampling {
            TextureSampling::Tiled => wgpu::SamplerDescriptor {
                label: Some(label),
                address_mode_u: wgpu::AddressMode::Repeat,
                address_mode_v: wgpu::AddressMode::Repeat,
                address_mode_w: wgpu::AddressMode::Repeat,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::MipmapFilterMode::Linear,
                ..Default::default()
            },
            TextureSampling::Cutout => wgpu::SamplerDescriptor {
                label: Some(label),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                ..Default::default()
            },
        });

        Ok(Self {
            texture,
            view,
            sampler: Some(sampler),
        })
    }

    /// 1x1 texture holding one RGBA texel.
    pub fn single_texel(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: [u8; 4],
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::COLOUR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        write_layer(queue, &texture, 0, 0, 1, 1, &rgba);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            ..Default::default()
        });
        Self {
            texture,
            view,
            sampler: Some(sampler),
        }
    }

    /// Builds a six-layer cube texture. Faces that are missing, too large for
    /// the device, or whose size differs from the first usable face stay zeroed.
    pub fn cubemap(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[Option<DecodedImage>; 6],
        label: &str,
    ) -> Self {
        let max_dimension = device.limits().max_texture_dimension_2d;
        let (width, height) = faces
            .iter()
            .flatten()
            .find(|face| fits_device(face.width, face.height, max_dimension))
            .map_or((1, 1), |face| (face.width, face.height));
        let (width, height) = if width == height {
            (width, height)
        } else {
            log::warn!("{label}: cube faces must be square, got {width}x{height}");
            (1, 1)
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::COLOUR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (index, face) in faces.iter().enumerate() {
            let Some(face) = face else { continue };
            if !fits_device(face.width, face.height, max_dimension) {
                log::error!(
                    "{label}: face {index} is {}x{}, above the device limit of {max_dimension}; skipping it",
                    face.width,
                    face.height
                );
                continue;
            }
            if (face.width, face.height) != (width, height) {
                log::warn!(
                    "{label}: face {index} is {}x{}, expected {width}x{height}; skipping it",
                    face.width,
                    face.height
                );
                continue;
            }
            write_layer(
                queue,
                &texture,
                0,
                cube_layer(index),
                width,
                height,
                &face.to_rgba8(),
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler: Some(sampler),
        }
    }
}

/// wgpu stores cube layers as +X, -X, +Y, -Y, +Z, -Z; load order is -X first.
pub fn cube_layer(load_index: usize) -> u32 {
    (load_index ^ 1) as u32
}

fn write_layer(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    mip_level: u32,
    layer: u32,
    width: u32,
    height: u32,
    rgba: &[u8],
) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture,
            mip_level,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

fn texture_layout(
    device: &wgpu::Device,
    view_dimension: wgpu::TextureViewDimension,
    label: &str,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some(label),
    })
}

#[derive(Debug)]
enum Slot {
    Flat(Texture, wgpu::BindGroup),
    Cube(Texture, wgpu::BindGroup),
}

/// Owns every scene texture for the lifetime of the process.
///
/// Handle `n` refers to `slots[n - 1]`; handle `0` and unknown handles
/// resolve to the black fallbacks.
#[derive(Debug)]
pub struct TextureRegistry {
    device: wgpu::Device,
    queue: wgpu::Queue,
    flat_layout: wgpu::BindGroupLayout,
    cube_layout: wgpu::BindGroupLayout,
    fallback_flat: wgpu::BindGroup,
    fallback_cube: wgpu::BindGroup,
    slots: Vec<Slot>,
}

impl TextureRegistry {
    /// `device` and `queue` are cheap clones of the context's handles.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let flat_layout = texture_layout(&device, wgpu::TextureViewDimension::D2, "2d texture layout");
        let cube_layout = texture_layout(&device, wgpu::TextureViewDimension::Cube, "cubemap layout");

        let fallback_flat_texture = Texture::single_texel(&device, &queue, [0, 0, 0, u8::MAX], "fallback texture");
        let fallback_flat = bind(&device, &flat_layout, &fallback_flat_texture, "fallback texture");
        let black = DecodedImage {
            width: 1,
            height: 1,
            channels: 4,
            layout: PixelLayout::Rgba,
            pixels: vec![0, 0, 0, u8::MAX],
        };
        let black_faces = [0; 6].map(|_| Some(black.clone()));
        let fallback_cube_texture = Texture::cubemap(&device, &queue, &black_faces, "fallback cubemap");
        let fallback_cube = bind(&device, &cube_layout, &fallback_cube_texture, "fallback cubemap");

        Self {
            device,
            queue,
            flat_layout,
            cube_layout,
            fallback_flat,
            fallback_cube,
            slots: Vec::new(),
        }
    }

    pub fn flat_layout(&self) -> &wgpu::BindGroupLayout {
        &self.flat_layout
    }

    pub fn cube_layout(&self) -> &wgpu::BindGroupLayout {
        &self.cube_layout
    }

    fn slot(&self, handle: TextureHandle) -> Option<&Slot> {
        (handle.id() as usize)
            .checked_sub(1)
            .and_then(|index| self.slots.get(index))
    }

    /// Bind group of a 2D texture, or the black fallback.
    pub fn bind_group(&self, handle: TextureHandle) -> &wgpu::BindGroup {
        match self.slot(handle) {
            Some(Slot::Flat(_, group)) => group,
            Some(Slot::Cube(..)) => {
                log::error!("texture {} is a cubemap, not a 2D texture", handle.id());
                &self.fallback_flat
            }
            None => &self.fallback_flat,
        }
    }

    /// Bind group of a cubemap, or the black fallback.
    pub fn cube_bind_group(&self, handle: TextureHandle) -> &wgpu::BindGroup {
        match self.slot(handle) {
            Some(Slot::Cube(_, group)) => group,
            Some(Slot::Flat(..)) => {
                log::error!("texture {} is a 2D texture, not a cubemap", handle.id());
                &self.fallback_cube
            }
            None => &self.fallback_cube,
        }
    }

    fn push(&mut self, slot: Slot) -> TextureHandle {
        self.slots.push(slot);
        TextureHandle::new(self.slots.len() as u32)
    }
}

fn bind(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &Texture,
    label: &str,
) -> wgpu::BindGroup {
    let sampler = texture
        .sampler
        .clone()
        .unwrap_or_else(|| device.create_sampler(&wgpu::SamplerDescriptor::default()));
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
        label: Some(label),
    })
}

impl TextureUpload for TextureRegistry {
    fn upload_2d(
        &mut self,
        image: &DecodedImage,
        sampling: TextureSampling,
        label: &str,
    ) -> TextureHandle {
        match Texture::from_decoded(&self.device, &self.queue, image, sampling, label) {
            Ok(texture) => {
                let group = bind(&self.device, &self.flat_layout, &texture, label);
                self.push(Slot::Flat(texture, group))
            }
            Err(e) => {
                log::error!("{e:#}");
                TextureHandle::NONE
            }
        }
    }

    fn upload_cubemap(&mut self, faces: &[Option<DecodedImage>; 6], label: &str) -> TextureHandle {
        let texture = Texture::cubemap(&self.device, &self.queue, faces, label);
        let group = bind(&self.device, &self.cube_layout, &texture, label);
        self.push(Slot::Cube(texture, group))
    }
}
