use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::data_structures::texture::{TextureHandle, TextureSampling};

/// Channel count requested from the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channels {
    /// Keep what the file stores; 4 channels decode as RGBA, anything else as RGB.
    Native,
    /// Always decode to RGBA with straight alpha.
    Rgba,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelLayout {
    Rgb,
    Rgba,
}

/// Decoded pixels, row 0 at the top of the image.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Channel count stored in the file.
    pub channels: u8,
    pub layout: PixelLayout,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// wgpu has no 3-channel colour formats, so RGB rows get an opaque alpha.
    pub fn to_rgba8(&self) -> Vec<u8> {
        match self.layout {
            PixelLayout::Rgba => self.pixels.clone(),
            PixelLayout::Rgb => self
                .pixels
                .chunks_exact(3)
                .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], u8::MAX])
                .collect(),
        }
    }
}

pub fn decode_image(path: &Path, channels: Channels) -> anyhow::Result<DecodedImage> {
    let img = image::ImageReader::open(path)
        .with_context(|| format!("cannot open {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("cannot read {}", path.display()))?
        .decode()
        .with_context(|| format!("cannot decode {}", path.display()))?;
    Ok(to_decoded(&img, channels))
}

/// Same as [`decode_image`] for an encoded image held in memory.
pub fn decode_image_bytes(bytes: &[u8], channels: Channels) -> anyhow::Result<DecodedImage> {
    let img = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("cannot read image bytes")?
        .decode()
        .context("cannot decode image bytes")?;
    Ok(to_decoded(&img, channels))
}

fn to_decoded(img: &image::DynamicImage, channels: Channels) -> DecodedImage {
    let native = img.color().channel_count();
    let (layout, pixels) = match (channels, native) {
        (Channels::Rgba, _) | (Channels::Native, 4) => (PixelLayout::Rgba, img.to_rgba8().into_raw()),
        (Channels::Native, _) => (PixelLayout::Rgb, img.to_rgb8().into_raw()),
    };

    DecodedImage {
        width: img.width(),
        height: img.height(),
        channels: native,
        layout,
        pixels,
    }
}

/// GPU-side half of texture loading.
///
/// Implementations own the created textures and hand out non-zero handles.
pub trait TextureUpload {
    fn upload_2d(
        &mut self,
        image: &DecodedImage,
        sampling: TextureSampling,
        label: &str,
    ) -> TextureHandle;

    /// `faces` are ordered -X, +X, -Y, +Y, -Z, +Z; `None` marks a face that failed to load.
    fn upload_cubemap(&mut self, faces: &[Option<DecodedImage>; 6], label: &str) -> TextureHandle;
}

/// Mipmapped, repeating colour texture.
pub fn load_texture_2d(uploads: &mut dyn TextureUpload, path: &Path) -> TextureHandle {
    load_2d(uploads, path, Channels::Native, TextureSampling::Tiled)
}

/// RGBA cut-out texture: clamped, linear, single mip level.
pub fn load_texture_with_alpha(uploads: &mut dyn TextureUpload, path: &Path) -> TextureHandle {
    load_2d(uploads, path, Channels::Rgba, TextureSampling::Cutout)
}

fn load_2d(
    uploads: &mut dyn TextureUpload,
    path: &Path,
    channels: Channels,
    sampling: TextureSampling,
) -> TextureHandle {
    log::info!("Loading texture: {}", path.display());
    match decode_image(path, channels) {
        Ok(image) => uploads.upload_2d(&image, sampling, &path.display().to_string()),
        Err(e) => {
            log::error!("Texture failed to load at path {}: {e:#}", path.display());
            TextureHandle::NONE
        }
    }
}

/// Mipmapped, repeating colour texture decoded from bytes embedded in a model file.
pub fn load_embedded_texture(uploads: &mut dyn TextureUpload, bytes: &[u8], label: &str) -> TextureHandle {
    log::info!("Loading embedded texture: {label}");
    match decode_image_bytes(bytes, Channels::Native) {
        Ok(image) => uploads.upload_2d(&image, TextureSampling::Tiled, label),
        Err(e) => {
            log::error!("Embedded texture {label} failed to load: {e:#}");
            TextureHandle::NONE
        }
    }
}

/// The six image files of a skybox.
#[derive(Clone, Debug, PartialEq)]
pub struct CubemapFaces {
    pub negative_x: PathBuf,
    pub positive_x: PathBuf,
    pub negative_y: PathBuf,
    pub positive_y: PathBuf,
    pub negative_z: PathBuf,
    pub positive_z: PathBuf,
}

impl CubemapFaces {
    /// `nx.png`, `px.png`, ... inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            negative_x: dir.join("nx.png"),
            positive_x: dir.join("px.png"),
            negative_y: dir.join("ny.png"),
            positive_y: dir.join("py.png"),
            negative_z: dir.join("nz.png"),
            positive_z: dir.join("pz.png"),
        }
    }

    /// Load order: -X, +X, -Y, +Y, -Z, +Z.
    pub fn ordered(&self) -> [&Path; 6] {
        [
            &self.negative_x,
            &self.positive_x,
            &self.negative_y,
            &self.positive_y,
            &self.negative_z,
            &self.positive_z,
        ]
    }
}

/// Never fails as a whole: faces that cannot be decoded, are not square, or
/// differ in size from the first usable face are logged and left blank.
pub fn load_cubemap(uploads: &mut dyn TextureUpload, faces: &CubemapFaces) -> TextureHandle {
    let paths = faces.ordered();
    let mut decoded = paths.map(|path| {
        log::info!("Loading texture: {}", path.display());
        match decode_image(path, Channels::Native) {
            Ok(image) => Some(image),
            Err(e) => {
                log::error!("Cubemap texture failed to load at path {}: {e:#}", path.display());
                None
            }
        }
    });

    let mut edge = None;
    for (face, path) in decoded.iter_mut().zip(paths) {
        let Some(image) = face else { continue };
        let reason = if image.width != image.height {
            "cube faces must be square"
        } else if edge.is_some_and(|edge| edge != image.width) {
            "size differs from the first face"
        } else {
            edge = Some(image.width);
            continue;
        };
        log::error!(
            "Cubemap texture at path {} is {}x{}: {reason}",
            path.display(),
            image.width,
            image.height
        );
        *face = None;
    }
    uploads.upload_cubemap(&decoded, "skybox cubemap")
}
