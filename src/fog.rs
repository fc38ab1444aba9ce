//! Distance fog shared by the opaque and skybox programs.
//!
//! Both WGSL programs read the same [`ShadingGlobals`] layout: view and
//! projection matrices, camera position and one set of [`FogParams`]. The
//! arithmetic below is the CPU mirror of the shader code in
//! `pipelines/scene.wgsl` and `pipelines/skybox.wgsl` and must stay in sync
//! with it.

use anyhow::bail;
use cgmath::{Matrix4, Point3};

/// Distance added to `fog_end` to get the fixed distance the skybox is fogged at.
pub const SKYBOX_FOG_PADDING: f32 = 10.0;

/// Fog tuning for one shading program.
///
/// `start` is usually larger than `end` in this scene: fragments closer than
/// `end` keep their texel colour and the fog thickens until `start`, where
/// only the fog colour remains.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FogParams {
    pub(crate) start: f32,
    pub(crate) end: f32,
    pub(crate) colour: [f32; 4],
}

impl FogParams {
    pub fn new(start: f32, end: f32, colour: [f32; 4]) -> anyhow::Result<Self> {
        if start == end {
            bail!("fog start and end must differ (both are {start})");
        }
        Ok(Self { start, end, colour })
    }

    pub fn start(&self) -> f32 {
        self.start
    }

    pub fn end(&self) -> f32 {
        self.end
    }

    pub fn colour(&self) -> [f32; 4] {
        self.colour
    }

    /// `clamp((end - distance) / (end - start), 0, 1)`
    pub fn factor(&self, distance: f32) -> f32 {
        ((self.end - distance) / (self.end - self.start)).clamp(0.0, 1.0)
    }

    /// Squared factor at the fixed skybox distance `end + 10`.
    pub fn skybox_factor(&self) -> f32 {
        self.factor(self.end + SKYBOX_FOG_PADDING).powi(2)
    }

    /// Opaque fragments: `mix(texel, fog_colour, factor)`.
    pub fn apply(&self, texel: [f32; 4], distance: f32) -> [f32; 4] {
        mix(texel, self.colour, self.factor(distance))
    }

    /// Skybox fragments: `mix(fog_colour, sky_texel, skybox_factor)`.
    pub fn apply_skybox(&self, sky_texel: [f32; 4]) -> [f32; 4] {
        mix(self.colour, sky_texel, self.skybox_factor())
    }
}

/// GLSL/WGSL `mix`: `a * (1 - t) + b * t`, per component.
pub fn mix(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    let mut out = [0.0; 4];
    for (i, channel) in out.iter_mut().enumerate() {
        *channel = a[i] * (1.0 - t) + b[i] * t;
    }
    out
}

/// Uniform block bound at group 1 of both programs.
///
/// Matches the WGSL `Globals` struct, where `fog_colour` is aligned to
/// 16 bytes after `fog_end`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadingGlobals {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub camera_position: [f32; 3],
    pub fog_start: f32,
    pub fog_end: f32,
    pub _padding: [f32; 3],
    pub fog_colour: [f32; 4],
}

impl ShadingGlobals {
    pub fn new(
        view: Matrix4<f32>,
        projection: Matrix4<f32>,
        camera_position: Point3<f32>,
        fog: &FogParams,
    ) -> Self {
        Self {
            view: view.into(),
            projection: projection.into(),
            camera_position: camera_position.into(),
            fog_start: fog.start,
            fog_end: fog.end,
            _padding: [0.0; 3],
            fog_colour: fog.colour,
        }
    }

    pub fn fog(&self) -> FogParams {
        FogParams {
            start: self.fog_start,
            end: self.fog_end,
            colour: self.fog_colour,
        }
    }
}
