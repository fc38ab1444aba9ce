//! Frame composition as data.
//!
//! [`plan_frame`] turns the scene layout, the camera and the loaded texture
//! handles into an ordered list of [`DrawCommand`]s: the same state changes
//! and draws the renderer performs, in the same order, but without a GPU.
//! [`FramePlan::resolve`] replays the commands through a small state tracker
//! so every draw knows the program, depth state, blend state, texture and
//! model matrix that are current when it is issued. The executor in
//! [`crate::frame`] consumes that resolved form.
//!
//! # Frame order
//!
//! 1. clear colour and depth
//! 2. opaque program globals (camera position, fog, view, projection)
//! 3. skybox: depth writes off, compare less-equal, rotation-only view
//! 4. depth writes back on, compare less, opaque program again
//! 5. road and grass quads
//! 6. wheat grid, one draw per cell
//! 7. models, one model matrix each, one draw per batch
//! 8. tree sprites far to near with alpha blending, then blending off
//! 9. unbind the 2D texture and present

use cgmath::{Matrix4, Vector4};
use wgpu::CompareFunction;

use crate::{
    camera::Camera,
    data_structures::{instance::InstanceRaw, texture::TextureHandle},
    fog::ShadingGlobals,
    scene::{SceneLayout, SceneModel, SceneTextures},
};

/// The two shading programs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Program {
    /// Textured, fogged geometry with alpha cut-out.
    Scene,
    /// Cubemap background with its own fog.
    Skybox,
}

/// Hand-authored geometry owned by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Geometry {
    Skybox,
    Road,
    Grass,
    Wheat,
    Tree,
}

impl Geometry {
    pub fn vertex_count(self) -> u32 {
        match self {
            Geometry::Skybox => 36,
            Geometry::Road | Geometry::Grass | Geometry::Wheat | Geometry::Tree => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DepthState {
    pub write: bool,
    pub compare: CompareFunction,
}

impl DepthState {
    pub const OPAQUE: Self = Self {
        write: true,
        compare: CompareFunction::Less,
    };
    /// Background at depth 1.0 that never occludes anything.
    pub const BACKGROUND: Self = Self {
        write: false,
        compare: CompareFunction::LessEqual,
    };
}

impl Default for DepthState {
    fn default() -> Self {
        Self::OPAQUE
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear { colour: wgpu::Color, depth: f32 },
    UseProgram(Program),
    SetGlobals { program: Program, globals: ShadingGlobals },
    Depth(DepthState),
    Blend(bool),
    BindTexture(TextureHandle),
    BindCubemap(TextureHandle),
    SetModel(Matrix4<f32>),
    DrawArrays { geometry: Geometry, count: u32 },
    DrawBatch { model: SceneModel, batch: usize },
    Present,
}

/// Ordered commands of one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FramePlan {
    commands: Vec<DrawCommand>,
}

/// Everything the planner reads besides the per-model batch counts.
pub struct FrameInputs<'a> {
    pub layout: &'a SceneLayout,
    pub textures: &'a SceneTextures,
    pub camera: &'a Camera,
    pub projection: Matrix4<f32>,
}

/// Upper 3x3 of `view` in an otherwise identity matrix.
pub fn rotation_only(view: Matrix4<f32>) -> Matrix4<f32> {
    let mut rotation = view;
    rotation.x.w = 0.0;
    rotation.y.w = 0.0;
    rotation.z.w = 0.0;
    rotation.w = Vector4::new(0.0, 0.0, 0.0, 1.0);
    rotation
}

pub fn plan_frame(inputs: &FrameInputs, batch_count: impl Fn(SceneModel) -> usize) -> FramePlan {
    use DrawCommand::*;

    let FrameInputs {
        layout,
        textures,
        camera,
        projection,
    } = *inputs;
    let view = camera.calc_matrix();
    let mut commands = Vec::with_capacity(layout.wheat.len() * 2 + 64);

    commands.push(Clear {
        colour: layout.clear_colour,
        depth: 1.0,
    });

    commands.push(UseProgram(Program::Scene));
    commands.push(SetGlobals {
        program: Program::Scene,
        globals: ShadingGlobals::new(view, projection, camera.position, &layout.scene_fog),
    });

    commands.push(Depth(DepthState::BACKGROUND));
    commands.push(UseProgram(Program::Skybox));
    commands.push(SetGlobals {
        program: Program::Skybox,
        globals: ShadingGlobals::new(
            rotation_only(view),
            projection,
            camera.position,
            &layout.skybox_fog,
        ),
    });
    commands.push(BindCubemap(textures.skybox));
    commands.push(draw(Geometry::Skybox));

    commands.push(Depth(DepthState::OPAQUE));
    commands.push(UseProgram(Program::Scene));

    commands.push(BindTexture(textures.road));
    commands.push(SetModel(layout.road.to_matrix()));
    commands.push(draw(Geometry::Road));
    commands.push(BindTexture(textures.grass));
    commands.push(SetModel(layout.grass.to_matrix()));
    commands.push(draw(Geometry::Grass));

    commands.push(BindTexture(textures.wheat));
    for cell in layout.wheat.cells() {
        commands.push(SetModel(cell));
        commands.push(draw(Geometry::Wheat));
    }

    for placement in &layout.models {
        commands.push(SetModel(placement.instance.to_matrix()));
        for batch in 0..batch_count(placement.model) {
            commands.push(DrawBatch {
                model: placement.model,
                batch,
            });
        }
    }

    commands.push(Blend(true));
    for &tree in &layout.trees {
        commands.push(BindTexture(textures.tree));
        commands.push(SetModel(layout.tree_matrix(tree)));
        commands.push(draw(Geometry::Tree));
    }
    commands.push(Blend(false));

    commands.push(BindTexture(TextureHandle::NONE));
    commands.push(Present);

    FramePlan { commands }
}

fn draw(geometry: Geometry) -> DrawCommand {
    DrawCommand::DrawArrays {
        geometry,
        count: geometry.vertex_count(),
    }
}

/// State in effect when a command executes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderState {
    pub program: Option<Program>,
    pub depth: DepthState,
    pub blend: bool,
    pub texture: TextureHandle,
    pub cubemap: TextureHandle,
    /// Slot of the current model matrix in [`ResolvedFrame::instances`].
    pub instance: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawKind {
    Arrays { geometry: Geometry, count: u32 },
    Batch { model: SceneModel, batch: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedDraw {
    pub state: RenderState,
    pub kind: DrawKind,
}

/// A plan flattened into what the GPU needs: one clear, the globals per
/// program, every model matrix and every draw with its state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedFrame {
    pub clear: Option<(wgpu::Color, f32)>,
    pub globals: Vec<(Program, ShadingGlobals)>,
    pub instances: Vec<InstanceRaw>,
    pub draws: Vec<ResolvedDraw>,
    pub presented: bool,
    pub final_state: RenderState,
}

impl ResolvedFrame {
    pub fn globals_for(&self, program: Program) -> Option<&ShadingGlobals> {
        self.globals
            .iter()
            .rev()
            .find(|(p, _)| *p == program)
            .map(|(_, globals)| globals)
    }
}

impl FramePlan {
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::DrawArrays { .. } | DrawCommand::DrawBatch { .. }))
            .count()
    }

    pub fn resolve(&self) -> ResolvedFrame {
        let mut frame = ResolvedFrame::default();
        let mut state = RenderState::default();

        for command in &self.commands {
            match command {
                DrawCommand::Clear { colour, depth } => {
                    if !frame.draws.is_empty() {
                        log::warn!("clear after the first draw is ignored");
                    } else {
                        frame.clear = Some((*colour, *depth));
                    }
                }
                DrawCommand::UseProgram(program) => state.program = Some(*program),
                DrawCommand::SetGlobals { program, globals } => {
                    if let Some(slot) = frame.globals.iter_mut().find(|(p, _)| p == program) {
                        log::warn!("{program:?} globals set twice in one frame; keeping the last");
                        slot.1 = *globals;
                    } else {
                        frame.globals.push((*program, *globals));
                    }
                }
                DrawCommand::Depth(depth) => state.depth = *depth,
                DrawCommand::Blend(blend) => state.blend = *blend,
                DrawCommand::BindTexture(handle) => state.texture = *handle,
                DrawCommand::BindCubemap(handle) => state.cubemap = *handle,
                DrawCommand::SetModel(matrix) => {
                    state.instance = Some(frame.instances.len() as u32);
                    frame.instances.push(InstanceRaw::from(*matrix));
                }
                DrawCommand::DrawArrays { geometry, count } => frame.draws.push(ResolvedDraw {
                    state,
                    kind: DrawKind::Arrays {
                        geometry: *geometry,
                        count: *count,
                    },
                }),
                DrawCommand::DrawBatch { model, batch } => frame.draws.push(ResolvedDraw {
                    state,
                    kind: DrawKind::Batch {
                        model: *model,
                        batch: *batch,
                    },
                }),
                DrawCommand::Present => frame.presented = true,
            }
        }

        frame.final_state = state;
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_only_drops_translation() {
        let view = Matrix4::from_translation(cgmath::Vector3::new(3.0, -1.0, 7.0))
            * Matrix4::from_angle_y(cgmath::Deg(30.0));
        let rotation = rotation_only(view);
        assert_eq!(rotation.w, Vector4::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(rotation.x, view.x);
        assert_eq!(rotation.z, view.z);
    }

    #[test]
    fn set_model_appends_instances() {
        let plan = FramePlan {
            commands: vec![
                DrawCommand::UseProgram(Program::Scene),
                DrawCommand::SetModel(Matrix4::from_scale(2.0)),
                DrawCommand::DrawArrays {
                    geometry: Geometry::Road,
                    count: 4,
                },
                DrawCommand::SetModel(Matrix4::from_scale(3.0)),
                DrawCommand::DrawArrays {
                    geometry: Geometry::Grass,
                    count: 4,
                },
            ],
        };
        let frame = plan.resolve();
        assert_eq!(frame.instances.len(), 2);
        assert_eq!(frame.draws[0].state.instance, Some(0));
        assert_eq!(frame.draws[1].state.instance, Some(1));
        assert!(!frame.presented);
    }
}
