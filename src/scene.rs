//! Static description of the village: what is drawn, where, and from which files.

use std::{
    ops::RangeInclusive,
    path::{Path, PathBuf},
};

use cgmath::{Deg, Matrix4, Vector3};

use crate::{
    data_structures::{instance::Instance, model::QuadVertex, texture::TextureHandle},
    fog::FogParams,
    resources::texture::CubemapFaces,
};

/// Road strip, 6 wide and 50 long, texture repeated 5 times along its length.
pub const ROAD_QUAD: [QuadVertex; 4] = [
    QuadVertex::new([-3.0, 0.0, -25.0], [0.0, 0.0]),
    QuadVertex::new([-3.0, 0.0, 25.0], [0.0, 5.0]),
    QuadVertex::new([3.0, 0.0, -25.0], [1.0, 0.0]),
    QuadVertex::new([3.0, 0.0, 25.0], [1.0, 5.0]),
];

pub const GRASS_QUAD: [QuadVertex; 4] = [
    QuadVertex::new([-100.0, 0.0, -25.0], [0.0, 0.0]),
    QuadVertex::new([-100.0, 0.0, 50.0], [0.0, 10.0]),
    QuadVertex::new([100.0, 0.0, -25.0], [10.0, 0.0]),
    QuadVertex::new([100.0, 0.0, 50.0], [10.0, 10.0]),
];

/// Upright wheat blade card, 0.2 wide and 1 tall.
pub const WHEAT_QUAD: [QuadVertex; 4] = [
    QuadVertex::new([-0.1, 0.0, 0.0], [0.0, 0.0]),
    QuadVertex::new([0.1, 0.0, 0.0], [1.0, 0.0]),
    QuadVertex::new([-0.1, 1.0, 0.0], [0.0, 1.0]),
    QuadVertex::new([0.1, 1.0, 0.0], [1.0, 1.0]),
];

pub const TREE_QUAD: [QuadVertex; 4] = [
    QuadVertex::new([-0.5, 0.0, -0.5], [0.0, 0.0]),
    QuadVertex::new([0.5, 0.0, -0.5], [1.0, 0.0]),
    QuadVertex::new([-0.5, 1.0, -0.5], [0.0, 1.0]),
    QuadVertex::new([0.5, 1.0, -0.5], [1.0, 1.0]),
];

#[rustfmt::skip]
pub const SKYBOX_VERTICES: [[f32; 3]; 36] = [
    [-1.0,  1.0, -1.0], [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0],

    [-1.0, -1.0,  1.0], [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0],
    [-1.0,  1.0, -1.0], [-1.0,  1.0,  1.0], [-1.0, -1.0,  1.0],

    [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0], [ 1.0, -1.0, -1.0],

    [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0],

    [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0],

    [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0],
];

/// Imported models placed in the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SceneModel {
    House,
    Castle,
}

/// Ground quads are turned first and moved second: `R * T`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundPlacement {
    pub rotation_y: Deg<f32>,
    pub translation: Vector3<f32>,
}

impl GroundPlacement {
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_angle_y(self.rotation_y) * Matrix4::from_translation(self.translation)
    }
}

/// Square patch of wheat cards, one draw per cell.
#[derive(Clone, Debug, PartialEq)]
pub struct WheatGrid {
    pub columns: RangeInclusive<i32>,
    pub rows: RangeInclusive<i32>,
    pub cell_size: f32,
    /// Z offset of the row with index 0.
    pub z_offset: f32,
}

impl WheatGrid {
    pub fn len(&self) -> usize {
        self.columns.clone().count() * self.rows.clone().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell transforms, X outer and Z inner.
    pub fn cells(&self) -> impl Iterator<Item = Matrix4<f32>> + '_ {
        self.columns.clone().flat_map(move |x| {
            self.rows.clone().map(move |z| {
                Matrix4::from_translation(Vector3::new(
                    x as f32 * self.cell_size,
                    0.0,
                    self.z_offset + z as f32 * self.cell_size,
                ))
            })
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModelPlacement {
    pub model: SceneModel,
    pub instance: Instance,
}

/// Everything `plan_frame` needs to know about the static scene.
#[derive(Clone, Debug)]
pub struct SceneLayout {
    pub clear_colour: wgpu::Color,
    pub scene_fog: FogParams,
    pub skybox_fog: FogParams,
    pub road: GroundPlacement,
    pub grass: GroundPlacement,
    pub wheat: WheatGrid,
    /// Drawn in order, each under one transform.
    pub models: Vec<ModelPlacement>,
    /// Sprite base positions, farthest first. Blending relies on this order.
    pub trees: Vec<Vector3<f32>>,
    pub tree_scale: f32,
}

impl Default for SceneLayout {
    fn default() -> Self {
        let fog_colour = [0.5, 0.5, 0.5, 1.0];
        Self {
            clear_colour: wgpu::Color {
                r: 0.2,
                g: 0.3,
                b: 0.3,
                a: 1.0,
            },
            scene_fog: FogParams {
                start: 30.0,
                end: 5.0,
                colour: fog_colour,
            },
            skybox_fog: FogParams {
                start: 50.0,
                end: 5.0,
                colour: fog_colour,
            },
            road: GroundPlacement {
                rotation_y: Deg(-270.0),
                translation: Vector3::new(0.0, 0.05, 0.0),
            },
            grass: GroundPlacement {
                rotation_y: Deg(-270.0),
                translation: Vector3::new(0.0, 0.0, 0.0),
            },
            wheat: WheatGrid {
                columns: -20..=20,
                rows: -20..=20,
                cell_size: 0.25,
                z_offset: 40.0,
            },
            models: vec![
                ModelPlacement {
                    model: SceneModel::House,
                    instance: Instance::placed(Vector3::new(5.0, 0.0, 15.0), Deg(270.0), 0.5),
                },
                ModelPlacement {
                    model: SceneModel::House,
                    instance: Instance::placed(Vector3::new(8.0, 0.0, -30.0), Deg(0.0), 0.5),
                },
                ModelPlacement {
                    model: SceneModel::Castle,
                    instance: Instance::placed(Vector3::new(35.0, 0.0, 0.0), Deg(0.0), 1.2),
                },
            ],
            trees: vec![
                Vector3::new(0.0, 4.0, -30.0),
                Vector3::new(15.0, 4.0, -27.0),
                Vector3::new(5.0, 4.0, -25.0),
                Vector3::new(-11.0, 4.0, -25.0),
                Vector3::new(-5.0, 4.0, -20.0),
                Vector3::new(15.0, 4.0, -20.0),
                Vector3::new(20.0, 4.0, -15.0),
                Vector3::new(-10.0, 4.0, -14.0),
            ],
            tree_scale: 4.0,
        }
    }
}

impl SceneLayout {
    /// Translate, scale, then flip Y so the sprite hangs down from its anchor.
    pub fn tree_matrix(&self, position: Vector3<f32>) -> Matrix4<f32> {
        Instance {
            position,
            scale: Vector3::new(self.tree_scale, -self.tree_scale, self.tree_scale),
            ..Default::default()
        }
        .to_matrix()
    }
}

/// Locations of every file the scene loads, below one asset root.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetPaths {
    root: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self::new(Path::new("./").join("assets"))
    }
}

impl AssetPaths {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn model(&self, model: SceneModel) -> PathBuf {
        match model {
            SceneModel::House => self.root.join("house").join("medieval house.obj"),
            SceneModel::Castle => self.root.join("castle").join("Palace.obj"),
        }
    }

    pub fn road(&self) -> PathBuf {
        self.root.join("textures").join("road.jpg")
    }

    pub fn grass(&self) -> PathBuf {
        self.root.join("textures").join("grass-texture.jpg")
    }

    pub fn wheat(&self) -> PathBuf {
        self.root.join("textures").join("wheat-texture.png")
    }

    pub fn tree(&self) -> PathBuf {
        self.root.join("textures").join("tree-texture.png")
    }

    pub fn skybox(&self) -> CubemapFaces {
        CubemapFaces::in_dir(&self.root.join("skybox"))
    }
}

/// Handles of the textures the frame binds directly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneTextures {
    pub road: TextureHandle,
    pub grass: TextureHandle,
    pub wheat: TextureHandle,
    pub tree: TextureHandle,
    pub skybox: TextureHandle,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector4};

    #[test]
    fn trees_are_listed_far_to_near() {
        let layout = SceneLayout::default();
        assert_eq!(layout.trees.len(), 8);
        assert!(layout.trees.windows(2).all(|w| w[0].z <= w[1].z));
    }

    #[test]
    fn wheat_grid_walks_x_then_z() {
        let grid = SceneLayout::default().wheat;
        assert_eq!(grid.len(), 41 * 41);
        let cells: Vec<_> = grid.cells().take(2).collect();
        assert_eq!(cells[0].w.truncate(), Vector3::new(-5.0, 0.0, 35.0));
        assert_eq!(cells[1].w.truncate(), Vector3::new(-5.0, 0.0, 35.25));
    }

    #[test]
    fn tree_sprite_hangs_below_its_anchor() {
        let layout = SceneLayout::default();
        let top = layout.tree_matrix(Vector3::new(0.0, 4.0, -30.0)) * Vector4::new(0.0, 1.0, 0.0, 1.0);
        assert!((top.truncate() - Vector3::new(0.0, 0.0, -30.0)).magnitude() < 1e-5);
    }

    #[test]
    fn road_keeps_its_lift_after_turning() {
        let m = SceneLayout::default().road.to_matrix();
        assert!((m.w.y - 0.05).abs() < 1e-6);
    }
}
