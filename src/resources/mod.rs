use std::{collections::HashMap, path::Path};

use crate::{
    data_structures::{
        model::{MeshData, Model},
        texture::{TextureHandle, TextureRegistry},
    },
    resources::{
        scene_import::{SceneImporter, SourceNode, SourceScene, TextureSource, importer_for},
        texture::{
            TextureUpload, load_cubemap, load_embedded_texture, load_texture_2d,
            load_texture_with_alpha,
        },
    },
    scene::{AssetPaths, SceneModel, SceneTextures},
};

/**
 * This module contains all logic for loading meshes and textures from external files.
 */
pub mod mesh;
pub mod scene_import;
pub mod texture;

/// Flattens a scene file into mesh data, depth first, a node's own meshes
/// before its children's.
///
/// Import failures, incomplete scenes and scenes without a root are logged
/// and yield an empty list. Diffuse textures are resolved next to the scene
/// file, or decoded from the scene itself, and loaded once per source. A
/// texture that fails to load leaves its meshes untextured.
pub fn import_model(
    importer: &dyn SceneImporter,
    uploads: &mut dyn TextureUpload,
    path: &Path,
) -> Vec<MeshData> {
    let scene = match importer.import(path) {
        Ok(scene) => scene,
        Err(e) => {
            log::error!("Model import failed for {}: {e:#}", path.display());
            return Vec::new();
        }
    };
    if scene.incomplete {
        log::error!("Model import failed for {}: scene is incomplete", path.display());
        return Vec::new();
    }
    let Some(root) = &scene.root else {
        log::error!("Model import failed for {}: scene has no root node", path.display());
        return Vec::new();
    };

    let directory = path.parent().unwrap_or(Path::new(""));
    let mut walker = Walker {
        scene: &scene,
        directory,
        file: path,
        uploads,
        textures: HashMap::new(),
        out: Vec::new(),
    };
    walker.visit(root);
    walker.out
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum TextureKey {
    File(String),
    Embedded(usize),
}

struct Walker<'a> {
    scene: &'a SourceScene,
    directory: &'a Path,
    file: &'a Path,
    uploads: &'a mut dyn TextureUpload,
    textures: HashMap<TextureKey, TextureHandle>,
    out: Vec<MeshData>,
}

impl Walker<'_> {
    fn visit(&mut self, node: &SourceNode) {
        let scene = self.scene;
        for &index in &node.meshes {
            let Some(source) = scene.meshes.get(index) else {
                log::warn!(
                    "{}: node {:?} references missing mesh {index}",
                    self.file.display(),
                    node.name
                );
                continue;
            };
            let texture = self.diffuse_texture(source.material);
            match mesh::to_mesh_data(source, texture) {
                Ok(data) => self.out.push(data),
                Err(e) => log::warn!(
                    "Mesh {:?} in file {} could not be loaded: {e:#}",
                    source.name,
                    self.file.display()
                ),
            }
        }
        for child in &node.children {
            self.visit(child);
        }
    }

    fn diffuse_texture(&mut self, material: Option<usize>) -> TextureHandle {
        let scene = self.scene;
        let Some(source) = material
            .and_then(|index| scene.materials.get(index))
            .and_then(|material| material.diffuse_texture.as_ref())
        else {
            return TextureHandle::NONE;
        };
        let key = match source {
            TextureSource::File(relative) => TextureKey::File(relative.clone()),
            TextureSource::Embedded { image, .. } => TextureKey::Embedded(*image),
        };
        if let Some(&handle) = self.textures.get(&key) {
            return handle;
        }
        let handle = match source {
            TextureSource::File(relative) => {
                load_texture_2d(self.uploads, &self.directory.join(relative))
            }
            TextureSource::Embedded { image, bytes } => {
                let label = format!("{}#image{image}", self.file.display());
                load_embedded_texture(self.uploads, bytes, &label)
            }
        };
        self.textures.insert(key, handle);
        handle
    }
}

/// Imports `path` with the importer matching its extension and uploads every
/// mesh as a batch, keeping importer order.
pub fn load_model(device: &wgpu::Device, textures: &mut TextureRegistry, path: &Path) -> Model {
    let importer = importer_for(path);
    let meshes = import_model(importer.as_ref(), textures, path);
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let model = Model::new(device, &name, &meshes);
    log::info!("Loaded model {} with {} batches", path.display(), model.batches.len());
    model
}

/// Every GPU resource of the village, loaded once at startup.
#[derive(Debug)]
pub struct SceneResources {
    pub textures: TextureRegistry,
    pub handles: SceneTextures,
    pub house: Model,
    pub castle: Model,
}

impl SceneResources {
    /// Missing or broken files degrade to fallback textures and empty models.
    pub fn load(device: &wgpu::Device, queue: &wgpu::Queue, assets: &AssetPaths) -> Self {
        let mut textures = TextureRegistry::new(device.clone(), queue.clone());

        let house = load_model(device, &mut textures, &assets.model(SceneModel::House));
        let castle = load_model(device, &mut textures, &assets.model(SceneModel::Castle));
        let handles = load_scene_textures(&mut textures, assets);

        Self {
            textures,
            handles,
            house,
            castle,
        }
    }

    pub fn model(&self, model: SceneModel) -> &Model {
        match model {
            SceneModel::House => &self.house,
            SceneModel::Castle => &self.castle,
        }
    }

    pub fn batch_count(&self, model: SceneModel) -> usize {
        self.model(model).batches.len()
    }
}

/// Ground, wheat, tree and skybox textures.
pub fn load_scene_textures(uploads: &mut dyn TextureUpload, assets: &AssetPaths) -> SceneTextures {
    SceneTextures {
        road: load_texture_2d(uploads, &assets.road()),
        grass: load_texture_2d(uploads, &assets.grass()),
        wheat: load_texture_2d(uploads, &assets.wheat()),
        tree: load_texture_with_alpha(uploads, &assets.tree()),
        skybox: load_cubemap(uploads, &assets.skybox()),
    }
}
