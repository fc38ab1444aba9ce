//! Scene files parsed into a format-neutral node tree.
//!
//! Importers only parse. Turning the tree into mesh batches and loading the
//! referenced textures happens in [`crate::resources::import_model`].

use std::path::Path;

use anyhow::Context;

/// A parsed scene file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceScene {
    pub root: Option<SourceNode>,
    pub meshes: Vec<SourceMesh>,
    pub materials: Vec<SourceMaterial>,
    /// Set when the parser gave up part way through.
    pub incomplete: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceNode {
    pub name: String,
    /// Indices into [`SourceScene::meshes`].
    pub meshes: Vec<usize>,
    pub children: Vec<SourceNode>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    /// Empty or one per position.
    pub normals: Vec<[f32; 3]>,
    /// First texture coordinate channel, one per position, `v = 0` at the image top.
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub faces: Vec<Vec<u32>>,
    /// Index into [`SourceScene::materials`].
    pub material: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceMaterial {
    pub name: String,
    pub diffuse_texture: Option<TextureSource>,
}

/// Where a material's image lives.
#[derive(Clone, Debug, PartialEq)]
pub enum TextureSource {
    /// Relative to the scene file's directory, `/` separated.
    File(String),
    /// Encoded image bytes stored inside the scene file.
    Embedded { image: usize, bytes: Vec<u8> },
}

impl TextureSource {
    /// Exporters on Windows write `textures\wood.png`.
    pub fn file(path: &str) -> Self {
        TextureSource::File(path.replace('\\', "/"))
    }
}

pub trait SceneImporter {
    fn import(&self, path: &Path) -> anyhow::Result<SourceScene>;
}

/// Picks the importer by file extension. Anything that is not glTF goes to
/// the OBJ importer, which reports unreadable input itself.
pub fn importer_for(path: &Path) -> Box<dyn SceneImporter> {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("gltf") | Some("glb") => Box::new(GltfImporter),
        _ => Box::new(ObjImporter),
    }
}

/// Wavefront OBJ + MTL through tobj.
pub struct ObjImporter;

impl SceneImporter for ObjImporter {
    fn import(&self, path: &Path) -> anyhow::Result<SourceScene> {
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .with_context(|| format!("cannot import {}", path.display()))?;

        let materials = match materials {
            Ok(materials) => materials
                .into_iter()
                .map(|m| SourceMaterial {
                    name: m.name,
                    diffuse_texture: m.diffuse_texture.as_deref().map(TextureSource::file),
                })
                .collect(),
            Err(e) => {
                log::warn!("{}: materials could not be loaded: {e}", path.display());
                Vec::new()
            }
        };

        let mut root = SourceNode {
            name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            ..Default::default()
        };
        let mut meshes = Vec::with_capacity(models.len());
        for (index, model) in models.into_iter().enumerate() {
            let mesh = model.mesh;
            let positions: Vec<[f32; 3]> = mesh
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect();
            let normals = mesh
                .normals
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]])
                .collect();
            // OBJ stores v = 0 at the bottom of the image.
            let tex_coords = (!mesh.texcoords.is_empty()).then(|| {
                mesh.texcoords
                    .chunks_exact(2)
                    .map(|t| [t[0], 1.0 - t[1]])
                    .collect()
            });
            let faces = mesh.indices.chunks(3).map(<[u32]>::to_vec).collect();

            root.children.push(SourceNode {
                name: model.name.clone(),
                meshes: vec![index],
                children: Vec::new(),
            });
            meshes.push(SourceMesh {
                name: model.name,
                positions,
                normals,
                tex_coords,
                faces,
                material: mesh.material_id,
            });
        }

        Ok(SourceScene {
            root: Some(root),
            meshes,
            materials,
            incomplete: false,
        })
    }
}

/// glTF 2.0 (`.gltf` with external buffers, or `.glb`).
pub struct GltfImporter;

impl SceneImporter for GltfImporter {
    fn import(&self, path: &Path) -> anyhow::Result<SourceScene> {
        let gltf::Gltf { document, blob } =
            gltf::Gltf::open(path).with_context(|| format!("cannot import {}", path.display()))?;
        // Images are left to the texture loader, which falls back per texture.
        let buffers = gltf::import_buffers(&document, path.parent(), blob)
            .with_context(|| format!("cannot load the buffers of {}", path.display()))?;

        let materials = document
            .materials()
            .map(|material| {
                let diffuse_texture = material
                    .pbr_metallic_roughness()
                    .base_color_texture()
                    .and_then(|info| {
                        let image = info.texture().source();
                        match image.source() {
                            gltf::image::Source::Uri { uri, .. } => Some(TextureSource::file(uri)),
                            gltf::image::Source::View { view, .. } => {
                                let bytes = view_bytes(&view, &buffers);
                                if bytes.is_none() {
                                    log::warn!(
                                        "{}: image {} points outside its buffer",
                                        path.display(),
                                        image.index()
                                    );
                                }
                                bytes.map(|bytes| TextureSource::Embedded {
                                    image: image.index(),
                                    bytes: bytes.to_vec(),
                                })
                            }
                        }
                    });
                SourceMaterial {
                    name: material.name().unwrap_or_default().to_string(),
                    diffuse_texture,
                }
            })
            .collect();

        let mut meshes = Vec::new();
        let mut incomplete = false;
        // gltf mesh index -> indices of the primitives kept in `meshes`
        let mut primitives_of = Vec::with_capacity(document.meshes().len());
        for mesh in document.meshes() {
            let mut kept = Vec::new();
            for primitive in mesh.primitives() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    log::warn!(
                        "{}: skipping {:?} primitive of mesh {}",
                        path.display(),
                        primitive.mode(),
                        mesh.index()
                    );
                    continue;
                }
                let reader = primitive
                    .reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
                let Some(positions) = reader.read_positions() else {
                    log::warn!("{}: primitive without positions in mesh {}", path.display(), mesh.index());
                    incomplete = true;
                    continue;
                };
                let positions: Vec<[f32; 3]> = positions.collect();
                let normals = reader
                    .read_normals()
                    .map(|normals| normals.collect())
                    .unwrap_or_default();
                let tex_coords = reader
                    .read_tex_coords(0)
                    .map(|coords| coords.into_f32().collect());
                let indices: Vec<u32> = match reader.read_indices() {
                    Some(indices) => indices.into_u32().collect(),
                    None => (0..positions.len() as u32).collect(),
                };
                let faces = indices.chunks(3).map(<[u32]>::to_vec).collect();

                kept.push(meshes.len());
                meshes.push(SourceMesh {
                    name: mesh.name().unwrap_or_default().to_string(),
                    positions,
                    normals,
                    tex_coords,
                    faces,
                    material: primitive.material().index(),
                });
            }
            primitives_of.push(kept);
        }

        let root = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .map(|scene| SourceNode {
                name: scene.name().unwrap_or_default().to_string(),
                meshes: Vec::new(),
                children: scene
                    .nodes()
                    .map(|node| gltf_node(&node, &primitives_of))
                    .collect(),
            });

        Ok(SourceScene {
            root,
            meshes,
            materials,
            incomplete,
        })
    }
}

fn view_bytes<'a>(view: &gltf::buffer::View, buffers: &'a [gltf::buffer::Data]) -> Option<&'a [u8]> {
    let range = view.offset()..view.offset() + view.length();
    buffers.get(view.buffer().index())?.0.get(range)
}

fn gltf_node(node: &gltf::Node, primitives_of: &[Vec<usize>]) -> SourceNode {
    SourceNode {
        name: node.name().unwrap_or_default().to_string(),
        meshes: node
            .mesh()
            .and_then(|mesh| primitives_of.get(mesh.index()))
            .cloned()
            .unwrap_or_default(),
        children: node
            .children()
            .map(|child| gltf_node(&child, primitives_of))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_paths_use_forward_slashes() {
        assert_eq!(
            TextureSource::file("textures\\roof\\thatch.png"),
            TextureSource::File("textures/roof/thatch.png".to_string())
        );
        assert_eq!(TextureSource::file("wood.png"), TextureSource::File("wood.png".to_string()));
    }
}
