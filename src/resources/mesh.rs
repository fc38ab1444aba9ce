use crate::{
    data_structures::{
        model::{MeshData, ModelVertex},
        texture::TextureHandle,
    },
    resources::scene_import::SourceMesh,
};

/**
 * Copies one parsed mesh into vertex/index lists.
 *
 * Missing texture coordinates become (0, 0) and missing normals become zero.
 * Faces are flattened in order, so a triangulated source yields a plain
 * triangle list.
 */
pub fn to_mesh_data(mesh: &SourceMesh, texture: TextureHandle) -> anyhow::Result<MeshData> {
    let vertices = mesh
        .positions
        .iter()
        .enumerate()
        .map(|(i, &position)| ModelVertex {
            position,
            normal: mesh.normals.get(i).copied().unwrap_or_default(),
            tex_coords: mesh
                .tex_coords
                .as_ref()
                .and_then(|coords| coords.get(i).copied())
                .unwrap_or_default(),
        })
        .collect();
    let indices = mesh.faces.iter().flatten().copied().collect();
    MeshData::new(vertices, indices, texture)
}
