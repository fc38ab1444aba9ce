mod common;

use std::fs;

use common::test_utils::{RecordingUploads, write_rgb_png};
use village_ngin::{
    data_structures::texture::TextureHandle,
    resources::{
        import_model,
        scene_import::{ObjImporter, SceneImporter, importer_for},
    },
};

const HUT_OBJ: &str = "\
mtllib hut.mtl
o Walls
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
usemtl wood
f 1/1/1 2/2/1 3/3/1 4/4/1
o Roof
v 0.0 1.0 0.0
v 1.0 1.0 0.0
v 0.5 2.0 0.0
usemtl thatch
f 5 6 7
";

const HUT_MTL: &str = "\
newmtl wood
Kd 1.0 1.0 1.0
map_Kd wood.png

newmtl thatch
Kd 0.8 0.7 0.2
";

fn write_hut(dir: &std::path::Path) -> std::path::PathBuf {
    let obj = dir.join("hut.obj");
    fs::write(&obj, HUT_OBJ).unwrap();
    fs::write(dir.join("hut.mtl"), HUT_MTL).unwrap();
    obj
}

#[test]
fn obj_objects_become_root_children_in_file_order() {
    let dir = tempfile::tempdir().unwrap();
    let obj = write_hut(dir.path());

    let scene = ObjImporter.import(&obj).unwrap();

    let root = scene.root.expect("obj scenes always have a root");
    let children: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(children, vec!["Walls", "Roof"]);
    assert_eq!(scene.meshes.len(), 2);
    assert_eq!(scene.materials.len(), 2);
    assert!(!scene.incomplete);
}

#[test]
fn quads_are_triangulated_and_v_is_flipped() {
    let dir = tempfile::tempdir().unwrap();
    let obj = write_hut(dir.path());

    let scene = ObjImporter.import(&obj).unwrap();
    let walls = &scene.meshes[0];

    assert_eq!(walls.faces.len(), 2);
    assert!(walls.faces.iter().all(|face| face.len() == 3));
    let uvs = walls.tex_coords.as_ref().expect("walls have uvs");
    let index = walls
        .positions
        .iter()
        .position(|p| *p == [0.0, 0.0, 0.0])
        .unwrap();
    assert_eq!(uvs[index], [0.0, 1.0]);
}

#[test]
fn mesh_without_uvs_reports_none() {
    let dir = tempfile::tempdir().unwrap();
    let obj = write_hut(dir.path());

    let scene = ObjImporter.import(&obj).unwrap();
    assert!(scene.meshes[1].tex_coords.is_none());
}

#[test]
fn hut_loads_with_its_wood_texture() {
    let dir = tempfile::tempdir().unwrap();
    let obj = write_hut(dir.path());
    write_rgb_png(&dir.path().join("wood.png"), 8, 8);
    let mut uploads = RecordingUploads::new();

    let batches = import_model(importer_for(&obj).as_ref(), &mut uploads, &obj);

    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].indices().len(), 6);
    assert_eq!(batches[1].indices().len(), 3);
    assert_eq!(batches[0].texture(), TextureHandle::new(1));
    assert!(batches[1].texture().is_none());
    assert_eq!(uploads.uploads.len(), 1);
}

#[test]
fn backslash_texture_paths_resolve_on_every_platform() {
    let dir = tempfile::tempdir().unwrap();
    let obj = write_hut(dir.path());
    fs::write(dir.path().join("hut.mtl"), HUT_MTL.replace("wood.png", "textures\\wood.png")).unwrap();
    let texture = dir.path().join("textures").join("wood.png");
    write_rgb_png(&texture, 8, 8);
    let mut uploads = RecordingUploads::new();

    let batches = import_model(&ObjImporter, &mut uploads, &obj);

    assert_eq!(batches[0].texture(), TextureHandle::new(1));
    assert_eq!(uploads.flat_labels(), vec![texture.display().to_string()]);
}

#[test]
fn missing_material_library_still_loads_geometry() {
    let dir = tempfile::tempdir().unwrap();
    let obj = dir.path().join("hut.obj");
    fs::write(&obj, HUT_OBJ).unwrap();

    let batches = import_model(&ObjImporter, &mut RecordingUploads::new(), &obj);

    assert_eq!(batches.len(), 2);
    assert!(batches.iter().all(|b| b.texture().is_none()));
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(ObjImporter.import(&dir.path().join("none.obj")).is_err());
}
