mod common;

use std::fs;

use common::test_utils::{RecordingUploads, Upload, capture_errors, write_rgb_png, write_rgba_png};
use village_ngin::{
    data_structures::texture::{TextureHandle, TextureSampling},
    resources::{
        load_scene_textures,
        texture::{
            Channels, CubemapFaces, PixelLayout, decode_image, load_cubemap, load_embedded_texture,
            load_texture_2d, load_texture_with_alpha,
        },
    },
    scene::AssetPaths,
};

#[test]
fn rgb_file_decodes_as_three_channels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("road.png");
    write_rgb_png(&path, 4, 2);

    let image = decode_image(&path, Channels::Native).unwrap();
    assert_eq!((image.width, image.height, image.channels), (4, 2, 3));
    assert_eq!(image.layout, PixelLayout::Rgb);
    assert_eq!(image.pixels.len(), 4 * 2 * 3);
    assert_eq!(image.to_rgba8()[..4], [200, 180, 40, 255]);
}

#[test]
fn alpha_request_forces_four_channels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wheat.png");
    write_rgb_png(&path, 2, 2);

    let image = decode_image(&path, Channels::Rgba).unwrap();
    assert_eq!(image.layout, PixelLayout::Rgba);
    assert_eq!(image.pixels.len(), 2 * 2 * 4);
}

#[test]
fn colour_texture_is_tiled_and_cutout_is_not() {
    let dir = tempfile::tempdir().unwrap();
    let grass = dir.path().join("grass.png");
    let tree = dir.path().join("tree.png");
    write_rgb_png(&grass, 8, 8);
    write_rgba_png(&tree, 4, 8);

    let mut uploads = RecordingUploads::new();
    let grass_handle = load_texture_2d(&mut uploads, &grass);
    let tree_handle = load_texture_with_alpha(&mut uploads, &tree);

    assert_eq!(grass_handle, TextureHandle::new(1));
    assert_eq!(tree_handle, TextureHandle::new(2));
    assert!(matches!(
        uploads.uploads[0],
        Upload::Flat { sampling: TextureSampling::Tiled, channels: 3, width: 8, .. }
    ));
    assert!(matches!(
        uploads.uploads[1],
        Upload::Flat { sampling: TextureSampling::Cutout, channels: 4, height: 8, .. }
    ));
    assert!(TextureSampling::Tiled.mipmapped());
    assert!(!TextureSampling::Cutout.mipmapped());
}

#[test]
fn missing_texture_yields_the_sentinel_without_uploading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.jpg");
    let mut uploads = RecordingUploads::new();

    let (handle, errors) = capture_errors(|| load_texture_2d(&mut uploads, &path));
    assert!(handle.is_none());
    assert_eq!(handle, TextureHandle::NONE);
    assert!(uploads.uploads.is_empty());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains(&path.display().to_string()));
}

#[test]
fn undecodable_texture_is_logged_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.png");
    fs::write(&path, b"not an image at all").unwrap();
    let mut uploads = RecordingUploads::new();

    let (handle, errors) = capture_errors(|| load_texture_with_alpha(&mut uploads, &path));
    assert!(handle.is_none());
    assert!(uploads.uploads.is_empty());
    assert_eq!(errors.len(), 1);
}

#[test]
fn embedded_bytes_decode_like_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("thatch.png");
    write_rgb_png(&path, 4, 4);
    let bytes = fs::read(&path).unwrap();
    let mut uploads = RecordingUploads::new();

    let handle = load_embedded_texture(&mut uploads, &bytes, "hut.glb#image0");
    assert_eq!(handle, TextureHandle::new(1));
    assert!(matches!(
        &uploads.uploads[0],
        Upload::Flat { label, sampling: TextureSampling::Tiled, width: 4, .. } if label == "hut.glb#image0"
    ));

    let (handle, errors) = capture_errors(|| load_embedded_texture(&mut uploads, &[1, 2, 3], "broken"));
    assert!(handle.is_none());
    assert_eq!(errors.len(), 1);
    assert_eq!(uploads.uploads.len(), 1);
}

#[test]
fn cubemap_survives_a_missing_face() {
    let dir = tempfile::tempdir().unwrap();
    let faces = CubemapFaces::in_dir(dir.path());
    for (i, path) in faces.ordered().into_iter().enumerate() {
        if i != 3 {
            write_rgb_png(path, 16, 16);
        }
    }

    let mut uploads = RecordingUploads::new();
    let (handle, errors) = capture_errors(|| load_cubemap(&mut uploads, &faces));

    assert!(!handle.is_none());
    assert_eq!(
        uploads.uploads,
        vec![Upload::Cube {
            label: "skybox cubemap".to_string(),
            faces: [Some(16), Some(16), Some(16), None, Some(16), Some(16)],
        }]
    );
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("py.png"));
}

#[test]
fn non_square_and_mismatched_faces_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let faces = CubemapFaces::in_dir(dir.path());
    let paths = faces.ordered();
    for path in paths {
        write_rgb_png(path, 16, 16);
    }
    write_rgb_png(paths[2], 16, 8);

    let mut uploads = RecordingUploads::new();
    let (handle, errors) = capture_errors(|| load_cubemap(&mut uploads, &faces));

    assert!(!handle.is_none());
    assert!(matches!(
        &uploads.uploads[0],
        Upload::Cube { faces: [Some(16), Some(16), None, Some(16), Some(16), Some(16)], .. }
    ));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("ny.png"));

    write_rgb_png(paths[2], 16, 16);
    write_rgb_png(paths[5], 8, 8);
    let (_, errors) = capture_errors(|| load_cubemap(&mut uploads, &faces));
    assert!(matches!(
        &uploads.uploads[1],
        Upload::Cube { faces: [Some(16), Some(16), Some(16), Some(16), Some(16), None], .. }
    ));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("pz.png"));
}

#[test]
fn cubemap_with_no_faces_is_still_created() {
    let dir = tempfile::tempdir().unwrap();
    let mut uploads = RecordingUploads::new();
    let handle = load_cubemap(&mut uploads, &CubemapFaces::in_dir(dir.path()));
    assert!(!handle.is_none());
    assert!(matches!(&uploads.uploads[0], Upload::Cube { faces: [None, None, None, None, None, None], .. }));
}

#[test]
fn scene_textures_come_from_the_asset_root() {
    let dir = tempfile::tempdir().unwrap();
    let assets = AssetPaths::new(dir.path());
    write_rgb_png(&assets.wheat(), 4, 4);
    write_rgba_png(&assets.tree(), 4, 4);
    for path in assets.skybox().ordered() {
        write_rgb_png(path, 2, 2);
    }

    let mut uploads = RecordingUploads::new();
    let textures = load_scene_textures(&mut uploads, &assets);

    // road and grass are missing
    assert!(textures.road.is_none());
    assert!(textures.grass.is_none());
    assert_eq!(textures.wheat, TextureHandle::new(1));
    assert_eq!(textures.tree, TextureHandle::new(2));
    assert_eq!(textures.skybox, TextureHandle::new(3));
    assert_eq!(
        uploads.flat_labels(),
        vec![
            assets.wheat().display().to_string(),
            assets.tree().display().to_string()
        ]
    );
}
