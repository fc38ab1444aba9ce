use village_ngin::{
    camera::CameraSettings,
    flow,
    scene::{AssetPaths, SceneLayout},
};

fn main() -> anyhow::Result<()> {
    let assets = match std::env::args_os().nth(1) {
        Some(root) => AssetPaths::new(root),
        None => AssetPaths::default(),
    };
    flow::run(assets, SceneLayout::default(), CameraSettings::default())
}
