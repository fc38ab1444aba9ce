use std::{
    cell::RefCell,
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Once,
};

use village_ngin::{
    data_structures::texture::{TextureHandle, TextureSampling},
    resources::{
        scene_import::{SceneImporter, SourceScene},
        texture::{DecodedImage, TextureUpload},
    },
};

/// One call made against [`RecordingUploads`].
#[derive(Clone, Debug, PartialEq)]
pub enum Upload {
    Flat {
        label: String,
        width: u32,
        height: u32,
        channels: u8,
        sampling: TextureSampling,
    },
    Cube {
        label: String,
        /// Width of each face, `None` where the face failed to load.
        faces: [Option<u32>; 6],
    },
}

/// Texture sink that remembers every upload and hands out handles 1, 2, 3, ...
#[derive(Debug, Default)]
pub struct RecordingUploads {
    pub uploads: Vec<Upload>,
}

impl RecordingUploads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flat_labels(&self) -> Vec<&str> {
        self.uploads
            .iter()
            .filter_map(|upload| match upload {
                Upload::Flat { label, .. } => Some(label.as_str()),
                Upload::Cube { .. } => None,
            })
            .collect()
    }

    fn next(&mut self, upload: Upload) -> TextureHandle {
        self.uploads.push(upload);
        TextureHandle::new(self.uploads.len() as u32)
    }
}

impl TextureUpload for RecordingUploads {
    fn upload_2d(
        &mut self,
        image: &DecodedImage,
        sampling: TextureSampling,
        label: &str,
    ) -> TextureHandle {
        self.next(Upload::Flat {
            label: label.to_string(),
            width: image.width,
            height: image.height,
            channels: image.channels,
            sampling,
        })
    }

    fn upload_cubemap(&mut self, faces: &[Option<DecodedImage>; 6], label: &str) -> TextureHandle {
        self.next(Upload::Cube {
            label: label.to_string(),
            faces: faces.each_ref().map(|face| face.as_ref().map(|image| image.width)),
        })
    }
}

/// Importer that returns prepared scenes by path and records what was asked.
#[derive(Default)]
pub struct ScriptedImporter {
    scenes: HashMap<PathBuf, SourceScene>,
    pub requested: RefCell<Vec<PathBuf>>,
}

impl ScriptedImporter {
    pub fn with(mut self, path: impl Into<PathBuf>, scene: SourceScene) -> Self {
        self.scenes.insert(path.into(), scene);
        self
    }
}

impl SceneImporter for ScriptedImporter {
    fn import(&self, path: &Path) -> anyhow::Result<SourceScene> {
        self.requested.borrow_mut().push(path.to_path_buf());
        self.scenes
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no scene scripted for {}", path.display()))
    }
}

pub fn write_rgb_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create fixture directory");
    }
    image::RgbImage::from_pixel(width, height, image::Rgb([200, 180, 40]))
        .save(path)
        .expect("failed to write fixture");
}

pub fn write_rgba_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("failed to create fixture directory");
    }
    image::RgbaImage::from_pixel(width, height, image::Rgba([20, 120, 30, 0]))
        .save(path)
        .expect("failed to write fixture");
}

thread_local! {
    static RECORDS: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
}

/// Keeps each test thread's records apart so parallel tests do not mix.
struct CapturingLogger;

impl log::Log for CapturingLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        RECORDS.with(|records| {
            records
                .borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger;
static INSTALL: Once = Once::new();

/// Runs `f` and returns its result with the messages logged at error level meanwhile.
pub fn capture_errors<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
    INSTALL.call_once(|| {
        log::set_logger(&LOGGER).expect("another logger is installed");
        log::set_max_level(log::LevelFilter::Trace);
    });
    RECORDS.with(|records| records.borrow_mut().clear());
    let value = f();
    let errors = RECORDS.with(|records| {
        records
            .take()
            .into_iter()
            .filter(|(level, _)| *level == log::Level::Error)
            .map(|(_, message)| message)
            .collect()
    });
    (value, errors)
}
