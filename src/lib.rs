//! village-ngin
//!
//! A first-person walk along the road of a small medieval village: grass and
//! a road on the ground, a field of wheat sprites, two houses and a castle
//! loaded from model files, a row of alpha-blended tree sprites, a cubemap
//! sky and linear distance fog over everything.
//!
//! High-level modules
//! - `camera`: first-person camera, bounded WASD movement and Q/E yaw
//! - `context`: window, surface, device and queue
//! - `data_structures`: vertices, mesh batches, instances and textures
//! - `flow`: the winit event loop and per-frame glue
//! - `fog`: fog parameters and the shader globals they feed
//! - `frame`: executes a planned frame on the GPU
//! - `pipelines`: render pipelines and the globals uniform
//! - `render`: the frame as an ordered list of draw commands
//! - `resources`: texture and model loading
//! - `scene`: placement data of everything in the village
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod fog;
pub mod frame;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use winit::event::WindowEvent;
