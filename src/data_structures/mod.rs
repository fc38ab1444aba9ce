//! Engine data structures: meshes, textures and instances.
//!
//! - `model` holds the vertex formats, CPU mesh data and GPU mesh batches
//! - `texture` holds GPU textures and the handle registry
//! - `instance` holds per-draw transforms and their GPU layout

pub mod instance;
pub mod model;
pub mod texture;
