//! Rendering for the map viewer using wgpu: camera, orbit controls, lights,
//! post-processing parameters and the frame's GPU passes.

pub mod camera;
pub mod controls;
pub mod lighting;
pub mod mesh;
pub mod pipeline;
pub mod post;
pub mod renderer;
pub mod texture;
pub mod vertex;

pub use camera::*;
pub use controls::*;
pub use lighting::*;
pub use mesh::*;
pub use pipeline::*;
pub use post::*;
pub use renderer::*;
pub use texture::*;
pub use vertex::*;
