//! Map asset loading: the glTF binary manifest, background loading and
//! per-asset material fix-ups.

pub mod error;
pub mod gltf_loader;
pub mod loader;
pub mod manifest;
pub mod materials;

pub use error::*;
pub use gltf_loader::*;
pub use loader::*;
pub use manifest::*;
pub use materials::*;
