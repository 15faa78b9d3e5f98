//! Ray picking against loaded scene geometry using Rapier3D query pipelines.

pub mod raycast;
pub mod world;

pub use raycast::*;
pub use world::*;

pub use rapier3d;
