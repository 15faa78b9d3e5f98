//! Core types shared by every mapview crate.
//!
//! - Clocks and time sources
//! - The fixed-rate frame scheduler
//! - Transforms and the scene graph
//! - Tweens for camera animation

pub mod scene;
pub mod scheduler;
pub mod time;
pub mod transform;
pub mod tween;

pub use scene::*;
pub use scheduler::*;
pub use time::*;
pub use transform::*;
pub use tween::*;

// Re-export commonly used types
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
