//! Vertex and per-instance layouts shared by the scene and shadow pipelines.

use bytemuck::{Pod, Zeroable};
use engine_core::{Blending, Material};
use glam::Mat4;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Normal
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Per-draw data: world matrix plus the material values the lit shader needs.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// Model matrix, column-major.
    pub model: [[f32; 4]; 4],
    /// Linear base colour, alpha = opacity.
    pub color: [f32; 4],
    /// x = metalness, y = roughness, z = receives shadow (0/1), w unused.
    pub surface: [f32; 4],
}

impl InstanceData {
    pub fn from_material(world: Mat4, material: &Material, receive_shadow: bool) -> Self {
        Self {
            model: world.to_cols_array_2d(),
            color: [
                material.color.x + material.emissive.x,
                material.color.y + material.emissive.y,
                material.color.z + material.emissive.z,
                material.opacity,
            ],
            surface: [
                material.metalness,
                material.roughness,
                if receive_shadow { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }

    /// Whether the draw goes through the additive pipeline.
    pub fn is_additive(material: &Material) -> bool {
        material.blending == Blending::Additive
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // Model matrix column 0
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Model matrix column 1
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Model matrix column 2
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Model matrix column 3
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Color
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Surface
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 20]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn instance_carries_opacity_and_shadow_flag() {
        let mut material = Material::named("Water");
        material.opacity = 2.0;
        material.metalness = 0.65;
        let inst = InstanceData::from_material(Mat4::from_translation(Vec3::X), &material, true);
        assert_eq!(inst.color[3], 2.0);
        assert_eq!(inst.surface[0], 0.65);
        assert_eq!(inst.surface[2], 1.0);
        assert_eq!(inst.model[3][0], 1.0);
    }

    #[test]
    fn layouts_match_struct_sizes() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        assert_eq!(std::mem::size_of::<InstanceData>(), 96);
    }
}
