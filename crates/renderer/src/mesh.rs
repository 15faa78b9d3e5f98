//! GPU buffers for scene meshes.

use crate::vertex::Vertex;
use engine_core::MeshData;
use wgpu::util::DeviceExt;

/// A GPU mesh with vertex and index buffers.
pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl Mesh {
    /// Create a mesh from vertex and index data.
    pub fn new(device: &wgpu::Device, vertices: &[Vertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            num_indices: indices.len() as u32,
        }
    }

    /// Upload CPU mesh data. Returns `None` for meshes with nothing to draw.
    pub fn from_data(device: &wgpu::Device, data: &MeshData) -> Option<Self> {
        if data.positions.is_empty() || data.indices.len() < 3 {
            return None;
        }
        Some(Self::new(device, &interleave(data), &data.indices))
    }
}

/// Interleave positions and normals, substituting +Y where normals are missing.
pub fn interleave(data: &MeshData) -> Vec<Vertex> {
    data.positions
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let n = data.normals.get(i).copied().unwrap_or(glam::Vec3::Y);
            Vertex::new(p.to_array(), n.to_array())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn interleave_fills_missing_normals() {
        let data = MeshData {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            normals: vec![Vec3::X],
            indices: vec![0, 1, 2],
        };
        let vertices = interleave(&data);
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[0].normal, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[2].normal, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[1].position, [1.0, 0.0, 0.0]);
    }
}
