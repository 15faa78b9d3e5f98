//! Perspective camera for the map view.

use bytemuck::{Pod, Zeroable};
use engine_core::Transform;
use glam::{Mat4, Quat, Vec2, Vec3};

/// A ray in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

/// Perspective camera with configurable FOV and clipping planes.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera transform (position and rotation).
    pub transform: Transform,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Aspect ratio (width / height).
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            fov_degrees: 65.0,
            near: 0.1,
            far: 400.0,
            aspect: 16.0 / 9.0,
        }
    }
}

impl Camera {
    /// Create a new camera at the given position.
    pub fn new(position: Vec3) -> Self {
        Self {
            transform: Transform::from_position(position),
            ..Default::default()
        }
    }

    /// Update aspect ratio (call on window resize).
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Orient the camera toward a world point.
    pub fn look_at(&mut self, target: Vec3) {
        self.transform.look_at(target, Vec3::Y);
    }

    /// Rotation that would make the camera face `target` from where it stands.
    pub fn rotation_towards(&self, target: Vec3) -> Option<Quat> {
        Transform::rotation_towards(self.transform.position, target, Vec3::Y)
    }

    /// Get the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.transform.rotation, self.transform.position).inverse()
    }

    /// Get the projection matrix (wgpu depth range 0..1).
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    /// Get the combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Ray from the camera through a point given in normalized device coordinates.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection_matrix().inverse();
        let through = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 0.5));
        let origin = self.position();
        Ray {
            origin,
            direction: (through - origin).normalize_or_zero(),
        }
    }

    /// Get camera position.
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Get camera forward direction.
    pub fn forward(&self) -> Vec3 {
        self.transform.forward()
    }

    /// Get camera right direction.
    pub fn right(&self) -> Vec3 {
        self.transform.right()
    }

    /// Get camera up direction.
    pub fn up(&self) -> Vec3 {
        self.transform.up()
    }
}

/// Camera uniform data for GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 4], // w unused, padding
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            position: [0.0; 4],
        }
    }

    pub fn update(&mut self, camera: &Camera) {
        self.view_proj = camera.view_projection_matrix().to_cols_array_2d();
        let pos = camera.position();
        self.position = [pos.x, pos.y, pos.z, 1.0];
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_ray_follows_forward() {
        let mut camera = Camera::new(Vec3::new(5.0, 5.0, 5.0));
        camera.look_at(Vec3::ZERO);
        let ray = camera.ray_from_ndc(Vec2::ZERO);
        assert!((ray.direction - camera.forward()).length() < 1e-3);
        assert_eq!(ray.origin, camera.position());
    }

    #[test]
    fn right_edge_ray_leans_right() {
        let camera = Camera::new(Vec3::ZERO);
        let ray = camera.ray_from_ndc(Vec2::new(1.0, 0.0));
        assert!(ray.direction.x > 0.0);
        assert!(ray.direction.z < 0.0);
        assert!((ray.direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn view_matrix_moves_position_to_origin() {
        let mut camera = Camera::new(Vec3::new(3.0, 1.0, -2.0));
        camera.look_at(Vec3::new(0.0, 0.0, 10.0));
        let eye = camera.view_matrix().transform_point3(camera.position());
        assert!(eye.length() < 1e-4);
    }
}
