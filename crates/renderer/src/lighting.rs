//! Scene lighting: ambient fill, one shadow-casting sun, and a sky/ground hemisphere.

use engine_core::color_from_hex;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub color: u32,
    pub intensity: f32,
}

/// Orthographic shadow camera bounds for the sun.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowCamera {
    pub near: f32,
    pub far: f32,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub color: u32,
    pub intensity: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub cast_shadow: bool,
    pub shadow_map_size: u32,
    /// Soft-shadow filter radius, in shadow-map texels.
    pub shadow_radius: f32,
    pub shadow_blur_samples: u32,
    pub shadow_bias: f32,
    pub shadow_camera: ShadowCamera,
}

impl DirectionalLight {
    /// Unit vector pointing from the target toward the light.
    pub fn direction(&self) -> Vec3 {
        (Vec3::from(self.position) - Vec3::from(self.target)).normalize_or_zero()
    }

    /// View-projection of the shadow camera (wgpu depth range 0..1).
    pub fn shadow_view_proj(&self) -> Mat4 {
        let eye = Vec3::from(self.position);
        let target = Vec3::from(self.target);
        let forward = (target - eye).normalize_or_zero();
        let up = if forward.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(eye, target, up);
        let c = &self.shadow_camera;
        let proj = Mat4::orthographic_rh(c.left, c.right, c.bottom, c.top, c.near, c.far);
        proj * view
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HemisphereLight {
    pub sky_color: u32,
    pub ground_color: u32,
    pub intensity: f32,
}

impl HemisphereLight {
    /// Irradiance for a surface normal: sky colour facing up, ground facing down.
    pub fn irradiance(&self, normal: Vec3) -> Vec3 {
        let w = 0.5 * normal.normalize_or_zero().y + 0.5;
        color_from_hex(self.ground_color).lerp(color_from_hex(self.sky_color), w) * self.intensity
    }
}

/// Every light in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingRig {
    pub ambient: AmbientLight,
    pub sun: DirectionalLight,
    pub hemisphere: HemisphereLight,
}

impl Default for LightingRig {
    fn default() -> Self {
        Self {
            ambient: AmbientLight {
                color: 0xffffff,
                intensity: 1.0,
            },
            sun: DirectionalLight {
                color: 0xffffff,
                intensity: 1.0,
                position: [18.0, 40.0, 10.0],
                target: [-20.0, 0.0, -20.0],
                cast_shadow: true,
                // Sized for the current tile set; grow with the map.
                shadow_map_size: 2048,
                shadow_radius: 25.0,
                shadow_blur_samples: 25,
                shadow_bias: 0.0,
                shadow_camera: ShadowCamera {
                    near: 0.2,
                    far: 65.0,
                    left: -42.0,
                    right: 31.0,
                    bottom: -31.0,
                    top: 49.0,
                },
            },
            hemisphere: HemisphereLight {
                sky_color: 0xe5e7ff,
                ground_color: 0xd2b156,
                intensity: 1.75,
            },
        }
    }
}

/// Shadow map update policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowSettings {
    pub enabled: bool,
    /// Re-render the shadow map every frame. When false the last map is reused.
    pub auto_update: bool,
    /// One-shot request to re-render even when `auto_update` is off.
    pub needs_update: bool,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_update: true,
            needs_update: false,
        }
    }
}

impl ShadowSettings {
    /// Whether the shadow pass should run this frame. Clears `needs_update`.
    pub fn take_render_request(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        let render = self.auto_update || self.needs_update;
        self.needs_update = false;
        render
    }

    /// Stop re-rendering the shadow map; the current map stays in use.
    pub fn freeze(&mut self) {
        self.auto_update = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sun_points_down_toward_map() {
        let rig = LightingRig::default();
        let dir = rig.sun.direction();
        assert!(dir.y > 0.0);
        assert!((dir.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shadow_camera_contains_sun_target() {
        let rig = LightingRig::default();
        let clip = rig.sun.shadow_view_proj().project_point3(Vec3::from(rig.sun.target));
        assert!(clip.x.abs() <= 1.0 && clip.y.abs() <= 1.0);
        assert!((0.0..=1.0).contains(&clip.z));
    }

    #[test]
    fn hemisphere_blends_sky_and_ground() {
        let hemi = LightingRig::default().hemisphere;
        let up = hemi.irradiance(Vec3::Y);
        let down = hemi.irradiance(-Vec3::Y);
        assert!((up - color_from_hex(0xe5e7ff) * 1.75).length() < 1e-5);
        assert!((down - color_from_hex(0xd2b156) * 1.75).length() < 1e-5);
    }

    #[test]
    fn frozen_shadows_render_only_on_request() {
        let mut shadows = ShadowSettings::default();
        assert!(shadows.take_render_request());
        shadows.freeze();
        assert!(!shadows.take_render_request());
        shadows.needs_update = true;
        assert!(shadows.take_render_request());
        assert!(!shadows.take_render_request());
    }
}
