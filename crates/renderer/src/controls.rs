//! Orbit controls: pointer-driven camera navigation around a target point.
//!
//! The camera position is kept in spherical coordinates around `target`. Pointer
//! input queues rotation, dolly and pan deltas; [`OrbitControls::update`] applies
//! them (damped when enabled), clamps the result and re-aims the camera.

use crate::camera::Camera;
use glam::Vec3;
use std::f32::consts::{PI, TAU};

const POLAR_EPS: f32 = 1e-6;

#[derive(Debug, Clone)]
pub struct OrbitControls {
    /// Point the camera orbits and looks at.
    pub target: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Polar angle limits, measured from +Y.
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub enable_damping: bool,
    /// Fraction of the pending motion applied per update when damping.
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,

    theta_delta: f32,
    phi_delta: f32,
    scale: f32,
    pan_offset: Vec3,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            enable_rotate: true,
            enable_zoom: true,
            enable_pan: true,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
        }
    }
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }

    /// Queue a rotation from a pointer drag of `(dx, dy)` pixels in a viewport
    /// `viewport_height` pixels tall. A full-height drag turns by a full circle.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if !self.enable_rotate {
            return;
        }
        let height = viewport_height.max(1.0);
        self.theta_delta -= TAU * dx / height * self.rotate_speed;
        self.phi_delta -= TAU * dy / height * self.rotate_speed;
    }

    /// Queue a dolly from wheel input. Positive `lines` moves toward the target.
    pub fn dolly(&mut self, lines: f32) {
        if !self.enable_zoom {
            return;
        }
        self.scale *= 0.95f32.powf(self.zoom_speed * lines);
    }

    /// Queue a pan from a pointer drag, scaled so the target tracks the pointer.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32, camera: &Camera) {
        if !self.enable_pan {
            return;
        }
        let height = viewport_height.max(1.0);
        let distance = (camera.position() - self.target).length()
            * (camera.fov_degrees.to_radians() / 2.0).tan();
        let left = -camera.right() * (2.0 * dx * distance / height);
        let up = camera.up() * (2.0 * dy * distance / height);
        self.pan_offset += (left + up) * self.pan_speed;
    }

    /// Apply queued motion and re-aim the camera. `delta` (seconds) makes damping
    /// frame-rate independent; without it damping is applied per call.
    pub fn update(&mut self, camera: &mut Camera, delta: Option<f32>) {
        let damping = match delta {
            Some(dt) if self.enable_damping => {
                1.0 - (1.0 - self.damping_factor).powf((dt * 60.0).max(0.0))
            }
            _ if self.enable_damping => self.damping_factor,
            _ => 1.0,
        };

        let offset = camera.position() - self.target;
        let mut radius = offset.length();
        let (mut theta, mut phi) = if radius > 0.0 {
            (offset.x.atan2(offset.z), (offset.y / radius).clamp(-1.0, 1.0).acos())
        } else {
            (0.0, PI / 2.0)
        };

        theta += self.theta_delta * damping;
        phi += self.phi_delta * damping;
        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(POLAR_EPS, PI - POLAR_EPS);

        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance.max(self.min_distance));

        self.target += self.pan_offset * damping;

        let sin_phi = phi.sin();
        let offset = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        camera.transform.position = self.target + offset;
        camera.look_at(self.target);

        if self.enable_damping {
            self.theta_delta *= 1.0 - damping;
            self.phi_delta *= 1.0 - damping;
            self.pan_offset *= 1.0 - damping;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;
    }
}
