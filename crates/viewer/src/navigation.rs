//! Camera control modes: orbiting a pivot, or first-person free look with WASD
//! movement. Double clicks fly the camera toward the picked point.

use engine_core::{Easing, Lerp, Tween};
use glam::{Quat, Vec3};
use input::DirectionKeys;
use renderer::{Camera, OrbitControls};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// First-person movement speed, units per second.
pub const FPS_SPEED: f32 = 12.0;
/// How fast the velocity blend factor ramps to 1, per second.
pub const FPS_BLEND_RATE: f32 = 3.0;
pub const FPS_PIVOT_DISTANCE: f32 = 0.01;
pub const ORBIT_PIVOT_DISTANCE: f32 = 20.0;
/// Closest orbit radius. Kept under `near / 7` so a double click on anything
/// visible can land the camera at a seventh of the hit distance.
pub const ORBIT_MIN_DISTANCE: f32 = 0.01;
pub const FPS_TWEEN_SECONDS: f32 = 0.75;
pub const ORBIT_TWEEN_SECONDS: f32 = 1.35;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ControlMode {
    #[default]
    Orbit,
    FirstPerson,
}

impl ControlMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ControlMode::Orbit => "orbit",
            ControlMode::FirstPerson => "fps",
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown control mode {0:?} (expected \"fps\" or \"orbit\")")]
pub struct ParseControlModeError(pub String);

impl FromStr for ControlMode {
    type Err = ParseControlModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "orbit" => Ok(ControlMode::Orbit),
            "fps" => Ok(ControlMode::FirstPerson),
            other => Err(ParseControlModeError(other.to_string())),
        }
    }
}

/// Orbit-control limits for each mode.
pub fn apply_preset(mode: ControlMode, controls: &mut OrbitControls) {
    match mode {
        ControlMode::FirstPerson => {
            controls.enable_pan = false;
            controls.min_distance = 0.0;
            controls.max_distance = FPS_PIVOT_DISTANCE;
            controls.enable_zoom = false;
            controls.enable_damping = true;
            controls.damping_factor = 0.1;
            // Inverted so a drag turns the view the way the pointer moves.
            controls.rotate_speed = -0.4;
        }
        ControlMode::Orbit => {
            controls.enable_pan = true;
            controls.enable_zoom = true;
            controls.min_distance = ORBIT_MIN_DISTANCE;
            controls.max_distance = 150.0;
            controls.enable_damping = true;
            controls.damping_factor = 0.05;
            controls.rotate_speed = 1.0;
        }
    }
}

/// Owns the active control mode, first-person velocity and the double-click tweens.
#[derive(Debug, Clone)]
pub struct Navigator {
    mode: ControlMode,
    velocity: Vec3,
    /// Blend weight toward the desired velocity, reset when starting or stopping.
    factor: f32,
    was_moving: bool,
    rotation_tween: Option<Tween<Quat>>,
    position_tween: Option<Tween<Vec3>>,
    target_tween: Option<Tween<Vec3>>,
}

impl Navigator {
    /// Start in orbit mode around the current target, then switch to `mode`.
    pub fn new(mode: ControlMode, camera: &Camera, controls: &mut OrbitControls) -> Self {
        let mut navigator = Self {
            mode: ControlMode::Orbit,
            velocity: Vec3::ZERO,
            factor: 0.0,
            was_moving: false,
            rotation_tween: None,
            position_tween: None,
            target_tween: None,
        };
        apply_preset(ControlMode::Orbit, controls);
        navigator.switch_mode(mode, camera, controls);
        navigator
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn is_navigating(&self) -> bool {
        self.rotation_tween.is_some() || self.position_tween.is_some() || self.target_tween.is_some()
    }

    /// Re-anchor the pivot in front of the camera and apply the mode's limits.
    /// Switching to the active mode does nothing. Returns whether the mode changed.
    pub fn switch_mode(&mut self, mode: ControlMode, camera: &Camera, controls: &mut OrbitControls) -> bool {
        if mode == self.mode {
            return false;
        }
        let look = camera.forward();
        let pivot_distance = match mode {
            ControlMode::FirstPerson => FPS_PIVOT_DISTANCE,
            ControlMode::Orbit => ORBIT_PIVOT_DISTANCE,
        };
        controls.target = camera.position() + look * pivot_distance;
        apply_preset(mode, controls);
        log::debug!("Control mode {} -> {}", self.mode, mode);
        self.mode = mode;
        true
    }

    /// Per-step update: first-person movement, then any running navigation tween.
    /// Returns true when a tween step already ran `controls.update` this step.
    pub fn update(
        &mut self,
        delta: f32,
        keys: &DirectionKeys,
        camera: &mut Camera,
        controls: &mut OrbitControls,
    ) -> bool {
        if self.mode == ControlMode::FirstPerson {
            self.move_first_person(delta, keys, camera, controls);
        }
        self.advance_tweens(delta, camera, controls)
    }

    fn move_first_person(&mut self, delta: f32, keys: &DirectionKeys, camera: &mut Camera, controls: &mut OrbitControls) {
        let intent = keys.movement_intent();
        let moving = intent != Vec3::ZERO;
        if moving != self.was_moving {
            self.factor = 0.0;
            self.was_moving = moving;
        }
        self.factor = (self.factor + delta * FPS_BLEND_RATE).min(1.0);

        let desired = camera.transform.rotation * intent * delta * FPS_SPEED;
        self.velocity = self.velocity.lerp(desired, self.factor);
        camera.transform.position += self.velocity;
        controls.target += self.velocity;
    }

    fn advance_tweens(&mut self, delta: f32, camera: &mut Camera, controls: &mut OrbitControls) -> bool {
        if !self.is_navigating() {
            return false;
        }
        if let Some(tween) = self.rotation_tween.as_mut() {
            camera.transform.rotation = tween.advance(delta);
        }
        if let Some(tween) = self.position_tween.as_mut() {
            camera.transform.position = tween.advance(delta);
        }
        if let Some(tween) = self.target_tween.as_mut() {
            controls.target = tween.advance(delta);
        }
        controls.update(camera, Some(delta));

        clear_finished(&mut self.rotation_tween);
        clear_finished(&mut self.position_tween);
        clear_finished(&mut self.target_tween);
        true
    }

    /// Fly toward a picked point `hit` that lies `distance` along the unit ray `direction`.
    /// Replaces any navigation already in progress.
    pub fn navigate_to(
        &mut self,
        hit: Vec3,
        distance: f32,
        direction: Vec3,
        camera: &Camera,
        controls: &OrbitControls,
    ) {
        self.rotation_tween = None;
        self.position_tween = None;
        self.target_tween = None;

        match self.mode {
            ControlMode::FirstPerson => {
                if let Some(facing) = camera.rotation_towards(hit) {
                    self.rotation_tween = Some(Tween::new(
                        camera.transform.rotation,
                        facing,
                        FPS_TWEEN_SECONDS,
                        Easing::QuadraticInOut,
                    ));
                }
                self.target_tween = Some(Tween::new(
                    controls.target,
                    hit.lerp(camera.position(), 0.8),
                    FPS_TWEEN_SECONDS,
                    Easing::QuadraticInOut,
                ));
            }
            ControlMode::Orbit => {
                self.position_tween = Some(Tween::new(
                    camera.position(),
                    hit - direction * (distance / 7.0),
                    ORBIT_TWEEN_SECONDS,
                    Easing::QuadraticInOut,
                ));
                self.target_tween = Some(Tween::new(
                    controls.target,
                    hit,
                    ORBIT_TWEEN_SECONDS,
                    Easing::QuadraticInOut,
                ));
            }
        }
        log::debug!("Navigating ({}) to {:?}", self.mode, hit);
    }
}

fn clear_finished<T: Lerp>(slot: &mut Option<Tween<T>>) {
    if slot.as_ref().is_some_and(Tween::is_finished) {
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use input::Direction;

    const DT: f32 = 1.0 / 60.0;

    fn setup(mode: ControlMode) -> (Navigator, Camera, OrbitControls) {
        let mut camera = Camera::new(Vec3::new(5.0, 5.0, 5.0));
        camera.look_at(Vec3::ZERO);
        let mut controls = OrbitControls::new(Vec3::ZERO);
        let navigator = Navigator::new(mode, &camera, &mut controls);
        (navigator, camera, controls)
    }

    #[test]
    fn parses_mode_tokens() {
        assert_eq!("fps".parse::<ControlMode>(), Ok(ControlMode::FirstPerson));
        assert_eq!("orbit".parse::<ControlMode>(), Ok(ControlMode::Orbit));
        assert_eq!(
            "walk".parse::<ControlMode>(),
            Err(ParseControlModeError("walk".to_string()))
        );
        assert!("FPS".parse::<ControlMode>().is_err());
        assert_eq!(ControlMode::FirstPerson.to_string(), "fps");
    }

    #[test]
    fn starting_in_orbit_keeps_target() {
        let (navigator, _, controls) = setup(ControlMode::Orbit);
        assert_eq!(navigator.mode(), ControlMode::Orbit);
        assert_eq!(controls.target, Vec3::ZERO);
        assert_eq!(controls.max_distance, 150.0);
    }

    #[test]
    fn first_person_pivot_sits_just_ahead() {
        let (navigator, camera, controls) = setup(ControlMode::FirstPerson);
        assert_eq!(navigator.mode(), ControlMode::FirstPerson);
        let expected = camera.position() + camera.forward() * FPS_PIVOT_DISTANCE;
        assert!((controls.target - expected).length() < 1e-6);
        assert!(!controls.enable_pan);
        assert!(!controls.enable_zoom);
        assert_eq!(controls.rotate_speed, -0.4);
        assert_eq!(controls.damping_factor, 0.1);
    }

    #[test]
    fn switching_twice_is_idempotent() {
        let (mut navigator, camera, mut controls) = setup(ControlMode::Orbit);
        assert!(navigator.switch_mode(ControlMode::FirstPerson, &camera, &mut controls));
        let target = controls.target;
        assert!(!navigator.switch_mode(ControlMode::FirstPerson, &camera, &mut controls));
        assert_eq!(controls.target, target);

        assert!(navigator.switch_mode(ControlMode::Orbit, &camera, &mut controls));
        let expected = camera.position() + camera.forward() * ORBIT_PIVOT_DISTANCE;
        assert!((controls.target - expected).length() < 1e-4);
        assert!(controls.enable_pan);
        assert_eq!(controls.min_distance, ORBIT_MIN_DISTANCE);
    }

    #[test]
    fn orbit_ignores_movement_keys() {
        let (mut navigator, mut camera, mut controls) = setup(ControlMode::Orbit);
        let mut keys = DirectionKeys::default();
        keys.set(Direction::Up, true);
        let before = camera.position();
        navigator.update(DT, &keys, &mut camera, &mut controls);
        assert_eq!(camera.position(), before);
        assert_eq!(navigator.velocity(), Vec3::ZERO);
    }

    #[test]
    fn first_person_moves_camera_and_target_together() {
        let (mut navigator, mut camera, mut controls) = setup(ControlMode::FirstPerson);
        let mut keys = DirectionKeys::default();
        keys.set(Direction::Up, true);
        let start = camera.position();
        let offset = controls.target - start;
        for _ in 0..30 {
            navigator.update(DT, &keys, &mut camera, &mut controls);
        }
        let moved = camera.position() - start;
        assert!(moved.dot(camera.forward()) > 0.0);
        assert!((controls.target - camera.position() - offset).length() < 1e-4);
        // Never faster than full speed.
        assert!(navigator.velocity().length() <= FPS_SPEED * DT + 1e-5);
    }

    #[test]
    fn releasing_keys_decays_velocity() {
        let (mut navigator, mut camera, mut controls) = setup(ControlMode::FirstPerson);
        let mut keys = DirectionKeys::default();
        keys.set(Direction::Right, true);
        for _ in 0..60 {
            navigator.update(DT, &keys, &mut camera, &mut controls);
        }
        let cruising = navigator.velocity().length();
        assert!((cruising - FPS_SPEED * DT).abs() < 1e-4);

        keys.clear();
        for _ in 0..60 {
            navigator.update(DT, &keys, &mut camera, &mut controls);
        }
        assert!(navigator.velocity().length() < cruising * 0.01);
    }

    #[test]
    fn orbit_double_click_lands_short_of_hit() {
        let (mut navigator, mut camera, mut controls) = setup(ControlMode::Orbit);
        let origin = camera.position();
        let hit = Vec3::new(-3.0, 0.0, -4.0);
        let direction = (hit - origin).normalize();
        let distance = (hit - origin).length();

        navigator.navigate_to(hit, distance, direction, &camera, &controls);
        assert!(navigator.is_navigating());
        let keys = DirectionKeys::default();
        for _ in 0..120 {
            navigator.update(DT, &keys, &mut camera, &mut controls);
        }

        assert!(!navigator.is_navigating());
        assert_eq!(controls.target, hit);
        let expected = hit - direction * (distance / 7.0);
        assert!((camera.position() - expected).length() < 1e-3);
    }

    #[test]
    fn orbit_double_click_on_close_hit() {
        let (mut navigator, mut camera, mut controls) = setup(ControlMode::Orbit);
        let origin = camera.position();
        let direction = (-origin).normalize();
        let distance = 3.5;
        let hit = origin + direction * distance;

        navigator.navigate_to(hit, distance, direction, &camera, &controls);
        let keys = DirectionKeys::default();
        for _ in 0..120 {
            navigator.update(DT, &keys, &mut camera, &mut controls);
        }

        let expected = hit - direction * (distance / 7.0);
        assert!((camera.position() - expected).length() < 1e-3);
        assert!(((camera.position() - controls.target).length() - 0.5).abs() < 1e-3);

        // Settled controls leave the camera where the tween put it.
        controls.update(&mut camera, Some(DT));
        assert!((camera.position() - expected).length() < 1e-3);
    }

    #[test]
    fn update_reports_whether_tween_ran_controls() {
        let (mut navigator, mut camera, mut controls) = setup(ControlMode::Orbit);
        let keys = DirectionKeys::default();
        assert!(!navigator.update(DT, &keys, &mut camera, &mut controls));

        let origin = camera.position();
        let hit = Vec3::new(0.0, 0.0, -10.0);
        let direction = (hit - origin).normalize();
        navigator.navigate_to(hit, (hit - origin).length(), direction, &camera, &controls);
        assert!(navigator.update(DT, &keys, &mut camera, &mut controls));
        for _ in 0..120 {
            navigator.update(DT, &keys, &mut camera, &mut controls);
        }
        assert!(!navigator.update(DT, &keys, &mut camera, &mut controls));
    }

    #[test]
    fn velocity_survives_mode_round_trip() {
        let (mut navigator, mut camera, mut controls) = setup(ControlMode::FirstPerson);
        let mut keys = DirectionKeys::default();
        keys.set(Direction::Up, true);
        for _ in 0..20 {
            navigator.update(DT, &keys, &mut camera, &mut controls);
        }
        let velocity = navigator.velocity();
        assert!(velocity.length() > 0.0);

        assert!(navigator.switch_mode(ControlMode::Orbit, &camera, &mut controls));
        assert_eq!(navigator.velocity(), velocity);
        assert!(navigator.switch_mode(ControlMode::FirstPerson, &camera, &mut controls));
        assert_eq!(navigator.velocity(), velocity);

        // Movement carries on from the kept velocity.
        let before = camera.position();
        navigator.update(DT, &keys, &mut camera, &mut controls);
        let step = camera.position() - before;
        assert!(step.dot(camera.forward()) > 0.0);
        assert!(step.length() >= velocity.length() * 0.5);
    }

    #[test]
    fn first_person_double_click_turns_toward_hit() {
        let (mut navigator, mut camera, mut controls) = setup(ControlMode::FirstPerson);
        let hit = Vec3::new(5.0, 0.0, -20.0);
        let direction = (hit - camera.position()).normalize();
        let distance = (hit - camera.position()).length();

        navigator.navigate_to(hit, distance, direction, &camera, &controls);
        let keys = DirectionKeys::default();
        for _ in 0..60 {
            navigator.update(DT, &keys, &mut camera, &mut controls);
        }
        assert!(!navigator.is_navigating());
        let toward = (hit - camera.position()).normalize();
        assert!(camera.forward().dot(toward) > 0.99);
    }

    #[test]
    fn new_click_replaces_running_tween() {
        let (mut navigator, mut camera, mut controls) = setup(ControlMode::Orbit);
        let keys = DirectionKeys::default();
        let first = Vec3::new(0.0, 0.0, -30.0);
        let origin = camera.position();
        navigator.navigate_to(first, (first - origin).length(), (first - origin).normalize(), &camera, &controls);
        for _ in 0..10 {
            navigator.update(DT, &keys, &mut camera, &mut controls);
        }

        let second = Vec3::new(10.0, 0.0, 10.0);
        let origin = camera.position();
        let direction = (second - origin).normalize();
        navigator.navigate_to(second, (second - origin).length(), direction, &camera, &controls);
        for _ in 0..120 {
            navigator.update(DT, &keys, &mut camera, &mut controls);
        }
        assert_eq!(controls.target, second);
    }
}
