//! Keyboard and pointer input for the viewer.

use glam::{Vec2, Vec3};
use std::collections::HashSet;
use std::time::Duration;

/// Two left clicks closer than this count as a double click.
pub const DOUBLE_CLICK_INTERVAL: Duration = Duration::from_millis(300);
/// Maximum pointer travel, in physical pixels, between the two clicks.
pub const DOUBLE_CLICK_SLOP: f32 = 4.0;

/// One of the four movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// WASD and arrow-key bindings.
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::KeyW | KeyCode::ArrowUp => Some(Direction::Up),
            KeyCode::KeyS | KeyCode::ArrowDown => Some(Direction::Down),
            KeyCode::KeyA | KeyCode::ArrowLeft => Some(Direction::Left),
            KeyCode::KeyD | KeyCode::ArrowRight => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Which directions are currently held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl DirectionKeys {
    pub fn set(&mut self, direction: Direction, held: bool) {
        match direction {
            Direction::Up => self.up = held,
            Direction::Down => self.down = held,
            Direction::Left => self.left = held,
            Direction::Right => self.right = held,
        }
    }

    /// Apply a key event. Returns false if the key is not a direction binding.
    pub fn process_key(&mut self, key: KeyCode, state: ElementState) -> bool {
        match Direction::from_key(key) {
            Some(direction) => {
                self.set(direction, state.is_pressed());
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Camera-local movement direction: `-Z` forward, `+X` right, `y` always 0.
    /// Zero when nothing is held or opposing keys cancel, unit length otherwise.
    pub fn movement_intent(&self) -> Vec3 {
        let x = self.right as i32 - self.left as i32;
        let z = self.down as i32 - self.up as i32;
        Vec3::new(x as f32, 0.0, z as f32).normalize_or_zero()
    }
}

/// Tracks pointer position, drag deltas and double clicks.
#[derive(Debug, Default)]
pub struct PointerState {
    /// Buttons currently held.
    held: HashSet<MouseButton>,
    /// Cursor position in window coordinates.
    position: Vec2,
    /// Cursor movement since the last call to `take_delta`.
    accumulated_delta: Vec2,
    /// Scroll accumulated since the last call to `take_scroll`.
    accumulated_scroll: f32,
    /// Time and position of the last left press, for double-click detection.
    last_click: Option<(Duration, Vec2)>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process cursor position update.
    pub fn process_cursor_position(&mut self, position: (f64, f64)) {
        let position = Vec2::new(position.0 as f32, position.1 as f32);
        self.accumulated_delta += position - self.position;
        self.position = position;
    }

    /// Process a mouse button event at time `now` (any monotonic origin).
    /// Returns true when this press completes a double click.
    pub fn process_mouse_button(
        &mut self,
        button: MouseButton,
        state: ElementState,
        now: Duration,
    ) -> bool {
        match state {
            ElementState::Pressed => {
                self.held.insert(button);
                // Drags start fresh from the press position.
                self.accumulated_delta = Vec2::ZERO;
                if button == MouseButton::Left {
                    return self.register_click(now);
                }
                false
            }
            ElementState::Released => {
                self.held.remove(&button);
                false
            }
        }
    }

    fn register_click(&mut self, now: Duration) -> bool {
        if let Some((at, position)) = self.last_click {
            let quick = now.saturating_sub(at) <= DOUBLE_CLICK_INTERVAL;
            let still = position.distance(self.position) <= DOUBLE_CLICK_SLOP;
            if quick && still {
                self.last_click = None;
                return true;
            }
        }
        self.last_click = Some((now, self.position));
        false
    }

    /// Process a wheel event in lines (positive scrolls away from the user).
    pub fn process_scroll(&mut self, lines: f32) {
        self.accumulated_scroll += lines;
    }

    pub fn is_held(&self, button: MouseButton) -> bool {
        self.held.contains(&button)
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Movement since the last call.
    pub fn take_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.accumulated_delta)
    }

    /// Scroll since the last call.
    pub fn take_scroll(&mut self) -> f32 {
        std::mem::take(&mut self.accumulated_scroll)
    }

    /// Pointer position in normalized device coordinates for a window of `size`.
    pub fn ndc(&self, size: Vec2) -> Vec2 {
        let size = size.max(Vec2::ONE);
        Vec2::new(
            self.position.x / size.x * 2.0 - 1.0,
            -(self.position.y / size.y) * 2.0 + 1.0,
        )
    }
}

// Re-export for convenience
pub use winit::event::{ElementState, MouseButton};
pub use winit::keyboard::KeyCode;

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(up: bool, down: bool, left: bool, right: bool) -> DirectionKeys {
        DirectionKeys {
            up,
            down,
            left,
            right,
        }
    }

    #[test]
    fn no_keys_means_no_intent() {
        assert_eq!(DirectionKeys::default().movement_intent(), Vec3::ZERO);
    }

    #[test]
    fn single_key_gives_unit_axis() {
        assert_eq!(keys(true, false, false, false).movement_intent(), -Vec3::Z);
        assert_eq!(keys(false, false, false, true).movement_intent(), Vec3::X);
    }

    #[test]
    fn diagonal_is_normalized() {
        let intent = keys(true, false, true, false).movement_intent();
        assert!((intent.length() - 1.0).abs() < 1e-6);
        assert!(intent.x < 0.0 && intent.z < 0.0);
        assert_eq!(intent.y, 0.0);
    }

    #[test]
    fn opposing_keys_cancel_on_their_axis() {
        assert_eq!(keys(true, true, false, false).movement_intent(), Vec3::ZERO);
        let strafe = keys(true, true, false, true).movement_intent();
        assert_eq!(strafe, Vec3::X);
        assert_eq!(keys(true, true, true, true).movement_intent(), Vec3::ZERO);
    }

    #[test]
    fn wasd_and_arrows_share_bindings() {
        let mut k = DirectionKeys::default();
        assert!(k.process_key(KeyCode::KeyW, ElementState::Pressed));
        assert!(k.up);
        assert!(k.process_key(KeyCode::ArrowUp, ElementState::Released));
        assert!(!k.up);
        assert!(k.process_key(KeyCode::ArrowLeft, ElementState::Pressed));
        assert!(k.left);
        assert!(!k.process_key(KeyCode::KeyQ, ElementState::Pressed));
    }

    #[test]
    fn two_quick_clicks_in_place_are_a_double_click() {
        let mut p = PointerState::new();
        p.process_cursor_position((100.0, 100.0));
        let t0 = Duration::from_millis(1000);
        assert!(!p.process_mouse_button(MouseButton::Left, ElementState::Pressed, t0));
        p.process_mouse_button(MouseButton::Left, ElementState::Released, t0);
        assert!(p.process_mouse_button(
            MouseButton::Left,
            ElementState::Pressed,
            t0 + Duration::from_millis(200)
        ));
        // A third click starts a new pair.
        assert!(!p.process_mouse_button(
            MouseButton::Left,
            ElementState::Pressed,
            t0 + Duration::from_millis(300)
        ));
    }

    #[test]
    fn slow_or_moved_clicks_are_not_double() {
        let mut p = PointerState::new();
        let t0 = Duration::from_millis(0);
        p.process_mouse_button(MouseButton::Left, ElementState::Pressed, t0);
        assert!(!p.process_mouse_button(
            MouseButton::Left,
            ElementState::Pressed,
            t0 + Duration::from_millis(800)
        ));
        p.process_cursor_position((50.0, 0.0));
        assert!(!p.process_mouse_button(
            MouseButton::Left,
            ElementState::Pressed,
            t0 + Duration::from_millis(900)
        ));
    }

    #[test]
    fn ndc_maps_corners_and_center() {
        let mut p = PointerState::new();
        let size = Vec2::new(800.0, 600.0);
        p.process_cursor_position((400.0, 300.0));
        assert!(p.ndc(size).length() < 1e-6);
        p.process_cursor_position((0.0, 0.0));
        assert_eq!(p.ndc(size), Vec2::new(-1.0, 1.0));
    }

    #[test]
    fn pointer_delta_is_consumed() {
        let mut p = PointerState::new();
        p.process_cursor_position((10.0, 10.0));
        p.take_delta();
        p.process_cursor_position((15.0, 12.0));
        assert_eq!(p.take_delta(), Vec2::new(5.0, 2.0));
        assert_eq!(p.take_delta(), Vec2::ZERO);
    }
}
