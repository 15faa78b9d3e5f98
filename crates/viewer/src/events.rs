//! Window event handling for ViewerState.

use crate::navigation::ControlMode;
use crate::ViewerState;
use winit::event::{MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Pixels per wheel "line" for touchpads reporting pixel deltas.
const PIXELS_PER_LINE: f32 = 40.0;

impl ViewerState {
    /// Handle a window event. Returns true if the app should exit.
    pub(crate) fn handle_window_event(&mut self, event: WindowEvent) -> bool {
        match event {
            WindowEvent::CloseRequested => {
                self.running = false;
                true
            }
            WindowEvent::Resized(size) => {
                self.viewer.renderer.resize(size);
                self.viewer.camera.set_aspect(size.width, size.height);
                false
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    // Held keys only move the camera in first-person mode.
                    self.viewer.keys.process_key(key, event.state);

                    if event.state.is_pressed() && !event.repeat {
                        let token = match key {
                            KeyCode::F1 => Some(ControlMode::FirstPerson.as_str()),
                            KeyCode::F2 => Some(ControlMode::Orbit.as_str()),
                            _ => None,
                        };
                        if let Some(token) = token {
                            if let Err(e) = self.switch_controls(token) {
                                log::warn!("{}", e);
                            }
                        }
                        if key == KeyCode::Escape {
                            self.running = false;
                            return true;
                        }
                    }
                }
                false
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.viewer.pointer.process_cursor_position((position.x, position.y));
                false
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let now = self.now();
                if self.viewer.pointer.process_mouse_button(button, state, now) {
                    self.navigate_to_pointer();
                }
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                self.viewer.pointer.process_scroll(lines);
                false
            }
            WindowEvent::Focused(false) => {
                self.viewer.keys.clear();
                false
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                !self.running
            }
            _ => false,
        }
    }
}
