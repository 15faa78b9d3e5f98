//! mapview: interactive 3D map viewer with orbit and first-person camera controls.

mod config;
mod environment;
mod events;
mod navigation;
mod quality;
mod state;

use anyhow::Result;
use state::ViewerState;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

struct App {
    state: Option<ViewerState>,
}

impl App {
    fn new() -> Self {
        Self { state: None }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_none() {
            let config = config::ViewerConfig::load();
            let window_attrs = Window::default_attributes()
                .with_title(state::TITLE)
                .with_inner_size(winit::dpi::LogicalSize::new(config.window_width, config.window_height));

            let window = match event_loop.create_window(window_attrs) {
                Ok(w) => Arc::new(w),
                Err(e) => {
                    log::error!("Failed to create window: {}", e);
                    event_loop.exit();
                    return;
                }
            };

            match pollster::block_on(ViewerState::new(window.clone(), &config)) {
                Ok(s) => {
                    log::info!("Viewer ready in {} mode", s.mode());
                    self.state = Some(s);
                    window.request_redraw();
                }
                Err(e) => {
                    log::error!("Failed to initialize viewer: {:#}", e);
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(state) = &mut self.state {
            if state.handle_window_event(event) || !state.running {
                event_loop.exit();
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("mapview");
    println!("  Left drag  - rotate        Right drag - pan");
    println!("  Wheel      - zoom          Double click - fly to point");
    println!("  WASD/Arrows - move (first person)");
    println!("  F1 - first person          F2 - orbit          Esc - quit");

    let event_loop = EventLoop::new()?;
    // Poll so the scheduler sees every host callback; it gates steps itself.
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app)?;

    Ok(())
}
