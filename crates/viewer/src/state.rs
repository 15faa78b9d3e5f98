//! Viewer state: everything the frame loop and input handlers mutate, owned by the app.

use crate::config::ViewerConfig;
use crate::environment::{create_camera, create_scene, prepare_asset};
use crate::navigation::{ControlMode, Navigator};
use crate::quality::QualityController;
use anyhow::Result;
use assets::{AssetLoader, AssetManifest, LoadEvent};
use engine_core::{Clock, FrameScheduler, Scene, SystemTime, TimeSource};
use glam::Vec2;
use input::{DirectionKeys, MouseButton, PointerState};
use picking::PickingWorld;
use renderer::{Camera, LightingRig, OrbitControls, PostProcessing, Renderer, ShadowSettings};
use std::sync::Arc;
use winit::window::Window;

pub const TITLE: &str = "mapview";

/// Top-level state: the fixed-rate scheduler, the wall clock it is driven by,
/// and the viewer it steps.
pub struct ViewerState {
    pub running: bool,
    scheduler: FrameScheduler,
    wall: SystemTime,
    pub(crate) viewer: Viewer,
}

/// Everything one logical step touches.
pub(crate) struct Viewer {
    pub(crate) renderer: Renderer,
    pub(crate) scene: Scene,
    pub(crate) camera: Camera,
    pub(crate) controls: OrbitControls,
    pub(crate) navigator: Navigator,
    pub(crate) keys: DirectionKeys,
    pub(crate) pointer: PointerState,
    lighting: LightingRig,
    post: PostProcessing,
    shadows: ShadowSettings,
    /// Paces camera movement and damping.
    render_clock: Clock,
    /// Measures frame times for the quality controller only.
    perf_clock: Clock,
    controller: QualityController,
    loader: AssetLoader,
    picking: PickingWorld,
    load_reported: bool,
    shown_progress: Option<u32>,
}

impl ViewerState {
    pub async fn new(window: Arc<Window>, config: &ViewerConfig) -> Result<Self> {
        let size = window.inner_size();
        let renderer = Renderer::new(window, &config.lighting, config.vsync).await?;

        let camera = create_camera(size.width, size.height);
        let mut controls = OrbitControls::new(glam::Vec3::ZERO);
        let initial_mode = config.initial_mode.parse::<ControlMode>().unwrap_or_else(|e| {
            log::warn!("{}, starting in orbit mode", e);
            ControlMode::Orbit
        });
        let navigator = Navigator::new(initial_mode, &camera, &mut controls);

        let manifest = AssetManifest::map(&config.asset_dir);
        let loader = AssetLoader::spawn(&manifest)?;

        let viewer = Viewer {
            renderer,
            scene: create_scene(),
            camera,
            controls,
            navigator,
            keys: DirectionKeys::default(),
            pointer: PointerState::new(),
            lighting: config.lighting,
            post: config.post_processing(),
            shadows: ShadowSettings::default(),
            render_clock: Clock::default(),
            perf_clock: Clock::default(),
            controller: QualityController::new(config.quality),
            loader,
            picking: PickingWorld::new(),
            load_reported: false,
            shown_progress: None,
        };

        Ok(Self {
            running: true,
            scheduler: FrameScheduler::at_rate(config.tick_rate_hz),
            wall: SystemTime::new(),
            viewer,
        })
    }

    /// Switch camera controls by token (`"fps"` or `"orbit"`).
    pub fn switch_controls(&mut self, token: &str) -> Result<()> {
        let mode = token.parse::<ControlMode>()?;
        let v = &mut self.viewer;
        v.navigator.switch_mode(mode, &v.camera, &mut v.controls);
        Ok(())
    }

    pub fn mode(&self) -> ControlMode {
        self.viewer.navigator.mode()
    }

    /// Host frame callback: run one logical step if the scheduler says it is due.
    pub fn redraw(&mut self) {
        let now = self.wall.now_ms();
        let mut result = Ok(());
        self.scheduler.tick(now, || result = self.viewer.step(now));

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.viewer.renderer.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory, exiting");
                self.running = false;
            }
            Err(e) => log::warn!("Render error: {}", e),
        }
        self.viewer.renderer.window.request_redraw();
    }

    /// Pick under the pointer and start navigating toward the hit.
    pub(crate) fn navigate_to_pointer(&mut self) {
        let v = &mut self.viewer;
        let size = v.renderer.size;
        let ndc = v.pointer.ndc(Vec2::new(size.width as f32, size.height as f32));
        let ray = v.camera.ray_from_ndc(ndc);
        match v.picking.raycast(ray.origin, ray.direction, v.camera.far) {
            Some(hit) => v
                .navigator
                .navigate_to(hit.point, hit.distance, ray.direction, &v.camera, &v.controls),
            None => log::debug!("Double click hit nothing"),
        }
    }

    pub(crate) fn now(&self) -> std::time::Duration {
        self.wall.now()
    }
}

impl Viewer {
    /// One logical step: loading, quality sampling, input, camera, render.
    fn step(&mut self, now_ms: f64) -> Result<(), wgpu::SurfaceError> {
        let delta = self.render_clock.delta();
        let frame_time = self.perf_clock.delta();

        self.poll_assets(now_ms);

        if let Some(verdict) = self.controller.sample(now_ms, frame_time) {
            self.controller.apply(verdict, &mut self.post, &mut self.shadows);
        }

        self.apply_pointer();
        let synced = self
            .navigator
            .update(delta, &self.keys, &mut self.camera, &mut self.controls);
        if !synced {
            self.controls.update(&mut self.camera, Some(delta));
        }

        self.renderer.render(
            &self.scene,
            &self.camera,
            &self.lighting,
            &mut self.shadows,
            &self.post,
        )
    }

    fn poll_assets(&mut self, now_ms: f64) {
        for event in self.loader.poll() {
            if let LoadEvent::Loaded { entry, mut root } = event {
                prepare_asset(&entry, &mut root);
                if let Err(e) = self.picking.insert_subtree(&root) {
                    log::warn!("{} is not pickable: {}", entry.file, e);
                }
                self.scene.add(root);
            }
        }

        let percent = (self.loader.progress() * 100.0).round() as u32;
        if self.shown_progress != Some(percent) {
            self.shown_progress = Some(percent);
            let title = if self.loader.is_complete() {
                TITLE.to_string()
            } else {
                format!("{TITLE} - loading {percent}%")
            };
            self.renderer.window.set_title(&title);
        }

        if self.loader.is_complete() && !self.load_reported {
            self.load_reported = true;
            self.controller.notify_load_complete(now_ms);
        }
    }

    /// Turn accumulated pointer motion and scroll into orbit-control input.
    fn apply_pointer(&mut self) {
        let drag = self.pointer.take_delta();
        let height = self.renderer.size.height as f32;
        if self.pointer.is_held(MouseButton::Left) {
            self.controls.rotate(drag.x, drag.y, height);
        } else if self.pointer.is_held(MouseButton::Right) {
            self.controls.pan(drag.x, drag.y, height, &self.camera);
        }
        let scroll = self.pointer.take_scroll();
        if scroll != 0.0 {
            self.controls.dolly(scroll);
        }
    }
}
