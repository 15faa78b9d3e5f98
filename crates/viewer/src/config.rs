//! Viewer configuration (window, pacing, quality, lighting, post-processing).
//! Loaded from mapview.ron at startup.

use crate::quality::QualityConfig;
use renderer::{AoParameters, BloomParameters, DenoiseParameters, LightingRig, PostProcessing};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "mapview.ron";

/// Persistent viewer settings. Every field falls back to its default when missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Window width in logical pixels.
    pub window_width: u32,
    /// Window height in logical pixels.
    pub window_height: u32,
    pub vsync: bool,
    /// Directory holding the map's `.glb` files.
    pub asset_dir: PathBuf,
    /// `"orbit"` or `"fps"`.
    pub initial_mode: String,
    /// Logical steps per second.
    pub tick_rate_hz: f64,
    pub quality: QualityConfig,
    pub lighting: LightingRig,
    pub ao: AoParameters,
    pub denoise: DenoiseParameters,
    pub bloom: BloomParameters,
    /// Linear tone-mapping exposure.
    pub exposure: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            vsync: true,
            asset_dir: PathBuf::from("assets"),
            initial_mode: String::from("orbit"),
            tick_rate_hz: engine_core::DEFAULT_TICK_RATE_HZ,
            quality: QualityConfig::default(),
            lighting: LightingRig::default(),
            ao: AoParameters::default(),
            denoise: DenoiseParameters::default(),
            bloom: BloomParameters::default(),
            exposure: 1.16,
        }
    }
}

impl ViewerConfig {
    /// Load config from `mapview.ron` in the current directory. If the file is missing or
    /// invalid, returns default config.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(data) => Self::parse(&data).unwrap_or_else(|e| {
                log::warn!("Invalid config at {:?}: {}, using defaults", path, e);
                Self::default()
            }),
            Err(_) => {
                log::info!("No config at {:?}, using defaults", path);
                Self::default()
            }
        }
    }

    pub fn parse(data: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(data)
    }

    pub fn post_processing(&self) -> PostProcessing {
        PostProcessing::new(self.ao, self.denoise, self.bloom, self.exposure)
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = ViewerConfig::parse(
            "(window_width: 800, initial_mode: \"fps\", quality: (sample_count: 50))",
        )
        .unwrap();
        assert_eq!(config.window_width, 800);
        assert_eq!(config.window_height, 720);
        assert_eq!(config.initial_mode, "fps");
        assert_eq!(config.quality.sample_count, 50);
        assert_eq!(config.quality.warmup_ms, 2000.0);
        assert_eq!(config.ao.samples, 16);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        assert!(ViewerConfig::parse("(window_width: \"wide\")").is_err());
        let config = ViewerConfig::load_from(Path::new("no/such/mapview.ron"));
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn defaults_round_trip_through_ron() {
        let config = ViewerConfig::default();
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        assert_eq!(ViewerConfig::parse(&text).unwrap(), config);
    }

    #[test]
    fn post_processing_uses_configured_blocks() {
        let mut config = ViewerConfig::default();
        config.ao.samples = 12;
        config.exposure = 1.5;
        let post = config.post_processing();
        assert_eq!(post.ao.samples, 12);
        assert_eq!(post.exposure, 1.5);
        assert!(!post.bloom.enabled);
    }
}
