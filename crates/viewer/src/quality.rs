//! Runtime quality fallback: measure frame time once after loading settles and
//! drop the ambient-occlusion sample count if the machine cannot keep up.

use renderer::{PostProcessing, ShadowSettings};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Delay after loading completes before sampling starts.
    pub warmup_ms: f64,
    /// Frame times averaged for the single verdict.
    pub sample_count: usize,
    /// Average frame time (seconds) above which AO is downgraded.
    pub threshold_seconds: f32,
    pub downgraded_ao_samples: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            warmup_ms: 2000.0,
            sample_count: 100,
            threshold_seconds: 0.025,
            downgraded_ao_samples: 8,
        }
    }
}

/// Fixed-size accumulator of frame times. Produces its average once, when it
/// fills, and ignores everything after that.
#[derive(Debug, Clone)]
pub struct FrameSampleWindow {
    capacity: usize,
    count: usize,
    accumulator: f32,
    average: Option<f32>,
}

impl FrameSampleWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            count: 0,
            accumulator: 0.0,
            average: None,
        }
    }

    /// Add one sample. Returns the average on the push that fills the window.
    pub fn push(&mut self, delta: f32) -> Option<f32> {
        if self.average.is_some() {
            return None;
        }
        self.accumulator += delta;
        self.count += 1;
        if self.count < self.capacity {
            return None;
        }
        let average = self.accumulator / self.count as f32;
        self.average = Some(average);
        Some(average)
    }

    pub fn average(&self) -> Option<f32> {
        self.average
    }

    pub fn len(&self) -> usize {
        self.count
    }
}

/// Outcome of a full sample window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityVerdict {
    pub average: f32,
    /// Whether AO should drop to the downgraded sample count.
    pub downgrade: bool,
}

#[derive(Debug, Clone)]
pub struct QualityController {
    config: QualityConfig,
    window: FrameSampleWindow,
    /// Wall-clock time (ms) at which loading reported complete.
    loaded_at: Option<f64>,
}

impl QualityController {
    pub fn new(config: QualityConfig) -> Self {
        Self {
            window: FrameSampleWindow::new(config.sample_count),
            config,
            loaded_at: None,
        }
    }

    /// Start the warm-up countdown. Only the first call counts.
    pub fn notify_load_complete(&mut self, now_ms: f64) {
        if self.loaded_at.is_none() {
            self.loaded_at = Some(now_ms);
        }
    }

    pub fn is_warm(&self, now_ms: f64) -> bool {
        self.loaded_at
            .is_some_and(|at| now_ms >= at + self.config.warmup_ms)
    }

    /// Record one frame time. Returns a verdict exactly once, when the window fills.
    pub fn sample(&mut self, now_ms: f64, delta: f32) -> Option<QualityVerdict> {
        if !self.is_warm(now_ms) {
            return None;
        }
        self.window.push(delta).map(|average| QualityVerdict {
            average,
            downgrade: average > self.config.threshold_seconds,
        })
    }

    pub fn average(&self) -> Option<f32> {
        self.window.average()
    }

    pub fn sample_count(&self) -> usize {
        self.window.len()
    }

    /// Freeze the shadow map and, if the verdict says so, lower the AO sample count.
    pub fn apply(&self, verdict: QualityVerdict, post: &mut PostProcessing, shadows: &mut ShadowSettings) {
        shadows.freeze();
        if verdict.downgrade {
            log::info!(
                "Average frame time {:.1} ms over {} frames: AO samples {} -> {}",
                verdict.average * 1000.0,
                self.window.len(),
                post.ao.samples,
                self.config.downgraded_ao_samples
            );
            post.set_ao_samples(self.config.downgraded_ao_samples);
        } else {
            log::info!(
                "Average frame time {:.1} ms over {} frames: keeping quality",
                verdict.average * 1000.0,
                self.window.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warm_controller() -> QualityController {
        let mut controller = QualityController::new(QualityConfig::default());
        controller.notify_load_complete(0.0);
        controller
    }

    fn feed(controller: &mut QualityController, now_ms: f64, delta: f32, n: usize) -> Vec<QualityVerdict> {
        (0..n).filter_map(|_| controller.sample(now_ms, delta)).collect()
    }

    #[test]
    fn window_averages_once_and_freezes() {
        let mut window = FrameSampleWindow::new(4);
        assert_eq!(window.push(1.0), None);
        assert_eq!(window.push(2.0), None);
        assert_eq!(window.push(3.0), None);
        assert_eq!(window.push(6.0), Some(3.0));
        assert_eq!(window.push(100.0), None);
        assert_eq!(window.average(), Some(3.0));
        assert_eq!(window.len(), 4);
    }

    #[test]
    fn slow_frames_trigger_downgrade() {
        let mut controller = warm_controller();
        let verdicts = feed(&mut controller, 5000.0, 0.030, 100);
        assert_eq!(verdicts.len(), 1);
        assert!(verdicts[0].downgrade);
        assert!((controller.average().unwrap() - 0.030).abs() < 1e-5);
    }

    #[test]
    fn fast_frames_keep_quality() {
        let mut controller = warm_controller();
        let verdicts = feed(&mut controller, 5000.0, 0.010, 100);
        assert_eq!(verdicts.len(), 1);
        assert!(!verdicts[0].downgrade);
    }

    #[test]
    fn ninety_nine_samples_decide_nothing() {
        let mut controller = warm_controller();
        assert!(feed(&mut controller, 5000.0, 0.5, 99).is_empty());
        assert_eq!(controller.average(), None);
    }

    #[test]
    fn verdict_fires_at_most_once() {
        let mut controller = warm_controller();
        let verdicts = feed(&mut controller, 5000.0, 0.040, 1000);
        assert_eq!(verdicts.len(), 1);
    }

    #[test]
    fn nothing_is_sampled_before_warm_up() {
        let mut controller = QualityController::new(QualityConfig::default());
        assert!(feed(&mut controller, 10_000.0, 0.5, 200).is_empty());
        assert_eq!(controller.sample_count(), 0);

        controller.notify_load_complete(1000.0);
        assert!(!controller.is_warm(2999.0));
        assert!(feed(&mut controller, 2999.0, 0.5, 200).is_empty());
        assert_eq!(controller.sample_count(), 0);
        assert!(controller.is_warm(3000.0));
    }

    #[test]
    fn later_load_signals_do_not_restart_warm_up() {
        let mut controller = QualityController::new(QualityConfig::default());
        controller.notify_load_complete(0.0);
        controller.notify_load_complete(10_000.0);
        assert!(controller.is_warm(2000.0));
    }

    #[test]
    fn apply_freezes_shadows_and_downgrades_ao() {
        let controller = warm_controller();
        let mut post = PostProcessing::default();
        let mut shadows = ShadowSettings::default();

        controller.apply(QualityVerdict { average: 0.01, downgrade: false }, &mut post, &mut shadows);
        assert!(!shadows.auto_update);
        assert_eq!(post.ao.samples, 16);

        controller.apply(QualityVerdict { average: 0.03, downgrade: true }, &mut post, &mut shadows);
        assert_eq!(post.ao.samples, 8);
    }
}
