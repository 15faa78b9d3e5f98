//! Fixed-rate frame gating for the render loop.

/// Default logical rate of the viewer loop.
pub const DEFAULT_TICK_RATE_HZ: f64 = 60.0;

/// Runs at most one logical step per host callback, spaced by a fixed interval.
///
/// The host (winit redraw, browser rAF, a test loop) calls [`FrameScheduler::tick`]
/// as often as it likes. A step runs only once the wall-clock deadline has passed;
/// the deadline then advances by one interval. If the deadline is still in the
/// past after advancing (the host stalled), it snaps to `now` so a stall costs a
/// single step instead of a burst of queued ones.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    interval_ms: f64,
    time_target: f64,
    steps: u64,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::at_rate(DEFAULT_TICK_RATE_HZ)
    }
}

impl FrameScheduler {
    /// Create a scheduler with an explicit step interval in milliseconds.
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms: interval_ms.max(f64::EPSILON),
            time_target: 0.0,
            steps: 0,
        }
    }

    /// Create a scheduler stepping `hz` times per second.
    pub fn at_rate(hz: f64) -> Self {
        Self::new(1000.0 / hz.max(f64::EPSILON))
    }

    /// Whether a step would run at `now_ms`.
    pub fn is_due(&self, now_ms: f64) -> bool {
        now_ms >= self.time_target
    }

    /// Run `step` if the deadline has passed. Returns whether it ran.
    pub fn tick<F: FnOnce()>(&mut self, now_ms: f64, step: F) -> bool {
        if !self.is_due(now_ms) {
            return false;
        }

        step();
        self.steps += 1;

        self.time_target += self.interval_ms;
        if now_ms >= self.time_target {
            self.time_target = now_ms;
        }
        true
    }

    /// Current deadline in milliseconds.
    pub fn time_target(&self) -> f64 {
        self.time_target
    }

    /// Step interval in milliseconds.
    pub fn interval(&self) -> f64 {
        self.interval_ms
    }

    /// Number of steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }
}
