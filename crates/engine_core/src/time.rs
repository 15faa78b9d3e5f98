//! Time sources and delta clocks for the frame loop.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Something that can report monotonic time since an arbitrary fixed origin.
pub trait TimeSource {
    /// Time elapsed since this source's origin.
    fn now(&self) -> Duration;

    /// Current time in milliseconds (float), the unit the frame scheduler works in.
    fn now_ms(&self) -> f64 {
        self.now().as_secs_f64() * 1000.0
    }
}

/// Wall-clock time source backed by `Instant`.
#[derive(Debug, Clone, Copy)]
pub struct SystemTime {
    origin: Instant,
}

impl Default for SystemTime {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for SystemTime {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven time source. Clones share the same underlying time, so a test can
/// hold one handle and advance it while clocks read through another.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    now: Rc<Cell<Duration>>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Move time forward by a number of milliseconds.
    pub fn advance_ms(&self, ms: f64) {
        self.advance(Duration::from_secs_f64(ms / 1000.0));
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Delta clock: each call to [`Clock::delta`] returns the seconds elapsed since the
/// previous call (or since the clock was created, for the first call).
///
/// Clocks never share sampling state, even when they read the same [`TimeSource`].
#[derive(Debug, Clone)]
pub struct Clock<S: TimeSource = SystemTime> {
    source: S,
    last: Duration,
}

impl Default for Clock<SystemTime> {
    fn default() -> Self {
        Self::new(SystemTime::new())
    }
}

impl<S: TimeSource> Clock<S> {
    /// Create a clock that starts measuring now.
    pub fn new(source: S) -> Self {
        let last = source.now();
        Self { source, last }
    }

    /// Seconds since the previous sample.
    pub fn delta(&mut self) -> f32 {
        let now = self.source.now();
        let delta = now.saturating_sub(self.last);
        self.last = now;
        delta.as_secs_f32()
    }
}
