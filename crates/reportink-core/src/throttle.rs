//! Frame-rate coalescing for high-frequency events.

use std::time::Duration;

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
pub use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
pub use std::time::Instant;

/// Default minimum interval between runs, about one animation frame.
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

/// Runs expensive work at most once per interval.
///
/// The first request after a quiet period runs immediately. Requests that
/// arrive too soon are folded into a single pending run that [`poll`]
/// releases once the interval has elapsed. Callers supply the clock so
/// behaviour is deterministic.
///
/// [`poll`]: FrameThrottle::poll
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    interval: Duration,
    last_run: Option<Instant>,
    pending: bool,
}

impl Default for FrameThrottle {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_FRAME_INTERVAL_MS))
    }
}

impl FrameThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
            pending: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn is_due(&self, now: Instant) -> bool {
        self.last_run
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Ask to run. Returns `true` if the caller should run now; otherwise
    /// the run is deferred until a later [`poll`](Self::poll).
    pub fn request(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.last_run = Some(now);
            self.pending = false;
            true
        } else {
            self.pending = true;
            false
        }
    }

    /// Release a deferred run if its interval has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.pending && self.is_due(now) {
            self.last_run = Some(now);
            self.pending = false;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Drop any deferred run.
    pub fn cancel(&mut self) {
        self.pending = false;
    }
}
