//! Silence endpointing: deciding a capture has ended because the speaker
//! went quiet.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::clock::{Clock, TokioClock};

/// Default quiet period before a session is endpointed.
pub const DEFAULT_SILENCE_WINDOW: Duration = Duration::from_millis(1500);

/// Watches event activity and decides when the speaker has gone quiet.
///
/// A single countdown deadline is re-armed by every partial or final result;
/// resetting replaces the deadline rather than stacking timers. When the
/// deadline passes with no further activity the detector fires exactly once,
/// and the capture loop turns that into a session stop. Manual stop and
/// terminal events disarm it.
#[derive(Debug)]
pub struct SilenceEndpointDetector<C: Clock = TokioClock> {
    clock: C,
    window: Duration,
    deadline: Option<Instant>,
    fired: bool,
}

impl SilenceEndpointDetector<TokioClock> {
    pub fn new(window: Duration) -> Self {
        Self::with_clock(window, TokioClock)
    }
}

impl<C: Clock> SilenceEndpointDetector<C> {
    pub fn with_clock(window: Duration, clock: C) -> Self {
        Self {
            clock,
            window,
            deadline: None,
            fired: false,
        }
    }

    /// Re-arm the countdown: a result event just arrived.
    pub fn reset(&mut self) {
        if self.fired {
            return;
        }
        self.deadline = Some(self.clock.now() + self.window);
    }

    /// Cancel the pending countdown without firing.
    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    /// Whether a countdown is outstanding.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some() && !self.fired
    }

    /// Resolves when the armed deadline passes. Pends forever while unarmed,
    /// so it can sit in a `select!` guarded by [`is_armed`](Self::is_armed).
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => self.clock.sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }

    /// Mark the deadline as having fired.
    ///
    /// Returns `true` only on the first firing per session, the rising edge
    /// on which the capture loop requests stop.
    pub fn fire(&mut self) -> bool {
        self.deadline = None;
        if self.fired {
            return false;
        }
        self.fired = true;
        debug!(window_ms = self.window.as_millis() as u64, "silence window elapsed");
        true
    }
}
