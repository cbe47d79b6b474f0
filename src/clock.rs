use std::future::Future;
use tokio::time::Instant;

/// Time source for the silence endpoint detector.
///
/// Timers are supplied through this seam rather than read from ambient
/// globals so tests can drive them deterministically (tokio's paused clock
/// flows through `TokioClock` under `#[tokio::test(start_paused = true)]`).
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;

    fn sleep_until(&self, deadline: Instant) -> impl Future<Output = ()> + Send;
}

/// Default clock backed by the tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep_until(&self, deadline: Instant) -> impl Future<Output = ()> + Send {
        tokio::time::sleep_until(deadline)
    }
}
