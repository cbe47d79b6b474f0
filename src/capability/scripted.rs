//! A recognition capability that replays a scripted event sequence.
//!
//! Stands in for a real recognizer wherever one is unavailable: the demo
//! binary builds scripts from command-line utterances, and the tests feed it
//! fixed scenarios with controlled timing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::debug;

use crate::protocol::{RecognitionErrorKind, RecognitionEvent, EVENT_CHANNEL_CAPACITY};

use super::{RecognitionCapability, SessionConfig};

/// One step of a capability script: wait, then deliver.
#[derive(Debug, Clone)]
pub struct ScriptStep {
    pub delay: Duration,
    pub event: RecognitionEvent,
}

impl ScriptStep {
    pub fn new(delay: Duration, event: RecognitionEvent) -> Self {
        Self { delay, event }
    }

    /// A partial hypothesis after the given delay.
    pub fn partial(delay: Duration, text: &str) -> Self {
        Self::new(delay, RecognitionEvent::Partial(text.to_string()))
    }

    /// A finalized span after the given delay.
    pub fn finalized(delay: Duration, text: &str) -> Self {
        Self::new(delay, RecognitionEvent::Final(text.to_string()))
    }
}

#[derive(Default)]
struct ScriptedState {
    script: Vec<ScriptStep>,
    start_delay: Duration,
    start_failure: Option<RecognitionErrorKind>,
    /// Deliver `Ended` on its own once the script is exhausted, instead of
    /// waiting for a stop request.
    end_after_script: bool,
    /// Stop line to the currently live stream, if any.
    active_stop: Option<watch::Sender<bool>>,
}

/// Replays a fixed script of recognition events.
///
/// Cloning shares the underlying state, so a test can keep one handle for
/// assertions while the engine drives the other.
#[derive(Clone, Default)]
pub struct ScriptedCapability {
    state: Arc<Mutex<ScriptedState>>,
    start_count: Arc<AtomicUsize>,
    stop_count: Arc<AtomicUsize>,
}

impl ScriptedCapability {
    pub fn new(script: Vec<ScriptStep>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptedState {
                script,
                ..ScriptedState::default()
            })),
            start_count: Arc::new(AtomicUsize::new(0)),
            stop_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delay startup, e.g. to leave a window for stop-during-starting.
    pub async fn set_start_delay(&self, delay: Duration) {
        self.state.lock().await.start_delay = delay;
    }

    /// Fail the next start with the given kind.
    pub async fn fail_start_with(&self, kind: RecognitionErrorKind) {
        self.state.lock().await.start_failure = Some(kind);
    }

    /// Deliver `Ended` as soon as the script runs out.
    pub async fn end_after_script(&self) {
        self.state.lock().await.end_after_script = true;
    }

    /// How many times `start` has actually acquired a stream.
    pub fn start_count(&self) -> usize {
        self.start_count.load(Ordering::SeqCst)
    }

    /// How many times `stop` has been requested.
    pub fn stop_count(&self) -> usize {
        self.stop_count.load(Ordering::SeqCst)
    }
}

impl RecognitionCapability for ScriptedCapability {
    async fn start(
        &self,
        _config: &SessionConfig,
    ) -> Result<mpsc::Receiver<RecognitionEvent>, RecognitionErrorKind> {
        let (script, start_delay, start_failure, end_after_script) = {
            let state = self.state.lock().await;
            (
                state.script.clone(),
                state.start_delay,
                state.start_failure,
                state.end_after_script,
            )
        };

        // Simulated acquisition. Dropping the future here is the abort path:
        // nothing has been spawned yet, so nothing leaks.
        if !start_delay.is_zero() {
            tokio::time::sleep(start_delay).await;
        }

        if let Some(kind) = start_failure {
            debug!(code = kind.code(), "scripted capability refusing to start");
            return Err(kind);
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        self.state.lock().await.active_stop = Some(stop_tx);
        self.start_count.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            for step in script {
                tokio::select! {
                    _ = tokio::time::sleep(step.delay) => {
                        let is_ended = matches!(step.event, RecognitionEvent::Ended);
                        if tx.send(step.event).await.is_err() {
                            return;
                        }
                        if is_ended {
                            return;
                        }
                    }
                    _ = stop_rx.changed() => {
                        let _ = tx.send(RecognitionEvent::Ended).await;
                        return;
                    }
                }
            }

            if !end_after_script {
                // Script exhausted: hold the stream open until stopped, like
                // a recognizer waiting on a quiet microphone.
                if !*stop_rx.borrow_and_update() {
                    let _ = stop_rx.changed().await;
                }
            }
            let _ = tx.send(RecognitionEvent::Ended).await;
        });

        Ok(rx)
    }

    async fn stop(&self) {
        self.stop_count.fetch_add(1, Ordering::SeqCst);
        if let Some(stop) = self.state.lock().await.active_stop.as_ref() {
            let _ = stop.send(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_replay_in_order() {
        let capability = ScriptedCapability::new(vec![
            ScriptStep::partial(Duration::from_millis(0), "one"),
            ScriptStep::finalized(Duration::from_millis(0), "one liter"),
            ScriptStep::new(Duration::from_millis(0), RecognitionEvent::Ended),
        ]);

        let mut rx = capability.start(&SessionConfig::default()).await.unwrap();
        assert_eq!(
            rx.recv().await,
            Some(RecognitionEvent::Partial("one".to_string()))
        );
        assert_eq!(
            rx.recv().await,
            Some(RecognitionEvent::Final("one liter".to_string()))
        );
        assert_eq!(rx.recv().await, Some(RecognitionEvent::Ended));
        assert_eq!(capability.start_count(), 1);
    }

    #[tokio::test]
    async fn test_start_failure() {
        let capability = ScriptedCapability::new(vec![]);
        capability
            .fail_start_with(RecognitionErrorKind::PermissionDenied)
            .await;

        let result = capability.start(&SessionConfig::default()).await;
        assert_eq!(result.err(), Some(RecognitionErrorKind::PermissionDenied));
        assert_eq!(capability.start_count(), 0);
    }

    #[tokio::test]
    async fn test_stop_delivers_ended() {
        let capability = ScriptedCapability::new(vec![ScriptStep::partial(
            Duration::from_millis(0),
            "hello",
        )]);

        let mut rx = capability.start(&SessionConfig::default()).await.unwrap();
        assert_eq!(
            rx.recv().await,
            Some(RecognitionEvent::Partial("hello".to_string()))
        );

        capability.stop().await;
        assert_eq!(rx.recv().await, Some(RecognitionEvent::Ended));
    }
}
