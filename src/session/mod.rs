//! Recognition session lifecycle.
//!
//! One session = one acquisition of the underlying recognition capability.
//! Sessions are never reused: each capture builds a fresh session, drives it
//! to `Ended` or `Failed`, and discards it.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capability::{RecognitionCapability, SessionConfig};
use crate::protocol::{RecognitionEvent, SessionState};
use crate::{CaptureError, Result};

/// How a start attempt resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The capability is live and delivering events.
    Listening,
    /// A stop request arrived during acquisition; the in-flight start was
    /// dropped and the session never reached `Listening`.
    Aborted,
}

/// Thin lifecycle wrapper around one streaming recognition capability.
///
/// State machine: `Idle → Starting → Listening → Stopping → Ended`, with
/// `Starting`/`Listening → Failed` on any fatal capability error. The one
/// benign error, `no-speech`, is ignored in place.
pub struct RecognitionSession<C: RecognitionCapability> {
    id: Uuid,
    capability: Arc<C>,
    config: SessionConfig,
    state: SessionState,
    events: Option<mpsc::Receiver<RecognitionEvent>>,
    stop_sent: bool,
}

impl<C: RecognitionCapability> RecognitionSession<C> {
    pub fn new(capability: Arc<C>, config: SessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            capability,
            config,
            state: SessionState::Idle,
            events: None,
            stop_sent: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Begin streaming recognition.
    ///
    /// No-op when the session is already starting or listening: at most one
    /// capability acquisition ever happens per session. A stop request
    /// arriving through `cancel` while acquisition is in flight drops the
    /// start future (releasing whatever the capability had acquired) and
    /// resolves to [`StartOutcome::Aborted`].
    pub async fn start(&mut self, cancel: &mut watch::Receiver<bool>) -> Result<StartOutcome> {
        if self.state.is_active() {
            debug!(session_id = %self.id, "start ignored, session already active");
            return Ok(StartOutcome::Listening);
        }

        if *cancel.borrow_and_update() {
            self.state = SessionState::Ended;
            return Ok(StartOutcome::Aborted);
        }

        self.state = SessionState::Starting;
        info!(session_id = %self.id, language = %self.config.language, "starting recognition");

        let capability = self.capability.clone();
        let config = self.config.clone();
        let acquisition = async move { capability.start(&config).await };

        tokio::select! {
            result = acquisition => match result {
                Ok(events) => {
                    self.events = Some(events);
                    self.state = SessionState::Listening;
                    debug!(session_id = %self.id, "recognition listening");
                    Ok(StartOutcome::Listening)
                }
                Err(kind) => {
                    self.state = SessionState::Failed;
                    warn!(session_id = %self.id, code = kind.code(), "recognition failed to start");
                    Err(CaptureError::Recognition { kind })
                }
            },
            _ = cancel.changed() => {
                self.state = SessionState::Ended;
                info!(session_id = %self.id, "acquisition aborted by stop request");
                Ok(StartOutcome::Aborted)
            }
        }
    }

    /// Receive the next raw event, applying lifecycle transitions.
    ///
    /// Returns `None` once the stream is over: after `Ended`, after a fatal
    /// error has moved the session to `Failed`, or when the capability
    /// dropped its sender without confirming shutdown.
    pub async fn next_event(&mut self) -> Option<RecognitionEvent> {
        let events = self.events.as_mut()?;

        match events.recv().await {
            Some(RecognitionEvent::Error(kind)) if !kind.is_fatal() => {
                debug!(session_id = %self.id, code = kind.code(), "ignoring benign recognition error");
                Some(RecognitionEvent::Error(kind))
            }
            Some(RecognitionEvent::Error(kind)) => {
                warn!(session_id = %self.id, code = kind.code(), "recognition error, session failed");
                self.state = SessionState::Failed;
                self.events = None;
                Some(RecognitionEvent::Error(kind))
            }
            Some(RecognitionEvent::Ended) => {
                info!(session_id = %self.id, "recognition ended");
                self.state = SessionState::Ended;
                self.events = None;
                Some(RecognitionEvent::Ended)
            }
            Some(event) => Some(event),
            None => {
                debug!(session_id = %self.id, "event stream closed");
                self.state = SessionState::Ended;
                self.events = None;
                None
            }
        }
    }

    /// Request graceful termination. Always safe to call; repeated calls and
    /// calls on a finished session are no-ops. The session leaves `Stopping`
    /// when the capability confirms with an `Ended` event.
    pub async fn stop(&mut self) {
        if self.stop_sent || !self.state.is_active() {
            return;
        }
        self.stop_sent = true;
        self.state = SessionState::Stopping;
        info!(session_id = %self.id, "stopping recognition");
        self.capability.stop().await;
    }
}
