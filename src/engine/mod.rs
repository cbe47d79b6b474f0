//! The capture engine: one logical capture slot wiring a recognition
//! session's event stream into transcript accumulation, silence endpointing,
//! and normalization, with a correction feedback loop on the side.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capability::{RecognitionCapability, SessionConfig};
use crate::clock::{Clock, TokioClock};
use crate::endpoint::{SilenceEndpointDetector, DEFAULT_SILENCE_WINDOW};
use crate::learner::CorrectionLearner;
use crate::normalize::normalize;
use crate::protocol::{CaptureOutcome, EndReason, LiveTranscript, RecognitionEvent};
use crate::session::{RecognitionSession, StartOutcome};
use crate::store::{CorrectionStore, KeyValueStore};
use crate::transcript::TranscriptAccumulator;
use crate::{CaptureError, Result};

/// Engine-level configuration for a capture.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Per-session options forwarded to the capability.
    pub session: SessionConfig,
    /// Quiet period after which the session is endpointed.
    pub silence_window: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            silence_window: DEFAULT_SILENCE_WINDOW,
        }
    }
}

struct ActiveCapture {
    session_id: Uuid,
    stop: watch::Sender<bool>,
    done: JoinHandle<Result<CaptureOutcome>>,
}

/// Streaming voice capture engine.
///
/// Owns one logical capture slot: starting while a capture is live is a
/// no-op that returns the existing session id, and starting after a capture
/// finished first settles that capture's teardown so two sessions never hold
/// the microphone at once. The correction dictionary is shared across
/// captures and grows via [`learn_from_edit`](Self::learn_from_edit).
pub struct CaptureEngine<C, S, K = TokioClock>
where
    C: RecognitionCapability,
    S: KeyValueStore,
    K: Clock + Clone,
{
    capability: Arc<C>,
    store: Arc<CorrectionStore<S>>,
    config: CaptureConfig,
    clock: K,
    active: Mutex<Option<ActiveCapture>>,
}

impl<C, S> CaptureEngine<C, S, TokioClock>
where
    C: RecognitionCapability,
    S: KeyValueStore,
{
    pub fn new(capability: C, store: CorrectionStore<S>, config: CaptureConfig) -> Self {
        Self::with_clock(capability, store, config, TokioClock)
    }
}

impl<C, S, K> CaptureEngine<C, S, K>
where
    C: RecognitionCapability,
    S: KeyValueStore,
    K: Clock + Clone,
{
    pub fn with_clock(
        capability: C,
        store: CorrectionStore<S>,
        config: CaptureConfig,
        clock: K,
    ) -> Self {
        Self {
            capability: Arc::new(capability),
            store: Arc::new(store),
            config,
            clock,
            active: Mutex::new(None),
        }
    }

    /// The shared correction dictionary.
    pub fn store(&self) -> &Arc<CorrectionStore<S>> {
        &self.store
    }

    /// Start a capture, delivering live transcript updates to `updates`.
    ///
    /// Returns the session id. If a capture is already running this is a
    /// no-op returning the running session's id; no second capability
    /// instance is created.
    pub async fn start_capture(
        &self,
        updates: mpsc::UnboundedSender<LiveTranscript>,
    ) -> Result<Uuid> {
        let mut active = self.active.lock().await;

        if let Some(current) = active.take() {
            if !current.done.is_finished() {
                debug!(session_id = %current.session_id, "capture already running, start ignored");
                let session_id = current.session_id;
                *active = Some(current);
                return Ok(session_id);
            }
            // Settle the previous capture's teardown before acquiring again.
            match current.done.await {
                Ok(Ok(outcome)) => {
                    info!(session_id = %outcome.session_id, "discarding uncollected capture outcome")
                }
                Ok(Err(e)) => debug!("previous capture ended with error: {e}"),
                Err(e) => warn!("previous capture task panicked: {e}"),
            }
        }

        let session =
            RecognitionSession::new(self.capability.clone(), self.config.session.clone());
        let session_id = session.id();
        let (stop_tx, stop_rx) = watch::channel(false);

        let done = tokio::spawn(run_capture(
            session,
            stop_rx,
            self.config.clone(),
            self.clock.clone(),
            self.store.clone(),
            updates,
        ));

        *active = Some(ActiveCapture {
            session_id,
            stop: stop_tx,
            done,
        });

        Ok(session_id)
    }

    /// Request the running capture to stop. Safe to call at any time,
    /// including when nothing is running or a stop was already requested.
    pub async fn stop(&self) {
        if let Some(active) = self.active.lock().await.as_ref() {
            let _ = active.stop.send(true);
        }
    }

    /// Whether a capture is currently in flight.
    pub async fn is_capturing(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|active| !active.done.is_finished())
            .unwrap_or(false)
    }

    /// Wait for the running capture to end and return its definitive,
    /// normalized outcome.
    pub async fn finish(&self) -> Result<CaptureOutcome> {
        let active = self
            .active
            .lock()
            .await
            .take()
            .ok_or(CaptureError::NoActiveCapture)?;

        active
            .done
            .await
            .map_err(|e| CaptureError::Internal(format!("capture task failed: {e}")))?
    }

    /// Feed a user-edited transcript back into the correction dictionary.
    /// Returns how many corrections were learned.
    pub async fn learn_from_edit(&self, original: &str, corrected: &str) -> usize {
        CorrectionLearner::new(self.store.clone())
            .learn(original, corrected)
            .await
    }

    /// Normalize arbitrary text against the current dictionary.
    pub async fn normalize_text(&self, raw: &str) -> String {
        let corrections = self.store.load_all().await;
        normalize(raw, &corrections)
    }
}

/// Drive one session from start to its definitive transcript.
async fn run_capture<C, S, K>(
    mut session: RecognitionSession<C>,
    mut stop_rx: watch::Receiver<bool>,
    config: CaptureConfig,
    clock: K,
    store: Arc<CorrectionStore<S>>,
    updates: mpsc::UnboundedSender<LiveTranscript>,
) -> Result<CaptureOutcome>
where
    C: RecognitionCapability,
    S: KeyValueStore,
    K: Clock,
{
    let started_at = Utc::now();
    let session_id = session.id();

    if session.start(&mut stop_rx).await? == StartOutcome::Aborted {
        return Ok(CaptureOutcome {
            session_id,
            transcript: String::new(),
            raw_transcript: String::new(),
            end: EndReason::Stopped,
            started_at,
            ended_at: Utc::now(),
        });
    }

    let mut accumulator = TranscriptAccumulator::new();
    let mut detector = SilenceEndpointDetector::with_clock(config.silence_window, clock);
    // Armed from the start so a capture that never hears anything still
    // endpoints after one quiet window.
    detector.reset();

    let mut stop_requested = false;
    let mut pending_reason: Option<EndReason> = None;
    let end;

    loop {
        tokio::select! {
            biased;

            _ = stop_rx.changed(), if !stop_requested => {
                stop_requested = true;
                pending_reason.get_or_insert(EndReason::Stopped);
                detector.disarm();
                session.stop().await;
            }

            _ = detector.expired(), if detector.is_armed() => {
                if detector.fire() {
                    stop_requested = true;
                    pending_reason.get_or_insert(EndReason::Silence);
                    session.stop().await;
                }
            }

            event = session.next_event() => match event {
                Some(RecognitionEvent::Partial(text)) => {
                    accumulator.on_partial(&text);
                    detector.reset();
                    let _ = updates.send(LiveTranscript {
                        session_id,
                        text: accumulator.live(),
                        is_final_chunk: false,
                    });
                }
                Some(RecognitionEvent::Final(text)) => {
                    accumulator.on_final(&text);
                    detector.reset();
                    let _ = updates.send(LiveTranscript {
                        session_id,
                        text: accumulator.live(),
                        is_final_chunk: true,
                    });
                    if !config.session.continuous && !stop_requested {
                        stop_requested = true;
                        pending_reason.get_or_insert(EndReason::Stopped);
                        detector.disarm();
                        session.stop().await;
                    }
                }
                Some(RecognitionEvent::Error(kind)) if !kind.is_fatal() => {
                    // Benign no-speech: state, transcript, and the armed
                    // silence deadline are all left untouched.
                }
                Some(RecognitionEvent::Error(kind)) => {
                    detector.disarm();
                    end = EndReason::Failed(kind);
                    break;
                }
                Some(RecognitionEvent::Ended) => {
                    detector.disarm();
                    end = pending_reason.take().unwrap_or(EndReason::StreamEnded);
                    break;
                }
                None => {
                    detector.disarm();
                    end = pending_reason.take().unwrap_or(EndReason::StreamEnded);
                    break;
                }
            },
        }
    }

    let ended_at = Utc::now();
    let raw_transcript = accumulator.into_definitive();
    let corrections = store.load_all().await;
    let transcript = normalize(&raw_transcript, &corrections);

    info!(
        session_id = %session_id,
        end = ?end,
        chars = transcript.len(),
        "capture finished"
    );

    Ok(CaptureOutcome {
        session_id,
        transcript,
        raw_transcript,
        end,
        started_at,
        ended_at,
    })
}
