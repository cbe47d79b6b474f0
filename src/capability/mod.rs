//! The recognition capability boundary.
//!
//! The engine does not implement speech-to-text. It wraps an external
//! streaming recognition capability behind this seam: start, stop, and a
//! channel of raw [`RecognitionEvent`]s. The [`scripted`] capability replays
//! a predefined event sequence and backs the demo binary and the tests.

use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::sync::mpsc;

use crate::protocol::{RecognitionErrorKind, RecognitionEvent};

pub mod scripted;

pub use scripted::{ScriptStep, ScriptedCapability};

/// How a capture is activated and released by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivationMode {
    /// One press starts, a second press stops.
    Toggle,
    /// Capture runs while the control is held.
    PushToTalk,
}

/// Per-session configuration handed to the capability at start.
///
/// The behaviors that earlier revisions of this engine re-implemented as
/// separate code paths are plain options here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Recognition language tag.
    pub language: String,
    /// Keep listening across final results instead of stopping after the
    /// first finalized utterance.
    pub continuous: bool,
    /// Ask the capability for interim (partial) hypotheses.
    pub interim_results: bool,
    /// Activation style, forwarded to the capability.
    pub activation: ActivationMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            continuous: true,
            interim_results: true,
            activation: ActivationMode::Toggle,
        }
    }
}

/// A streaming speech recognition capability.
///
/// Contract:
/// - `start` acquires the microphone and begins streaming. It resolves to
///   the session's event receiver once the capability is live, or to the
///   error kind that prevented startup. Dropping the returned future before
///   it resolves aborts the acquisition and releases anything already
///   acquired.
/// - Events are delivered in order over a channel of capacity
///   [`EVENT_CHANNEL_CAPACITY`](crate::protocol::EVENT_CHANNEL_CAPACITY);
///   at most one event is in flight.
/// - `stop` requests graceful termination and is always safe to call,
///   including when nothing is running. A live stream confirms shutdown by
///   delivering [`RecognitionEvent::Ended`] after releasing its resources.
pub trait RecognitionCapability: Send + Sync + 'static {
    fn start(
        &self,
        config: &SessionConfig,
    ) -> impl Future<Output = Result<mpsc::Receiver<RecognitionEvent>, RecognitionErrorKind>> + Send;

    fn stop(&self) -> impl Future<Output = ()> + Send;
}
