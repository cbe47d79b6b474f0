use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Capacity of the event channel between a capability and the session.
///
/// The capability may have at most one event in flight; delivery order is
/// preserved and nothing is buffered beyond that.
pub const EVENT_CHANNEL_CAPACITY: usize = 1;

/// Error codes reported by a recognition capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecognitionErrorKind {
    /// Microphone access was denied by the user or platform.
    PermissionDenied,
    /// No capture device is available.
    DeviceNotFound,
    /// The environment does not provide a recognition capability.
    Unsupported,
    /// Network failure while streaming to the recognizer.
    Network,
    /// The audio capture pipeline failed mid-session.
    AudioCapture,
    /// The capability was aborted from outside the engine.
    Aborted,
    /// The recognizer heard nothing it could transcribe. Benign.
    NoSpeech,
}

impl RecognitionErrorKind {
    /// Whether this error terminates the session.
    ///
    /// `NoSpeech` is the one benign code: the session stays in `Listening`
    /// and the silence window is left to run out on its own.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RecognitionErrorKind::NoSpeech)
    }

    /// The wire code for this error, matching the capability boundary.
    pub fn code(&self) -> &'static str {
        match self {
            RecognitionErrorKind::PermissionDenied => "permission-denied",
            RecognitionErrorKind::DeviceNotFound => "device-not-found",
            RecognitionErrorKind::Unsupported => "unsupported",
            RecognitionErrorKind::Network => "network",
            RecognitionErrorKind::AudioCapture => "audio-capture",
            RecognitionErrorKind::Aborted => "aborted",
            RecognitionErrorKind::NoSpeech => "no-speech",
        }
    }
}

impl std::fmt::Display for RecognitionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            RecognitionErrorKind::PermissionDenied => "microphone permission denied",
            RecognitionErrorKind::DeviceNotFound => "no audio capture device found",
            RecognitionErrorKind::Unsupported => "speech recognition is not supported here",
            RecognitionErrorKind::Network => "network error while streaming recognition",
            RecognitionErrorKind::AudioCapture => "audio capture failed",
            RecognitionErrorKind::Aborted => "recognition aborted",
            RecognitionErrorKind::NoSpeech => "no speech detected",
        };
        f.write_str(message)
    }
}

/// A raw event delivered by the recognition capability.
///
/// Events arrive strictly in delivery order and are consumed only by the
/// capture loop, which feeds the accumulator and the endpoint detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecognitionEvent {
    /// A not-yet-finalized hypothesis for the current utterance. Supersedes
    /// any earlier partial.
    Partial(String),
    /// A hypothesis the capability will not revise further for that span.
    Final(String),
    /// An error surfaced by the capability.
    Error(RecognitionErrorKind),
    /// The capability confirmed shutdown and released its audio resources.
    Ended,
}

/// Lifecycle state of a recognition session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Starting,
    Listening,
    Stopping,
    Ended,
    Failed,
}

impl SessionState {
    /// States in which a capability instance is (or is being) acquired.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionState::Starting | SessionState::Listening | SessionState::Stopping
        )
    }
}

/// Why a capture session terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// The caller requested stop.
    Stopped,
    /// The silence window elapsed with no further events.
    Silence,
    /// The capability ended the stream on its own.
    StreamEnded,
    /// A fatal capability error terminated the session.
    Failed(RecognitionErrorKind),
}

impl EndReason {
    pub fn is_failure(&self) -> bool {
        matches!(self, EndReason::Failed(_))
    }
}

/// A live transcript update pushed to the caller on every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveTranscript {
    /// Session this update belongs to.
    pub session_id: Uuid,
    /// The full transcript so far, finalized text plus pending hypothesis.
    pub text: String,
    /// Whether the triggering event finalized a span.
    pub is_final_chunk: bool,
}

/// The definitive result of a capture session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureOutcome {
    /// Session identifier.
    pub session_id: Uuid,
    /// Normalized definitive transcript.
    pub transcript: String,
    /// The transcript as accumulated, before normalization.
    pub raw_transcript: String,
    /// Why the session ended.
    pub end: EndReason,
    /// When the capture started.
    pub started_at: DateTime<Utc>,
    /// When the capture ended.
    pub ended_at: DateTime<Utc>,
}

impl CaptureOutcome {
    /// Wall-clock duration of the capture.
    pub fn duration(&self) -> chrono::Duration {
        self.ended_at - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_fatality() {
        assert!(!RecognitionErrorKind::NoSpeech.is_fatal());
        assert!(RecognitionErrorKind::PermissionDenied.is_fatal());
        assert!(RecognitionErrorKind::Network.is_fatal());
        assert!(RecognitionErrorKind::Aborted.is_fatal());
    }

    #[test]
    fn test_error_kind_codes() {
        assert_eq!(RecognitionErrorKind::PermissionDenied.code(), "permission-denied");
        assert_eq!(RecognitionErrorKind::NoSpeech.code(), "no-speech");
        assert_eq!(RecognitionErrorKind::AudioCapture.code(), "audio-capture");
    }

    #[test]
    fn test_event_serialization() {
        let event = RecognitionEvent::Partial("one lite".to_string());
        let json = serde_json::to_string(&event).unwrap();
        let back: RecognitionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn test_session_state_activity() {
        assert!(SessionState::Starting.is_active());
        assert!(SessionState::Listening.is_active());
        assert!(SessionState::Stopping.is_active());
        assert!(!SessionState::Idle.is_active());
        assert!(!SessionState::Ended.is_active());
        assert!(!SessionState::Failed.is_active());
    }

    #[test]
    fn test_outcome_duration() {
        let started = Utc::now();
        let outcome = CaptureOutcome {
            session_id: Uuid::new_v4(),
            transcript: "One litre milk".to_string(),
            raw_transcript: "one lite milk".to_string(),
            end: EndReason::Silence,
            started_at: started,
            ended_at: started + chrono::Duration::milliseconds(2500),
        };
        assert_eq!(outcome.duration().num_milliseconds(), 2500);
        assert!(!outcome.end.is_failure());
    }
}
