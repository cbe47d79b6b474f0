//! Voice Capture - a streaming voice capture and adaptive correction engine
//!
//! This crate turns a stream of raw speech-recognition results into a clean
//! running transcript and learns from user corrections over time. It
//! features:
//!
//! - A single recognition session state machine with idempotent start/stop
//! - Live merging of interim and final results into one transcript
//! - Silence-based endpointing with a configurable quiet window
//! - Normalization against a learned token substitution dictionary
//! - Best-effort correction learning from user-edited transcripts
//! - Durable dictionary persistence behind a key-value seam
//!
//! Speech-to-text itself is external: the engine drives any
//! [`RecognitionCapability`](capability::RecognitionCapability), and ships a
//! scripted one for demos and tests.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use voice_capture::{
//!     capability::{ScriptStep, ScriptedCapability},
//!     engine::{CaptureConfig, CaptureEngine},
//!     store::{CorrectionStore, MemoryStore},
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let capability = ScriptedCapability::new(vec![
//!         ScriptStep::partial(Duration::from_millis(5), "one lite"),
//!         ScriptStep::finalized(Duration::from_millis(5), "one lite milk"),
//!     ]);
//!     capability.end_after_script().await;
//!
//!     let engine = CaptureEngine::new(
//!         capability,
//!         CorrectionStore::new(MemoryStore::new()),
//!         CaptureConfig::default(),
//!     );
//!
//!     // Teach the engine a correction, then capture.
//!     engine.learn_from_edit("one lite milk", "one litre milk").await;
//!
//!     let (updates, mut live) = tokio::sync::mpsc::unbounded_channel();
//!     engine.start_capture(updates).await?;
//!     while let Some(update) = live.recv().await {
//!         println!("live: {}", update.text);
//!     }
//!
//!     let outcome = engine.finish().await?;
//!     assert_eq!(outcome.transcript, "One litre milk");
//!     Ok(())
//! }
//! ```

pub mod capability;
pub mod clock;
pub mod endpoint;
pub mod engine;
pub mod learner;
pub mod normalize;
pub mod protocol;
pub mod session;
pub mod store;
pub mod transcript;

// Re-export commonly used types for convenience
pub use capability::{ActivationMode, RecognitionCapability, SessionConfig};
pub use engine::{CaptureConfig, CaptureEngine};
pub use protocol::{
    CaptureOutcome, EndReason, LiveTranscript, RecognitionErrorKind, RecognitionEvent,
    SessionState,
};
pub use store::{CorrectionEntry, CorrectionStore, JsonFileStore, KeyValueStore, MemoryStore};

// Error types
use thiserror::Error;

/// Errors that can occur in the voice capture engine
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The recognition capability could not begin streaming
    #[error("recognition failed to start: {kind}")]
    Recognition { kind: RecognitionErrorKind },

    /// No capture is running on this engine's slot
    #[error("no active capture")]
    NoActiveCapture,

    /// I/O error from the persistence layer
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal engine failure
    #[error("{0}")]
    Internal(String),
}

/// Result type alias for voice capture operations
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
