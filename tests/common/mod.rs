//! Shared helpers for the integration tests.

use std::time::Duration;
use tokio::sync::mpsc;
use voice_capture::{
    capability::{ScriptStep, ScriptedCapability},
    engine::{CaptureConfig, CaptureEngine},
    protocol::{CaptureOutcome, LiveTranscript},
    store::{CorrectionStore, MemoryStore},
};

pub const SILENCE_WINDOW: Duration = Duration::from_millis(1500);

/// Build an engine over a scripted capability and an in-memory store.
pub fn engine_for(
    capability: ScriptedCapability,
) -> CaptureEngine<ScriptedCapability, MemoryStore> {
    let config = CaptureConfig {
        silence_window: SILENCE_WINDOW,
        ..CaptureConfig::default()
    };
    CaptureEngine::new(capability, CorrectionStore::new(MemoryStore::new()), config)
}

/// Run a full capture over the given script and collect every live update
/// alongside the definitive outcome.
pub async fn run_scripted_capture(
    script: Vec<ScriptStep>,
) -> (Vec<LiveTranscript>, CaptureOutcome) {
    let capability = ScriptedCapability::new(script);
    let engine = engine_for(capability);

    let (tx, mut rx) = mpsc::unbounded_channel();
    engine.start_capture(tx).await.expect("capture should start");
    let outcome = engine.finish().await.expect("capture should finish");

    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }

    (updates, outcome)
}
