use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use voice_capture::{
    capability::{ScriptStep, ScriptedCapability},
    engine::{CaptureConfig, CaptureEngine},
    store::{CorrectionStore, JsonFileStore},
};

#[derive(Parser)]
#[command(name = "voice-capture")]
#[command(about = "Streaming voice capture engine demo with a simulated recognizer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Utterance the simulated recognizer hears; repeat for multiple
    /// utterances
    #[arg(long = "say", required = true)]
    pub utterances: Vec<String>,

    /// User-corrected transcript to learn from after the capture
    #[arg(long)]
    pub learn: Option<String>,

    /// Directory holding the persisted correction dictionary
    #[arg(long, default_value = "voice-capture-data")]
    pub data_dir: PathBuf,

    /// Silence window in milliseconds before the session is endpointed
    #[arg(long, default_value = "1500")]
    pub silence_ms: u64,

    /// Delay between simulated recognition events in milliseconds
    #[arg(long, default_value = "150")]
    pub event_delay_ms: u64,

    /// Stop after the first finalized utterance
    #[arg(long)]
    pub single_utterance: bool,

    /// Skip interim hypotheses; deliver finals only
    #[arg(long)]
    pub finals_only: bool,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Expand each utterance into the event sequence a streaming recognizer
/// would produce: word-by-word growing partials, then the finalized text.
fn build_script(args: &Args) -> Vec<ScriptStep> {
    let delay = Duration::from_millis(args.event_delay_ms);
    let mut script = Vec::new();

    for utterance in &args.utterances {
        if !args.finals_only {
            let words: Vec<&str> = utterance.split_whitespace().collect();
            for upto in 1..words.len() {
                script.push(ScriptStep::partial(delay, &words[..upto].join(" ")));
            }
        }
        script.push(ScriptStep::finalized(delay, utterance));
    }

    script
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level: tracing::Level = args.log_level.into();
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    info!("Starting Voice Capture v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Data dir: {}", args.data_dir.display());
    info!("  Silence window: {}ms", args.silence_ms);
    info!("  Utterances: {}", args.utterances.len());

    let capability = ScriptedCapability::new(build_script(&args));
    capability.end_after_script().await;

    let store = CorrectionStore::new(JsonFileStore::new(&args.data_dir));
    let mut config = CaptureConfig::default();
    config.silence_window = Duration::from_millis(args.silence_ms);
    config.session.continuous = !args.single_utterance;
    config.session.interim_results = !args.finals_only;

    let engine = CaptureEngine::new(capability, store, config);

    let (updates, mut live) = tokio::sync::mpsc::unbounded_channel();
    let session_id = engine
        .start_capture(updates)
        .await
        .context("Failed to start capture")?;
    info!("Capture session {} started", session_id);

    let printer = tokio::spawn(async move {
        while let Some(update) = live.recv().await {
            let marker = if update.is_final_chunk { "*" } else { " " };
            println!("{marker} {}", update.text);
        }
    });

    let outcome = engine.finish().await.context("Capture failed")?;
    let _ = printer.await;

    println!();
    println!("Session ended: {:?}", outcome.end);
    println!("Raw transcript:        {}", outcome.raw_transcript);
    println!("Normalized transcript: {}", outcome.transcript);

    if let Some(corrected) = &args.learn {
        let learned = engine.learn_from_edit(&outcome.raw_transcript, corrected).await;
        println!();
        if learned > 0 {
            println!(
                "Learned {learned} correction(s); future transcripts will read: {}",
                engine.normalize_text(&outcome.raw_transcript).await
            );
        } else {
            println!("No corrections learned (edit did not align word-for-word)");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from([
            "voice-capture",
            "--say",
            "one lite milk",
            "--learn",
            "one litre milk",
            "--silence-ms",
            "500",
            "--log-level",
            "debug",
        ]);

        assert_eq!(args.utterances, vec!["one lite milk".to_string()]);
        assert_eq!(args.learn.as_deref(), Some("one litre milk"));
        assert_eq!(args.silence_ms, 500);
        assert!(matches!(args.log_level, LogLevel::Debug));
    }

    #[test]
    fn test_build_script_grows_partials() {
        let args = Args::parse_from(["voice-capture", "--say", "one lite milk"]);
        let script = build_script(&args);

        let texts: Vec<String> = script
            .iter()
            .map(|step| match &step.event {
                voice_capture::RecognitionEvent::Partial(text) => format!("~{text}"),
                voice_capture::RecognitionEvent::Final(text) => format!("!{text}"),
                other => panic!("unexpected event in script: {other:?}"),
            })
            .collect();

        assert_eq!(texts, vec!["~one", "~one lite", "!one lite milk"]);
    }

    #[test]
    fn test_build_script_finals_only() {
        let args = Args::parse_from(["voice-capture", "--say", "two kilos", "--finals-only"]);
        let script = build_script(&args);
        assert_eq!(script.len(), 1);
        assert!(matches!(
            script[0].event,
            voice_capture::RecognitionEvent::Final(_)
        ));
    }
}
