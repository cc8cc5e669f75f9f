// Currency Lens replay
// Runs a scripted scan session headlessly and prints the final session snapshot

use clap::Parser;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

use currency_lens_lib::audio::AudioSequencer;
use currency_lens_lib::classifier::{Classifier, ScriptedModel};
use currency_lens_lib::interaction::{Input, PointerEvent};
use currency_lens_lib::session::{FileSequenceSource, SessionError};
use currency_lens_lib::{
    default_config_path, spawn_session, AppConfig, ConfigError, DetectionMode, Scanner,
    SessionHandle,
};

#[derive(Parser, Debug)]
#[command(name = "currency-lens", about = "Replay a scripted scan session headlessly")]
struct Args {
    /// Scenario JSON: frames, scripted model outputs and user steps.
    scenario: PathBuf,

    /// Config file; defaults to the platform config location.
    config: Option<PathBuf>,
}

const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
enum ReplayError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scenario error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Session did not settle within {0:?}")]
    Timeout(Duration),
}

/// Scripted session: frames to "photograph", model outputs, and user actions
#[derive(Debug, Deserialize)]
struct Scenario {
    /// Image files handed out one per capture, relative to the scenario file
    frames: Vec<PathBuf>,

    /// Probability vectors per mode, consumed one per classification
    #[serde(default)]
    outputs: HashMap<DetectionMode, Vec<Vec<f32>>>,

    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Step {
    Capture,
    Confirm,
    Dismiss,
    SwitchMode { mode: DetectionMode },
    CycleMode,
    ToggleWallet,
    ClearWallet,
    Pointer { event: PointerEvent },
    Wait { ms: u64 },
}

impl Step {
    fn into_input(self) -> Option<Input> {
        let input = match self {
            Step::Capture => Input::CaptureRequested,
            Step::Confirm => Input::ConfirmPressed,
            Step::Dismiss => Input::DismissPressed,
            Step::SwitchMode { mode } => Input::SwitchMode(mode),
            Step::CycleMode => Input::CycleMode,
            Step::ToggleWallet => Input::ToggleWallet,
            Step::ClearWallet => Input::ClearWallet,
            Step::Pointer { event } => Input::Pointer(event),
            Step::Wait { .. } => return None,
        };
        Some(input)
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ReplayError> {
    let args = Args::parse();
    let scenario_path = args.scenario;
    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };

    let config = AppConfig::load_or_default(&config_path)?;
    let scenario: Scenario = serde_json::from_str(&std::fs::read_to_string(&scenario_path)?)?;
    let base_dir = scenario_path.parent().unwrap_or(Path::new("."));

    let mut classifier = Classifier::new(config.input_size, config.top_k);
    for (mode, outputs) in scenario.outputs {
        let mut model = ScriptedModel::new();
        for output in outputs {
            model.push(output);
        }
        classifier.register(mode, Box::new(model));
    }

    let frames = scenario.frames.iter().map(|frame| base_dir.join(frame));
    let scanner = Scanner::new(Box::new(FileSequenceSource::new(frames)), classifier);

    let (audio, _audio_task) = spawn_audio();
    let (session, task) = spawn_session(config, scanner, audio);

    for step in scenario.steps {
        log::info!("Step: {:?}", step);
        match step {
            Step::Wait { ms } => tokio::time::sleep(Duration::from_millis(ms)).await,
            step => {
                if let Some(input) = step.into_input() {
                    send_and_settle(&session, input).await?;
                }
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&session.view())?);

    drop(session);
    if let Err(e) = task.await {
        log::warn!("Session task ended abnormally: {}", e);
    }
    Ok(())
}

/// Send one input and wait until it is handled and no scan is in flight
async fn send_and_settle(session: &SessionHandle, input: Input) -> Result<(), ReplayError> {
    let sequence = session.send(input)?;
    session
        .settle(sequence, SETTLE_TIMEOUT)
        .await
        .ok_or(ReplayError::Timeout(SETTLE_TIMEOUT))?;
    Ok(())
}

#[cfg(feature = "playback")]
fn spawn_audio() -> (AudioSequencer, JoinHandle<()>) {
    use currency_lens_lib::audio::{HeadlessBackend, RodioBackend};

    match RodioBackend::new() {
        Ok(backend) => AudioSequencer::spawn(backend),
        Err(e) => {
            log::warn!("Audio output unavailable, playing silently: {}", e);
            AudioSequencer::spawn(HeadlessBackend::default())
        }
    }
}

#[cfg(not(feature = "playback"))]
fn spawn_audio() -> (AudioSequencer, JoinHandle<()>) {
    AudioSequencer::spawn(currency_lens_lib::audio::HeadlessBackend::default())
}
