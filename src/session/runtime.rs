// Session runtime
// Async driver that feeds inputs to the interaction machine and carries out its effects

use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::capture::{ScanError, Scanner};
use super::trace::TraceWriter;
use crate::audio::{AudioSequencer, Cue, CueConfig};
use crate::classifier::ClassificationResult;
use crate::config::AppConfig;
use crate::currency::DetectionMode;
use crate::interaction::{Effect, Input, InteractionMachine, PhaseKind, SessionView};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session has shut down")]
    Closed,
}

/// Cloneable front door to a running session
#[derive(Clone)]
pub struct SessionHandle {
    inputs: mpsc::UnboundedSender<Input>,
    view: watch::Receiver<SessionView>,

    /// Inputs sent through any clone of this handle
    sent: Arc<Mutex<u64>>,
}

impl SessionHandle {
    /// Queue an input and return its sequence number
    ///
    /// The input has been handled once a snapshot shows `processed_inputs` at or
    /// above that number.
    pub fn send(&self, input: Input) -> Result<u64, SessionError> {
        let mut sent = self.sent.lock().map_err(|_| SessionError::Closed)?;
        self.inputs.send(input).map_err(|_| SessionError::Closed)?;
        *sent += 1;
        Ok(*sent)
    }

    pub fn capture(&self) -> Result<u64, SessionError> {
        self.send(Input::CaptureRequested)
    }

    pub fn confirm(&self) -> Result<u64, SessionError> {
        self.send(Input::ConfirmPressed)
    }

    pub fn dismiss(&self) -> Result<u64, SessionError> {
        self.send(Input::DismissPressed)
    }

    pub fn switch_mode(&self, mode: DetectionMode) -> Result<u64, SessionError> {
        self.send(Input::SwitchMode(mode))
    }

    /// Latest published snapshot
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Receiver notified after every processed input
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Wait until a snapshot satisfies `predicate`, giving up after `timeout`
    pub async fn wait_for(
        &self,
        timeout: Duration,
        predicate: impl FnMut(&SessionView) -> bool,
    ) -> Option<SessionView> {
        let mut rx = self.view.clone();
        let view = match tokio::time::timeout(timeout, rx.wait_for(predicate)).await {
            Ok(Ok(view)) => Some(view.clone()),
            _ => None,
        };
        view
    }

    /// Wait until input `sequence` is handled and no scan is in flight
    pub async fn settle(&self, sequence: u64, timeout: Duration) -> Option<SessionView> {
        self.wait_for(timeout, |view| {
            view.processed_inputs >= sequence && view.phase != PhaseKind::Classifying
        })
        .await
    }
}

/// Start a session on the current tokio runtime
///
/// The session ends once every `SessionHandle` is dropped.
pub fn spawn_session(
    config: AppConfig,
    scanner: Scanner,
    audio: AudioSequencer,
) -> (SessionHandle, JoinHandle<()>) {
    let machine = InteractionMachine::new(&config);
    let (view_tx, view_rx) = watch::channel(machine.view());
    let (inputs_tx, inputs_rx) = mpsc::unbounded_channel();
    let (internal_tx, internal_rx) = mpsc::unbounded_channel();

    let trace = config.trace_path.clone().map(TraceWriter::new);
    if let Some(trace) = &trace {
        log::info!("Recording decisions to {}", trace.path().display());
    }

    let driver = SessionDriver {
        machine,
        scanner: Arc::new(Mutex::new(scanner)),
        audio,
        cues: config.cues.clone(),
        trace,
        internal_tx,
        prompt_timer: None,
        tap_timer: None,
        processed: 0,
        view_tx,
    };

    let task = tokio::spawn(driver.run(inputs_rx, internal_rx));
    let handle = SessionHandle {
        inputs: inputs_tx,
        view: view_rx,
        sent: Arc::new(Mutex::new(0)),
    };
    (handle, task)
}

struct SessionDriver {
    machine: InteractionMachine,
    scanner: Arc<Mutex<Scanner>>,
    audio: AudioSequencer,
    cues: CueConfig,
    trace: Option<TraceWriter>,

    /// Completions of scans and timers re-enter the machine through here
    internal_tx: mpsc::UnboundedSender<Input>,
    prompt_timer: Option<JoinHandle<()>>,
    tap_timer: Option<JoinHandle<()>>,
    processed: u64,
    view_tx: watch::Sender<SessionView>,
}

impl SessionDriver {
    async fn run(
        mut self,
        mut inputs: mpsc::UnboundedReceiver<Input>,
        mut internal: mpsc::UnboundedReceiver<Input>,
    ) {
        log::info!("Session started in {} mode", self.machine.mode().as_str());

        loop {
            let input = tokio::select! {
                input = inputs.recv() => match input {
                    Some(input) => {
                        self.processed += 1;
                        input
                    }
                    None => break,
                },
                Some(input) = internal.recv() => input,
            };

            let effects = self.machine.handle(input);
            for effect in effects {
                self.apply(effect);
            }
            self.publish();
        }

        cancel(&mut self.prompt_timer);
        cancel(&mut self.tap_timer);
        self.audio.stop_all();
        log::info!("Session closed");
    }

    fn publish(&self) {
        let mut view = self.machine.view();
        view.processed_inputs = self.processed;
        self.view_tx.send_replace(view);
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::StopAudio => self.audio.stop_all(),
            Effect::PlayCue { cue, priority } => self.play_cue(&cue, priority),
            Effect::StartScan { ticket, mode } => self.start_scan(ticket, mode),
            Effect::SchedulePrompt { token, delay } => {
                cancel(&mut self.prompt_timer);
                self.prompt_timer = Some(self.schedule(delay, Input::PromptElapsed { token }));
            }
            Effect::CancelPrompt => cancel(&mut self.prompt_timer),
            Effect::ScheduleTapWindow { token, delay } => {
                cancel(&mut self.tap_timer);
                self.tap_timer = Some(self.schedule(delay, Input::TapWindowElapsed { token }));
            }
            Effect::CancelTapWindow => cancel(&mut self.tap_timer),
            Effect::Record(decision) => {
                log::debug!("Scan #{}: {}", decision.ticket, decision.reasoning);
                if let Some(trace) = &self.trace {
                    if let Err(e) = trace.record(&decision) {
                        log::warn!("Failed to write trace entry: {}", e);
                    }
                }
            }
        }
    }

    fn play_cue(&self, cue: &Cue, priority: bool) {
        let Some(clip) = self.cues.resolve(cue) else {
            log::debug!("No clip configured for {:?}", cue);
            return;
        };

        if priority {
            self.audio.play_now(clip);
        } else {
            self.audio.play(clip);
        }
    }

    /// Run capture and classification off the async threads
    fn start_scan(&self, ticket: u64, mode: DetectionMode) {
        let scanner = Arc::clone(&self.scanner);
        let tx = self.internal_tx.clone();

        tokio::spawn(async move {
            let work = tokio::task::spawn_blocking(move || run_scan(&scanner, mode));

            let outcome = match work.await {
                Ok(outcome) => outcome,
                Err(e) => Err(ScanError::WorkerAborted(e.to_string())),
            };

            // Session may already be gone
            let _ = tx.send(Input::ScanFinished { ticket, outcome });
        });
    }

    fn schedule(&self, delay: Duration, input: Input) -> JoinHandle<()> {
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(input);
        })
    }
}

fn run_scan(
    scanner: &Mutex<Scanner>,
    mode: DetectionMode,
) -> Result<ClassificationResult, ScanError> {
    let mut scanner = scanner
        .lock()
        .map_err(|_| ScanError::WorkerAborted("scanner lock poisoned".to_string()))?;
    scanner.scan(mode)
}

fn cancel(timer: &mut Option<JoinHandle<()>>) {
    if let Some(timer) = timer.take() {
        timer.abort();
    }
}
