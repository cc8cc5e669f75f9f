// Interaction state machine
// Single owner of scan phase, pending detection, overlays and the wallet
//
// The machine is synchronous: every input returns the effects the runtime must
// carry out (audio, scan work, timers). Late completions are recognized by the
// ticket or token they carry and ignored once they no longer match.

use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use super::gesture::{
    drag_feedback, interpret, Feedback, GestureAction, GestureContext, PointerEvent,
    PointerTracker, TapKind, TapTracker,
};
use crate::acceptance::{AcceptancePolicy, DetectionDecision, Verdict};
use crate::audio::Cue;
use crate::classifier::ClassificationResult;
use crate::config::AppConfig;
use crate::currency::{self, Denomination, DetectionMode};
use crate::session::ScanError;
use crate::wallet::{WalletEntry, WalletItem, WalletLedger, WalletStats};

/// An accepted detection waiting for confirm or dismiss
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingDetection {
    pub label: String,
    pub probability: f32,
    pub mode: DetectionMode,
    pub denomination: &'static Denomination,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Classifying {
        ticket: u64,
        mode: DetectionMode,
    },
    AwaitingGesture {
        pending: PendingDetection,
        prompt_token: u64,
    },
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Idle => PhaseKind::Idle,
            Phase::Classifying { .. } => PhaseKind::Classifying,
            Phase::AwaitingGesture { .. } => PhaseKind::AwaitingGesture,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Idle,
    Classifying,
    AwaitingGesture,
}

/// Everything that can happen to a session
#[derive(Debug)]
pub enum Input {
    CaptureRequested,
    ScanFinished {
        ticket: u64,
        outcome: Result<ClassificationResult, ScanError>,
    },
    PromptElapsed {
        token: u64,
    },
    TapWindowElapsed {
        token: u64,
    },
    Pointer(PointerEvent),
    ConfirmPressed,
    DismissPressed,
    SwitchMode(DetectionMode),
    CycleMode,
    ToggleWallet,
    RemoveWalletItem(Uuid),
    ClearWallet,
}

/// Work the runtime performs on behalf of the machine
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StopAudio,
    PlayCue { cue: Cue, priority: bool },
    StartScan { ticket: u64, mode: DetectionMode },
    SchedulePrompt { token: u64, delay: Duration },
    CancelPrompt,
    ScheduleTapWindow { token: u64, delay: Duration },
    CancelTapWindow,
    Record(DetectionDecision),
}

/// Read-only picture of the session for presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub phase: PhaseKind,
    pub mode: DetectionMode,
    pub camera_zoom: f32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingDetection>,

    /// Passive notice such as a mode switch announcement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,

    pub feedback: Feedback,
    pub wallet_visible: bool,

    /// Newest first
    pub wallet: Vec<WalletItem>,
    pub stats: WalletStats,

    /// Whether a capture request would be accepted right now
    pub capture_enabled: bool,

    /// Count of inputs taken from session handles, filled in by the session runtime
    pub processed_inputs: u64,
}

pub struct InteractionMachine {
    policy: AcceptancePolicy,
    config: AppConfig,
    phase: Phase,
    mode: DetectionMode,
    ledger: WalletLedger,
    banner: Option<String>,
    feedback: Feedback,
    wallet_visible: bool,
    pointer: PointerTracker,
    taps: TapTracker,
    tap_token: Option<u64>,

    /// Shared counter for capture tickets, prompt tokens and tap tokens
    next_token: u64,
}

impl InteractionMachine {
    pub fn new(config: &AppConfig) -> Self {
        InteractionMachine {
            policy: AcceptancePolicy::new(config.acceptance.clone()),
            config: config.clone(),
            phase: Phase::Idle,
            mode: config.initial_mode,
            ledger: WalletLedger::new(),
            banner: None,
            feedback: Feedback::Neutral,
            wallet_visible: false,
            pointer: PointerTracker::new(),
            taps: TapTracker::default(),
            tap_token: None,
            next_token: 1,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    pub fn ledger(&self) -> &WalletLedger {
        &self.ledger
    }

    pub fn pending(&self) -> Option<&PendingDetection> {
        match &self.phase {
            Phase::AwaitingGesture { pending, .. } => Some(pending),
            _ => None,
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            phase: self.phase.kind(),
            mode: self.mode,
            camera_zoom: self.mode.camera_zoom(),
            pending: self.pending().cloned(),
            banner: self.banner.clone(),
            feedback: self.feedback,
            wallet_visible: self.wallet_visible,
            wallet: self.ledger.display_order(),
            stats: self.ledger.stats(self.config.exchange_rate),
            capture_enabled: self.phase == Phase::Idle,
            processed_inputs: 0,
        }
    }

    /// Apply one input and return the effects it requires, in order
    pub fn handle(&mut self, input: Input) -> Vec<Effect> {
        let mut effects = Vec::new();

        match input {
            Input::CaptureRequested => self.request_capture(&mut effects),
            Input::ScanFinished { ticket, outcome } => {
                self.finish_scan(ticket, outcome, &mut effects)
            }
            Input::PromptElapsed { token } => self.prompt_elapsed(token, &mut effects),
            Input::TapWindowElapsed { token } => self.tap_window_elapsed(token),
            Input::Pointer(event) => self.pointer(event, &mut effects),
            Input::ConfirmPressed => self.confirm(&mut effects),
            Input::DismissPressed => self.dismiss(&mut effects),
            Input::SwitchMode(mode) => self.switch_mode(mode, &mut effects),
            Input::CycleMode => self.switch_mode(self.mode.next(), &mut effects),
            Input::ToggleWallet => self.toggle_wallet(),
            Input::RemoveWalletItem(id) => {
                if !self.ledger.remove(&id) {
                    log::debug!("Wallet item {} not found", id);
                }
            }
            Input::ClearWallet => {
                log::info!("Clearing wallet ({} items)", self.ledger.len());
                self.ledger.clear();
            }
        }

        effects
    }

    fn issue_token(&mut self) -> u64 {
        let token = self.next_token;
        self.next_token += 1;
        token
    }

    fn transition(&mut self, next: Phase) {
        log::debug!("Phase {:?} -> {:?}", self.phase.kind(), next.kind());
        self.phase = next;
        self.feedback = Feedback::Neutral;
    }

    fn request_capture(&mut self, effects: &mut Vec<Effect>) {
        if self.phase != Phase::Idle {
            log::debug!("Capture refused while {:?}", self.phase.kind());
            return;
        }

        let ticket = self.issue_token();
        let mode = self.mode;
        log::info!("Capture #{} requested in {} mode", ticket, mode.as_str());

        self.banner = None;
        self.transition(Phase::Classifying { ticket, mode });
        effects.push(Effect::StopAudio);
        effects.push(Effect::StartScan { ticket, mode });
    }

    fn finish_scan(
        &mut self,
        ticket: u64,
        outcome: Result<ClassificationResult, ScanError>,
        effects: &mut Vec<Effect>,
    ) {
        let mode = match self.phase {
            Phase::Classifying { ticket: current, mode } if current == ticket => mode,
            _ => {
                log::debug!("Discarding stale scan result #{}", ticket);
                return;
            }
        };

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                log::error!("Scan #{} failed: {}", ticket, e);
                effects.push(Effect::Record(DetectionDecision::from_failure(
                    ticket,
                    mode,
                    e.to_string(),
                )));
                self.transition(Phase::Idle);
                return;
            }
        };

        let verdict = self.policy.evaluate(&result, mode);
        effects.push(Effect::Record(DetectionDecision::from_verdict(
            ticket, mode, &result, &verdict,
        )));

        let top = match verdict {
            Verdict::Accept(top) => top,
            Verdict::Reject(reason) => {
                log::info!("Scan #{} rejected: {}", ticket, reason.describe());
                self.transition(Phase::Idle);
                return;
            }
        };

        let Some(denomination) = currency::lookup(&top.label) else {
            log::warn!("Accepted label {} is not in the catalog", top.label);
            self.transition(Phase::Idle);
            return;
        };

        log::info!(
            "Detected {} ({:.1}%), awaiting confirmation",
            denomination.display_name,
            top.probability * 100.0
        );

        let prompt_token = self.issue_token();
        self.transition(Phase::AwaitingGesture {
            pending: PendingDetection {
                label: top.label.clone(),
                probability: top.probability,
                mode,
                denomination,
            },
            prompt_token,
        });
        self.wallet_visible = false;

        effects.push(Effect::PlayCue {
            cue: Cue::Denomination(top.label),
            priority: false,
        });
        effects.push(Effect::SchedulePrompt {
            token: prompt_token,
            delay: Duration::from_millis(self.config.prompt_delay_ms),
        });
    }

    fn prompt_elapsed(&mut self, token: u64, effects: &mut Vec<Effect>) {
        match self.phase {
            Phase::AwaitingGesture { prompt_token, .. } if prompt_token == token => {
                effects.push(Effect::PlayCue {
                    cue: Cue::SwipePrompt,
                    priority: false,
                });
            }
            _ => log::debug!("Ignoring stale prompt timer {}", token),
        }
    }

    fn tap_window_elapsed(&mut self, token: u64) {
        if self.tap_token != Some(token) {
            return;
        }
        self.tap_token = None;
        self.taps.reset();

        if self.phase == Phase::Idle && self.banner.take().is_some() {
            log::debug!("Banner dismissed by tap");
        }
    }

    fn gesture_context(&self) -> GestureContext {
        match self.phase {
            Phase::AwaitingGesture { .. } => GestureContext::AwaitingGesture,
            _ => GestureContext::Browsing,
        }
    }

    fn pointer(&mut self, event: PointerEvent, effects: &mut Vec<Effect>) {
        let Some(sample) = self.pointer.track(event) else {
            return;
        };
        let context = self.gesture_context();
        let thresholds = &self.config.gestures;

        match event {
            PointerEvent::Down { .. } => {}
            PointerEvent::Move { .. } => {
                let dragging = self.pointer.update_dragging(&sample, thresholds);
                if let Some(feedback) =
                    drag_feedback(context, &sample, dragging, self.wallet_visible, thresholds)
                {
                    self.feedback = feedback;
                }
            }
            PointerEvent::Up { at_ms, .. } => {
                let action = interpret(context, &sample, thresholds);
                self.feedback = Feedback::Neutral;

                match action {
                    GestureAction::Confirm => self.confirm(effects),
                    GestureAction::Dismiss => self.dismiss(effects),
                    GestureAction::RevealWallet => {
                        log::debug!("Wallet revealed by swipe");
                        self.wallet_visible = true;
                    }
                    GestureAction::Tap => self.tap(at_ms, effects),
                    GestureAction::Neutral => {}
                }
            }
        }
    }

    fn tap(&mut self, at_ms: u64, effects: &mut Vec<Effect>) {
        match self.taps.register(at_ms, self.config.gestures.double_tap_ms) {
            TapKind::Double => {
                self.tap_token = None;
                effects.push(Effect::CancelTapWindow);
                // Double tap is the capture trigger
                self.request_capture(effects);
            }
            TapKind::Single => {
                let token = self.issue_token();
                self.tap_token = Some(token);
                effects.push(Effect::ScheduleTapWindow {
                    token,
                    delay: Duration::from_millis(self.config.gestures.double_tap_ms),
                });
            }
        }
    }

    /// Take the pending detection out of AwaitingGesture, leaving the machine Idle
    fn resolve_pending(&mut self, effects: &mut Vec<Effect>) -> Option<PendingDetection> {
        let Phase::AwaitingGesture { pending, .. } = &self.phase else {
            log::debug!("No pending detection to resolve");
            return None;
        };
        let pending = pending.clone();

        effects.push(Effect::StopAudio);
        effects.push(Effect::CancelPrompt);
        self.transition(Phase::Idle);
        Some(pending)
    }

    fn confirm(&mut self, effects: &mut Vec<Effect>) {
        let Some(pending) = self.resolve_pending(effects) else {
            return;
        };

        let item = self.ledger.insert(WalletEntry::from_denomination(
            pending.denomination,
            pending.probability,
        ));
        log::info!(
            "Added {} to wallet ({} items)",
            item.denomination,
            self.ledger.len()
        );

        effects.push(Effect::PlayCue {
            cue: Cue::AddedToWallet,
            priority: true,
        });
    }

    fn dismiss(&mut self, effects: &mut Vec<Effect>) {
        let Some(pending) = self.resolve_pending(effects) else {
            return;
        };

        log::info!("Dismissed {}", pending.label);
        effects.push(Effect::PlayCue {
            cue: Cue::ReadyForNextScan,
            priority: true,
        });
    }

    fn switch_mode(&mut self, mode: DetectionMode, effects: &mut Vec<Effect>) {
        match &self.phase {
            Phase::AwaitingGesture { pending, .. } => {
                log::info!("Discarding pending {} on mode switch", pending.label);
                effects.push(Effect::CancelPrompt);
            }
            Phase::Classifying { ticket, .. } => {
                log::info!("Abandoning scan #{} on mode switch", ticket);
            }
            Phase::Idle => {}
        }

        effects.push(Effect::StopAudio);
        self.transition(Phase::Idle);
        self.mode = mode;
        self.banner = Some(format!(
            "Switched to {} detection",
            mode.as_str().to_uppercase()
        ));
        log::info!("Detection mode set to {}", mode.as_str());
    }

    fn toggle_wallet(&mut self) {
        if self.wallet_visible {
            self.wallet_visible = false;
        } else if matches!(self.phase, Phase::AwaitingGesture { .. }) {
            log::debug!("Wallet stays hidden while a detection is pending");
        } else {
            self.wallet_visible = true;
        }
    }
}
