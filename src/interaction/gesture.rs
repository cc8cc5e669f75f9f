// Gesture recognition
// Derives tap / swipe / drag from raw pointer events and interprets them per interaction context

use serde::{Deserialize, Serialize};

/// Pixel and timing thresholds for gesture classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureThresholds {
    /// Horizontal displacement needed for a confirm/dismiss swipe
    pub swipe_px: f32,

    /// Upward displacement needed to reveal the wallet
    pub vertical_swipe_px: f32,

    /// A tap moves less than this in total
    pub tap_max_px: f32,

    /// A tap is released within this many milliseconds
    pub tap_max_ms: u64,

    /// Second tap within this window makes a double tap
    pub double_tap_ms: u64,

    /// Movement below this is not treated as a drag yet
    pub drag_start_px: f32,

    /// Upward drag where wallet reveal feedback begins
    pub wallet_reveal_start_px: f32,

    /// Upward drag distance over which reveal feedback reaches 1.0
    pub wallet_reveal_span_px: f32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        GestureThresholds {
            swipe_px: 100.0,
            vertical_swipe_px: 150.0,
            tap_max_px: 10.0,
            tap_max_ms: 300,
            double_tap_ms: 300,
            drag_start_px: 5.0,
            wallet_reveal_start_px: 20.0,
            wallet_reveal_span_px: 100.0,
        }
    }
}

/// Raw pointer input; coordinates in pixels, y grows downwards
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PointerEvent {
    Down { x: f32, y: f32, at_ms: u64 },
    Move { x: f32, y: f32, at_ms: u64 },
    Up { x: f32, y: f32, at_ms: u64 },
}

/// Displacement and duration of one pointer stroke
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSample {
    pub dx: f32,
    pub dy: f32,
    pub elapsed_ms: u64,
}

impl GestureSample {
    pub fn distance(&self) -> f32 {
        (self.dx * self.dx + self.dy * self.dy).sqrt()
    }

    pub fn is_tap(&self, thresholds: &GestureThresholds) -> bool {
        self.distance() < thresholds.tap_max_px && self.elapsed_ms < thresholds.tap_max_ms
    }

    /// True once the stroke has moved far enough to count as a drag
    pub fn is_dragging(&self, thresholds: &GestureThresholds) -> bool {
        self.dx.abs() > thresholds.drag_start_px || self.dy.abs() > thresholds.drag_start_px
    }
}

/// Tracks the stroke in progress
#[derive(Debug, Default)]
pub struct PointerTracker {
    origin: Option<(f32, f32, u64)>,

    /// Latched once the stroke first moves past the drag threshold
    dragging: bool,
}

impl PointerTracker {
    pub fn new() -> Self {
        PointerTracker::default()
    }

    /// Feed a pointer event; returns the stroke so far for Move and the final stroke for Up
    /// Moves and releases without a preceding Down are ignored
    pub fn track(&mut self, event: PointerEvent) -> Option<GestureSample> {
        match event {
            PointerEvent::Down { x, y, at_ms } => {
                self.origin = Some((x, y, at_ms));
                self.dragging = false;
                None
            }
            PointerEvent::Move { x, y, at_ms } => self.sample(x, y, at_ms),
            PointerEvent::Up { x, y, at_ms } => {
                let sample = self.sample(x, y, at_ms);
                self.origin = None;
                self.dragging = false;
                sample
            }
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.origin.is_some()
    }

    /// Whether the current stroke has become a drag
    /// The drag threshold gates only the start; later samples may return near the origin
    pub fn update_dragging(
        &mut self,
        sample: &GestureSample,
        thresholds: &GestureThresholds,
    ) -> bool {
        if self.origin.is_some() && sample.is_dragging(thresholds) {
            self.dragging = true;
        }
        self.dragging
    }

    fn sample(&self, x: f32, y: f32, at_ms: u64) -> Option<GestureSample> {
        let (x0, y0, t0) = self.origin?;
        Some(GestureSample {
            dx: x - x0,
            dy: y - y0,
            elapsed_ms: at_ms.saturating_sub(t0),
        })
    }
}

/// Which interpretation table applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureContext {
    /// A pending detection waits for confirm/dismiss; only the horizontal axis is live
    AwaitingGesture,

    /// No pending detection; only the vertical axis is live
    Browsing,
}

/// What a completed stroke means in its context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureAction {
    Confirm,
    Dismiss,
    RevealWallet,
    Tap,
    /// Ambiguous drag; feedback springs back to neutral
    Neutral,
}

/// Interpret a released stroke
pub fn interpret(
    context: GestureContext,
    sample: &GestureSample,
    thresholds: &GestureThresholds,
) -> GestureAction {
    if sample.is_tap(thresholds) {
        return GestureAction::Tap;
    }

    match context {
        GestureContext::AwaitingGesture => {
            if sample.dx < -thresholds.swipe_px {
                GestureAction::Confirm
            } else if sample.dx > thresholds.swipe_px {
                GestureAction::Dismiss
            } else {
                GestureAction::Neutral
            }
        }
        GestureContext::Browsing => {
            if sample.dy < -thresholds.vertical_swipe_px {
                GestureAction::RevealWallet
            } else {
                GestureAction::Neutral
            }
        }
    }
}

/// Live visual feedback while a stroke is in progress
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Feedback {
    Neutral,

    /// Horizontal offset of the detection card
    SwipeOffset(f32),

    /// Wallet reveal progress in [0, 1]
    WalletReveal(f32),
}

/// Feedback for an in-progress stroke, or None to leave the current feedback alone
pub fn drag_feedback(
    context: GestureContext,
    sample: &GestureSample,
    dragging: bool,
    wallet_visible: bool,
    thresholds: &GestureThresholds,
) -> Option<Feedback> {
    if !dragging {
        return None;
    }

    match context {
        GestureContext::AwaitingGesture => Some(Feedback::SwipeOffset(sample.dx)),
        GestureContext::Browsing => {
            if sample.dy < -thresholds.wallet_reveal_start_px && !wallet_visible {
                let progress = (sample.dy.abs() / thresholds.wallet_reveal_span_px).min(1.0);
                Some(Feedback::WalletReveal(progress))
            } else {
                None
            }
        }
    }
}

/// Result of registering a tap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapKind {
    /// First tap; may still become a double tap
    Single,
    Double,
}

/// Pairs taps into double taps
#[derive(Debug, Default)]
pub struct TapTracker {
    last_tap_ms: Option<u64>,
}

impl TapTracker {
    pub fn register(&mut self, at_ms: u64, window_ms: u64) -> TapKind {
        match self.last_tap_ms {
            Some(last) if at_ms.saturating_sub(last) < window_ms => {
                self.last_tap_ms = None;
                TapKind::Double
            }
            _ => {
                self.last_tap_ms = Some(at_ms);
                TapKind::Single
            }
        }
    }

    pub fn reset(&mut self) {
        self.last_tap_ms = None;
    }
}
