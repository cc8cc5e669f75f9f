// Interaction module
// Gesture recognition and the session state machine

pub mod gesture;
pub mod machine;

pub use gesture::{Feedback, GestureThresholds, PointerEvent};
pub use machine::{
    Effect, Input, InteractionMachine, PendingDetection, Phase, PhaseKind, SessionView,
};
