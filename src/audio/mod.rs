// Audio module
// Playback primitive, backends and the cue sequencer

pub mod backend;
pub mod cues;
pub mod headless;
#[cfg(feature = "playback")]
pub mod rodio_backend;
pub mod sequencer;

pub use backend::{AudioBackend, AudioError, Clip, PlaybackNotifier, SoundHandle};
pub use cues::{Cue, CueConfig};
pub use headless::HeadlessBackend;
#[cfg(feature = "playback")]
pub use rodio_backend::RodioBackend;
pub use sequencer::{AudioSequencer, CompletionCallback, PlaybackQueue};
