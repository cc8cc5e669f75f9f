// Audio primitive
// The narrow load/play/stop/release surface every playback backend implements

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors raised by an audio backend
/// The sequencer logs and swallows all of these
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Failed to load clip {clip}: {reason}")]
    Load { clip: String, reason: String },

    #[error("Failed to play sound {0}: {1}")]
    Play(SoundHandle, String),

    #[error("Failed to stop sound {0}: {1}")]
    Stop(SoundHandle, String),

    #[error("Failed to release sound {0}: {1}")]
    Release(SoundHandle, String),

    #[error("Audio backend unavailable: {0}")]
    Unavailable(String),
}

/// A short sound file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clip {
    /// Name used in logs
    pub name: String,
    pub path: PathBuf,
}

impl Clip {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Clip {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Opaque reference to a loaded sound
/// Backends must never hand out the same value twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle(pub u64);

impl fmt::Display for SoundHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Completion signal handed to a backend with every `play` call
/// Sent once the sound finishes on its own; may also arrive after a stop
#[derive(Debug, Clone)]
pub struct PlaybackNotifier {
    handle: SoundHandle,
    tx: mpsc::UnboundedSender<SoundHandle>,
}

impl PlaybackNotifier {
    pub fn new(handle: SoundHandle, tx: mpsc::UnboundedSender<SoundHandle>) -> Self {
        PlaybackNotifier { handle, tx }
    }

    /// Report natural completion; a closed sequencer is ignored
    pub fn finished(&self) {
        let _ = self.tx.send(self.handle);
    }
}

/// Playback primitive consumed by the sequencer
pub trait AudioBackend: Send + 'static {
    fn load(&mut self, clip: &Clip) -> Result<SoundHandle, AudioError>;

    /// Start playback; `done` must be signalled when the sound ends naturally
    fn play(&mut self, handle: SoundHandle, done: PlaybackNotifier) -> Result<(), AudioError>;

    fn stop(&mut self, handle: SoundHandle) -> Result<(), AudioError>;

    fn release(&mut self, handle: SoundHandle) -> Result<(), AudioError>;
}
