// Audio sequencer
// One-at-a-time clip playback with FIFO queueing and priority interruption

use std::collections::VecDeque;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::backend::{AudioBackend, Clip, PlaybackNotifier, SoundHandle};

/// Invoked after a clip finishes and is released, before the next clip starts
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

struct QueuedClip {
    clip: Clip,
    on_complete: Option<CompletionCallback>,
}

struct NowPlaying {
    handle: SoundHandle,
    clip_name: String,
    on_complete: Option<CompletionCallback>,
}

fn fire(callback: Option<CompletionCallback>) {
    if let Some(callback) = callback {
        callback();
    }
}

/// Synchronous sequencing core
///
/// All backend failures are logged and swallowed here; nothing this type does
/// can fail from the caller's point of view.
pub struct PlaybackQueue<B: AudioBackend> {
    backend: B,
    queue: VecDeque<QueuedClip>,
    current: Option<NowPlaying>,
    finished_tx: mpsc::UnboundedSender<SoundHandle>,
}

impl<B: AudioBackend> PlaybackQueue<B> {
    /// `finished_tx` receives the handle of every sound the backend reports as ended
    pub fn new(backend: B, finished_tx: mpsc::UnboundedSender<SoundHandle>) -> Self {
        PlaybackQueue {
            backend,
            queue: VecDeque::new(),
            current: None,
            finished_tx,
        }
    }

    /// Queue a clip; `priority` first stops everything and drops the queue
    pub fn enqueue(&mut self, clip: Clip, priority: bool, on_complete: Option<CompletionCallback>) {
        if priority {
            self.stop_all();
        }
        self.queue.push_back(QueuedClip { clip, on_complete });
        if self.current.is_none() {
            self.advance();
        }
    }

    /// Stop and release the current clip and discard queued clips
    /// Callbacks of discarded or interrupted clips never fire
    pub fn stop_all(&mut self) {
        let dropped = self.queue.len();
        self.queue.clear();

        if let Some(playing) = self.current.take() {
            if let Err(e) = self.backend.stop(playing.handle) {
                log::warn!("Stopping '{}' failed (ignored): {}", playing.clip_name, e);
            }
            if let Err(e) = self.backend.release(playing.handle) {
                log::warn!("Releasing '{}' failed (ignored): {}", playing.clip_name, e);
            }
            log::debug!("Interrupted '{}', dropped {} queued clip(s)", playing.clip_name, dropped);
        }
    }

    /// Handle a completion report from the backend
    /// Reports for anything but the current sound are stale and ignored
    pub fn on_finished(&mut self, handle: SoundHandle) -> bool {
        let is_current = self
            .current
            .as_ref()
            .map(|playing| playing.handle == handle)
            .unwrap_or(false);
        if !is_current {
            log::debug!("Ignoring stale completion for sound {}", handle);
            return false;
        }

        if let Some(playing) = self.current.take() {
            if let Err(e) = self.backend.release(playing.handle) {
                log::warn!("Releasing '{}' failed (ignored): {}", playing.clip_name, e);
            }
            fire(playing.on_complete);
        }
        self.advance();
        true
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    /// Number of clips waiting behind the current one
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn current_clip(&self) -> Option<&str> {
        self.current.as_ref().map(|playing| playing.clip_name.as_str())
    }

    fn advance(&mut self) {
        while let Some(next) = self.queue.pop_front() {
            match self.start(&next.clip) {
                Ok(handle) => {
                    self.current = Some(NowPlaying {
                        handle,
                        clip_name: next.clip.name,
                        on_complete: next.on_complete,
                    });
                    return;
                }
                Err(e) => {
                    log::warn!("Skipping clip '{}': {}", next.clip.name, e);
                    fire(next.on_complete);
                }
            }
        }
    }

    fn start(&mut self, clip: &Clip) -> Result<SoundHandle, super::AudioError> {
        let handle = self.backend.load(clip)?;
        let notifier = PlaybackNotifier::new(handle, self.finished_tx.clone());
        if let Err(e) = self.backend.play(handle, notifier) {
            if let Err(release_err) = self.backend.release(handle) {
                log::warn!("Releasing '{}' failed (ignored): {}", clip.name, release_err);
            }
            return Err(e);
        }
        Ok(handle)
    }
}

enum SequencerCommand {
    Enqueue {
        clip: Clip,
        priority: bool,
        on_complete: Option<CompletionCallback>,
    },
    StopAll,
}

/// Handle to the sequencer driver task
/// Cheap to clone; the driver stops everything and exits once every handle is dropped
#[derive(Clone)]
pub struct AudioSequencer {
    tx: mpsc::UnboundedSender<SequencerCommand>,
}

impl AudioSequencer {
    /// Spawn the driver loop on the current tokio runtime
    pub fn spawn<B: AudioBackend>(backend: B) -> (AudioSequencer, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (finished_tx, finished_rx) = mpsc::unbounded_channel();
        let queue = PlaybackQueue::new(backend, finished_tx);
        let task = tokio::spawn(drive(queue, rx, finished_rx));
        (AudioSequencer { tx }, task)
    }

    pub fn enqueue(&self, clip: Clip, priority: bool, on_complete: Option<CompletionCallback>) {
        self.send(SequencerCommand::Enqueue {
            clip,
            priority,
            on_complete,
        });
    }

    /// Append a clip to the queue
    pub fn play(&self, clip: Clip) {
        self.enqueue(clip, false, None);
    }

    /// Interrupt whatever is playing and play `clip` next
    pub fn play_now(&self, clip: Clip) {
        self.enqueue(clip, true, None);
    }

    pub fn stop_all(&self) {
        self.send(SequencerCommand::StopAll);
    }

    fn send(&self, command: SequencerCommand) {
        if self.tx.send(command).is_err() {
            log::warn!("Audio sequencer is not running; command dropped");
        }
    }
}

async fn drive<B: AudioBackend>(
    mut queue: PlaybackQueue<B>,
    mut commands: mpsc::UnboundedReceiver<SequencerCommand>,
    mut finished: mpsc::UnboundedReceiver<SoundHandle>,
) {
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(SequencerCommand::Enqueue { clip, priority, on_complete }) => {
                    queue.enqueue(clip, priority, on_complete);
                }
                Some(SequencerCommand::StopAll) => queue.stop_all(),
                None => break,
            },
            Some(handle) = finished.recv() => {
                queue.on_finished(handle);
            }
        }
    }

    queue.stop_all();
    log::debug!("Audio sequencer stopped");
}
