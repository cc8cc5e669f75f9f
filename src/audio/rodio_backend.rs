// Device playback using rodio
// The output stream is not Send, so it lives on a dedicated thread for the backend's lifetime

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread;

use super::backend::{AudioBackend, AudioError, Clip, PlaybackNotifier, SoundHandle};

struct LoadedSound {
    bytes: Arc<Vec<u8>>,
    sink: Option<Arc<Sink>>,
}

pub struct RodioBackend {
    output: OutputStreamHandle,
    sounds: HashMap<SoundHandle, LoadedSound>,
    next_id: u64,
    // Dropping this ends the stream thread
    _shutdown: std_mpsc::Sender<()>,
}

impl RodioBackend {
    /// Open the default output device
    pub fn new() -> Result<Self, AudioError> {
        let (handle_tx, handle_rx) = std_mpsc::channel();
        let (shutdown_tx, shutdown_rx) = std_mpsc::channel::<()>();

        thread::spawn(move || match OutputStream::try_default() {
            Ok((_stream, handle)) => {
                let _ = handle_tx.send(Ok(handle));
                // Blocks until the backend is dropped
                let _ = shutdown_rx.recv();
            }
            Err(e) => {
                let _ = handle_tx.send(Err(e.to_string()));
            }
        });

        let output = handle_rx
            .recv()
            .map_err(|e| AudioError::Unavailable(e.to_string()))?
            .map_err(AudioError::Unavailable)?;

        log::info!("Audio output opened");

        Ok(RodioBackend {
            output,
            sounds: HashMap::new(),
            next_id: 1,
            _shutdown: shutdown_tx,
        })
    }
}

impl AudioBackend for RodioBackend {
    fn load(&mut self, clip: &Clip) -> Result<SoundHandle, AudioError> {
        let bytes = std::fs::read(&clip.path).map_err(|e| AudioError::Load {
            clip: clip.name.clone(),
            reason: e.to_string(),
        })?;

        let handle = SoundHandle(self.next_id);
        self.next_id += 1;
        self.sounds.insert(
            handle,
            LoadedSound {
                bytes: Arc::new(bytes),
                sink: None,
            },
        );
        Ok(handle)
    }

    fn play(&mut self, handle: SoundHandle, done: PlaybackNotifier) -> Result<(), AudioError> {
        let sound = self
            .sounds
            .get_mut(&handle)
            .ok_or_else(|| AudioError::Play(handle, "sound not loaded".to_string()))?;

        let source = Decoder::new(Cursor::new(sound.bytes.as_ref().clone()))
            .map_err(|e| AudioError::Play(handle, e.to_string()))?;
        let sink =
            Sink::try_new(&self.output).map_err(|e| AudioError::Play(handle, e.to_string()))?;
        sink.append(source);

        let sink = Arc::new(sink);
        sound.sink = Some(Arc::clone(&sink));

        // Also returns after stop(); the sequencer discards that report as stale
        thread::spawn(move || {
            sink.sleep_until_end();
            done.finished();
        });

        Ok(())
    }

    fn stop(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        let sound = self
            .sounds
            .get(&handle)
            .ok_or_else(|| AudioError::Stop(handle, "sound not loaded".to_string()))?;
        if let Some(sink) = &sound.sink {
            sink.stop();
        }
        Ok(())
    }

    fn release(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        let sound = self
            .sounds
            .remove(&handle)
            .ok_or_else(|| AudioError::Release(handle, "sound not loaded".to_string()))?;
        if let Some(sink) = sound.sink {
            sink.stop();
        }
        Ok(())
    }
}
