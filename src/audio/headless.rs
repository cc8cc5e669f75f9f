// Headless playback
// Timer-driven backend: "plays" a clip by waiting out its duration

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::backend::{AudioBackend, AudioError, Clip, PlaybackNotifier, SoundHandle};

/// Backend for devices without audio output, replays and tests
/// WAV durations are read from the header; other formats use the fallback duration
pub struct HeadlessBackend {
    fallback: Duration,
    next_id: u64,
    loaded: HashMap<SoundHandle, Duration>,
    playing: HashMap<SoundHandle, JoinHandle<()>>,
}

impl HeadlessBackend {
    pub fn new(fallback: Duration) -> Self {
        HeadlessBackend {
            fallback,
            next_id: 1,
            loaded: HashMap::new(),
            playing: HashMap::new(),
        }
    }

    fn abort(&mut self, handle: SoundHandle) {
        if let Some(task) = self.playing.remove(&handle) {
            task.abort();
        }
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        HeadlessBackend::new(Duration::from_millis(800))
    }
}

/// Duration of a WAV file, or None if it is not a readable WAV
pub fn wav_duration(path: &Path) -> Option<Duration> {
    let reader = hound::WavReader::open(path).ok()?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return None;
    }
    // duration() counts frames (samples per channel)
    let frames = reader.duration() as f64;
    Some(Duration::from_secs_f64(frames / spec.sample_rate as f64))
}

impl AudioBackend for HeadlessBackend {
    fn load(&mut self, clip: &Clip) -> Result<SoundHandle, AudioError> {
        if !clip.path.is_file() {
            return Err(AudioError::Load {
                clip: clip.name.clone(),
                reason: format!("{} not found", clip.path.display()),
            });
        }

        let duration = wav_duration(&clip.path).unwrap_or(self.fallback);
        let handle = SoundHandle(self.next_id);
        self.next_id += 1;
        self.loaded.insert(handle, duration);
        Ok(handle)
    }

    fn play(&mut self, handle: SoundHandle, done: PlaybackNotifier) -> Result<(), AudioError> {
        let duration = *self
            .loaded
            .get(&handle)
            .ok_or_else(|| AudioError::Play(handle, "sound not loaded".to_string()))?;

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| AudioError::Unavailable(e.to_string()))?;

        self.abort(handle);
        let task = runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            done.finished();
        });
        self.playing.insert(handle, task);
        Ok(())
    }

    fn stop(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        self.abort(handle);
        Ok(())
    }

    fn release(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        self.abort(handle);
        self.loaded
            .remove(&handle)
            .map(|_| ())
            .ok_or_else(|| AudioError::Release(handle, "sound not loaded".to_string()))
    }
}

impl Drop for HeadlessBackend {
    fn drop(&mut self) {
        for (_, task) in self.playing.drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    fn write_wav(dir: &TempDir, name: &str, sample_rate: u32, frames: u32) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..frames {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn test_wav_duration() {
        let dir = TempDir::new().unwrap();
        let path = write_wav(&dir, "half.wav", 8000, 4000);
        assert_eq!(wav_duration(&path), Some(Duration::from_millis(500)));

        let not_wav = dir.path().join("cue.mp3");
        std::fs::write(&not_wav, b"ID3").unwrap();
        assert_eq!(wav_duration(&not_wav), None);
    }

    #[test]
    fn test_missing_file_fails_to_load() {
        let mut backend = HeadlessBackend::default();
        let err = backend.load(&Clip::new("ghost", "/nonexistent/ghost.wav")).unwrap_err();
        assert!(matches!(err, AudioError::Load { .. }));
    }

    #[tokio::test]
    async fn test_playback_signals_completion() {
        let dir = TempDir::new().unwrap();
        let path = write_wav(&dir, "blip.wav", 8000, 80);

        let mut backend = HeadlessBackend::default();
        let handle = backend.load(&Clip::new("blip", path)).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        backend.play(handle, PlaybackNotifier::new(handle, tx)).unwrap();

        let finished = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap();
        assert_eq!(finished, Some(handle));
        assert!(backend.release(handle).is_ok());
    }

    #[tokio::test]
    async fn test_stop_suppresses_completion() {
        let dir = TempDir::new().unwrap();
        let path = write_wav(&dir, "long.wav", 8000, 8000);

        let mut backend = HeadlessBackend::default();
        let handle = backend.load(&Clip::new("long", path)).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        // Keep a sender alive so an aborted timer cannot close the channel
        backend.play(handle, PlaybackNotifier::new(handle, tx.clone())).unwrap();
        backend.stop(handle).unwrap();

        let waited = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(waited.is_err());
    }

    #[test]
    fn test_double_release_fails() {
        let dir = TempDir::new().unwrap();
        let path = write_wav(&dir, "blip.wav", 8000, 80);
        let mut backend = HeadlessBackend::default();
        let handle = backend.load(&Clip::new("blip", path)).unwrap();
        assert!(backend.release(handle).is_ok());
        assert!(matches!(backend.release(handle), Err(AudioError::Release(..))));
    }
}
