// Capture and scan
// Still-image sources and the capture-then-classify unit of work

use std::collections::VecDeque;
use std::path::PathBuf;
use thiserror::Error;

use crate::classifier::{ClassificationResult, Classifier, ClassifierError};
use crate::currency::DetectionMode;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Capture source has no more images")]
    Exhausted,
}

/// Anything that can go wrong between a capture request and a ranked result
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Classification failed: {0}")]
    Classification(#[from] ClassifierError),

    #[error("Scan worker aborted: {0}")]
    WorkerAborted(String),
}

/// An encoded still image
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,

    /// Where the image came from, if it was a file
    pub origin: Option<PathBuf>,
}

/// Produces a still image on request; may block for as long as the camera needs
pub trait CaptureSource: Send {
    fn capture(&mut self) -> Result<CapturedImage, CaptureError>;
}

/// Replays image files in order, one per capture
#[derive(Debug, Default)]
pub struct FileSequenceSource {
    paths: VecDeque<PathBuf>,
}

impl FileSequenceSource {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        FileSequenceSource {
            paths: paths.into_iter().collect(),
        }
    }
}

impl CaptureSource for FileSequenceSource {
    fn capture(&mut self) -> Result<CapturedImage, CaptureError> {
        let path = self.paths.pop_front().ok_or(CaptureError::Exhausted)?;
        let bytes = std::fs::read(&path)?;
        Ok(CapturedImage {
            bytes,
            origin: Some(path),
        })
    }
}

/// Capture source and classifier run together as one blocking unit
pub struct Scanner {
    source: Box<dyn CaptureSource>,
    classifier: Classifier,
}

impl Scanner {
    pub fn new(source: Box<dyn CaptureSource>, classifier: Classifier) -> Self {
        Scanner { source, classifier }
    }

    /// Capture one still and classify it with the model for `mode`
    pub fn scan(&mut self, mode: DetectionMode) -> Result<ClassificationResult, ScanError> {
        let image = self.source.capture()?;
        if let Some(origin) = &image.origin {
            log::debug!("Captured {} ({} bytes)", origin.display(), image.bytes.len());
        }
        Ok(self.classifier.classify(&image.bytes, mode)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ScriptedModel;
    use crate::currency::catalog;
    use image::{ImageFormat, Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_png(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        RgbImage::from_pixel(8, 8, Rgb([120, 90, 60]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    #[test]
    fn test_file_sequence_source() {
        let dir = TempDir::new().unwrap();
        let path = write_png(&dir, "a.png");
        let mut source = FileSequenceSource::new(vec![path.clone()]);

        let image = source.capture().unwrap();
        assert_eq!(image.origin, Some(path));
        assert!(!image.bytes.is_empty());
        assert!(matches!(source.capture(), Err(CaptureError::Exhausted)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut source = FileSequenceSource::new(vec![PathBuf::from("/nonexistent/frame.jpg")]);
        assert!(matches!(source.capture(), Err(CaptureError::Io(_))));
    }

    #[test]
    fn test_scan_end_to_end() {
        let dir = TempDir::new().unwrap();
        let path = write_png(&dir, "bill.png");

        let labels = catalog::labels(DetectionMode::OldPeso);
        let mut probabilities = vec![0.0; labels.len()];
        probabilities[2] = 0.9;
        probabilities[0] = 0.1;
        let mut model = ScriptedModel::new();
        model.push(probabilities);

        let classifier = Classifier::new(16, 3).with_model(DetectionMode::OldPeso, Box::new(model));
        let mut scanner = Scanner::new(Box::new(FileSequenceSource::new(vec![path])), classifier);

        let result = scanner.scan(DetectionMode::OldPeso).unwrap();
        assert_eq!(result.top().unwrap().label, "100 PESO");

        // Source exhausted on the second scan
        assert!(matches!(
            scanner.scan(DetectionMode::OldPeso),
            Err(ScanError::Capture(CaptureError::Exhausted))
        ));
    }
}
