// Classifier adapter
// Wraps the opaque per-mode models and turns a captured image into a ranked result

use ndarray::Array4;
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

use super::preprocess;
use super::ranking::{rank_predictions, ClassificationResult};
use crate::currency::{catalog, DetectionMode};

/// Errors that can occur during classification
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("No model loaded for mode: {0:?}")]
    ModelNotLoaded(DetectionMode),

    #[error("Image decoding failed: {0}")]
    ImageDecode(String),

    #[error("Inference failed: {0}")]
    InferenceError(String),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),
}

/// An opaque pre-trained model
/// Maps a normalized NHWC pixel tensor to one probability per label index
pub trait CurrencyModel: Send {
    fn predict(&mut self, input: &Array4<f32>) -> Result<Vec<f32>, ClassifierError>;
}

/// Unified classifier interface over one model per detection mode
pub struct Classifier {
    models: HashMap<DetectionMode, Box<dyn CurrencyModel>>,
    input_size: u32,
    top_k: usize,
}

impl Classifier {
    /// Create a classifier with no models registered yet
    pub fn new(input_size: u32, top_k: usize) -> Self {
        Classifier {
            models: HashMap::new(),
            input_size,
            top_k,
        }
    }

    /// Register (or replace) the model serving `mode`
    pub fn register(&mut self, mode: DetectionMode, model: Box<dyn CurrencyModel>) {
        log::info!("Model registered for {} detection", mode.as_str());
        self.models.insert(mode, model);
    }

    /// Builder-style variant of `register`
    pub fn with_model(mut self, mode: DetectionMode, model: Box<dyn CurrencyModel>) -> Self {
        self.register(mode, model);
        self
    }

    pub fn is_loaded(&self, mode: DetectionMode) -> bool {
        self.models.contains_key(&mode)
    }

    /// Classify an encoded image (JPEG/PNG bytes) with the model for `mode`
    pub fn classify(
        &mut self,
        image: &[u8],
        mode: DetectionMode,
    ) -> Result<ClassificationResult, ClassifierError> {
        if !self.is_loaded(mode) {
            return Err(ClassifierError::ModelNotLoaded(mode));
        }
        let tensor = preprocess::image_to_tensor(image, self.input_size)?;
        self.classify_tensor(tensor, mode)
    }

    /// Classify an already-normalized tensor
    /// The tensor is consumed and released once inference returns, on success or failure
    pub fn classify_tensor(
        &mut self,
        tensor: Array4<f32>,
        mode: DetectionMode,
    ) -> Result<ClassificationResult, ClassifierError> {
        let model = self
            .models
            .get_mut(&mode)
            .ok_or(ClassifierError::ModelNotLoaded(mode))?;

        let probabilities = model.predict(&tensor);
        drop(tensor);

        rank_predictions(&probabilities?, catalog::labels(mode), self.top_k)
    }
}

/// Deterministic model that replays queued probability vectors
/// Used for headless replays and tests; an empty queue is an inference failure
#[derive(Debug, Default)]
pub struct ScriptedModel {
    outputs: VecDeque<Result<Vec<f32>, String>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        ScriptedModel::default()
    }

    /// Queue a probability vector for the next call
    pub fn push(&mut self, probabilities: Vec<f32>) {
        self.outputs.push_back(Ok(probabilities));
    }

    /// Queue a failure for the next call
    pub fn push_failure(&mut self, message: impl Into<String>) {
        self.outputs.push_back(Err(message.into()));
    }

    pub fn remaining(&self) -> usize {
        self.outputs.len()
    }
}

impl CurrencyModel for ScriptedModel {
    fn predict(&mut self, _input: &Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        match self.outputs.pop_front() {
            Some(Ok(probabilities)) => Ok(probabilities),
            Some(Err(message)) => Err(ClassifierError::InferenceError(message)),
            None => Err(ClassifierError::InferenceError(
                "scripted model has no queued output".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_tensor() -> Array4<f32> {
        Array4::zeros((1, 4, 4, 3))
    }

    fn usd_probabilities(top_index: usize, top: f32) -> Vec<f32> {
        let n = catalog::labels(DetectionMode::Usd).len();
        let rest = (1.0 - top) / (n - 1) as f32;
        (0..n).map(|i| if i == top_index { top } else { rest }).collect()
    }

    #[test]
    fn test_unregistered_mode_fails() {
        let mut classifier = Classifier::new(4, 3);
        let err = classifier
            .classify_tensor(blank_tensor(), DetectionMode::Coins)
            .unwrap_err();
        assert!(matches!(err, ClassifierError::ModelNotLoaded(DetectionMode::Coins)));
    }

    #[test]
    fn test_classify_with_scripted_model() {
        let mut model = ScriptedModel::new();
        model.push(usd_probabilities(2, 0.94));
        let mut classifier = Classifier::new(4, 3).with_model(DetectionMode::Usd, Box::new(model));

        let result = classifier
            .classify_tensor(blank_tensor(), DetectionMode::Usd)
            .unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result.top().unwrap().label, "10 DOLLARS");
        assert!((result.top().unwrap().probability - 0.94).abs() < 1e-6);
    }

    #[test]
    fn test_model_failure_propagates() {
        let mut model = ScriptedModel::new();
        model.push_failure("backend crashed");
        let mut classifier = Classifier::new(4, 3).with_model(DetectionMode::Usd, Box::new(model));

        let err = classifier
            .classify_tensor(blank_tensor(), DetectionMode::Usd)
            .unwrap_err();
        assert!(matches!(err, ClassifierError::InferenceError(_)));
    }

    #[test]
    fn test_wrong_output_length_is_malformed() {
        let mut model = ScriptedModel::new();
        model.push(vec![0.5, 0.5]);
        let mut classifier = Classifier::new(4, 3).with_model(DetectionMode::Usd, Box::new(model));

        let err = classifier
            .classify_tensor(blank_tensor(), DetectionMode::Usd)
            .unwrap_err();
        assert!(matches!(err, ClassifierError::MalformedOutput(_)));
    }

    #[test]
    fn test_exhausted_script_fails() {
        let mut model = ScriptedModel::new();
        assert_eq!(model.remaining(), 0);
        assert!(model.predict(&blank_tensor()).is_err());
    }
}
