// Prediction ranking
// Turns a raw probability vector into a descending top-K classification result

use serde::{Deserialize, Serialize};

use super::backend::ClassifierError;

/// A single (label, probability) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,

    /// Probability in [0.0, 1.0]
    pub probability: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        Prediction {
            label: label.into(),
            probability,
        }
    }
}

/// Ranked classifier output, sorted descending by probability
/// Produced fresh per classification call and never mutated afterwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    predictions: Vec<Prediction>,
}

impl ClassificationResult {
    /// Build a result from predictions in any order; they are sorted here
    pub fn new(mut predictions: Vec<Prediction>) -> Self {
        predictions.sort_by(|a, b| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ClassificationResult { predictions }
    }

    /// Highest-probability entry
    pub fn top(&self) -> Option<&Prediction> {
        self.predictions.first()
    }

    /// Runner-up entry
    pub fn second(&self) -> Option<&Prediction> {
        self.predictions.get(1)
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Probability gap between the top two entries
    /// A missing runner-up counts as probability 0
    pub fn margin(&self) -> Option<f32> {
        let top = self.top()?;
        let second = self.second().map(|p| p.probability).unwrap_or(0.0);
        Some(top.probability - second)
    }
}

/// Rank a model's probability vector against its label table
///
/// The vector must have one finite entry in [0, 1] per label; anything else
/// is reported as malformed output rather than guessed at.
pub fn rank_predictions(
    probabilities: &[f32],
    labels: &[&str],
    top_k: usize,
) -> Result<ClassificationResult, ClassifierError> {
    if probabilities.len() != labels.len() {
        return Err(ClassifierError::MalformedOutput(format!(
            "expected {} probabilities, model returned {}",
            labels.len(),
            probabilities.len()
        )));
    }

    if let Some((idx, p)) = probabilities
        .iter()
        .enumerate()
        .find(|(_, p)| !p.is_finite() || **p < 0.0 || **p > 1.0)
    {
        return Err(ClassifierError::MalformedOutput(format!(
            "probability {} at index {} is outside [0, 1]",
            p, idx
        )));
    }

    let mut indexed: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let predictions = indexed
        .into_iter()
        .take(top_k)
        .map(|(idx, p)| Prediction::new(labels[idx], p))
        .collect();

    Ok(ClassificationResult::new(predictions))
}
