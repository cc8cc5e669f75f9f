// Acceptance policy
// Decides whether a ranked classification is confident and unambiguous enough to show

use serde::{Deserialize, Serialize};

use crate::classifier::{ClassificationResult, Prediction};
use crate::currency::{DetectionMode, NO_OBJECT_LABEL};

/// Minimum top-1 probability per detection mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeThresholds {
    pub coins: f32,
    pub old_peso: f32,
    pub new_peso: f32,
    pub usd: f32,
}

impl ModeThresholds {
    /// Same threshold for every mode
    pub fn uniform(threshold: f32) -> Self {
        ModeThresholds {
            coins: threshold,
            old_peso: threshold,
            new_peso: threshold,
            usd: threshold,
        }
    }

    pub fn get(&self, mode: DetectionMode) -> f32 {
        match mode {
            DetectionMode::Coins => self.coins,
            DetectionMode::OldPeso => self.old_peso,
            DetectionMode::NewPeso => self.new_peso,
            DetectionMode::Usd => self.usd,
        }
    }
}

impl Default for ModeThresholds {
    fn default() -> Self {
        // Uncalibrated values carried over from the shipped models
        ModeThresholds {
            coins: 0.98,
            old_peso: 1.0,
            new_peso: 1.0,
            usd: 1.0,
        }
    }
}

/// Configuration for the acceptance rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceptanceConfig {
    /// Required gap between the top two probabilities
    pub min_margin: f32,

    /// Label the models emit when nothing recognizable is in frame
    pub sentinel_label: String,

    pub min_confidence: ModeThresholds,
}

impl Default for AcceptanceConfig {
    fn default() -> Self {
        AcceptanceConfig {
            min_margin: 0.20,
            sentinel_label: NO_OBJECT_LABEL.to_string(),
            min_confidence: ModeThresholds::default(),
        }
    }
}

/// Why a classification was not surfaced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    /// The classifier returned no predictions
    Empty,

    /// Top label is the no-object sentinel
    NoObject,

    LowConfidence { probability: f32, required: f32 },

    NarrowMargin { margin: f32, required: f32 },
}

impl RejectReason {
    pub fn describe(&self) -> String {
        match self {
            RejectReason::Empty => "Classifier returned no predictions.".to_string(),
            RejectReason::NoObject => "No currency in frame.".to_string(),
            RejectReason::LowConfidence {
                probability,
                required,
            } => format!(
                "Confidence {:.1}% is below the {:.1}% required for this mode.",
                probability * 100.0,
                required * 100.0
            ),
            RejectReason::NarrowMargin { margin, required } => format!(
                "Lead over the runner-up is {:.1}%, needs at least {:.1}%.",
                margin * 100.0,
                required * 100.0
            ),
        }
    }
}

/// Outcome of the acceptance rules
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accept(Prediction),
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept(_))
    }
}

/// Confidence-plus-margin acceptance rule
/// Pure function of its inputs: holds no state and never mutates anything
#[derive(Debug, Clone)]
pub struct AcceptancePolicy {
    config: AcceptanceConfig,
}

impl AcceptancePolicy {
    pub fn new(config: AcceptanceConfig) -> Self {
        AcceptancePolicy { config }
    }

    /// Evaluate a ranked result for the given mode
    ///
    /// Rules, in order:
    /// 1. top label must not be the no-object sentinel
    /// 2. top probability must reach the mode's minimum confidence
    /// 3. top must beat the runner-up by at least the minimum margin
    pub fn evaluate(&self, result: &ClassificationResult, mode: DetectionMode) -> Verdict {
        let Some(top) = result.top() else {
            return Verdict::Reject(RejectReason::Empty);
        };

        if top.label == self.config.sentinel_label {
            return Verdict::Reject(RejectReason::NoObject);
        }

        let required = self.config.min_confidence.get(mode);
        if top.probability < required {
            return Verdict::Reject(RejectReason::LowConfidence {
                probability: top.probability,
                required,
            });
        }

        let margin = result.margin().unwrap_or(top.probability);
        if margin < self.config.min_margin {
            return Verdict::Reject(RejectReason::NarrowMargin {
                margin,
                required: self.config.min_margin,
            });
        }

        Verdict::Accept(top.clone())
    }
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        AcceptancePolicy::new(AcceptanceConfig::default())
    }
}

/// Explainable record of one finished scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionDecision {
    /// Capture ticket the scan belonged to
    pub ticket: u64,

    pub mode: DetectionMode,

    pub predictions: Vec<Prediction>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<f32>,

    pub accepted: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<RejectReason>,

    /// Set when the scan never produced a result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,

    pub reasoning: String,
}

impl DetectionDecision {
    /// Record a scan that produced a classification
    pub fn from_verdict(
        ticket: u64,
        mode: DetectionMode,
        result: &ClassificationResult,
        verdict: &Verdict,
    ) -> Self {
        let mut reason_parts = Vec::new();

        if let Some(top) = result.top() {
            reason_parts.push(format!(
                "Top prediction {} ({}% confidence) in {} mode.",
                top.label,
                (top.probability * 100.0) as u32,
                mode.as_str()
            ));
        }

        let reject_reason = match verdict {
            Verdict::Accept(p) => {
                reason_parts.push(format!("Accepted {}; awaiting confirmation.", p.label));
                None
            }
            Verdict::Reject(reason) => {
                reason_parts.push(format!("Rejected: {}", reason.describe()));
                Some(reason.clone())
            }
        };

        DetectionDecision {
            ticket,
            mode,
            predictions: result.predictions().to_vec(),
            margin: result.margin(),
            accepted: verdict.is_accept(),
            reject_reason,
            failure: None,
            reasoning: reason_parts.join(" "),
        }
    }

    /// Record a scan that failed before classification finished
    pub fn from_failure(ticket: u64, mode: DetectionMode, failure: impl Into<String>) -> Self {
        let failure = failure.into();
        DetectionDecision {
            ticket,
            mode,
            predictions: Vec::new(),
            margin: None,
            accepted: false,
            reject_reason: None,
            reasoning: format!("Scan failed: {}. Returned to idle.", failure),
            failure: Some(failure),
        }
    }
}
