// Classifier module
// Image preprocessing, model adapter and top-K ranking

pub mod backend;
pub mod preprocess;
pub mod ranking;

pub use backend::{Classifier, ClassifierError, CurrencyModel, ScriptedModel};
pub use ranking::{rank_predictions, ClassificationResult, Prediction};
