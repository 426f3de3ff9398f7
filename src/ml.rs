//! Intent classification.
//!
//! - [`features`]: word and character n-gram featurization
//! - [`maxent`]: regularized softmax model and its trainer
//! - [`metrics`]: multiclass evaluation
//! - [`preprocess`]: cleaning and spelling-correction policy
//! - [`intent_classifier`]: train / predict / save / load

pub mod features;
pub mod intent_classifier;
pub mod maxent;
pub mod metrics;
pub mod preprocess;

pub use features::{FeaturizerConfig, SparseVector, TextFeaturizer};
pub use intent_classifier::{
    IntentClassifier, IntentPrediction, LabelScore, TrainedModel, TrainingExample,
};
pub use maxent::{MaxEntModel, MaxEntTrainer, TrainerConfig, TrainingStats};
pub use metrics::ClassificationMetrics;
pub use preprocess::TextPreprocessor;
