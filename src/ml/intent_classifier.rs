//! Maximum-entropy intent classifier.
//!
//! Training cleans the examples, prepares their text with the shared
//! [`TextPreprocessor`], fits a [`TextFeaturizer`] vocabulary and a
//! [`MaxEntModel`], then sanity-checks the result on a tiny fixed
//! validation set. The trained artifact is swapped in as a whole, so a
//! concurrent [`IntentClassifier::predict`] sees either the old or the new
//! model, never a mix.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use log::{info, warn};
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TiffinError};
use crate::ml::features::{FeaturizerConfig, SparseVector, TextFeaturizer};
use crate::ml::maxent::{MaxEntModel, MaxEntTrainer, TrainerConfig, TrainingStats};
use crate::ml::metrics::{ClassificationMetrics, argmax};
use crate::ml::preprocess::{TextPreprocessor, clean_examples};
use crate::util::fs::write_atomic;

/// Smoke-test utterances scored after every training run.
pub const VALIDATION_SET: &[(&str, &str)] = &[("hi", "Greeting"), ("bye bye", "Goodbye")];

/// Training sample for intent classification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrainingExample {
    /// Utterance text.
    pub text: String,
    /// Intent label.
    pub label: String,
}

impl TrainingExample {
    pub fn new<T: Into<String>, L: Into<String>>(text: T, label: L) -> Self {
        TrainingExample {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// Probability assigned to one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Output of [`IntentClassifier::predict`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentPrediction {
    /// Highest scoring label.
    pub label: String,
    /// Score of `label`.
    pub confidence: f64,
    /// Every label with its score, in the model's label order.
    pub scores: Vec<LabelScore>,
}

impl IntentPrediction {
    /// The `k` best labels, highest score first.
    pub fn top(&self, k: usize) -> Vec<LabelScore> {
        let mut ranked = self.scores.clone();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(k);
        ranked
    }
}

/// A trained classifier artifact: labels, vocabulary and weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    labels: Vec<String>,
    featurizer: TextFeaturizer,
    model: MaxEntModel,
    stats: TrainingStats,
    trained_at: DateTime<Utc>,
    training_examples: usize,
}

impl TrainedModel {
    /// Labels in class-index order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Number of examples left after cleaning.
    pub fn training_examples(&self) -> usize {
        self.training_examples
    }

    pub fn vocabulary_size(&self) -> usize {
        self.featurizer.vocabulary_size()
    }

    /// Class probabilities for already prepared text.
    fn probabilities(&self, prepared: &str) -> Result<Vec<f64>> {
        let features = self.featurizer.transform(prepared)?;
        Ok(self.model.predict_proba(&features))
    }

    /// Score already prepared text.
    pub fn predict_prepared(&self, prepared: &str) -> Result<IntentPrediction> {
        let probs = self.probabilities(prepared)?;
        let best = argmax(&probs);

        Ok(IntentPrediction {
            label: self.labels[best].clone(),
            confidence: probs[best],
            scores: self
                .labels
                .iter()
                .zip(&probs)
                .map(|(label, score)| LabelScore {
                    label: label.clone(),
                    score: *score,
                })
                .collect(),
        })
    }
}

/// Trains and serves the intent model.
#[derive(Debug)]
pub struct IntentClassifier {
    preprocessor: TextPreprocessor,
    featurizer_config: FeaturizerConfig,
    trainer: MaxEntTrainer,
    model: RwLock<Option<Arc<TrainedModel>>>,
}

impl IntentClassifier {
    /// Create an untrained classifier.
    pub fn new(
        preprocessor: TextPreprocessor,
        featurizer_config: FeaturizerConfig,
        trainer_config: TrainerConfig,
    ) -> Self {
        IntentClassifier {
            preprocessor,
            featurizer_config,
            trainer: MaxEntTrainer::new(trainer_config),
            model: RwLock::new(None),
        }
    }

    /// The preprocessor shared by training and prediction.
    pub fn preprocessor(&self) -> &TextPreprocessor {
        &self.preprocessor
    }

    /// The current model, if any.
    pub fn current(&self) -> Option<Arc<TrainedModel>> {
        self.model.read().clone()
    }

    pub fn is_trained(&self) -> bool {
        self.model.read().is_some()
    }

    /// Labels the current model can produce; empty when untrained.
    pub fn labels(&self) -> Vec<String> {
        self.current()
            .map(|model| model.labels.clone())
            .unwrap_or_default()
    }

    /// Train a new model and make it current.
    ///
    /// Fails with [`TiffinError::TrainingData`] when no example survives
    /// cleaning.
    pub fn train(
        &self,
        examples: &[TrainingExample],
    ) -> Result<(ClassificationMetrics, Arc<TrainedModel>)> {
        let cleaned = clean_examples(examples);
        if cleaned.is_empty() {
            return Err(TiffinError::training_data(
                "no usable training examples after cleaning",
            ));
        }

        let texts: Vec<String> = cleaned
            .par_iter()
            .map(|example| self.preprocessor.prepare_training(&example.text))
            .collect();

        let mut labels: Vec<String> = Vec::new();
        let mut label_index: AHashMap<&str, usize> = AHashMap::new();
        let classes: Vec<usize> = cleaned
            .iter()
            .map(|example| {
                *label_index.entry(example.label.as_str()).or_insert_with(|| {
                    labels.push(example.label.clone());
                    labels.len() - 1
                })
            })
            .collect();

        info!(
            "Training intent classifier on {} examples across {} labels",
            cleaned.len(),
            labels.len()
        );

        let mut featurizer = TextFeaturizer::new(self.featurizer_config.clone())?;
        featurizer.fit(&texts)?;
        let vectors = texts
            .par_iter()
            .map(|text| featurizer.transform(text))
            .collect::<Result<Vec<SparseVector>>>()?;
        let data: Vec<(SparseVector, usize)> = vectors.into_iter().zip(classes).collect();

        let (model, stats) =
            self.trainer
                .train(&data, featurizer.vocabulary_size(), labels.len())?;

        let trained = Arc::new(TrainedModel {
            labels,
            featurizer,
            model,
            stats,
            trained_at: Utc::now(),
            training_examples: cleaned.len(),
        });

        let metrics = self.validate(&trained, &cleaned)?;
        info!(
            "Intent classifier trained: {} features, {} iterations, loss {:.6}, validation micro accuracy {:.3}",
            trained.vocabulary_size(),
            trained.stats.iterations,
            trained.stats.final_loss,
            metrics.micro_accuracy
        );

        *self.model.write() = Some(Arc::clone(&trained));
        Ok((metrics, trained))
    }

    /// Score the fixed validation utterances whose labels the model knows.
    /// Falls back to the training set when none apply.
    fn validate(
        &self,
        model: &TrainedModel,
        training: &[TrainingExample],
    ) -> Result<ClassificationMetrics> {
        let validation: Vec<TrainingExample> = VALIDATION_SET
            .iter()
            .filter(|(_, label)| model.labels.iter().any(|l| l == label))
            .map(|(text, label)| TrainingExample::new(*text, *label))
            .collect();

        if validation.is_empty() {
            warn!("no validation utterance matches a trained label; scoring the training set");
            self.evaluate_with(model, training)
        } else {
            self.evaluate_with(model, &validation)
        }
    }

    /// Evaluate the current model on labelled examples.
    ///
    /// Examples whose label the model does not know are skipped.
    pub fn evaluate(&self, examples: &[TrainingExample]) -> Result<ClassificationMetrics> {
        let model = self.require_model()?;
        self.evaluate_with(&model, examples)
    }

    fn evaluate_with(
        &self,
        model: &TrainedModel,
        examples: &[TrainingExample],
    ) -> Result<ClassificationMetrics> {
        let scored = examples
            .iter()
            .filter_map(|example| {
                let truth = model.labels.iter().position(|l| *l == example.label)?;
                let prepared = self.preprocessor.prepare_inference(&example.text);
                Some(model.probabilities(&prepared).map(|probs| (truth, probs)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ClassificationMetrics::evaluate(&model.labels, &scored))
    }

    /// Predict the intent of one utterance.
    pub fn predict(&self, text: &str) -> Result<IntentPrediction> {
        let model = self.require_model()?;
        let prepared = self.preprocessor.prepare_inference(text);
        model.predict_prepared(&prepared)
    }

    fn require_model(&self) -> Result<Arc<TrainedModel>> {
        self.current().ok_or_else(|| {
            TiffinError::model_not_trained("the intent classifier has not been trained or loaded")
        })
    }

    /// Persist the current model, replacing any file at `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let model = self.require_model()?;
        let bytes = bincode::serialize(model.as_ref())?;
        write_atomic(path, &bytes)?;
        info!("Saved intent model to {}", path.display());
        Ok(())
    }

    /// Load a model saved by [`IntentClassifier::save`] and make it current.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Arc<TrainedModel>> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let model: TrainedModel = bincode::deserialize(&bytes)?;
        if model.labels.is_empty() || model.model.num_classes() != model.labels.len() {
            return Err(TiffinError::serialization(format!(
                "intent model {} is inconsistent",
                path.display()
            )));
        }

        let model = Arc::new(model);
        *self.model.write() = Some(Arc::clone(&model));
        info!(
            "Loaded intent model from {} ({} labels)",
            path.display(),
            model.labels.len()
        );
        Ok(model)
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(
            TextPreprocessor::passthrough(),
            FeaturizerConfig::default(),
            TrainerConfig::default(),
        )
    }
}
