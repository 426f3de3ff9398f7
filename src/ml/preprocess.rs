//! Text preparation shared by training and prediction.
//!
//! Both paths of [`IntentClassifier`](crate::ml::intent_classifier::IntentClassifier)
//! go through one [`TextPreprocessor`], so the feature space seen at
//! prediction time is built from text prepared the same way as the
//! training text.

use std::sync::Arc;

use ahash::AHashSet;
use log::debug;

use crate::ml::intent_classifier::TrainingExample;
use crate::spelling::SpellingCorrector;

/// Applies spelling correction according to the configured policy.
#[derive(Debug, Clone, Default)]
pub struct TextPreprocessor {
    corrector: Option<Arc<SpellingCorrector>>,
    correct_at_inference: bool,
}

impl TextPreprocessor {
    /// Create a preprocessor. Without a corrector, text passes through.
    pub fn new(corrector: Option<Arc<SpellingCorrector>>, correct_at_inference: bool) -> Self {
        TextPreprocessor {
            corrector,
            correct_at_inference,
        }
    }

    /// A preprocessor that never changes text.
    pub fn passthrough() -> Self {
        Self::default()
    }

    /// Whether prediction input is corrected too.
    pub fn corrects_at_inference(&self) -> bool {
        self.corrector.is_some() && self.correct_at_inference
    }

    /// Prepare a training example's text.
    pub fn prepare_training(&self, text: &str) -> String {
        match &self.corrector {
            Some(corrector) => corrector.correct(text),
            None => text.to_string(),
        }
    }

    /// Prepare an utterance for prediction.
    pub fn prepare_inference(&self, text: &str) -> String {
        match &self.corrector {
            Some(corrector) if self.correct_at_inference => corrector.correct(text),
            _ => text.to_string(),
        }
    }
}

/// Drop examples with a blank text or label and collapse exact
/// `(label, text)` duplicates, keeping the first occurrence.
pub fn clean_examples(examples: &[TrainingExample]) -> Vec<TrainingExample> {
    let mut seen = AHashSet::new();
    let mut cleaned = Vec::with_capacity(examples.len());
    for example in examples {
        if example.text.trim().is_empty() || example.label.trim().is_empty() {
            continue;
        }
        if seen.insert((example.label.as_str(), example.text.as_str())) {
            cleaned.push(example.clone());
        }
    }

    debug!(
        "cleaned training set: {} of {} examples kept",
        cleaned.len(),
        examples.len()
    );
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spelling::{CorrectorConfig, SpellingDictionary};

    fn corrector() -> Arc<SpellingCorrector> {
        let mut dict = SpellingDictionary::new();
        dict.add_word("order", 10);
        dict.add_domain_words();
        Arc::new(SpellingCorrector::new(dict, CorrectorConfig::default()))
    }

    #[test]
    fn test_clean_examples() {
        let examples = vec![
            TrainingExample::new("hi", "Greeting"),
            TrainingExample::new("hi", "Greeting"),
            TrainingExample::new("hi", "Other"),
            TrainingExample::new("", "Greeting"),
            TrainingExample::new("hello", " "),
        ];

        let cleaned = clean_examples(&examples);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0], TrainingExample::new("hi", "Greeting"));
        assert_eq!(cleaned[1], TrainingExample::new("hi", "Other"));
    }

    #[test]
    fn test_policy() {
        let symmetric = TextPreprocessor::new(Some(corrector()), true);
        assert_eq!(symmetric.prepare_training("ordr idli"), "order idli");
        assert_eq!(symmetric.prepare_inference("ordr idli"), "order idli");
        assert!(symmetric.corrects_at_inference());

        let training_only = TextPreprocessor::new(Some(corrector()), false);
        assert_eq!(training_only.prepare_training("ordr"), "order");
        assert_eq!(training_only.prepare_inference("ordr"), "ordr");
        assert!(!training_only.corrects_at_inference());

        let passthrough = TextPreprocessor::passthrough();
        assert_eq!(passthrough.prepare_training("ordr"), "ordr");
    }
}
