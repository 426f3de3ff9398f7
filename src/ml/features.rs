//! Text featurization for the intent classifier.
//!
//! Each utterance becomes a bag of word n-grams and character n-grams over
//! a shared vocabulary, L2-normalized as a single vector. The vocabulary is
//! fixed by [`TextFeaturizer::fit`]; unseen grams are dropped at transform
//! time.

use std::sync::Arc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{Analyzer, PipelineAnalyzer};
use crate::analysis::char_filter::{PatternReplaceCharFilter, UnicodeNormalizationCharFilter};
use crate::analysis::token_filter::{LowercaseFilter, StopFilter};
use crate::analysis::tokenizer::{NgramTokenizer, UnicodeWordTokenizer};
use crate::error::{Result, TiffinError};

const WORD_PREFIX: &str = "w:";
const CHAR_PREFIX: &str = "c:";

/// Configuration for feature extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturizerConfig {
    /// Longest word n-gram (1 = unigrams only).
    pub word_ngram_length: usize,
    /// Shortest character n-gram.
    pub char_ngram_min: usize,
    /// Longest character n-gram.
    pub char_ngram_max: usize,
    /// Drop common English stop words before building word n-grams.
    pub remove_stop_words: bool,
    /// Keep digit runs as words.
    pub keep_numbers: bool,
    /// Fold accented letters to their base letter.
    pub strip_diacritics: bool,
    /// Replace punctuation and symbols with whitespace.
    pub strip_punctuation: bool,
}

impl Default for FeaturizerConfig {
    fn default() -> Self {
        FeaturizerConfig {
            word_ngram_length: 1,
            char_ngram_min: 1,
            char_ngram_max: 3,
            remove_stop_words: true,
            keep_numbers: true,
            strip_diacritics: true,
            strip_punctuation: true,
        }
    }
}

/// A sparse feature vector with strictly increasing indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Build from unordered `(index, value)` pairs, summing duplicates.
    pub fn from_pairs(mut pairs: Vec<(u32, f64)>) -> Self {
        pairs.sort_unstable_by_key(|(index, _)| *index);

        let mut vector = SparseVector::default();
        for (index, value) in pairs {
            if vector.indices.last() == Some(&index) {
                if let Some(last) = vector.values.last_mut() {
                    *last += value;
                }
            } else {
                vector.indices.push(index);
                vector.values.push(value);
            }
        }
        vector
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Scale to unit length. The zero vector is left as is.
    pub fn l2_normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for value in &mut self.values {
                *value /= norm;
            }
        }
    }

    /// Dot product with a dense slice.
    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.iter()
            .map(|(index, value)| dense.get(index).copied().unwrap_or(0.0) * value)
            .sum()
    }

    /// Iterate over `(index, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices
            .iter()
            .zip(&self.values)
            .map(|(index, value)| (*index as usize, *value))
    }
}

/// Serialized form of a fitted featurizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FeaturizerState {
    config: FeaturizerConfig,
    vocabulary: Vec<String>,
}

/// Turns text into sparse feature vectors.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "FeaturizerState", into = "FeaturizerState")]
pub struct TextFeaturizer {
    config: FeaturizerConfig,
    word_analyzer: PipelineAnalyzer,
    char_analyzer: PipelineAnalyzer,
    /// Feature name -> index mapping.
    vocabulary: AHashMap<String, u32>,
    /// Feature names in index order.
    features: Vec<String>,
}

impl std::fmt::Debug for TextFeaturizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextFeaturizer")
            .field("config", &self.config)
            .field("vocabulary_size", &self.features.len())
            .field("word_analyzer", &self.word_analyzer.pipeline_name())
            .field("char_analyzer", &self.char_analyzer.pipeline_name())
            .finish()
    }
}

impl TextFeaturizer {
    /// Create an unfitted featurizer.
    pub fn new(config: FeaturizerConfig) -> Result<Self> {
        if config.word_ngram_length == 0 {
            return Err(TiffinError::configuration(
                "word_ngram_length must be at least 1",
            ));
        }

        let mut word_analyzer = PipelineAnalyzer::new(Arc::new(UnicodeWordTokenizer::new()));
        let mut char_analyzer = PipelineAnalyzer::new(Arc::new(NgramTokenizer::new(
            config.char_ngram_min,
            config.char_ngram_max,
        )?));

        if config.strip_diacritics {
            let filter = Arc::new(UnicodeNormalizationCharFilter::strip_diacritics());
            word_analyzer = word_analyzer.add_char_filter(filter.clone());
            char_analyzer = char_analyzer.add_char_filter(filter);
        }
        if config.strip_punctuation {
            let filter = Arc::new(PatternReplaceCharFilter::punctuation()?);
            word_analyzer = word_analyzer.add_char_filter(filter.clone());
            char_analyzer = char_analyzer.add_char_filter(filter);
        }
        if !config.keep_numbers {
            word_analyzer = word_analyzer.add_char_filter(Arc::new(PatternReplaceCharFilter::digits()?));
        }
        char_analyzer = char_analyzer
            .add_char_filter(Arc::new(PatternReplaceCharFilter::new(r"\s+", " ")?))
            .add_char_filter(Arc::new(PatternReplaceCharFilter::new(r"^ | $", "")?));

        let lowercase = Arc::new(LowercaseFilter::new());
        word_analyzer = word_analyzer.add_filter(lowercase.clone());
        char_analyzer = char_analyzer.add_filter(lowercase);
        if config.remove_stop_words {
            word_analyzer = word_analyzer.add_filter(Arc::new(StopFilter::new()));
        }

        Ok(TextFeaturizer {
            config,
            word_analyzer: word_analyzer.with_name("intent_words"),
            char_analyzer: char_analyzer.with_name("intent_chars"),
            vocabulary: AHashMap::new(),
            features: Vec::new(),
        })
    }

    /// The featurizer configuration.
    pub fn config(&self) -> &FeaturizerConfig {
        &self.config
    }

    /// Number of features in the fitted vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.features.len()
    }

    /// Feature names in index order.
    pub fn feature_names(&self) -> &[String] {
        &self.features
    }

    /// Build the vocabulary from training texts, replacing any previous one.
    ///
    /// Indices are assigned in order of first appearance, so the same
    /// texts always produce the same vocabulary.
    pub fn fit<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<()> {
        self.vocabulary.clear();
        self.features.clear();

        for text in texts {
            for gram in self.grams(text.as_ref())? {
                if !self.vocabulary.contains_key(&gram) {
                    self.vocabulary.insert(gram.clone(), self.features.len() as u32);
                    self.features.push(gram);
                }
            }
        }
        Ok(())
    }

    /// Transform a text into an L2-normalized sparse vector.
    pub fn transform(&self, text: &str) -> Result<SparseVector> {
        let pairs = self
            .grams(text)?
            .into_iter()
            .filter_map(|gram| self.vocabulary.get(&gram).map(|&index| (index, 1.0)))
            .collect();

        let mut vector = SparseVector::from_pairs(pairs);
        vector.l2_normalize();
        Ok(vector)
    }

    /// All prefixed grams of `text`, with repeats.
    fn grams(&self, text: &str) -> Result<Vec<String>> {
        let words: Vec<String> = self.word_analyzer.analyze(text)?.map(|t| t.text).collect();

        let mut grams = Vec::new();
        for n in 1..=self.config.word_ngram_length {
            for window in words.windows(n) {
                grams.push(format!("{WORD_PREFIX}{}", window.join(" ")));
            }
        }
        grams.extend(
            self.char_analyzer
                .analyze(text)?
                .map(|t| format!("{CHAR_PREFIX}{}", t.text)),
        );
        Ok(grams)
    }
}

impl From<TextFeaturizer> for FeaturizerState {
    fn from(featurizer: TextFeaturizer) -> Self {
        FeaturizerState {
            config: featurizer.config,
            vocabulary: featurizer.features,
        }
    }
}

impl TryFrom<FeaturizerState> for TextFeaturizer {
    type Error = TiffinError;

    fn try_from(state: FeaturizerState) -> Result<Self> {
        let mut featurizer = TextFeaturizer::new(state.config)?;
        featurizer.vocabulary = state
            .vocabulary
            .iter()
            .enumerate()
            .map(|(index, gram)| (gram.clone(), index as u32))
            .collect();
        featurizer.features = state.vocabulary;
        Ok(featurizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted(texts: &[&str]) -> TextFeaturizer {
        let mut featurizer = TextFeaturizer::new(FeaturizerConfig::default()).unwrap();
        featurizer.fit(texts).unwrap();
        featurizer
    }

    #[test]
    fn test_sparse_vector_from_pairs() {
        let vector = SparseVector::from_pairs(vec![(3, 1.0), (1, 2.0), (3, 1.0)]);
        assert_eq!(vector.indices, vec![1, 3]);
        assert_eq!(vector.values, vec![2.0, 2.0]);
        assert_eq!(vector.dot(&[0.0, 1.0, 0.0, 0.5]), 3.0);
    }

    #[test]
    fn test_word_and_char_features() {
        let featurizer = fitted(&["hi"]);
        let names = featurizer.feature_names();

        assert!(names.contains(&"w:hi".to_string()));
        assert!(names.contains(&"c:h".to_string()));
        assert!(names.contains(&"c:hi".to_string()));
        assert!(names.contains(&"c:i".to_string()));
    }

    #[test]
    fn test_normalization_steps() {
        let featurizer = fitted(&["Café, the DOSA! 2"]);
        let names = featurizer.feature_names();

        assert!(names.contains(&"w:cafe".to_string()));
        assert!(names.contains(&"w:dosa".to_string()));
        assert!(names.contains(&"w:2".to_string()));
        assert!(!names.contains(&"w:the".to_string()));
        assert!(!names.iter().any(|n| n.contains(',') || n.contains('!')));
    }

    #[test]
    fn test_transform_is_unit_length() {
        let featurizer = fitted(&["i want a masala dosa", "show me the menu"]);
        let vector = featurizer.transform("masala dosa please").unwrap();

        assert!(!vector.is_empty());
        assert!((vector.norm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_text_is_empty() {
        let featurizer = fitted(&["abc"]);
        let vector = featurizer.transform("xyz").unwrap();
        assert!(vector.is_empty());
        assert_eq!(vector.norm(), 0.0);
    }

    #[test]
    fn test_word_bigrams() {
        let config = FeaturizerConfig {
            word_ngram_length: 2,
            ..Default::default()
        };
        let mut featurizer = TextFeaturizer::new(config).unwrap();
        featurizer.fit(&["masala dosa"]).unwrap();
        assert!(
            featurizer
                .feature_names()
                .contains(&"w:masala dosa".to_string())
        );
    }

    #[test]
    fn test_serde_restores_vocabulary() {
        let featurizer = fitted(&["order some idli"]);
        let bytes = bincode::serialize(&featurizer).unwrap();
        let restored: TextFeaturizer = bincode::deserialize(&bytes).unwrap();

        assert_eq!(restored.feature_names(), featurizer.feature_names());
        assert_eq!(
            restored.transform("idli").unwrap(),
            featurizer.transform("idli").unwrap()
        );
    }
}
