//! Engine configuration.
//!
//! Every field has a default, so a JSON config file only needs the values
//! it changes:
//!
//! ```
//! use tiffin::config::EngineConfig;
//!
//! let config: EngineConfig =
//!     serde_json::from_str(r#"{"data_dir": "assets", "confidence_threshold": 0.6}"#).unwrap();
//! assert_eq!(config.intents_path(), std::path::PathBuf::from("assets/intents.json"));
//! assert_eq!(config.history_capacity, 10_000);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dispatch::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::error::{Result, TiffinError};
use crate::ml::{FeaturizerConfig, TrainerConfig};
use crate::spelling::CorrectorConfig;

/// Settings for building an [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory every relative file name below is resolved against.
    pub data_dir: PathBuf,
    pub intents_file: String,
    pub entities_file: String,
    pub dictionary_file: String,
    pub affix_file: String,
    /// Extra domain vocabulary, one word per line. Skipped when absent.
    pub domain_words_file: Option<String>,
    pub intent_model_file: String,
    pub entity_model_file: String,
    /// Part-of-speech lexicon for the linguistic stage. Skipped when absent.
    pub pos_lexicon_file: Option<String>,

    /// Predictions at or below this confidence are not dispatched.
    pub confidence_threshold: f64,
    /// Whether live utterances are spell-corrected before classification.
    pub correct_at_inference: bool,
    /// Retrain even when a persisted intent model exists.
    pub force_retrain: bool,
    pub history_capacity: usize,

    pub corrector: CorrectorConfig,
    pub trainer: TrainerConfig,
    pub featurizer: FeaturizerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            data_dir: PathBuf::from("data"),
            intents_file: "intents.json".to_string(),
            entities_file: "entities.json".to_string(),
            dictionary_file: "en_US.dic".to_string(),
            affix_file: "en_US.aff".to_string(),
            domain_words_file: Some("domain_words.txt".to_string()),
            intent_model_file: "intent.model".to_string(),
            entity_model_file: "entity.model".to_string(),
            pos_lexicon_file: Some("pos_lexicon.json".to_string()),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            correct_at_inference: true,
            force_retrain: false,
            history_capacity: 10_000,
            corrector: CorrectorConfig::default(),
            trainer: TrainerConfig::default(),
            featurizer: FeaturizerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Default configuration rooted at `data_dir`.
    pub fn with_data_dir<P: Into<PathBuf>>(data_dir: P) -> Self {
        EngineConfig {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Read a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TiffinError::configuration(format!("cannot read config {}: {e}", path.display()))
        })?;
        let config: EngineConfig = serde_json::from_str(&content).map_err(|e| {
            TiffinError::configuration(format!("malformed config {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no engine can run with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.confidence_threshold) {
            return Err(TiffinError::configuration(format!(
                "confidence_threshold must be in [0, 1), got {}",
                self.confidence_threshold
            )));
        }
        if self.history_capacity == 0 {
            return Err(TiffinError::configuration(
                "history_capacity must be positive",
            ));
        }
        if self.featurizer.char_ngram_min == 0
            || self.featurizer.char_ngram_min > self.featurizer.char_ngram_max
        {
            return Err(TiffinError::configuration(format!(
                "invalid char n-gram range {}..={}",
                self.featurizer.char_ngram_min, self.featurizer.char_ngram_max
            )));
        }
        Ok(())
    }

    fn resolve(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    pub fn intents_path(&self) -> PathBuf {
        self.resolve(&self.intents_file)
    }

    pub fn entities_path(&self) -> PathBuf {
        self.resolve(&self.entities_file)
    }

    pub fn dictionary_path(&self) -> PathBuf {
        self.resolve(&self.dictionary_file)
    }

    pub fn affix_path(&self) -> PathBuf {
        self.resolve(&self.affix_file)
    }

    /// The domain word list, if configured and present on disk.
    pub fn domain_words_path(&self) -> Option<PathBuf> {
        self.domain_words_file
            .as_deref()
            .map(|name| self.resolve(name))
            .filter(|path| path.exists())
    }

    pub fn intent_model_path(&self) -> PathBuf {
        self.resolve(&self.intent_model_file)
    }

    pub fn entity_model_path(&self) -> PathBuf {
        self.resolve(&self.entity_model_file)
    }

    /// The POS lexicon path, if configured. Existence is checked by the
    /// entity pipeline, which degrades when it cannot load it.
    pub fn pos_lexicon_path(&self) -> Option<PathBuf> {
        self.pos_lexicon_file.as_deref().map(|name| self.resolve(name))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.confidence_threshold, 0.49);
        assert!(config.correct_at_inference);
        assert_eq!(config.corrector.max_distance, 3);
        assert_eq!(config.corrector.max_suggestions, 3);
        assert_eq!(config.featurizer.char_ngram_max, 3);
        assert!(config.trainer.enforce_non_negativity);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_paths() {
        let config = EngineConfig::with_data_dir("/srv/tiffin");
        assert_eq!(
            config.intent_model_path(),
            PathBuf::from("/srv/tiffin/intent.model")
        );
        assert_eq!(config.affix_path(), PathBuf::from("/srv/tiffin/en_US.aff"));
        assert_eq!(config.domain_words_path(), None);

        let config = EngineConfig {
            pos_lexicon_file: None,
            ..config
        };
        assert_eq!(config.pos_lexicon_path(), None);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"data_dir": "assets", "correct_at_inference": false, "corrector": {{"max_distance": 2}}}}"#
        )
        .unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("assets"));
        assert!(!config.correct_at_inference);
        assert_eq!(config.corrector.max_distance, 2);
        assert_eq!(config.corrector.max_suggestions, 3);
        assert_eq!(config.intents_file, "intents.json");
    }

    #[test]
    fn test_load_rejects_bad_threshold() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"confidence_threshold": 1.5}}"#).unwrap();

        let err = EngineConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, TiffinError::Configuration(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load("/nonexistent/tiffin.json").unwrap_err();
        assert!(err.is_fatal());
    }
}
