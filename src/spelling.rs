//! Spelling correction against a Hunspell dictionary extended with
//! restaurant vocabulary.

pub mod affix;
pub mod corrector;
pub mod dictionary;
pub mod domain;
pub mod levenshtein;
pub mod suggest;

pub use corrector::{CorrectionResult, CorrectorConfig, SpellingCorrector, WordCorrection};
pub use dictionary::SpellingDictionary;
pub use suggest::{Suggestion, SuggestionConfig, SuggestionEngine};
