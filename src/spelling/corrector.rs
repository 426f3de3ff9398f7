//! Token-level spelling corrector.

use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::spelling::dictionary::{DOMAIN_FREQUENCY, SpellingDictionary};
use crate::spelling::suggest::{Suggestion, SuggestionConfig, SuggestionEngine};

/// Configuration for the spelling corrector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectorConfig {
    /// Maximum edit distance for suggestions.
    pub max_distance: usize,
    /// Maximum number of suggestions to consider.
    pub max_suggestions: usize,
    /// Minimum frequency threshold for suggestions.
    pub min_frequency: u32,
}

impl Default for CorrectorConfig {
    fn default() -> Self {
        CorrectorConfig {
            max_distance: 3,
            max_suggestions: 3,
            min_frequency: 1,
        }
    }
}

impl From<&CorrectorConfig> for SuggestionConfig {
    fn from(config: &CorrectorConfig) -> Self {
        SuggestionConfig {
            max_distance: config.max_distance,
            max_suggestions: config.max_suggestions,
            min_frequency: config.min_frequency,
        }
    }
}

/// One replaced token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordCorrection {
    /// The token as it appeared in the input.
    pub original: String,
    /// The replacement written to the output.
    pub replacement: String,
    /// Edit distance between the two.
    pub distance: usize,
}

/// Result of spelling correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionResult {
    /// Original text.
    pub original: String,
    /// Corrected text.
    pub corrected: String,
    /// Every replacement made, in input order.
    pub corrections: Vec<WordCorrection>,
}

impl CorrectionResult {
    /// Check if any token was replaced.
    pub fn has_corrections(&self) -> bool {
        !self.corrections.is_empty()
    }
}

/// Replaces misspelled tokens with their best dictionary suggestion.
///
/// Only the alphabetic core of a whitespace-delimited token is looked at:
/// surrounding punctuation is kept, tokens containing digits are left alone,
/// and the capitalisation of the original token is carried over.
#[derive(Debug, Clone)]
pub struct SpellingCorrector {
    engine: SuggestionEngine,
    config: CorrectorConfig,
}

impl SpellingCorrector {
    /// Create a corrector over an already assembled dictionary.
    pub fn new(dictionary: SpellingDictionary, config: CorrectorConfig) -> Self {
        let engine = SuggestionEngine::with_config(dictionary, SuggestionConfig::from(&config));
        SpellingCorrector { engine, config }
    }

    /// Load a Hunspell dictionary, merge the built-in domain vocabulary and
    /// an optional extra word list, and build a corrector over the result.
    pub fn from_files(
        dic_path: &Path,
        aff_path: &Path,
        domain_words: Option<&Path>,
        config: CorrectorConfig,
    ) -> Result<Self> {
        let mut dictionary = SpellingDictionary::from_hunspell(dic_path, aff_path)?;
        dictionary.add_domain_words();
        if let Some(path) = domain_words {
            dictionary.add_domain_word_file(path)?;
        }
        info!(
            "Spelling corrector ready with {} words",
            dictionary.word_count()
        );
        Ok(Self::new(dictionary, config))
    }

    /// Merge extra vocabulary, such as entity names and dish names, so it is
    /// never corrected. Returns the number of words offered.
    pub fn add_vocabulary<I, S>(&mut self, words: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut count = 0;
        for word in words {
            for part in word.as_ref().split_whitespace() {
                if part.chars().any(char::is_alphabetic) {
                    self.engine.add_word(part, DOMAIN_FREQUENCY);
                    count += 1;
                }
            }
        }
        count
    }

    /// The corrector configuration.
    pub fn config(&self) -> &CorrectorConfig {
        &self.config
    }

    /// The merged dictionary.
    pub fn dictionary(&self) -> &SpellingDictionary {
        self.engine.dictionary()
    }

    /// Suggestions for a single word, best first.
    pub fn suggest(&self, word: &str) -> Vec<Suggestion> {
        self.engine.suggest(word)
    }

    /// Correct a text. Empty input comes back unchanged.
    pub fn correct(&self, text: &str) -> String {
        self.correct_with_report(text).corrected
    }

    /// Correct a text and report what was replaced.
    pub fn correct_with_report(&self, text: &str) -> CorrectionResult {
        let mut corrected = String::with_capacity(text.len());
        let mut corrections = Vec::new();

        for piece in text.split_inclusive(char::is_whitespace) {
            let token = piece.trim_end();
            let whitespace = &piece[token.len()..];

            match self.correct_token(token) {
                Some((replacement, distance)) => {
                    debug!("corrected '{token}' to '{replacement}'");
                    corrections.push(WordCorrection {
                        original: token.to_string(),
                        replacement: replacement.clone(),
                        distance,
                    });
                    corrected.push_str(&replacement);
                }
                None => corrected.push_str(token),
            }
            corrected.push_str(whitespace);
        }

        CorrectionResult {
            original: text.to_string(),
            corrected,
            corrections,
        }
    }

    fn correct_token(&self, token: &str) -> Option<(String, usize)> {
        let start = token.find(char::is_alphabetic)?;
        let end = token
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, c)| i + c.len_utf8())?;
        let core = &token[start..end];

        if core.chars().any(|c| c.is_numeric()) || self.engine.is_correct(core) {
            return None;
        }

        let best = self.engine.suggest(core).into_iter().next()?;
        let replacement = format!(
            "{}{}{}",
            &token[..start],
            match_case(core, &best.word),
            &token[end..]
        );
        Some((replacement, best.distance))
    }
}

fn match_case(original: &str, replacement: &str) -> String {
    let mut chars = original.chars();
    let Some(first) = chars.next() else {
        return replacement.to_string();
    };

    if first.is_uppercase() && original.chars().count() > 1 && chars.all(|c| !c.is_lowercase()) {
        replacement.to_uppercase()
    } else if first.is_uppercase() {
        let mut out = String::with_capacity(replacement.len());
        let mut rest = replacement.chars();
        if let Some(head) = rest.next() {
            out.extend(head.to_uppercase());
        }
        out.push_str(rest.as_str());
        out
    } else {
        replacement.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corrector() -> SpellingCorrector {
        let mut dict = SpellingDictionary::new();
        for word in ["i", "want", "to", "order", "some", "please", "hello", "for"] {
            dict.add_word(word, 10);
        }
        dict.add_domain_words();
        SpellingCorrector::new(dict, CorrectorConfig::default())
    }

    #[test]
    fn test_correct_misspelled_word() {
        assert_eq!(corrector().correct("i want to ordr"), "i want to order");
    }

    #[test]
    fn test_domain_words_untouched() {
        let corrector = corrector();
        assert_eq!(corrector.correct("order idli"), "order idli");
        assert_eq!(corrector.correct("masala dosa please"), "masala dosa please");
    }

    #[test]
    fn test_added_vocabulary_never_corrected() {
        let mut corrector = corrector();
        assert_ne!(corrector.correct("order for raj"), "order for raj");

        let added = corrector.add_vocabulary(["Raj", "mango lassi", "65"]);
        assert_eq!(added, 3);
        assert_eq!(corrector.correct("order for raj"), "order for raj");
        assert_eq!(corrector.correct("Raj"), "Raj");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(corrector().correct(""), "");
        assert_eq!(corrector().correct("   "), "   ");
    }

    #[test]
    fn test_punctuation_and_case_preserved() {
        let corrector = corrector();
        assert_eq!(corrector.correct("Helo!"), "Hello!");
        assert_eq!(corrector.correct("PLEASE ordr."), "PLEASE order.");
        assert_eq!(corrector.correct("HELO  there"), "HELLO  there");
    }

    #[test]
    fn test_numbers_untouched() {
        assert_eq!(corrector().correct("2 dosas"), "2 dosas");
        assert_eq!(corrector().correct("table42"), "table42");
    }

    #[test]
    fn test_report() {
        let result = corrector().correct_with_report("ordr sme idli");
        assert!(result.has_corrections());
        assert_eq!(result.corrected, "order some idli");
        assert_eq!(result.corrections.len(), 2);
        assert_eq!(result.corrections[0].original, "ordr");
        assert_eq!(result.corrections[0].replacement, "order");
    }
}
