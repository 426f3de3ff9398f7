//! Spelling suggestion generation.

use std::cmp::Ordering;

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::spelling::dictionary::SpellingDictionary;
use crate::spelling::levenshtein::levenshtein_distance_threshold;

/// A spelling suggestion with a score indicating confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// The suggested word.
    pub word: String,
    /// Confidence score (higher is better, 0.0 to 1.0).
    pub score: f64,
    /// Edit distance from the original word.
    pub distance: usize,
    /// Frequency of the suggested word in the dictionary.
    pub frequency: u32,
    /// Whether the candidate came from the replacement table.
    pub from_replacement: bool,
}

impl Suggestion {
    /// Create a new suggestion.
    pub fn new(word: String, distance: usize, frequency: u32, from_replacement: bool) -> Self {
        Suggestion {
            word,
            score: 1.0 / (1.0 + distance as f64),
            distance,
            frequency,
            from_replacement,
        }
    }

    /// Ranking: replacement-table hits, then distance, then frequency,
    /// then the word itself so ties resolve the same way every time.
    fn rank(&self, other: &Self) -> Ordering {
        other
            .from_replacement
            .cmp(&self.from_replacement)
            .then(self.distance.cmp(&other.distance))
            .then(other.frequency.cmp(&self.frequency))
            .then_with(|| self.word.cmp(&other.word))
    }
}

/// Configuration for spelling suggestion generation.
#[derive(Debug, Clone)]
pub struct SuggestionConfig {
    /// Maximum edit distance to consider.
    pub max_distance: usize,
    /// Maximum number of suggestions to return.
    pub max_suggestions: usize,
    /// Minimum frequency threshold for suggestions.
    pub min_frequency: u32,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        SuggestionConfig {
            max_distance: 3,
            max_suggestions: 3,
            min_frequency: 1,
        }
    }
}

/// Main spelling suggestion engine.
///
/// Words are bucketed by character count so a lookup only measures
/// candidates whose length is within `max_distance` of the input.
#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    dictionary: SpellingDictionary,
    by_length: AHashMap<usize, Vec<String>>,
    config: SuggestionConfig,
}

impl SuggestionEngine {
    /// Create a new suggestion engine with the given dictionary.
    pub fn new(dictionary: SpellingDictionary) -> Self {
        Self::with_config(dictionary, SuggestionConfig::default())
    }

    /// Create a new suggestion engine with custom configuration.
    pub fn with_config(dictionary: SpellingDictionary, config: SuggestionConfig) -> Self {
        let mut by_length: AHashMap<usize, Vec<String>> = AHashMap::new();
        for (word, _) in dictionary.iter() {
            by_length
                .entry(word.chars().count())
                .or_default()
                .push(word.to_string());
        }
        for bucket in by_length.values_mut() {
            bucket.sort_unstable();
        }

        SuggestionEngine {
            dictionary,
            by_length,
            config,
        }
    }

    /// Add a word after construction, keeping the length index in step.
    pub fn add_word(&mut self, word: &str, frequency: u32) {
        let normalized = word.to_lowercase();
        let is_new = !normalized.is_empty() && !self.dictionary.contains(&normalized);
        self.dictionary.add_word(&normalized, frequency);
        if is_new {
            let bucket = self
                .by_length
                .entry(normalized.chars().count())
                .or_default();
            if let Err(position) = bucket.binary_search(&normalized) {
                bucket.insert(position, normalized);
            }
        }
    }

    /// Update the configuration.
    pub fn set_config(&mut self, config: SuggestionConfig) {
        self.config = config;
    }

    /// The dictionary backing this engine.
    pub fn dictionary(&self) -> &SpellingDictionary {
        &self.dictionary
    }

    /// Check if a word is correctly spelled.
    pub fn is_correct(&self, word: &str) -> bool {
        self.dictionary.contains(word)
    }

    /// Get suggestions for a potentially misspelled word, best first.
    pub fn suggest(&self, word: &str) -> Vec<Suggestion> {
        let word_lower = word.to_lowercase();
        if word_lower.is_empty() {
            return Vec::new();
        }

        if self.dictionary.contains(&word_lower) {
            let frequency = self.dictionary.frequency(&word_lower);
            return vec![Suggestion::new(word_lower, 0, frequency, false)];
        }

        let replaced = self.replacement_candidates(&word_lower);
        let max_distance = self.config.max_distance;
        let len = word_lower.chars().count();

        let mut suggestions = Vec::new();
        for candidate_len in len.saturating_sub(max_distance)..=len + max_distance {
            let Some(bucket) = self.by_length.get(&candidate_len) else {
                continue;
            };
            for candidate in bucket {
                let frequency = self.dictionary.frequency(candidate);
                if frequency < self.config.min_frequency {
                    continue;
                }
                if let Some(distance) =
                    levenshtein_distance_threshold(&word_lower, candidate, max_distance)
                {
                    suggestions.push(Suggestion::new(
                        candidate.clone(),
                        distance,
                        frequency,
                        replaced.contains(candidate.as_str()),
                    ));
                }
            }
        }

        suggestions.sort_by(Suggestion::rank);
        suggestions.truncate(self.config.max_suggestions);
        suggestions
    }

    /// Dictionary words reachable by one replacement-table substitution.
    fn replacement_candidates(&self, word: &str) -> AHashSet<String> {
        let mut candidates = AHashSet::new();
        for (from, to) in self.dictionary.replacements() {
            if from.is_empty() {
                continue;
            }
            for (index, _) in word.match_indices(from.as_str()) {
                let candidate = format!("{}{}{}", &word[..index], to, &word[index + from.len()..]);
                if self.dictionary.contains(&candidate) {
                    candidates.insert(candidate);
                }
            }
        }
        candidates
    }
}
