//! Dictionary management for spelling correction.

use std::fs;
use std::path::Path;

use ahash::AHashMap;
use log::info;

use crate::error::{Result, TiffinError};
use crate::spelling::affix::{AffixRules, parse_dic};
use crate::spelling::domain::{DOMAIN_WORDS, load_word_list};

/// Frequency assigned to every form generated from a Hunspell word list.
pub const BASE_FREQUENCY: u32 = 1;

/// Frequency assigned to domain words, so they outrank general English
/// candidates at equal edit distance.
pub const DOMAIN_FREQUENCY: u32 = 100;

/// A dictionary that stores words and their frequencies for spelling correction.
#[derive(Debug, Clone, Default)]
pub struct SpellingDictionary {
    /// Lowercased words and their frequencies
    words: AHashMap<String, u32>,
    /// Replacement table tried before plain edit distance
    replacements: Vec<(String, String)>,
    /// Total word count for probability calculations
    total_count: u64,
}

impl SpellingDictionary {
    /// Create a new empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a Hunspell `.dic`/`.aff` pair, expanding every affixed form.
    pub fn from_hunspell<P: AsRef<Path>, Q: AsRef<Path>>(dic_path: P, aff_path: Q) -> Result<Self> {
        let dic_path = dic_path.as_ref();
        let rules = AffixRules::load(aff_path)?;
        let content = fs::read_to_string(dic_path).map_err(|e| {
            TiffinError::configuration(format!(
                "cannot read dictionary {}: {e}",
                dic_path.display()
            ))
        })?;

        let dictionary = Self::from_parts(&content, &rules);
        info!(
            "Loaded dictionary {} ({} word forms, {} replacements)",
            dic_path.display(),
            dictionary.word_count(),
            dictionary.replacements.len()
        );
        Ok(dictionary)
    }

    /// Build a dictionary from `.dic` content and already parsed affix rules.
    pub fn from_parts(dic_content: &str, rules: &AffixRules) -> Self {
        let mut dictionary = SpellingDictionary::new();
        for (word, flags) in parse_dic(dic_content) {
            for form in rules.expand(&word, &flags) {
                dictionary.add_word(&form, BASE_FREQUENCY);
            }
        }
        dictionary.replacements = rules.replacements().to_vec();
        dictionary
    }

    /// Add a word, keeping the higher of the existing and given frequency.
    pub fn add_word(&mut self, word: &str, frequency: u32) {
        let normalized = word.to_lowercase();
        if normalized.is_empty() {
            return;
        }

        let entry = self.words.entry(normalized).or_insert(0);
        if frequency > *entry {
            self.total_count += u64::from(frequency - *entry);
            *entry = frequency;
        }
    }

    /// Merge the built-in restaurant vocabulary.
    pub fn add_domain_words(&mut self) {
        for word in DOMAIN_WORDS {
            self.add_word(word, DOMAIN_FREQUENCY);
        }
    }

    /// Merge a supplementary domain word list file.
    pub fn add_domain_word_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let words = load_word_list(path)?;
        for word in &words {
            self.add_word(word, DOMAIN_FREQUENCY);
        }
        info!("Merged {} domain words from {}", words.len(), path.display());
        Ok(words.len())
    }

    /// Check if a word exists in the dictionary.
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains_key(&word.to_lowercase())
    }

    /// Get the frequency of a word.
    pub fn frequency(&self, word: &str) -> u32 {
        self.words.get(&word.to_lowercase()).copied().unwrap_or(0)
    }

    /// Get the probability of a word (frequency / total_count).
    pub fn probability(&self, word: &str) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }
        self.frequency(word) as f64 / self.total_count as f64
    }

    /// Iterate over every word with its frequency.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.words.iter().map(|(word, freq)| (word.as_str(), *freq))
    }

    /// Replacement pairs from the affix file.
    pub fn replacements(&self) -> &[(String, String)] {
        &self.replacements
    }

    /// Get the total number of unique words.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Get the total frequency count.
    pub fn total_frequency(&self) -> u64 {
        self.total_count
    }

    /// Merge another dictionary into this one.
    pub fn merge(&mut self, other: &SpellingDictionary) {
        for (word, frequency) in other.iter() {
            self.add_word(word, frequency);
        }
        for pair in &other.replacements {
            if !self.replacements.contains(pair) {
                self.replacements.push(pair.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_add_and_lookup() {
        let mut dict = SpellingDictionary::new();
        dict.add_word("Hello", 5);
        dict.add_word("world", 3);

        assert!(dict.contains("hello"));
        assert!(dict.contains("HELLO"));
        assert_eq!(dict.frequency("hello"), 5);
        assert_eq!(dict.word_count(), 2);
        assert_eq!(dict.total_frequency(), 8);
    }

    #[test]
    fn test_add_keeps_higher_frequency() {
        let mut dict = SpellingDictionary::new();
        dict.add_word("dosa", 100);
        dict.add_word("dosa", 1);

        assert_eq!(dict.frequency("dosa"), 100);
        assert_eq!(dict.total_frequency(), 100);
    }

    #[test]
    fn test_domain_words() {
        let mut dict = SpellingDictionary::new();
        dict.add_domain_words();

        assert!(dict.contains("idli"));
        assert!(dict.contains("dosa"));
        assert_eq!(dict.frequency("masala"), DOMAIN_FREQUENCY);
    }

    #[test]
    fn test_from_hunspell() {
        let mut dic = NamedTempFile::new().unwrap();
        writeln!(dic, "2\norder/DS\nplease").unwrap();
        let mut aff = NamedTempFile::new().unwrap();
        writeln!(
            aff,
            "SET UTF-8\nREP 1\nREP f ph\nSFX D Y 1\nSFX D 0 ed [^ey]\nSFX S Y 1\nSFX S 0 s [^y]"
        )
        .unwrap();

        let dict = SpellingDictionary::from_hunspell(dic.path(), aff.path()).unwrap();
        assert!(dict.contains("order"));
        assert!(dict.contains("ordered"));
        assert!(dict.contains("orders"));
        assert!(dict.contains("please"));
        assert_eq!(dict.replacements().len(), 1);
    }

    #[test]
    fn test_missing_dictionary_is_configuration_error() {
        let aff = NamedTempFile::new().unwrap();
        let result = SpellingDictionary::from_hunspell("/nonexistent/en_US.dic", aff.path());
        assert!(matches!(result, Err(TiffinError::Configuration(_))));
    }

    #[test]
    fn test_merge() {
        let mut a = SpellingDictionary::new();
        a.add_word("hello", 2);
        let mut b = SpellingDictionary::new();
        b.add_word("hello", 7);
        b.add_word("biryani", 100);

        a.merge(&b);
        assert_eq!(a.frequency("hello"), 7);
        assert!(a.contains("biryani"));
    }
}
