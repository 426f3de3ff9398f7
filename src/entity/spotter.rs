//! Gazetteer spotter: exact, case-insensitive phrase matching over tokens.

use serde::{Deserialize, Serialize};

use crate::analysis::token::Token;
use crate::analysis::tokenizer::{RegexTokenizer, Tokenizer};
use crate::error::Result;

/// Words (with inner apostrophes) and single punctuation marks.
pub const ENTITY_TOKEN_PATTERN: &str = r"\w+(?:['’]\w+)*|[^\w\s]";

/// Build the tokenizer shared by spotters and the entity pipeline.
pub fn entity_tokenizer() -> Result<RegexTokenizer> {
    RegexTokenizer::with_pattern(ENTITY_TOKEN_PATTERN)
}

/// Persisted form of one spotter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotterRecord {
    pub tag: String,
    pub patterns: Vec<String>,
    pub ignore_case: bool,
}

/// A half-open token range `[start, end)` matched by a spotter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpotMatch {
    pub start: usize,
    pub end: usize,
}

/// Recognizes the phrases of one entity type.
///
/// At each token position the longest matching phrase wins and scanning
/// resumes after it, so one spotter never reports overlapping spans.
#[derive(Debug, Clone)]
pub struct Spotter {
    record: SpotterRecord,
    /// Tokenized phrases, longest first.
    phrases: Vec<Vec<String>>,
}

impl Spotter {
    /// Build a case-insensitive spotter for `tag`.
    pub fn new<S: Into<String>>(tag: S, patterns: &[String], tokenizer: &RegexTokenizer) -> Result<Self> {
        Self::from_record(
            SpotterRecord {
                tag: tag.into(),
                patterns: patterns.to_vec(),
                ignore_case: true,
            },
            tokenizer,
        )
    }

    /// Rebuild a spotter from its persisted record.
    pub fn from_record(record: SpotterRecord, tokenizer: &RegexTokenizer) -> Result<Self> {
        let mut phrases = Vec::with_capacity(record.patterns.len());
        for pattern in &record.patterns {
            let phrase: Vec<String> = tokenizer
                .tokenize(pattern)?
                .map(|token| fold(&token.text, record.ignore_case))
                .collect();
            if !phrase.is_empty() && !phrases.contains(&phrase) {
                phrases.push(phrase);
            }
        }
        phrases.sort_by(|a, b| b.len().cmp(&a.len()));

        Ok(Spotter { record, phrases })
    }

    /// The entity type this spotter emits.
    pub fn tag(&self) -> &str {
        &self.record.tag
    }

    /// The persisted form of this spotter.
    pub fn record(&self) -> &SpotterRecord {
        &self.record
    }

    /// Number of distinct phrases.
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Find every phrase occurrence in `tokens`.
    pub fn find(&self, tokens: &[Token]) -> Vec<SpotMatch> {
        let folded: Vec<String> = tokens
            .iter()
            .map(|token| fold(&token.text, self.record.ignore_case))
            .collect();

        let mut matches = Vec::new();
        let mut start = 0;
        while start < folded.len() {
            let longest = self.phrases.iter().find(|phrase| {
                folded[start..]
                    .get(..phrase.len())
                    .is_some_and(|window| window == phrase.as_slice())
            });

            match longest {
                Some(phrase) => {
                    matches.push(SpotMatch {
                        start,
                        end: start + phrase.len(),
                    });
                    start += phrase.len();
                }
                None => start += 1,
            }
        }
        matches
    }
}

fn fold(text: &str, ignore_case: bool) -> String {
    if ignore_case {
        text.to_lowercase()
    } else {
        text.to_string()
    }
}
