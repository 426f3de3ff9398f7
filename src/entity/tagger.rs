//! Lexicon-based part-of-speech tagger.
//!
//! The lexicon is a JSON object mapping lowercase words to Universal
//! Dependencies tags (`{"order": "VERB", "idli": "NOUN"}`). Words missing
//! from it are tagged from their shape.

use std::fs;
use std::path::Path;

use ahash::AHashMap;
use log::info;

use crate::analysis::token::{Token, TokenType};
use crate::error::{Result, TiffinError};

/// Tag used for every token when no tagger is available.
pub const UNKNOWN_POS: &str = "X";

#[derive(Debug, Clone, Default)]
pub struct PosTagger {
    lexicon: AHashMap<String, String>,
}

impl PosTagger {
    /// Load a lexicon file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TiffinError::configuration(format!(
                "cannot read POS lexicon {}: {e}",
                path.display()
            ))
        })?;
        let lexicon: AHashMap<String, String> = serde_json::from_str(&content)?;
        if lexicon.is_empty() {
            return Err(TiffinError::configuration(format!(
                "POS lexicon {} is empty",
                path.display()
            )));
        }

        info!("Loaded POS lexicon with {} entries", lexicon.len());
        Ok(Self::from_lexicon(lexicon))
    }

    pub fn from_lexicon<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        PosTagger {
            lexicon: entries
                .into_iter()
                .map(|(word, tag)| (word.as_ref().to_lowercase(), tag.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lexicon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexicon.is_empty()
    }

    /// One tag per token.
    pub fn tag(&self, tokens: &[Token]) -> Vec<String> {
        tokens
            .iter()
            .map(|token| match self.lexicon.get(&token.text.to_lowercase()) {
                Some(tag) => tag.clone(),
                None => guess(token).to_string(),
            })
            .collect()
    }
}

fn guess(token: &Token) -> &'static str {
    match token.token_type {
        Some(TokenType::Num) => "NUM",
        Some(TokenType::Punctuation) => "PUNCT",
        _ if token.position > 0 && token.text.chars().next().is_some_and(char::is_uppercase) => {
            "PROPN"
        }
        _ => "NOUN",
    }
}
