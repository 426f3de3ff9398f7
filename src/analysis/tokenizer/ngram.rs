//! N-gram tokenizer implementation.

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::{Result, TiffinError};

/// A tokenizer that generates character n-grams.
///
/// Character n-grams make the intent featurizer tolerant of spelling
/// variants that the corrector leaves alone ("dosai" and "dosa" share most
/// of their trigrams).
///
/// # Examples
///
/// ```
/// use tiffin::analysis::tokenizer::ngram::NgramTokenizer;
/// use tiffin::analysis::tokenizer::Tokenizer;
///
/// let tokenizer = NgramTokenizer::new(3, 3).unwrap();
/// let tokens: Vec<_> = tokenizer.tokenize("vada").unwrap()
///     .map(|t| t.text)
///     .collect();
/// assert_eq!(tokens, vec!["vad", "ada"]);
///
/// let tokenizer = NgramTokenizer::new(1, 2).unwrap();
/// let tokens: Vec<_> = tokenizer.tokenize("ab").unwrap()
///     .map(|t| t.text)
///     .collect();
/// assert_eq!(tokens, vec!["a", "ab", "b"]);
/// ```
#[derive(Clone, Debug)]
pub struct NgramTokenizer {
    /// Minimum n-gram size
    min_gram: usize,
    /// Maximum n-gram size
    max_gram: usize,
}

impl NgramTokenizer {
    /// Create a new n-gram tokenizer.
    ///
    /// # Errors
    ///
    /// Returns an error if `min_gram` is 0 or `max_gram` is less than `min_gram`.
    pub fn new(min_gram: usize, max_gram: usize) -> Result<Self> {
        if min_gram == 0 {
            return Err(TiffinError::analysis("min_gram must be at least 1"));
        }
        if max_gram < min_gram {
            return Err(TiffinError::analysis(format!(
                "max_gram ({max_gram}) must be >= min_gram ({min_gram})"
            )));
        }
        Ok(Self { min_gram, max_gram })
    }

    /// Create a trigram tokenizer (n=3).
    pub fn trigram() -> Self {
        Self {
            min_gram: 3,
            max_gram: 3,
        }
    }

    pub fn min_gram(&self) -> usize {
        self.min_gram
    }

    pub fn max_gram(&self) -> usize {
        self.max_gram
    }
}

impl Tokenizer for NgramTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut token_position = 0;
        let mut start_offset = 0;

        for start in 0..chars.len() {
            let mut end_offset = start_offset;
            for (idx, ch) in chars[start..].iter().enumerate() {
                let gram_size = idx + 1;
                if gram_size > self.max_gram {
                    break;
                }
                end_offset += ch.len_utf8();
                if gram_size < self.min_gram {
                    continue;
                }

                let ngram: String = chars[start..start + gram_size].iter().collect();
                tokens.push(Token::with_offsets(
                    ngram,
                    token_position,
                    start_offset,
                    end_offset,
                ));
                token_position += 1;
            }
            start_offset += chars[start].len_utf8();
        }

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "ngram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ngram_creation() {
        assert!(NgramTokenizer::new(1, 3).is_ok());
        assert!(NgramTokenizer::new(0, 3).is_err());
        assert!(NgramTokenizer::new(3, 2).is_err());
    }

    #[test]
    fn test_trigram_shorter_than_n() {
        let tokenizer = NgramTokenizer::trigram();
        let tokens: Vec<Token> = tokenizer.tokenize("hi").unwrap().collect();
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_all_lengths_with_offsets() {
        let tokenizer = NgramTokenizer::new(1, 3).unwrap();
        let tokens: Vec<Token> = tokenizer.tokenize("é b").unwrap().collect();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();

        assert_eq!(texts, vec!["é", "é ", "é b", " ", " b", "b"]);
        // 'é' is two bytes wide
        assert_eq!(tokens[2].start_offset, 0);
        assert_eq!(tokens[2].end_offset, 4);
        assert_eq!(tokens[5].start_offset, 3);
    }
}
