//! Unicode word tokenizer implementation.
//!
//! Splits text on Unicode word boundaries (UAX #29) and keeps only word
//! segments. The intent featurizer builds its word n-grams from these.
//!
//! # Examples
//!
//! ```
//! use tiffin::analysis::tokenizer::Tokenizer;
//! use tiffin::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
//!
//! let tokenizer = UnicodeWordTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("Order idli, for Raj!").unwrap().collect();
//!
//! assert_eq!(tokens.len(), 4);
//! assert_eq!(tokens[3].text, "Raj");
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::{Token, TokenStream, TokenType};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// A tokenizer that splits text on Unicode word boundaries.
#[derive(Clone, Debug, Default)]
pub struct UnicodeWordTokenizer;

impl UnicodeWordTokenizer {
    /// Create a new Unicode word tokenizer.
    pub fn new() -> Self {
        UnicodeWordTokenizer
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let tokens: Vec<Token> = text
            .unicode_word_indices()
            .enumerate()
            .map(|(position, (offset, word))| {
                Token::with_offsets(word, position, offset, offset + word.len())
                    .with_token_type(TokenType::detect(word))
            })
            .collect();

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "unicode_word"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punctuation_is_dropped() {
        let tokenizer = UnicodeWordTokenizer::new();
        let tokens: Vec<Token> = tokenizer
            .tokenize("Hi, I'd like masala dosa.")
            .unwrap()
            .collect();

        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Hi", "I'd", "like", "masala", "dosa"]);
    }

    #[test]
    fn test_offsets_point_into_original() {
        let text = "chai  for Priya";
        let tokenizer = UnicodeWordTokenizer::new();
        let tokens: Vec<Token> = tokenizer.tokenize(text).unwrap().collect();

        for token in &tokens {
            assert_eq!(&text[token.start_offset..token.end_offset], token.text);
        }
        assert_eq!(tokens[2].position, 2);
    }

    #[test]
    fn test_empty_input() {
        let tokenizer = UnicodeWordTokenizer::new();
        assert_eq!(tokenizer.tokenize("").unwrap().count(), 0);
    }
}
