//! Token types and utilities for text analysis.
//!
//! A [`Token`] is the unit that flows through the analysis pipeline: the
//! token text plus its position in the stream and its byte offsets in the
//! text the tokenizer saw.
//!
//! # Examples
//!
//! ```
//! use tiffin::analysis::token::Token;
//!
//! let token = Token::with_offsets("idli", 1, 6, 10);
//! assert_eq!(token.text, "idli");
//! assert_eq!(token.start_offset, 6);
//! assert_eq!(token.end_offset, 10);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A token represents a single unit of text after tokenization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The text content of the token
    pub text: String,

    /// The position of the token in the token stream (0-based)
    pub position: usize,

    /// The byte offset where this token starts in the tokenized text
    pub start_offset: usize,

    /// The byte offset where this token ends in the tokenized text
    pub end_offset: usize,

    /// Content classification, when the tokenizer knows it
    pub token_type: Option<TokenType>,
}

/// Token type classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    /// Alphanumeric text
    Alphanum,
    /// Numeric values
    Num,
    /// Punctuation marks
    Punctuation,
    /// Other/unknown token types
    Other,
}

impl TokenType {
    /// Classify a word by its characters.
    pub fn detect(word: &str) -> Self {
        if word.is_empty() {
            TokenType::Other
        } else if word.chars().all(|c| c.is_numeric()) {
            TokenType::Num
        } else if word.chars().all(|c| c.is_alphanumeric()) {
            TokenType::Alphanum
        } else if word.chars().all(|c| c.is_ascii_punctuation()) {
            TokenType::Punctuation
        } else {
            TokenType::Other
        }
    }
}

impl Token {
    /// Create a new token with the given text and position.
    pub fn new<S: Into<String>>(text: S, position: usize) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset: 0,
            end_offset: 0,
            token_type: None,
        }
    }

    /// Create a new token with text, position, and byte offsets.
    pub fn with_offsets<S: Into<String>>(
        text: S,
        position: usize,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset,
            end_offset,
            token_type: None,
        }
    }

    /// Set the token type.
    pub fn with_token_type(mut self, token_type: TokenType) -> Self {
        self.token_type = Some(token_type);
        self
    }

    /// Clone this token with updated text.
    pub fn with_text<S: Into<String>>(&self, text: S) -> Self {
        let mut token = self.clone();
        token.text = text.into();
        token
    }

    /// Get the length of the token text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if the token text is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A token stream represents a sequence of tokens from the analysis pipeline.
pub type TokenStream = Box<dyn Iterator<Item = Token>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_creation() {
        let token = Token::new("hello", 0);
        assert_eq!(token.text, "hello");
        assert_eq!(token.position, 0);
        assert_eq!(token.start_offset, 0);
        assert_eq!(token.end_offset, 0);
        assert!(token.token_type.is_none());
    }

    #[test]
    fn test_token_type_detection() {
        assert_eq!(TokenType::detect("dosa"), TokenType::Alphanum);
        assert_eq!(TokenType::detect("42"), TokenType::Num);
        assert_eq!(TokenType::detect("?!"), TokenType::Punctuation);
        assert_eq!(TokenType::detect(""), TokenType::Other);
    }

    #[test]
    fn test_token_display() {
        let token = Token::new("vada", 0);
        assert_eq!(format!("{token}"), "vada");
    }
}
