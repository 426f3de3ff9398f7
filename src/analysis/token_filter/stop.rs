//! Stop filter implementation.
//!
//! Removes function words that carry no intent signal. The default list is
//! the English list the intent featurizer has always been trained with;
//! changing it changes the feature space of every saved model.
//!
//! # Examples
//!
//! ```
//! use tiffin::analysis::token_filter::Filter;
//! use tiffin::analysis::token_filter::stop::StopFilter;
//! use tiffin::analysis::token::Token;
//!
//! let filter = StopFilter::new();
//! let tokens = vec![
//!     Token::new("i", 0),
//!     Token::new("want", 1),
//!     Token::new("the", 2),
//!     Token::new("dosa", 3),
//! ];
//!
//! let result: Vec<_> = filter.filter(Box::new(tokens.into_iter()))
//!     .unwrap()
//!     .collect();
//!
//! assert_eq!(result.len(), 2);
//! assert_eq!(result[0].text, "want");
//! assert_eq!(result[1].text, "dosa");
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// Default English stop words list.
pub const DEFAULT_ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "don", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "s", "same", "she",
    "should", "so", "some", "such", "t", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "you", "your", "yours", "yourself",
    "yourselves",
];

/// A filter that removes stop words from the token stream.
///
/// Matching is exact, so place it after [`LowercaseFilter`](super::LowercaseFilter).
#[derive(Clone, Debug)]
pub struct StopFilter {
    stop_words: Arc<HashSet<String>>,
}

impl StopFilter {
    /// Create a stop filter with the default English list.
    pub fn new() -> Self {
        Self::from_words(DEFAULT_ENGLISH_STOP_WORDS.iter().copied())
    }

    /// Create a stop filter from a custom word list.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StopFilter {
            stop_words: Arc::new(words.into_iter().map(Into::into).collect()),
        }
    }

    /// Check if a word is a stop word.
    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Number of stop words in the list.
    pub fn len(&self) -> usize {
        self.stop_words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stop_words.is_empty()
    }
}

impl Default for StopFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for StopFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let stop_words = Arc::clone(&self.stop_words);
        Ok(Box::new(
            tokens.filter(move |token| !stop_words.contains(&token.text)),
        ))
    }

    fn name(&self) -> &'static str {
        "stop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::Token;

    #[test]
    fn test_default_list() {
        let filter = StopFilter::new();
        assert!(filter.is_stop_word("the"));
        assert!(filter.is_stop_word("yourselves"));
        assert!(!filter.is_stop_word("dosa"));
        assert!(!filter.is_stop_word("bye"));
    }

    #[test]
    fn test_custom_words() {
        let filter = StopFilter::from_words(vec!["please"]);
        let tokens = vec![Token::new("please", 0), Token::new("order", 1)];
        let result: Vec<Token> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].text, "order");
    }
}
