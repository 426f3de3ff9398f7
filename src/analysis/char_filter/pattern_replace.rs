use regex::Regex;

use super::CharFilter;
use crate::error::{Result, TiffinError};

/// A char filter that replaces every match of a regex pattern.
pub struct PatternReplaceCharFilter {
    pattern: Regex,
    replacement: String,
}

impl PatternReplaceCharFilter {
    /// Create a new pattern replace char filter.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)
                .map_err(|e| TiffinError::analysis(format!("Invalid regex pattern: {e}")))?,
            replacement: replacement.to_string(),
        })
    }

    /// Replace punctuation and symbols with a space.
    pub fn punctuation() -> Result<Self> {
        Self::new(r"[\p{P}\p{S}]+", " ")
    }

    /// Replace digit runs with a space.
    pub fn digits() -> Result<Self> {
        Self::new(r"\p{Nd}+", " ")
    }
}

impl CharFilter for PatternReplaceCharFilter {
    fn filter(&self, input: &str) -> String {
        self.pattern
            .replace_all(input, self.replacement.as_str())
            .into_owned()
    }

    fn name(&self) -> &'static str {
        "pattern_replace"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punctuation_replacement() {
        let filter = PatternReplaceCharFilter::punctuation().unwrap();
        assert_eq!(filter.filter("hi!! any dosa?"), "hi  any dosa ");
        assert_eq!(filter.filter("it's"), "it s");
    }

    #[test]
    fn test_digit_replacement() {
        let filter = PatternReplaceCharFilter::digits().unwrap();
        assert_eq!(filter.filter("table 12 now"), "table   now");
    }
}
