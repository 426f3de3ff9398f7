//! Char filters that normalize raw text before tokenization.
//!
//! - [`unicode_normalize::UnicodeNormalizationCharFilter`] - Unicode normalization,
//!   optionally folding diacritics away
//! - [`pattern_replace::PatternReplaceCharFilter`] - Regex-based replacement

/// Trait for character filters that transform text before tokenization.
pub trait CharFilter: Send + Sync {
    /// Apply this filter to the input text.
    fn filter(&self, input: &str) -> String;

    /// Get the name of this char filter.
    fn name(&self) -> &'static str;
}

pub mod pattern_replace;
pub mod unicode_normalize;

pub use pattern_replace::PatternReplaceCharFilter;
pub use unicode_normalize::{NormalizationForm, UnicodeNormalizationCharFilter};
