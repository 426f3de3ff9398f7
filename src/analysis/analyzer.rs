//! Analyzers combine char filters, a tokenizer and token filters.
//!
//! [`PipelineAnalyzer`](pipeline::PipelineAnalyzer) is the only implementation;
//! the intent featurizer assembles one from its configuration.

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for analyzers that convert text into processed tokens.
///
/// The trait requires `Send + Sync` so one analyzer can serve concurrent
/// predictions.
pub trait Analyzer: Send + Sync {
    /// Analyze the given text and return a stream of tokens.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod pipeline;

pub use pipeline::PipelineAnalyzer;
