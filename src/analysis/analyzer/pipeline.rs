//! Pipeline analyzer that combines char filters, a tokenizer and filters.
//!
//! Processing order:
//! 1. Char filters normalize the raw text
//! 2. The tokenizer splits it into tokens
//! 3. Token filters run in the order they were added
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use tiffin::analysis::analyzer::Analyzer;
//! use tiffin::analysis::analyzer::pipeline::PipelineAnalyzer;
//! use tiffin::analysis::char_filter::PatternReplaceCharFilter;
//! use tiffin::analysis::token_filter::{LowercaseFilter, StopFilter};
//! use tiffin::analysis::tokenizer::RegexTokenizer;
//!
//! let analyzer = PipelineAnalyzer::new(Arc::new(RegexTokenizer::new().unwrap()))
//!     .add_char_filter(Arc::new(PatternReplaceCharFilter::punctuation().unwrap()))
//!     .add_filter(Arc::new(LowercaseFilter::new()))
//!     .add_filter(Arc::new(StopFilter::new()));
//!
//! let tokens: Vec<_> = analyzer.analyze("Do you have Idli?").unwrap().collect();
//! assert_eq!(tokens.len(), 1);
//! assert_eq!(tokens[0].text, "idli");
//! ```

use std::sync::Arc;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::char_filter::CharFilter;
use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::Filter;
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// A configurable analyzer that combines a tokenizer with chains of filters.
#[derive(Clone)]
pub struct PipelineAnalyzer {
    tokenizer: Arc<dyn Tokenizer>,
    char_filters: Vec<Arc<dyn CharFilter>>,
    filters: Vec<Arc<dyn Filter>>,
    name: String,
}

impl PipelineAnalyzer {
    /// Create a new pipeline analyzer with the given tokenizer.
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        PipelineAnalyzer {
            name: format!("pipeline_{}", tokenizer.name()),
            tokenizer,
            char_filters: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Add a char filter to the pipeline.
    pub fn add_char_filter(mut self, char_filter: Arc<dyn CharFilter>) -> Self {
        self.char_filters.push(char_filter);
        self
    }

    /// Add a filter to the pipeline.
    pub fn add_filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Set a custom name for this analyzer.
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Get the configured name of this analyzer.
    pub fn pipeline_name(&self) -> &str {
        &self.name
    }

    /// Run only the char filters over `text`.
    pub fn normalize(&self, text: &str) -> String {
        self.char_filters
            .iter()
            .fold(text.to_string(), |acc, char_filter| char_filter.filter(&acc))
    }
}

impl Analyzer for PipelineAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        let normalized = self.normalize(text);
        let mut tokens = self.tokenizer.tokenize(&normalized)?;

        for filter in &self.filters {
            tokens = filter.filter(tokens)?;
        }

        Ok(tokens)
    }

    fn name(&self) -> &'static str {
        "pipeline"
    }
}

impl std::fmt::Debug for PipelineAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineAnalyzer")
            .field("name", &self.name)
            .field("tokenizer", &self.tokenizer.name())
            .field(
                "char_filters",
                &self.char_filters.iter().map(|f| f.name()).collect::<Vec<_>>(),
            )
            .field(
                "filters",
                &self.filters.iter().map(|f| f.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
