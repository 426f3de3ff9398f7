//! Text analysis for Tiffin.
//!
//! Analysis turns raw utterances into token streams. It is shared by the
//! intent featurizer (normalized, stop-word filtered words and character
//! n-grams) and by the entity spotter (raw word tokens with byte offsets).
//!
//! ```text
//! Raw Text → Char Filters → Tokenizer → Token Filters → Token Stream
//! ```

pub mod analyzer;
pub mod char_filter;
pub mod token;
pub mod token_filter;
pub mod tokenizer;
