//! # Tiffin
//!
//! Intent routing for a restaurant ordering assistant.
//!
//! ## Pipeline
//!
//! - Spelling correction against a Hunspell dictionary merged with
//!   restaurant vocabulary
//! - Intent classification with a regularized maximum-entropy model over
//!   word and character n-grams
//! - Gazetteer entity spotting (names, food items) on the raw utterance
//! - Confidence-gated dispatch to templated handlers
//!
//! [`engine::Engine`] wires the pieces together and owns all state.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod dispatch;
pub mod engine;
pub mod entity;
pub mod error;
pub mod ml;
pub mod spelling;
pub mod util;

pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::dispatch::{DispatchOutcome, Response};
    pub use crate::engine::Engine;
    pub use crate::entity::RecognizedEntity;
    pub use crate::error::{Result, TiffinError};
    pub use crate::ml::{IntentPrediction, TrainingExample};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
