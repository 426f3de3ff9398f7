//! Entity spotting.
//!
//! Entities are found by exact, case-insensitive phrase matching against
//! configured gazetteers. A part-of-speech tagger enriches the diagnostic
//! context when its lexicon is available; without it extraction works the
//! same and the context carries `X` tags.

pub mod pipeline;
pub mod spotter;
pub mod tagger;

pub use pipeline::{EntityPipeline, RecognizedEntity};
pub use spotter::{Spotter, SpotterRecord};
pub use tagger::PosTagger;
