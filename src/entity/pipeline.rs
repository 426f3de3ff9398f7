//! Entity extraction pipeline: tokenizer, optional tagger, spotters.

use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::token::Token;
use crate::analysis::tokenizer::{RegexTokenizer, Tokenizer};
use crate::corpus::EntityDefinition;
use crate::entity::spotter::{Spotter, SpotterRecord, entity_tokenizer};
use crate::entity::tagger::{PosTagger, UNKNOWN_POS};
use crate::error::{Result, TiffinError};
use crate::util::fs::write_atomic;

/// An entity found in an utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedEntity {
    /// Tag of the definition that matched, e.g. `Name`.
    pub entity_type: String,
    /// The matched text as it appears in the utterance.
    pub entity_value: String,
    /// `[tokens]-[POS tags]` trace of the whole utterance.
    pub context: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SpotterArtifact {
    records: Vec<SpotterRecord>,
}

/// Extracts entities from raw utterances.
#[derive(Debug, Clone)]
pub struct EntityPipeline {
    tokenizer: RegexTokenizer,
    tagger: Option<PosTagger>,
    spotters: Vec<Spotter>,
}

impl EntityPipeline {
    /// Build spotters from `definitions` and try to load the POS lexicon.
    ///
    /// A lexicon that cannot be loaded is logged and the pipeline runs in
    /// spotter-only mode; pattern matching is unaffected.
    pub fn new(definitions: &[EntityDefinition], pos_lexicon: Option<&Path>) -> Result<Self> {
        let tagger = match pos_lexicon {
            Some(path) => match PosTagger::load(path) {
                Ok(tagger) => Some(tagger),
                Err(e) => {
                    warn!(
                        "POS tagger unavailable ({e}); continuing with spotter-only entity extraction"
                    );
                    None
                }
            },
            None => {
                info!("No POS lexicon configured; entity extraction is spotter-only");
                None
            }
        };

        let tokenizer = entity_tokenizer()?;
        let spotters = definitions
            .iter()
            .map(|definition| Spotter::new(definition.tag.clone(), &definition.patterns, &tokenizer))
            .collect::<Result<Vec<_>>>()?;

        Ok(EntityPipeline {
            tokenizer,
            tagger,
            spotters,
        })
    }

    /// A pipeline without the linguistic stage.
    pub fn spotter_only(definitions: &[EntityDefinition]) -> Result<Self> {
        let mut pipeline = Self::new(&[], None)?;
        pipeline.spotters = definitions
            .iter()
            .map(|definition| {
                Spotter::new(definition.tag.clone(), &definition.patterns, &pipeline.tokenizer)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(pipeline)
    }

    /// Whether part-of-speech tagging is active.
    pub fn has_tagger(&self) -> bool {
        self.tagger.is_some()
    }

    /// Entity types in definition order.
    pub fn tags(&self) -> Vec<&str> {
        self.spotters.iter().map(Spotter::tag).collect()
    }

    /// Tokenize an utterance the way extraction does.
    pub fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
        Ok(self.tokenizer.tokenize(text)?.collect())
    }

    /// Find every entity in `text`.
    ///
    /// Results are ordered by position in the utterance, then by definition
    /// order. Every match is kept, including repeats of the same value.
    pub fn extract(&self, text: &str) -> Result<Vec<RecognizedEntity>> {
        let tokens = self.tokenize(text)?;
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for (order, spotter) in self.spotters.iter().enumerate() {
            for spot in spotter.find(&tokens) {
                found.push((spot.start, order, spot.end));
            }
        }
        if found.is_empty() {
            return Ok(Vec::new());
        }
        found.sort_unstable();

        let context = self.context(&tokens);
        Ok(found
            .into_iter()
            .map(|(start, order, end)| RecognizedEntity {
                entity_type: self.spotters[order].tag().to_string(),
                entity_value: text[tokens[start].start_offset..tokens[end - 1].end_offset]
                    .to_string(),
                context: context.clone(),
            })
            .collect())
    }

    fn context(&self, tokens: &[Token]) -> String {
        let words: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        let tags = match &self.tagger {
            Some(tagger) => tagger.tag(tokens),
            None => vec![UNKNOWN_POS.to_string(); tokens.len()],
        };
        format!("[{}]-[{}]", words.join(", "), tags.join(", "))
    }

    /// Write the spotters to `path`, one record per entity type.
    pub fn persist<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let artifact = SpotterArtifact {
            records: self.spotters.iter().map(|s| s.record().clone()).collect(),
        };
        write_atomic(path, &bincode::serialize(&artifact)?)?;
        info!(
            "Persisted {} spotters to {}",
            artifact.records.len(),
            path.display()
        );
        Ok(())
    }

    /// Replace the spotters with those persisted at `path`.
    pub fn restore<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let artifact: SpotterArtifact = bincode::deserialize(&bytes)?;

        let spotters = artifact
            .records
            .into_iter()
            .map(|record| Spotter::from_record(record, &self.tokenizer))
            .collect::<Result<Vec<_>>>()?;
        if spotters.iter().any(|s| s.tag().is_empty()) {
            return Err(TiffinError::serialization(format!(
                "spotter artifact {} has a record without a tag",
                path.display()
            )));
        }

        info!("Restored {} spotters from {}", spotters.len(), path.display());
        self.spotters = spotters;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::{NamedTempFile, TempDir};

    use super::*;

    fn definitions() -> Vec<EntityDefinition> {
        vec![
            EntityDefinition::new("Name", &["raj", "priya"]),
            EntityDefinition::new("FoodItem", &["idli", "masala dosa", "dosa"]),
        ]
    }

    #[test]
    fn test_extract_name() {
        let pipeline = EntityPipeline::spotter_only(&definitions()).unwrap();
        let entities = pipeline.extract("order idli for raj").unwrap();

        assert!(
            entities
                .iter()
                .any(|e| e.entity_type == "Name" && e.entity_value == "raj")
        );
        assert_eq!(entities[0].entity_type, "FoodItem");
        assert_eq!(entities[0].entity_value, "idli");
        assert_eq!(
            entities[0].context,
            "[order, idli, for, raj]-[X, X, X, X]"
        );
    }

    #[test]
    fn test_all_matches_kept() {
        let pipeline = EntityPipeline::spotter_only(&definitions()).unwrap();
        let entities = pipeline
            .extract("Masala Dosa for Raj and dosa for raj")
            .unwrap();

        let values: Vec<(&str, &str)> = entities
            .iter()
            .map(|e| (e.entity_type.as_str(), e.entity_value.as_str()))
            .collect();
        assert_eq!(
            values,
            vec![
                ("FoodItem", "Masala Dosa"),
                ("Name", "Raj"),
                ("FoodItem", "dosa"),
                ("Name", "raj"),
            ]
        );
    }

    #[test]
    fn test_extract_is_pure() {
        let pipeline = EntityPipeline::spotter_only(&definitions()).unwrap();
        let first = pipeline.extract("idli and dosa for priya").unwrap();
        let second = pipeline.extract("idli and dosa for priya").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_text() {
        let pipeline = EntityPipeline::spotter_only(&definitions()).unwrap();
        assert!(pipeline.extract("").unwrap().is_empty());
        assert!(pipeline.extract("nothing here").unwrap().is_empty());
    }

    #[test]
    fn test_missing_lexicon_degrades() {
        let pipeline =
            EntityPipeline::new(&definitions(), Some(Path::new("/nonexistent/pos.json"))).unwrap();
        assert!(!pipeline.has_tagger());

        let entities = pipeline.extract("order idli for raj").unwrap();
        assert_eq!(entities.len(), 2);
    }

    #[test]
    fn test_tagger_context() {
        let mut lexicon = NamedTempFile::new().unwrap();
        write!(lexicon, r#"{{"order": "VERB", "for": "ADP", "idli": "NOUN"}}"#).unwrap();

        let pipeline = EntityPipeline::new(&definitions(), Some(lexicon.path())).unwrap();
        assert!(pipeline.has_tagger());

        let entities = pipeline.extract("order idli for Raj").unwrap();
        assert_eq!(
            entities[0].context,
            "[order, idli, for, Raj]-[VERB, NOUN, ADP, PROPN]"
        );
    }

    #[test]
    fn test_persist_restore() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entity.model");

        let original = EntityPipeline::spotter_only(&definitions()).unwrap();
        original.persist(&path).unwrap();

        let mut restored = EntityPipeline::spotter_only(&[]).unwrap();
        restored.restore(&path).unwrap();

        assert_eq!(restored.tags(), vec!["Name", "FoodItem"]);
        let text = "masala dosa and idli for priya";
        assert_eq!(restored.extract(text).unwrap(), original.extract(text).unwrap());
    }

    #[test]
    fn test_restore_missing_file() {
        let mut pipeline = EntityPipeline::spotter_only(&definitions()).unwrap();
        assert!(matches!(
            pipeline.restore("/nonexistent/entity.model"),
            Err(TiffinError::Io(_))
        ));
        assert_eq!(pipeline.tags().len(), 2);
    }
}
