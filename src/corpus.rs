//! Intent and entity corpus files.
//!
//! Both files are JSON arrays. Field names are matched in lowercase or
//! PascalCase (`tag` / `Tag`), so corpora exported by other tools load
//! unchanged.

use std::fs;
use std::path::Path;

use ahash::AHashSet;
use log::info;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TiffinError};
use crate::ml::TrainingExample;

/// One intent: its tag, example utterances and static response data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentDefinition {
    #[serde(alias = "Tag")]
    pub tag: String,
    #[serde(alias = "Patterns", default)]
    pub patterns: Vec<String>,
    #[serde(alias = "Responses", default)]
    pub responses: Vec<String>,
    #[serde(alias = "Actions", default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
}

/// One entity type and the phrases that identify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDefinition {
    #[serde(alias = "Tag")]
    pub tag: String,
    #[serde(alias = "Patterns", default)]
    pub patterns: Vec<String>,
}

impl EntityDefinition {
    pub fn new<S: Into<String>>(tag: S, patterns: &[&str]) -> Self {
        EntityDefinition {
            tag: tag.into(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }
}

fn load_json_array<T: DeserializeOwned>(path: &Path, what: &str) -> Result<Vec<T>> {
    let content = fs::read_to_string(path).map_err(|e| {
        TiffinError::configuration(format!("cannot read {what} file {}: {e}", path.display()))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        TiffinError::configuration(format!("malformed {what} file {}: {e}", path.display()))
    })
}

fn check_unique_tags<'a, I: Iterator<Item = &'a str>>(tags: I, what: &str) -> Result<()> {
    let mut seen = AHashSet::new();
    for tag in tags {
        if tag.trim().is_empty() {
            return Err(TiffinError::configuration(format!("{what} with an empty tag")));
        }
        if !seen.insert(tag) {
            return Err(TiffinError::configuration(format!(
                "duplicate {what} tag '{tag}'"
            )));
        }
    }
    Ok(())
}

/// Load the intent corpus.
pub fn load_intents<P: AsRef<Path>>(path: P) -> Result<Vec<IntentDefinition>> {
    let path = path.as_ref();
    let intents: Vec<IntentDefinition> = load_json_array(path, "intent")?;
    check_unique_tags(intents.iter().map(|i| i.tag.as_str()), "intent")?;
    info!("Loaded {} intents from {}", intents.len(), path.display());
    Ok(intents)
}

/// Load the entity corpus.
pub fn load_entities<P: AsRef<Path>>(path: P) -> Result<Vec<EntityDefinition>> {
    let path = path.as_ref();
    let entities: Vec<EntityDefinition> = load_json_array(path, "entity")?;
    check_unique_tags(entities.iter().map(|e| e.tag.as_str()), "entity")?;
    info!("Loaded {} entity types from {}", entities.len(), path.display());
    Ok(entities)
}

/// Flatten intents into `(pattern, tag)` training examples, in file order.
pub fn training_examples(intents: &[IntentDefinition]) -> Vec<TrainingExample> {
    intents
        .iter()
        .flat_map(|intent| {
            intent
                .patterns
                .iter()
                .map(move |pattern| TrainingExample::new(pattern.clone(), intent.tag.clone()))
        })
        .collect()
}
