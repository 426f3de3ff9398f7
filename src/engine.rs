//! The engine: one explicitly owned context wiring the corrector,
//! classifier, entity pipeline, router and response history.
//!
//! Several engines can live in one process; nothing is global.
//!
//! ```no_run
//! use tiffin::config::EngineConfig;
//! use tiffin::engine::Engine;
//!
//! let engine = Engine::builder(EngineConfig::with_data_dir("data")).build()?;
//! let outcome = engine.respond("can i get a masala dosa")?;
//! println!("{}", outcome.text());
//! # Ok::<(), tiffin::error::TiffinError>(())
//! ```

use std::sync::Arc;

use ahash::AHashSet;
use chrono::{Local, Timelike};
use log::{debug, info, warn};
use parking_lot::RwLock;

use crate::config::EngineConfig;
use crate::corpus::{self, EntityDefinition, IntentDefinition};
use crate::dispatch::{DispatchOutcome, ResponseHistory, Router};
use crate::entity::{EntityPipeline, RecognizedEntity};
use crate::error::Result;
use crate::ml::preprocess::clean_examples;
use crate::ml::{ClassificationMetrics, IntentClassifier, IntentPrediction, TextPreprocessor};
use crate::spelling::{CorrectionResult, SpellingCorrector};

/// Assembles an [`Engine`]. Anything not supplied is loaded from the
/// files named by the [`EngineConfig`].
#[derive(Debug)]
pub struct EngineBuilder {
    config: EngineConfig,
    intents: Option<Vec<IntentDefinition>>,
    entities: Option<Vec<EntityDefinition>>,
    corrector: Option<SpellingCorrector>,
    router: Option<Router>,
}

impl EngineBuilder {
    pub fn intents(mut self, intents: Vec<IntentDefinition>) -> Self {
        self.intents = Some(intents);
        self
    }

    pub fn entities(mut self, entities: Vec<EntityDefinition>) -> Self {
        self.entities = Some(entities);
        self
    }

    pub fn corrector(mut self, corrector: SpellingCorrector) -> Self {
        self.corrector = Some(corrector);
        self
    }

    /// Use a custom handler table instead of the built-in one.
    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    /// Load, train or restore every component and validate the handler
    /// table against the intent labels.
    ///
    /// Any [`TiffinError::Configuration`](crate::error::TiffinError::Configuration)
    /// or training failure here is fatal for the engine.
    pub fn build(self) -> Result<Engine> {
        let config = self.config;
        config.validate()?;

        let intents = match self.intents {
            Some(intents) => intents,
            None => corpus::load_intents(config.intents_path())?,
        };
        let entity_definitions = match self.entities {
            Some(entities) => entities,
            None => corpus::load_entities(config.entities_path())?,
        };

        let router = self
            .router
            .unwrap_or_else(|| Router::with_builtin_handlers(config.confidence_threshold));
        let tags: Vec<&str> = intents.iter().map(|i| i.tag.as_str()).collect();
        router.validate(&tags)?;

        let mut corrector = match self.corrector {
            Some(corrector) => corrector,
            None => SpellingCorrector::from_files(
                &config.dictionary_path(),
                &config.affix_path(),
                config.domain_words_path().as_deref(),
                config.corrector.clone(),
            )?,
        };
        let merged = corrector.add_vocabulary(
            entity_definitions
                .iter()
                .flat_map(|definition| definition.patterns.iter()),
        );
        debug!("Merged {merged} entity terms into the spelling dictionary");
        let corrector = Arc::new(corrector);

        let preprocessor =
            TextPreprocessor::new(Some(Arc::clone(&corrector)), config.correct_at_inference);
        let classifier = IntentClassifier::new(
            preprocessor,
            config.featurizer.clone(),
            config.trainer.clone(),
        );

        let mut entities =
            EntityPipeline::new(&entity_definitions, config.pos_lexicon_path().as_deref())?;
        entities.persist(config.entity_model_path())?;
        entities.restore(config.entity_model_path())?;

        let engine = Engine {
            history: ResponseHistory::new(config.history_capacity),
            config,
            intents,
            corrector,
            classifier,
            entities,
            router,
            last_metrics: RwLock::new(None),
        };

        if !engine.restore_model() {
            engine.retrain()?;
        }
        engine.router.validate(&engine.classifier.labels())?;

        info!(
            "Engine ready: {} intents, {} entity types, threshold {:.2}",
            engine.intents.len(),
            engine.entities.tags().len(),
            engine.router.threshold()
        );
        Ok(engine)
    }
}

/// A ready-to-serve intent routing pipeline.
///
/// `Engine` is `Send + Sync`; [`respond`](Engine::respond) may be called
/// from many threads while [`retrain`](Engine::retrain) swaps the model.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    intents: Vec<IntentDefinition>,
    corrector: Arc<SpellingCorrector>,
    classifier: IntentClassifier,
    entities: EntityPipeline,
    router: Router,
    history: ResponseHistory,
    last_metrics: RwLock<Option<ClassificationMetrics>>,
}

impl Engine {
    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder {
            config,
            intents: None,
            entities: None,
            corrector: None,
            router: None,
        }
    }

    /// Try the persisted intent model. Returns false when training is needed.
    fn restore_model(&self) -> bool {
        let path = self.config.intent_model_path();
        if self.config.force_retrain || !path.exists() {
            return false;
        }

        let model = match self.classifier.load(&path) {
            Ok(model) => model,
            Err(e) => {
                warn!("Cannot restore intent model {}: {e}; retraining", path.display());
                return false;
            }
        };

        let expected: AHashSet<String> =
            clean_examples(&corpus::training_examples(&self.intents))
                .into_iter()
                .map(|example| example.label)
                .collect();
        let restored: AHashSet<String> = model.labels().iter().cloned().collect();
        if expected != restored {
            warn!(
                "Intent model {} was trained on different labels; retraining",
                path.display()
            );
            return false;
        }
        true
    }

    /// Retrain the classifier from the intent corpus and persist it.
    ///
    /// Predictions running meanwhile finish against the previous model. The
    /// new model serves as soon as training succeeds; a failed save is
    /// reported but leaves the new model and its metrics in place.
    pub fn retrain(&self) -> Result<ClassificationMetrics> {
        let examples = corpus::training_examples(&self.intents);
        let (metrics, _) = self.classifier.train(&examples)?;
        *self.last_metrics.write() = Some(metrics.clone());
        self.classifier.save(self.config.intent_model_path())?;
        Ok(metrics)
    }

    /// Route one utterance using the local clock.
    pub fn respond(&self, utterance: &str) -> Result<DispatchOutcome> {
        self.respond_at(utterance, Local::now().hour())
    }

    /// Route one utterance: classify the (optionally corrected) text,
    /// extract entities from the raw text, dispatch, and record the
    /// response in the history. A full history only skips the recording.
    pub fn respond_at(&self, utterance: &str, hour: u32) -> Result<DispatchOutcome> {
        let prediction = self.classifier.predict(utterance)?;
        let entities = self.entities.extract(utterance)?;

        let outcome = self.router.dispatch_at(
            utterance,
            &prediction.label,
            prediction.confidence,
            entities,
            hour,
        )?;

        match outcome {
            DispatchOutcome::Handled(response) => {
                let tokens: Vec<String> = self
                    .entities
                    .tokenize(utterance)?
                    .into_iter()
                    .map(|token| token.text)
                    .collect();
                let response = response.with_tokens(tokens.join(" "));
                if let Err(e) = self.history.insert(response.clone()) {
                    warn!("Response {} not recorded: {e}", response.id);
                }
                Ok(DispatchOutcome::Handled(response))
            }
            DispatchOutcome::NotUnderstood => Ok(DispatchOutcome::NotUnderstood),
        }
    }

    pub fn predict(&self, text: &str) -> Result<IntentPrediction> {
        self.classifier.predict(text)
    }

    pub fn extract(&self, text: &str) -> Result<Vec<RecognizedEntity>> {
        self.entities.extract(text)
    }

    pub fn correct(&self, text: &str) -> CorrectionResult {
        self.corrector.correct_with_report(text)
    }

    /// Metrics from the last training run, if this engine trained.
    pub fn last_metrics(&self) -> Option<ClassificationMetrics> {
        self.last_metrics.read().clone()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn intents(&self) -> &[IntentDefinition] {
        &self.intents
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    pub fn entity_pipeline(&self) -> &EntityPipeline {
        &self.entities
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn history(&self) -> &ResponseHistory {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::dispatch::NOT_UNDERSTOOD_MESSAGE;
    use crate::error::TiffinError;
    use crate::spelling::{CorrectorConfig, SpellingDictionary};

    fn intent(tag: &str, patterns: &[&str]) -> IntentDefinition {
        IntentDefinition {
            tag: tag.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            responses: Vec::new(),
            actions: None,
        }
    }

    fn corrector() -> SpellingCorrector {
        let mut dictionary = SpellingDictionary::new();
        for word in ["hello", "hi", "bye", "good", "morning", "order", "for", "please"] {
            dictionary.add_word(word, 10);
        }
        dictionary.add_domain_words();
        SpellingCorrector::new(dictionary, CorrectorConfig::default())
    }

    fn builder(dir: &TempDir) -> EngineBuilder {
        builder_with(EngineConfig::with_data_dir(dir.path()))
    }

    fn builder_with(mut config: EngineConfig) -> EngineBuilder {
        config.pos_lexicon_file = None;
        Engine::builder(config)
            .intents(vec![
                intent("Greeting", &["hi", "hello", "good morning"]),
                intent("Goodbye", &["bye", "bye bye", "see you later"]),
                intent("Order", &["order idli", "i want to order dosa please"]),
            ])
            .entities(vec![
                EntityDefinition::new("Name", &["raj"]),
                EntityDefinition::new("FoodItem", &["idli", "dosa"]),
            ])
            .corrector(corrector())
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn test_build_trains_and_persists() {
        let dir = TempDir::new().unwrap();
        let engine = builder(&dir).build().unwrap();

        assert!(engine.classifier().is_trained());
        assert!(engine.last_metrics().is_some());
        assert!(engine.config().intent_model_path().exists());
        assert!(engine.config().entity_model_path().exists());
    }

    #[test]
    fn test_second_build_restores_model() {
        let dir = TempDir::new().unwrap();
        let first = builder(&dir).build().unwrap();
        let trained_at = first.classifier().current().unwrap().trained_at();

        let second = builder(&dir).build().unwrap();
        assert!(second.last_metrics().is_none());
        assert_eq!(
            second.classifier().current().unwrap().trained_at(),
            trained_at
        );
        assert_eq!(
            second.predict("hi").unwrap().label,
            first.predict("hi").unwrap().label
        );
    }

    #[test]
    fn test_unbound_label_fails_at_startup() {
        let dir = TempDir::new().unwrap();
        let err = builder(&dir)
            .intents(vec![
                intent("Greeting", &["hi"]),
                intent("Reservation", &["book a table"]),
            ])
            .build()
            .unwrap_err();

        assert!(matches!(err, TiffinError::Configuration(_)));
        assert!(!dir.path().join("intent.model").exists());
    }

    #[test]
    fn test_respond_records_history() {
        let dir = TempDir::new().unwrap();
        let engine = builder(&dir).build().unwrap();

        let outcome = engine.respond_at("hi", 9).unwrap();
        let response = outcome.response().unwrap();
        assert_eq!(response.predicted_label, "Greeting");
        assert_eq!(response.text, "Good morning, how can I help you?");
        assert_eq!(response.tokens, "hi");
        assert_eq!(engine.history().len(), 1);
        assert_eq!(engine.history().get(&response.id).unwrap(), *response);
    }

    #[test]
    fn test_full_history_keeps_answering() {
        let dir = TempDir::new().unwrap();
        let mut config = EngineConfig::with_data_dir(dir.path());
        config.history_capacity = 1;
        let engine = builder_with(config).build().unwrap();

        for _ in 0..3 {
            let outcome = engine.respond_at("bye bye", 20).unwrap();
            let response = outcome.response().unwrap();
            assert_eq!(response.predicted_label, "Goodbye");
        }
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn test_entity_terms_survive_correction() {
        let dir = TempDir::new().unwrap();
        let engine = builder(&dir).build().unwrap();

        let result = engine.correct("order dosa for raj");
        assert_eq!(result.corrected, "order dosa for raj");
        assert!(result.corrections.is_empty());
    }

    #[test]
    fn test_failed_save_keeps_new_metrics() {
        let dir = TempDir::new().unwrap();
        builder(&dir).build().unwrap();
        let engine = builder(&dir).build().unwrap();
        assert!(engine.last_metrics().is_none());

        let model_path = engine.config().intent_model_path();
        std::fs::remove_file(&model_path).unwrap();
        std::fs::create_dir(&model_path).unwrap();
        assert!(engine.retrain().is_err());
        assert!(engine.last_metrics().is_some());
        assert!(engine.predict("hi").is_ok());
    }

    #[test]
    fn test_not_understood_is_not_recorded() {
        let dir = TempDir::new().unwrap();
        let router = Router::with_builtin_handlers(0.999);
        let engine = builder(&dir).router(router).build().unwrap();

        let outcome = engine.respond("qwzx plmk").unwrap();
        assert_eq!(outcome, DispatchOutcome::NotUnderstood);
        assert_eq!(outcome.text(), NOT_UNDERSTOOD_MESSAGE);
        assert!(engine.history().is_empty());
    }

    #[test]
    fn test_entities_use_raw_text() {
        let dir = TempDir::new().unwrap();
        let engine = builder(&dir).build().unwrap();

        let entities = engine.extract("order idli for Raj").unwrap();
        let values: Vec<(&str, &str)> = entities
            .iter()
            .map(|e| (e.entity_type.as_str(), e.entity_value.as_str()))
            .collect();
        assert_eq!(values, vec![("FoodItem", "idli"), ("Name", "Raj")]);
    }
}
