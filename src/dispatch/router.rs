//! Confidence-gated routing from intent labels to handlers.

use std::collections::BTreeMap;

use chrono::{Local, Timelike, Utc};
use log::{debug, error};
use uuid::Uuid;

use crate::dispatch::handlers::{Handler, HandlerContext, builtin_handlers};
use crate::dispatch::response::Response;
use crate::entity::RecognizedEntity;
use crate::error::{Result, TiffinError};

/// Predictions scoring at or below this are not dispatched.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.49;

/// Shown to the user when an utterance is not dispatched.
pub const NOT_UNDERSTOOD_MESSAGE: &str = "Sorry, I didn't understand that. How can I help you?";

/// Result of routing one utterance.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A handler ran and produced a response.
    Handled(Response),
    /// The prediction was not confident enough; no handler ran.
    NotUnderstood,
}

impl DispatchOutcome {
    /// The text to show the user.
    pub fn text(&self) -> &str {
        match self {
            DispatchOutcome::Handled(response) => &response.text,
            DispatchOutcome::NotUnderstood => NOT_UNDERSTOOD_MESSAGE,
        }
    }

    pub fn response(&self) -> Option<&Response> {
        match self {
            DispatchOutcome::Handled(response) => Some(response),
            DispatchOutcome::NotUnderstood => None,
        }
    }
}

/// Explicit label-to-handler table with a confidence gate.
///
/// The router keeps no per-conversation state; every call is independent.
#[derive(Debug, Clone)]
pub struct Router {
    handlers: BTreeMap<String, Handler>,
    threshold: f64,
}

impl Router {
    /// An empty router.
    pub fn new(threshold: f64) -> Self {
        Router {
            handlers: BTreeMap::new(),
            threshold,
        }
    }

    /// A router with every built-in restaurant handler registered.
    pub fn with_builtin_handlers(threshold: f64) -> Self {
        let mut router = Self::new(threshold);
        for (label, handler) in builtin_handlers() {
            router.register(label, handler);
        }
        router
    }

    /// Bind `handler` to `label`, returning the handler it replaces.
    pub fn register<S: Into<String>>(&mut self, label: S, handler: Handler) -> Option<Handler> {
        self.handlers.insert(label.into(), handler)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn contains(&self, label: &str) -> bool {
        self.handlers.contains_key(label)
    }

    /// Registered labels, sorted.
    pub fn labels(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// Check that every label the classifier can produce has a handler.
    pub fn validate<S: AsRef<str>>(&self, labels: &[S]) -> Result<()> {
        let unbound: Vec<&str> = labels
            .iter()
            .map(AsRef::as_ref)
            .filter(|label| !self.contains(label))
            .collect();

        if unbound.is_empty() {
            return Ok(());
        }
        error!("No handler registered for intent labels: {unbound:?}");
        Err(TiffinError::configuration(format!(
            "no handler registered for intent labels: {}",
            unbound.join(", ")
        )))
    }

    /// Whether a prediction with this confidence passes the gate.
    pub fn accepts(&self, confidence: f64) -> bool {
        confidence > self.threshold
    }

    /// Route one prediction using the current local hour.
    pub fn dispatch(
        &self,
        utterance: &str,
        predicted_label: &str,
        confidence: f64,
        entities: Vec<RecognizedEntity>,
    ) -> Result<DispatchOutcome> {
        self.dispatch_at(
            utterance,
            predicted_label,
            confidence,
            entities,
            Local::now().hour(),
        )
    }

    /// Route one prediction with an explicit hour of day.
    pub fn dispatch_at(
        &self,
        utterance: &str,
        predicted_label: &str,
        confidence: f64,
        entities: Vec<RecognizedEntity>,
        hour: u32,
    ) -> Result<DispatchOutcome> {
        if !self.accepts(confidence) {
            debug!(
                "confidence {confidence:.3} for '{predicted_label}' is at or below {:.2}; not dispatching",
                self.threshold
            );
            return Ok(DispatchOutcome::NotUnderstood);
        }

        let handler = self.handlers.get(predicted_label).ok_or_else(|| {
            TiffinError::configuration(format!(
                "no handler registered for intent label '{predicted_label}'"
            ))
        })?;

        let reply = handler(&HandlerContext {
            utterance,
            entities: &entities,
            hour,
        });

        Ok(DispatchOutcome::Handled(Response {
            id: Uuid::new_v4(),
            parent_id: None,
            question: utterance.to_string(),
            predicted_label: predicted_label.to_string(),
            text: reply.text,
            response_type: reply.response_type,
            requires_follow_up: reply.requires_follow_up,
            confidence,
            entities,
            tokens: String::new(),
            timestamp: Utc::now(),
        }))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::with_builtin_handlers(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::dispatch::handlers::HandlerReply;

    static CALLS: AtomicUsize = AtomicUsize::new(0);

    fn counting(_: &HandlerContext<'_>) -> HandlerReply {
        CALLS.fetch_add(1, Ordering::SeqCst);
        HandlerReply {
            text: "counted".to_string(),
            response_type: "Counting".to_string(),
            requires_follow_up: false,
        }
    }

    #[test]
    fn test_gate_never_invokes_handler() {
        let mut router = Router::new(DEFAULT_CONFIDENCE_THRESHOLD);
        router.register("Counting", counting);

        for confidence in [0.0, 0.1, 0.3, 0.49, f64::NAN] {
            let outcome = router
                .dispatch("anything", "Counting", confidence, Vec::new())
                .unwrap();
            assert_eq!(outcome, DispatchOutcome::NotUnderstood);
            assert_eq!(outcome.text(), NOT_UNDERSTOOD_MESSAGE);
        }
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);

        let outcome = router
            .dispatch("anything", "Counting", 0.5, Vec::new())
            .unwrap();
        assert_eq!(outcome.text(), "counted");
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unbound_label_is_configuration_error() {
        let router = Router::default();
        let err = router
            .dispatch("book a table", "Reservation", 0.9, Vec::new())
            .unwrap_err();
        assert!(matches!(err, TiffinError::Configuration(_)));
    }

    #[test]
    fn test_low_confidence_unbound_label_is_not_an_error() {
        let router = Router::default();
        let outcome = router
            .dispatch("book a table", "Reservation", 0.2, Vec::new())
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::NotUnderstood);
    }

    #[test]
    fn test_validate() {
        let router = Router::default();
        assert!(router.validate(&["Greeting", "Order", "Support"]).is_ok());

        let err = router
            .validate(&["Greeting", "Reservation", "Refund"])
            .unwrap_err();
        assert!(err.is_fatal());
        let message = err.to_string();
        assert!(message.contains("Reservation") && message.contains("Refund"));
    }

    #[test]
    fn test_response_record() {
        let router = Router::default();
        let entities = vec![RecognizedEntity {
            entity_type: "FoodItem".to_string(),
            entity_value: "idli".to_string(),
            context: "[order, idli]-[X, X]".to_string(),
        }];

        let outcome = router
            .dispatch_at("order idli", "Order", 0.87, entities.clone(), 13)
            .unwrap();
        let response = outcome.response().unwrap();

        assert_eq!(response.question, "order idli");
        assert_eq!(response.predicted_label, "Order");
        assert_eq!(response.text, "Ordering idli. Confirm?");
        assert_eq!(response.response_type, "Order");
        assert!(response.requires_follow_up);
        assert_eq!(response.confidence, 0.87);
        assert_eq!(response.entities, entities);
        assert!(response.parent_id.is_none());
        assert!(response.tokens.is_empty());
    }

    #[test]
    fn test_builtin_labels() {
        let router = Router::default();
        assert_eq!(router.labels().len(), 12);
        assert!(router.contains("SearchNonvegAppetizer"));
    }
}
