//! Structured response records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::RecognizedEntity;

/// The record produced for one dispatched utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: Uuid,
    /// Response this one follows up on, if any.
    pub parent_id: Option<Uuid>,
    /// The utterance as the user typed it.
    pub question: String,
    pub predicted_label: String,
    /// Text shown to the user.
    pub text: String,
    pub response_type: String,
    /// Whether the user is expected to confirm or add information.
    pub requires_follow_up: bool,
    /// Classifier score of `predicted_label`, in `[0, 1]`.
    pub confidence: f64,
    pub entities: Vec<RecognizedEntity>,
    /// Diagnostic token trace assigned by the caller; empty by default.
    pub tokens: String,
    pub timestamp: DateTime<Utc>,
}

impl Response {
    /// Attach a diagnostic token trace.
    pub fn with_tokens<S: Into<String>>(mut self, tokens: S) -> Self {
        self.tokens = tokens.into();
        self
    }

    /// Mark this response as a follow-up to `parent`.
    pub fn with_parent(mut self, parent: Uuid) -> Self {
        self.parent_id = Some(parent);
        self
    }
}
