//! Multiclass evaluation metrics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Probability floor used when taking logarithms.
const EPSILON: f64 = 1e-15;

/// Metrics from scoring a labelled set against a trained model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    /// Number of evaluated examples.
    pub examples: usize,
    /// Fraction of examples whose top class is correct.
    pub micro_accuracy: f64,
    /// Mean of per-class accuracies over the classes present.
    pub macro_accuracy: f64,
    /// Mean negative log-probability of the true class.
    pub log_loss: f64,
    /// Improvement of `log_loss` over always predicting the label prior,
    /// as a fraction of the prior's log loss.
    pub log_loss_reduction: f64,
    /// Log loss restricted to the examples of each class.
    pub per_class_log_loss: BTreeMap<String, f64>,
}

impl ClassificationMetrics {
    /// Compute metrics from `(true class, class probabilities)` pairs.
    ///
    /// `labels[i]` names class `i`.
    pub fn evaluate(labels: &[String], scored: &[(usize, Vec<f64>)]) -> Self {
        if scored.is_empty() || labels.is_empty() {
            return ClassificationMetrics::default();
        }

        let num_classes = labels.len();
        let mut counts = vec![0usize; num_classes];
        let mut correct = vec![0usize; num_classes];
        let mut class_loss = vec![0.0; num_classes];

        for (truth, probs) in scored {
            let predicted = argmax(probs);
            counts[*truth] += 1;
            if predicted == *truth {
                correct[*truth] += 1;
            }
            let p = probs.get(*truth).copied().unwrap_or(0.0).max(EPSILON);
            class_loss[*truth] += -p.ln();
        }

        let n = scored.len() as f64;
        let micro_accuracy = correct.iter().sum::<usize>() as f64 / n;
        let present: Vec<usize> = (0..num_classes).filter(|&c| counts[c] > 0).collect();
        let macro_accuracy = present
            .iter()
            .map(|&c| correct[c] as f64 / counts[c] as f64)
            .sum::<f64>()
            / present.len() as f64;

        let log_loss = class_loss.iter().sum::<f64>() / n;
        let prior_log_loss: f64 = present
            .iter()
            .map(|&c| {
                let prior = counts[c] as f64 / n;
                -prior * prior.ln()
            })
            .sum();
        let log_loss_reduction = if prior_log_loss > 0.0 {
            (prior_log_loss - log_loss) / prior_log_loss
        } else {
            0.0
        };

        let per_class_log_loss = present
            .iter()
            .map(|&c| (labels[c].clone(), class_loss[c] / counts[c] as f64))
            .collect();

        ClassificationMetrics {
            examples: scored.len(),
            micro_accuracy,
            macro_accuracy,
            log_loss,
            log_loss_reduction,
            per_class_log_loss,
        }
    }
}

/// Index of the largest score; the first one wins ties.
pub fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (index, score) in scores.iter().enumerate() {
        if *score > scores[best] {
            best = index;
        }
    }
    best
}
