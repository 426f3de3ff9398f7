//! Multiclass maximum-entropy (softmax regression) model.
//!
//! Training minimizes the mean cross-entropy plus `l2/2 * |W|^2 + l1 * |W|_1`
//! by accelerated proximal gradient descent (FISTA). The smooth part takes a
//! gradient step from an extrapolated point, then the L1 term is applied by
//! soft-thresholding, which also clips weights at zero when non-negativity is
//! enforced. Biases are neither penalized nor constrained. With unit-length
//! inputs the smooth part is `(1 + l2)`-smooth, so the step is fixed at
//! `1 / (1 + l2)`. Momentum is reset whenever the objective goes up.

use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TiffinError};
use crate::ml::features::SparseVector;

/// Hyperparameters for [`MaxEntTrainer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// L1 penalty weight.
    pub l1: f64,
    /// L2 penalty weight.
    pub l2: f64,
    /// Iteration cap.
    pub max_iterations: usize,
    /// Stop once the relative objective change falls below this.
    pub tolerance: f64,
    /// Clip feature weights at zero after every step.
    pub enforce_non_negativity: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            l1: 1e-4,
            l2: 1e-4,
            max_iterations: 20_000,
            tolerance: 1e-8,
            enforce_non_negativity: true,
        }
    }
}

/// Training statistics and performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    /// Number of iterations completed.
    pub iterations: usize,
    /// Objective value after the last iteration.
    pub final_loss: f64,
    /// Whether the tolerance was reached before the iteration cap.
    pub converged: bool,
    /// Number of momentum restarts.
    pub restarts: usize,
    /// Training time in milliseconds.
    pub training_time_ms: u64,
}

/// A trained softmax model over sparse features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxEntModel {
    num_features: usize,
    num_classes: usize,
    /// Class-major weights: `weights[class * num_features + feature]`.
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl MaxEntModel {
    fn zeros(num_features: usize, num_classes: usize) -> Self {
        MaxEntModel {
            num_features,
            num_classes,
            weights: vec![0.0; num_features * num_classes],
            biases: vec![0.0; num_classes],
        }
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Weights of one class.
    pub fn class_weights(&self, class: usize) -> &[f64] {
        &self.weights[class * self.num_features..(class + 1) * self.num_features]
    }

    /// Unnormalized class scores.
    pub fn logits(&self, x: &SparseVector) -> Vec<f64> {
        (0..self.num_classes)
            .map(|class| x.dot(self.class_weights(class)) + self.biases[class])
            .collect()
    }

    /// Class probabilities, summing to one.
    pub fn predict_proba(&self, x: &SparseVector) -> Vec<f64> {
        softmax(&self.logits(x))
    }
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Fits [`MaxEntModel`]s.
#[derive(Debug, Clone, Default)]
pub struct MaxEntTrainer {
    config: TrainerConfig,
}

impl MaxEntTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        MaxEntTrainer { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train on `(features, class)` pairs.
    ///
    /// Every class index must be below `num_classes` and every feature index
    /// below `num_features`.
    pub fn train(
        &self,
        data: &[(SparseVector, usize)],
        num_features: usize,
        num_classes: usize,
    ) -> Result<(MaxEntModel, TrainingStats)> {
        if data.is_empty() {
            return Err(TiffinError::training_data("no training examples"));
        }
        if num_classes == 0 {
            return Err(TiffinError::training_data("no classes to train"));
        }
        if let Some((_, class)) = data.iter().find(|(_, class)| *class >= num_classes) {
            return Err(TiffinError::invalid_argument(format!(
                "class {class} out of range for {num_classes} classes"
            )));
        }
        if let Some(index) = data
            .iter()
            .flat_map(|(x, _)| x.indices.iter())
            .find(|&&index| index as usize >= num_features)
        {
            return Err(TiffinError::invalid_argument(format!(
                "feature {index} out of range for {num_features} features"
            )));
        }
        if self.config.l1 < 0.0 || self.config.l2 < 0.0 {
            return Err(TiffinError::configuration(
                "regularization weights must be non-negative",
            ));
        }

        let start = Instant::now();
        let step = 1.0 / (1.0 + self.config.l2);
        let threshold = step * self.config.l1;

        let mut model = MaxEntModel::zeros(num_features, num_classes);
        let mut lookahead = model.clone();
        let mut momentum = 1.0_f64;
        let mut accelerated = false;
        let mut grad_w = vec![0.0; model.weights.len()];
        let mut grad_b = vec![0.0; num_classes];
        let mut previous = self.objective(&model, data);
        let mut stats = TrainingStats::default();

        for iteration in 1..=self.config.max_iterations {
            self.gradient(&lookahead, data, &mut grad_w, &mut grad_b);
            let candidate = self.proximal_step(&lookahead, &grad_w, &grad_b, step, threshold);
            let current = self.objective(&candidate, data);
            stats.iterations = iteration;

            if current > previous {
                if !accelerated {
                    // A plain step from the last iterate no longer descends.
                    stats.converged = true;
                    break;
                }
                // Overshot: drop the momentum and step from the last iterate.
                momentum = 1.0;
                accelerated = false;
                lookahead.clone_from(&model);
                stats.restarts += 1;
                continue;
            }

            let next_momentum = (1.0 + (1.0 + 4.0 * momentum * momentum).sqrt()) / 2.0;
            let beta = (momentum - 1.0) / next_momentum;
            for ((y, z), x) in lookahead
                .weights
                .iter_mut()
                .zip(&candidate.weights)
                .zip(&model.weights)
            {
                *y = z + beta * (z - x);
            }
            for ((y, z), x) in lookahead
                .biases
                .iter_mut()
                .zip(&candidate.biases)
                .zip(&model.biases)
            {
                *y = z + beta * (z - x);
            }
            momentum = next_momentum;
            accelerated = true;
            model = candidate;

            let change = (previous - current).abs() / previous.abs().max(1.0);
            if iteration % 500 == 0 {
                debug!("iteration {iteration}: objective {current:.8}");
            }
            previous = current;
            if change < self.config.tolerance {
                stats.converged = true;
                break;
            }
        }
        stats.final_loss = previous;

        stats.training_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "MaxEnt training finished after {} iterations (loss {:.6}, converged: {}, restarts: {})",
            stats.iterations, stats.final_loss, stats.converged, stats.restarts
        );
        Ok((model, stats))
    }

    /// Gradient step on the smooth part followed by the L1 proximal map.
    fn proximal_step(
        &self,
        from: &MaxEntModel,
        grad_w: &[f64],
        grad_b: &[f64],
        step: f64,
        threshold: f64,
    ) -> MaxEntModel {
        let mut next = from.clone();
        for (w, g) in next.weights.iter_mut().zip(grad_w) {
            let moved = *w - step * g;
            *w = if self.config.enforce_non_negativity {
                (moved - threshold).max(0.0)
            } else {
                moved.signum() * (moved.abs() - threshold).max(0.0)
            };
        }
        for (b, g) in next.biases.iter_mut().zip(grad_b) {
            *b -= step * g;
        }
        next
    }

    /// Gradient of the smooth part (mean cross-entropy plus L2).
    fn gradient(
        &self,
        model: &MaxEntModel,
        data: &[(SparseVector, usize)],
        grad_w: &mut [f64],
        grad_b: &mut [f64],
    ) {
        let n = data.len() as f64;
        grad_w.fill(0.0);
        grad_b.fill(0.0);

        let probabilities: Vec<Vec<f64>> =
            data.par_iter().map(|(x, _)| model.predict_proba(x)).collect();

        for ((x, label), probs) in data.iter().zip(&probabilities) {
            for (class, p) in probs.iter().enumerate() {
                let residual = (p - if class == *label { 1.0 } else { 0.0 }) / n;
                grad_b[class] += residual;
                let offset = class * model.num_features;
                for (feature, value) in x.iter() {
                    grad_w[offset + feature] += residual * value;
                }
            }
        }

        for (g, w) in grad_w.iter_mut().zip(&model.weights) {
            *g += self.config.l2 * w;
        }
    }

    /// Full regularized objective.
    fn objective(&self, model: &MaxEntModel, data: &[(SparseVector, usize)]) -> f64 {
        let losses: Vec<f64> = data
            .par_iter()
            .map(|(x, label)| {
                let probs = model.predict_proba(x);
                -probs[*label].max(f64::MIN_POSITIVE).ln()
            })
            .collect();
        let cross_entropy = losses.iter().sum::<f64>() / data.len() as f64;

        let l2: f64 = model.weights.iter().map(|w| w * w).sum();
        let l1: f64 = model.weights.iter().map(|w| w.abs()).sum();
        cross_entropy + 0.5 * self.config.l2 * l2 + self.config.l1 * l1
    }
}
