//! Per-user profile training.
//!
//! A user goes through two states:
//! - ACCUMULATING: a `UserSession` collects `(feature row, rating / max_rate)`
//!   samples for the movies the store knows
//! - TRAINED: `UserSession::train` consumes the session and returns the
//!   learned `UserProfile`
//!
//! Rust concept: `train(self, ..)` takes the session by value, so a session
//! cannot be trained twice or extended after training.

use crate::error::PredictError;
use data_loader::UserId;
use features::distance::dot;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

pub const DEFAULT_LEARNING_RATE: f64 = 0.5;
pub const DEFAULT_EPOCHS: usize = 5;

/// How the weights move on each sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdateRule {
    /// Each dimension is its own scalar regression sharing the target:
    /// `y[j] = θ[j]·x[j]`, `θ[j] -= lr·(y[j] - t)·x[j]`
    #[default]
    Elementwise,
    /// Joint linear model: `θ -= lr·(θ·x - t)·x`.
    /// Produces different predictions from `Elementwise`.
    DotProduct,
}

impl UpdateRule {
    pub fn name(self) -> &'static str {
        match self {
            UpdateRule::Elementwise => "ELEMENTWISE",
            UpdateRule::DotProduct => "DOTPRODUCT",
        }
    }
}

impl fmt::Display for UpdateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UpdateRule {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ELEMENTWISE" => Ok(UpdateRule::Elementwise),
            "DOTPRODUCT" => Ok(UpdateRule::DotProduct),
            _ => Err(PredictError::UnknownUpdateRule(s.to_string())),
        }
    }
}

/// Gradient-descent settings shared by every user of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileTrainer {
    learning_rate: f64,
    epochs: usize,
    rule: UpdateRule,
}

impl Default for ProfileTrainer {
    fn default() -> Self {
        Self::new(DEFAULT_LEARNING_RATE, DEFAULT_EPOCHS)
    }
}

impl ProfileTrainer {
    pub fn new(learning_rate: f64, epochs: usize) -> Self {
        Self {
            learning_rate,
            epochs,
            rule: UpdateRule::Elementwise,
        }
    }

    pub fn with_rule(mut self, rule: UpdateRule) -> Self {
        if rule == UpdateRule::DotProduct {
            warn!("Using the dot-product update rule: predictions diverge from the elementwise rule");
        }
        self.rule = rule;
        self
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn epochs(&self) -> usize {
        self.epochs
    }

    pub fn rule(&self) -> UpdateRule {
        self.rule
    }

    /// Learn a weight vector from `(features, target)` samples.
    ///
    /// The weights start as the first sample's features. Returns `None`
    /// when there is no sample.
    pub fn fit(&self, samples: &[(&[f64], f64)]) -> Option<Vec<f64>> {
        let (first, _) = samples.first()?;
        let mut theta = first.to_vec();

        for _ in 0..self.epochs {
            for (x, target) in samples {
                match self.rule {
                    UpdateRule::Elementwise => {
                        for (w, xj) in theta.iter_mut().zip(x.iter()) {
                            let loss = *w * xj - target;
                            *w -= self.learning_rate * loss * xj;
                        }
                    }
                    UpdateRule::DotProduct => {
                        let loss = dot(&theta, x) - target;
                        for (w, xj) in theta.iter_mut().zip(x.iter()) {
                            *w -= self.learning_rate * loss * xj;
                        }
                    }
                }
            }
        }
        Some(theta)
    }
}

/// Learned weights of one user
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user_id: UserId,
    pub weights: Vec<f64>,
}

/// Samples of one user while their ratings are being read.
///
/// Borrows feature rows from the store instead of copying them.
#[derive(Debug, Clone)]
pub struct UserSession<'a> {
    user_id: UserId,
    samples: Vec<(&'a [f64], f64)>,
    dropped: usize,
}

impl<'a> UserSession<'a> {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            samples: Vec::new(),
            dropped: 0,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Add a rated movie. `features` is `None` for a movie without
    /// metadata, which is dropped and counted.
    pub fn push(&mut self, features: Option<&'a [f64]>, target: f64) {
        match features {
            Some(row) => self.samples.push((row, target)),
            None => self.dropped += 1,
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Ratings dropped because the movie was unknown
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Train the profile; `None` if no rated movie was known.
    pub fn train(self, trainer: &ProfileTrainer) -> Option<UserProfile> {
        let weights = trainer.fit(&self.samples)?;
        debug!(
            "Trained user {} on {} samples ({} unknown movies dropped)",
            self.user_id,
            self.samples.len(),
            self.dropped
        );
        Some(UserProfile {
            user_id: self.user_id,
            weights,
        })
    }
}
