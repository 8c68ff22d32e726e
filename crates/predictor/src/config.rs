//! Run configuration.

use crate::error::{PredictError, Result};
use crate::scoring::{DEFAULT_MAX_RATE, ScoringMode, Scorer};
use crate::trainer::{DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE, ProfileTrainer, UpdateRule};
use features::FeaturePreset;

/// Everything that shapes one prediction run.
///
/// Validate before touching any file so a bad setting never leaves a
/// half-written output behind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictorConfig {
    pub preset: FeaturePreset,
    pub mode: ScoringMode,
    pub learning_rate: f64,
    pub epochs: usize,
    pub max_rate: f64,
    pub update_rule: UpdateRule,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            preset: FeaturePreset::Intermediate,
            mode: ScoringMode::DotProduct,
            learning_rate: DEFAULT_LEARNING_RATE,
            epochs: DEFAULT_EPOCHS,
            max_rate: DEFAULT_MAX_RATE,
            update_rule: UpdateRule::Elementwise,
        }
    }
}

impl PredictorConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(PredictError::InvalidParameter {
                name: "learning rate",
                reason: format!("{} is not a positive number", self.learning_rate),
            });
        }
        if self.epochs == 0 {
            return Err(PredictError::InvalidParameter {
                name: "epochs",
                reason: "at least one epoch is required".to_string(),
            });
        }
        if !self.max_rate.is_finite() || self.max_rate <= 0.0 {
            return Err(PredictError::InvalidParameter {
                name: "max rate",
                reason: format!("{} is not a positive number", self.max_rate),
            });
        }
        Ok(())
    }

    pub fn trainer(&self) -> ProfileTrainer {
        ProfileTrainer::new(self.learning_rate, self.epochs).with_rule(self.update_rule)
    }

    pub fn scorer(&self) -> Scorer {
        Scorer::new(self.mode, self.max_rate)
    }

    /// Output file name used when sweeping configurations
    pub fn evaluation_file_name(&self) -> String {
        format!("{}_{}_Evaluate.csv", self.preset, self.mode)
    }
}
