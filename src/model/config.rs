//! Model and training configuration

use burn::prelude::*;

use crate::utils::error::LesionError;

/// Architecture hyperparameters for the classifier
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// Number of output classes
    #[config(default = 9)]
    pub num_classes: usize,

    /// Width of the hidden dense layer on top of the backbone
    #[config(default = 512)]
    pub hidden_size: usize,

    /// Dropout probability before the hidden dense layer
    #[config(default = 0.5)]
    pub dropout: f64,

    /// Channel width of the first convolution block; later blocks double it
    #[config(default = 32)]
    pub base_filters: usize,
}

impl ModelConfig {
    /// Validate hyperparameter ranges
    pub fn validate(&self) -> crate::utils::error::Result<()> {
        if self.num_classes == 0 {
            return Err(LesionError::Config(
                "num_classes must be at least 1".to_string(),
            ));
        }
        if self.hidden_size == 0 {
            return Err(LesionError::Config(
                "hidden_size must be at least 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(LesionError::Config(format!(
                "dropout must be in [0.0, 1.0), got {}",
                self.dropout
            )));
        }
        if self.base_filters == 0 {
            return Err(LesionError::Config(
                "base_filters must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Hyperparameters for the training loop
#[derive(Config, Debug)]
pub struct TrainingConfig {
    /// Number of passes over the training set
    #[config(default = 50)]
    pub epochs: usize,

    /// Mini-batch size
    #[config(default = 32)]
    pub batch_size: usize,

    /// Initial Adam learning rate
    #[config(default = 1e-3)]
    pub learning_rate: f64,

    /// Multiplier applied to the learning rate on a validation plateau
    #[config(default = 0.5)]
    pub plateau_factor: f64,

    /// Epochs without validation-loss improvement before reducing the rate
    #[config(default = 3)]
    pub plateau_patience: usize,

    /// Floor below which the learning rate is never reduced
    #[config(default = 1e-5)]
    pub min_learning_rate: f64,

    /// Seed for shuffling and augmentation
    #[config(default = 42)]
    pub seed: u64,
}

impl TrainingConfig {
    /// Validate hyperparameter ranges
    pub fn validate(&self) -> crate::utils::error::Result<()> {
        if self.epochs == 0 {
            return Err(LesionError::Config("epochs must be at least 1".to_string()));
        }
        if self.batch_size == 0 {
            return Err(LesionError::Config(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.learning_rate <= 0.0 {
            return Err(LesionError::Config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.plateau_factor) {
            return Err(LesionError::Config(format!(
                "plateau_factor must be in (0.0, 1.0), got {}",
                self.plateau_factor
            )));
        }
        if self.min_learning_rate > self.learning_rate {
            return Err(LesionError::Config(format!(
                "min_learning_rate {} exceeds learning_rate {}",
                self.min_learning_rate, self.learning_rate
            )));
        }
        Ok(())
    }
}
