//! CNN model for skin lesion classification

pub mod cnn;
pub mod config;

pub use cnn::{ConvBlock, FeatureExtractor, LesionClassifier};
pub use config::{ModelConfig, TrainingConfig};
