//! # ISIC Skin-Lesion Classifier
//!
//! A Rust library for skin-lesion image classification on the ISIC
//! (International Skin Imaging Collaboration) dataset using the Burn
//! framework.
//!
//! The pipeline is a single linear pass:
//!
//! 1. Enumerate the train/test directory trees into labeled sample tables
//! 2. Merge both tables and re-split 80/20 with a fixed seed
//! 3. Decode and resize all images in parallel (rayon)
//! 4. Normalize pixels to `[0, 1]` and one-hot encode labels
//! 5. Train a classification head on top of a convolutional feature
//!    extractor with on-the-fly augmentation
//! 6. Evaluate, persist the model, reload it, and re-evaluate
//!
//! ## Modules
//!
//! - `dataset`: Directory enumeration, train/test splitting, parallel image
//!   loading, label encoding, and augmentation
//! - `model`: CNN feature extractor and classification head built with Burn
//! - `training`: Custom training loop with plateau-based learning rate decay
//! - `inference`: Reload-and-rescore evaluation of persisted models
//! - `utils`: Logging, error types, and evaluation metrics

pub mod backend;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod training;
pub mod utils;

pub use dataset::burn_dataset::{LesionBatch, LesionBatcher, LesionDataset, LesionImage};
pub use dataset::loader::SampleTable;
pub use dataset::split::{train_test_split, SplitConfig, Splits};
pub use model::cnn::LesionClassifier;
pub use model::config::{ModelConfig, TrainingConfig};
pub use training::trainer::Trainer;
pub use utils::error::{LesionError, Result};
pub use utils::metrics::{ConfusionMatrix, Metrics};

/// ISIC lesion categories (9 total)
pub const NUM_CLASSES: usize = 9;

/// Target image width after resizing
pub const IMAGE_WIDTH: u32 = 100;

/// Target image height after resizing
pub const IMAGE_HEIGHT: u32 = 75;

/// Fixed seed used for the train/test split
pub const SPLIT_SEED: u64 = 42;

/// Fraction of the combined pool held out for testing
pub const TEST_FRACTION: f64 = 0.2;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
