//! Dataset pipeline: enumeration, splitting, parallel loading, label
//! encoding, and augmentation.

pub mod augmentation;
pub mod burn_dataset;
pub mod encode;
pub mod loader;
pub mod split;

pub use burn_dataset::{AugmentingBatcher, LesionBatch, LesionBatcher, LesionDataset, LesionImage};
pub use loader::SampleTable;
pub use split::{train_test_split, SplitConfig, Splits};
