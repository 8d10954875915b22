//! Train/test splitting
//!
//! Re-partitions the combined sample pool into train and test sets with a
//! plain (non-stratified) random split, deterministic for a given input
//! ordering and seed. The original train/test directory boundary is
//! discarded once the tables are merged; only this split matters downstream.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::dataset::loader::Sample;
use crate::utils::error::{LesionError, Result};

/// Configuration for the train/test split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of the pool held out for testing
    pub test_fraction: f64,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: crate::TEST_FRACTION,
            seed: crate::SPLIT_SEED,
        }
    }
}

impl SplitConfig {
    /// Create a new split configuration, validating the test fraction
    pub fn new(test_fraction: f64, seed: u64) -> Result<Self> {
        if !(0.0..1.0).contains(&test_fraction) {
            return Err(LesionError::Config(format!(
                "Test fraction must be in [0.0, 1.0), got {}",
                test_fraction
            )));
        }
        Ok(Self {
            test_fraction,
            seed,
        })
    }
}

/// The two partitions produced by the splitter
#[derive(Debug, Clone, Default)]
pub struct Splits {
    /// Training samples
    pub train: Vec<Sample>,
    /// Held-out test samples
    pub test: Vec<Sample>,
}

impl Splits {
    /// Total number of samples across both partitions
    pub fn total(&self) -> usize {
        self.train.len() + self.test.len()
    }
}

/// Partition samples into train/test sets
///
/// Shuffles a copy of the pool with a seeded RNG and takes the first
/// `ceil(n * test_fraction)` samples as the test set. Identical input
/// ordering and seed always produce the identical partition.
pub fn train_test_split(samples: Vec<Sample>, config: &SplitConfig) -> Result<Splits> {
    if samples.is_empty() {
        return Err(LesionError::Dataset(
            "No samples provided for splitting".to_string(),
        ));
    }

    let n = samples.len();
    let n_test = (n as f64 * config.test_fraction).ceil() as usize;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut shuffled = samples;
    shuffled.shuffle(&mut rng);

    let train = shuffled.split_off(n_test);
    let test = shuffled;

    Ok(Splits { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn make_samples(classes: usize, per_class: usize) -> Vec<Sample> {
        let mut samples = Vec::new();
        for class in 0..classes {
            for i in 0..per_class {
                samples.push(Sample {
                    path: PathBuf::from(format!("class_{}/image_{}.jpg", class, i)),
                    label: class,
                    class_name: format!("class_{}", class),
                });
            }
        }
        samples
    }

    #[test]
    fn test_two_classes_ten_each_seed_42() {
        // 20 samples, 80/20 with seed 42 -> 16 train / 4 test
        let samples = make_samples(2, 10);
        let splits = train_test_split(samples, &SplitConfig::default()).unwrap();

        assert_eq!(splits.train.len(), 16);
        assert_eq!(splits.test.len(), 4);
        assert_eq!(splits.total(), 20);
    }

    #[test]
    fn test_split_is_deterministic() {
        let config = SplitConfig::default();

        let a = train_test_split(make_samples(5, 20), &config).unwrap();
        let b = train_test_split(make_samples(5, 20), &config).unwrap();

        let paths_a: Vec<_> = a.test.iter().map(|s| s.path.clone()).collect();
        let paths_b: Vec<_> = b.test.iter().map(|s| s.path.clone()).collect();
        assert_eq!(paths_a, paths_b);

        let train_a: Vec<_> = a.train.iter().map(|s| s.path.clone()).collect();
        let train_b: Vec<_> = b.train.iter().map(|s| s.path.clone()).collect();
        assert_eq!(train_a, train_b);
    }

    #[test]
    fn test_different_seed_changes_partition() {
        let a = train_test_split(make_samples(5, 20), &SplitConfig::new(0.2, 42).unwrap()).unwrap();
        let b = train_test_split(make_samples(5, 20), &SplitConfig::new(0.2, 43).unwrap()).unwrap();

        let paths_a: Vec<_> = a.test.iter().map(|s| s.path.clone()).collect();
        let paths_b: Vec<_> = b.test.iter().map(|s| s.path.clone()).collect();
        assert_ne!(paths_a, paths_b);
    }

    #[test]
    fn test_ratio_within_rounding() {
        let splits = train_test_split(make_samples(3, 33), &SplitConfig::default()).unwrap();
        let ratio = splits.test.len() as f64 / splits.total() as f64;
        assert!((ratio - 0.2).abs() < 0.02);
    }

    #[test]
    fn test_no_sample_lost_or_duplicated() {
        let splits = train_test_split(make_samples(4, 25), &SplitConfig::default()).unwrap();

        let mut all: Vec<_> = splits
            .train
            .iter()
            .chain(splits.test.iter())
            .map(|s| s.path.clone())
            .collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 100);
    }

    #[test]
    fn test_empty_pool_is_an_error() {
        let result = train_test_split(Vec::new(), &SplitConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_fraction_rejected() {
        assert!(SplitConfig::new(1.0, 42).is_err());
        assert!(SplitConfig::new(-0.1, 42).is_err());
        assert!(SplitConfig::new(0.2, 42).is_ok());
    }
}
