//! ISIC Dataset Path Enumerator
//!
//! Walks a directory root containing one subdirectory per lesion category
//! and produces a flat, ordered table of (image path, label) records.
//! Labels are assigned by the position of the class directory in sorted
//! listing order, starting at 0, so label assignment is stable across
//! platforms and runs.
//!
//! No extension filtering happens here; a non-image file recorded at this
//! stage surfaces as a decode error during the parallel loading phase.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::utils::error::{LesionError, Result};

/// A single image sample record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// Path to the image file
    pub path: PathBuf,
    /// Class label index (0-based, from class directory position)
    pub label: usize,
    /// Class name (the directory name, e.g. "melanoma")
    pub class_name: String,
}

/// A flat ordered table of labeled samples for one directory root
#[derive(Debug, Clone, Default)]
pub struct SampleTable {
    /// All samples, in enumeration order
    pub samples: Vec<Sample>,
    /// Class names in label order (index == label)
    pub class_names: Vec<String>,
}

impl SampleTable {
    /// Enumerate a directory root into a sample table
    ///
    /// The root should be structured as:
    /// ```text
    /// root/
    /// ├── actinic_keratosis/
    /// │   ├── ISIC_0024468.jpg
    /// │   └── ISIC_0024470.jpg
    /// ├── basal_cell_carcinoma/
    /// │   └── ...
    /// └── ...
    /// ```
    pub fn from_dir<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        info!("Enumerating samples from: {:?}", root);

        if !root.exists() {
            return Err(LesionError::PathNotFound(root.to_path_buf()));
        }

        // Discover class directories in sorted order for stable labels
        let mut class_names: Vec<String> = Vec::new();
        for entry in std::fs::read_dir(root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    class_names.push(name.to_string());
                }
            }
        }
        class_names.sort();

        if class_names.is_empty() {
            return Err(LesionError::Dataset(format!(
                "No class directories found under {:?}",
                root
            )));
        }

        info!("Found {} classes", class_names.len());

        // Record every file in every class directory, in order
        let mut samples = Vec::new();
        for (label, class_name) in class_names.iter().enumerate() {
            let class_dir = root.join(class_name);
            let before = samples.len();

            for entry in WalkDir::new(&class_dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                samples.push(Sample {
                    path: entry.path().to_path_buf(),
                    label,
                    class_name: class_name.clone(),
                });
            }

            debug!(
                "Class '{}' (label {}): {} samples",
                class_name,
                label,
                samples.len() - before
            );
        }

        info!("Enumerated {} total samples", samples.len());

        Ok(Self {
            samples,
            class_names,
        })
    }

    /// Merge another table into this one, unifying the class name sets
    ///
    /// Class names present in both tables must map to the same label in
    /// both, which holds when both roots carry the same sorted set of
    /// class directories. A divergent set is a dataset error.
    pub fn merge(mut self, other: SampleTable) -> Result<Self> {
        if self.class_names != other.class_names {
            return Err(LesionError::Dataset(format!(
                "Train/test class directories disagree: {:?} vs {:?}",
                self.class_names, other.class_names
            )));
        }
        self.samples.extend(other.samples);
        Ok(self)
    }

    /// Validate that the enumerated label set matches a configured class count
    ///
    /// Fails with a configuration error when the directory tree does not
    /// contain exactly `num_classes` categories.
    pub fn validate_class_count(&self, num_classes: usize) -> Result<()> {
        if self.class_names.len() != num_classes {
            return Err(LesionError::Config(format!(
                "Expected {} classes but enumerated {}: {:?}",
                num_classes,
                self.class_names.len(),
                self.class_names
            )));
        }
        Ok(())
    }

    /// Number of samples in the table
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of classes
    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Per-class sample counts, indexed by label
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.num_classes()];
        for sample in &self.samples {
            counts[sample.label] += 1;
        }
        counts
    }

    /// Print per-class statistics to the console
    pub fn print_stats(&self) {
        println!("\nDataset statistics:");
        println!("  Total samples: {}", self.len());
        println!("  Number of classes: {}", self.num_classes());
        println!("\n  Samples per class:");

        let counts = self.class_counts();
        for (label, name) in self.class_names.iter().enumerate() {
            println!("    {:3}. {:32} {:5}", label, name, counts[label]);
        }
    }
}
