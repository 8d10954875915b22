//! Metrics Module for Model Evaluation
//!
//! Provides metrics for evaluating lesion classification models:
//! - Accuracy (overall and per-class)
//! - Precision, Recall, F1-score
//! - Confusion Matrix

use serde::{Deserialize, Serialize};

/// Metrics for model evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
    /// Total number of samples evaluated
    pub total_samples: usize,

    /// Number of correct predictions
    pub correct_predictions: usize,

    /// Overall accuracy (correct / total)
    pub accuracy: f64,

    /// Average loss over all batches (set externally by the trainer)
    pub loss: Option<f64>,

    /// Macro-averaged precision (average of per-class precisions)
    pub macro_precision: f64,

    /// Macro-averaged recall
    pub macro_recall: f64,

    /// Macro-averaged F1-score
    pub macro_f1: f64,

    /// Per-class metrics
    pub per_class: Vec<ClassMetrics>,

    /// Confusion matrix
    pub confusion_matrix: ConfusionMatrix,
}

impl Metrics {
    /// Create new metrics from predictions and ground truth labels
    pub fn from_predictions(
        predictions: &[usize],
        ground_truth: &[usize],
        num_classes: usize,
    ) -> Self {
        assert_eq!(
            predictions.len(),
            ground_truth.len(),
            "Predictions and ground truth must have same length"
        );

        let total_samples = predictions.len();
        if total_samples == 0 {
            return Self::default();
        }

        let confusion_matrix =
            ConfusionMatrix::from_predictions(predictions, ground_truth, num_classes);

        let correct_predictions = predictions
            .iter()
            .zip(ground_truth.iter())
            .filter(|(p, g)| p == g)
            .count();

        let accuracy = correct_predictions as f64 / total_samples as f64;

        let per_class: Vec<ClassMetrics> = (0..num_classes)
            .map(|class_idx| ClassMetrics::from_confusion_matrix(&confusion_matrix, class_idx))
            .collect();

        // Macro averages over classes that actually occur
        let valid_classes: Vec<&ClassMetrics> =
            per_class.iter().filter(|m| m.support > 0).collect();
        let num_valid = valid_classes.len() as f64;

        let macro_precision = if num_valid > 0.0 {
            valid_classes.iter().map(|m| m.precision).sum::<f64>() / num_valid
        } else {
            0.0
        };

        let macro_recall = if num_valid > 0.0 {
            valid_classes.iter().map(|m| m.recall).sum::<f64>() / num_valid
        } else {
            0.0
        };

        let macro_f1 = if num_valid > 0.0 {
            valid_classes.iter().map(|m| m.f1).sum::<f64>() / num_valid
        } else {
            0.0
        };

        Self {
            total_samples,
            correct_predictions,
            accuracy,
            loss: None,
            macro_precision,
            macro_recall,
            macro_f1,
            per_class,
            confusion_matrix,
        }
    }

    /// Pretty print metrics
    pub fn display(&self) -> String {
        let mut output = String::new();

        output.push_str("Evaluation Metrics:\n");
        output.push_str(&format!("  Accuracy:        {:6.2}%\n", self.accuracy * 100.0));
        output.push_str(&format!(
            "  Macro Precision: {:6.2}%\n",
            self.macro_precision * 100.0
        ));
        output.push_str(&format!(
            "  Macro Recall:    {:6.2}%\n",
            self.macro_recall * 100.0
        ));
        output.push_str(&format!("  Macro F1:        {:6.2}%\n", self.macro_f1 * 100.0));
        if let Some(loss) = self.loss {
            output.push_str(&format!("  Loss:            {:.4}\n", loss));
        }
        output.push_str(&format!("  Total Samples:   {}\n", self.total_samples));

        output
    }

    /// Print the full report to stdout: summary, per-class table, and
    /// confusion matrix, with class names resolved where available
    pub fn print_report(&self, class_names: &[String]) {
        print!("{}", self.display());

        println!("\n  Per-class breakdown:");
        println!(
            "    {:32} {:>9} {:>9} {:>9} {:>9}",
            "class", "precision", "recall", "f1", "support"
        );
        for class in &self.per_class {
            let name = class_names
                .get(class.class_idx)
                .map(String::as_str)
                .unwrap_or("?");
            println!(
                "    {:32} {:>8.2}% {:>8.2}% {:>8.2}% {:>9}",
                name,
                class.precision * 100.0,
                class.recall * 100.0,
                class.f1 * 100.0,
                class.support
            );
        }

        println!("{}", self.confusion_matrix.display());
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            total_samples: 0,
            correct_predictions: 0,
            accuracy: 0.0,
            loss: None,
            macro_precision: 0.0,
            macro_recall: 0.0,
            macro_f1: 0.0,
            per_class: Vec::new(),
            confusion_matrix: ConfusionMatrix::default(),
        }
    }
}

impl std::fmt::Display for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Per-class metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassMetrics {
    /// Class index
    pub class_idx: usize,

    /// True positives
    pub true_positives: usize,

    /// False positives
    pub false_positives: usize,

    /// False negatives
    pub false_negatives: usize,

    /// Precision = TP / (TP + FP)
    pub precision: f64,

    /// Recall = TP / (TP + FN)
    pub recall: f64,

    /// F1 = 2 * (precision * recall) / (precision + recall)
    pub f1: f64,

    /// Support = number of actual samples of this class
    pub support: usize,
}

impl ClassMetrics {
    /// Calculate metrics for a class from confusion matrix
    pub fn from_confusion_matrix(cm: &ConfusionMatrix, class_idx: usize) -> Self {
        let true_positives = cm.get(class_idx, class_idx);

        let false_positives: usize = (0..cm.num_classes)
            .filter(|&i| i != class_idx)
            .map(|i| cm.get(i, class_idx))
            .sum();

        let false_negatives: usize = (0..cm.num_classes)
            .filter(|&i| i != class_idx)
            .map(|i| cm.get(class_idx, i))
            .sum();

        let support = true_positives + false_negatives;

        let precision = if true_positives + false_positives > 0 {
            true_positives as f64 / (true_positives + false_positives) as f64
        } else {
            0.0
        };

        let recall = if support > 0 {
            true_positives as f64 / support as f64
        } else {
            0.0
        };

        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            class_idx,
            true_positives,
            false_positives,
            false_negatives,
            precision,
            recall,
            f1,
            support,
        }
    }
}

/// Confusion Matrix for multi-class classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Number of classes
    pub num_classes: usize,

    /// Matrix data (row = actual, column = predicted), row-major
    pub matrix: Vec<usize>,
}

impl Default for ConfusionMatrix {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ConfusionMatrix {
    /// Create a new empty confusion matrix
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            matrix: vec![0; num_classes * num_classes],
        }
    }

    /// Create confusion matrix from predictions and ground truth
    pub fn from_predictions(
        predictions: &[usize],
        ground_truth: &[usize],
        num_classes: usize,
    ) -> Self {
        let mut cm = Self::new(num_classes);

        for (&pred, &actual) in predictions.iter().zip(ground_truth.iter()) {
            cm.add(actual, pred);
        }

        cm
    }

    /// Add a single prediction to the matrix
    pub fn add(&mut self, actual: usize, predicted: usize) {
        if actual < self.num_classes && predicted < self.num_classes {
            self.matrix[actual * self.num_classes + predicted] += 1;
        }
    }

    /// Get the count at (actual, predicted)
    pub fn get(&self, actual: usize, predicted: usize) -> usize {
        if actual < self.num_classes && predicted < self.num_classes {
            self.matrix[actual * self.num_classes + predicted]
        } else {
            0
        }
    }

    /// Get the total count
    pub fn total(&self) -> usize {
        self.matrix.iter().sum()
    }

    /// Get the number of correct predictions (diagonal sum)
    pub fn correct(&self) -> usize {
        (0..self.num_classes).map(|i| self.get(i, i)).sum()
    }

    /// Get overall accuracy
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total > 0 {
            self.correct() as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Pretty print the confusion matrix
    pub fn display(&self) -> String {
        let mut output = String::new();

        output.push_str("\nConfusion Matrix (rows=actual, cols=predicted):\n\n");

        output.push_str("        ");
        for col in 0..self.num_classes {
            output.push_str(&format!("{:>6}", col));
        }
        output.push('\n');

        for row in 0..self.num_classes {
            output.push_str(&format!("{:>6}  ", row));
            for col in 0..self.num_classes {
                let count = self.get(row, col);
                if row == col {
                    output.push_str(&format!("[{:>4}]", count));
                } else if count > 0 {
                    output.push_str(&format!(" {:>4} ", count));
                } else {
                    output.push_str("    . ");
                }
            }
            output.push('\n');
        }

        output.push_str(&format!("\nAccuracy: {:.2}%\n", self.accuracy() * 100.0));

        output
    }
}

impl std::fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_matrix() {
        let predictions = vec![0, 1, 2, 0, 1, 2, 0, 0, 2, 2];
        let ground_truth = vec![0, 1, 2, 0, 2, 2, 1, 0, 1, 2];

        let cm = ConfusionMatrix::from_predictions(&predictions, &ground_truth, 3);

        assert_eq!(cm.get(0, 0), 3);
        assert_eq!(cm.get(1, 1), 1);
        assert_eq!(cm.get(2, 2), 3);

        assert_eq!(cm.total(), 10);
        assert_eq!(cm.correct(), 7);
        assert!((cm.accuracy() - 0.7).abs() < 0.001);
    }

    #[test]
    fn test_metrics_from_predictions() {
        let predictions = vec![0, 1, 2, 0, 1, 2, 0, 0, 2, 2];
        let ground_truth = vec![0, 1, 2, 0, 2, 2, 1, 0, 1, 2];

        let metrics = Metrics::from_predictions(&predictions, &ground_truth, 3);

        assert_eq!(metrics.total_samples, 10);
        assert_eq!(metrics.correct_predictions, 7);
        assert!((metrics.accuracy - 0.7).abs() < 0.001);
    }

    #[test]
    fn test_class_metrics() {
        let predictions = vec![0, 0, 0, 1, 1];
        let ground_truth = vec![0, 0, 1, 1, 0];

        let cm = ConfusionMatrix::from_predictions(&predictions, &ground_truth, 2);
        let class0 = ClassMetrics::from_confusion_matrix(&cm, 0);

        // Class 0: TP=2, FP=1, FN=1
        assert_eq!(class0.true_positives, 2);
        assert_eq!(class0.false_positives, 1);
        assert_eq!(class0.false_negatives, 1);
        assert!((class0.precision - 2.0 / 3.0).abs() < 0.001);
        assert!((class0.recall - 2.0 / 3.0).abs() < 0.001);
    }

    #[test]
    fn test_empty_metrics() {
        let metrics = Metrics::from_predictions(&[], &[], 9);
        assert_eq!(metrics.total_samples, 0);
        assert_eq!(metrics.accuracy, 0.0);
    }
}
