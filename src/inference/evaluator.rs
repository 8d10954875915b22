//! Batched evaluation of a trained classifier
//!
//! Runs a model over a dataset without augmentation or gradients and
//! reports mean loss, argmax accuracy, and the full prediction/label
//! sequences for downstream metric computation. Predictions are compared
//! against labels recovered by argmax from the one-hot targets, which is
//! also how a reloaded model is verified against the original.

use burn::data::dataloader::batcher::Batcher;
use burn::prelude::*;
use burn::tensor::ElementConversion;
use tracing::debug;

use crate::dataset::encode::decode_one_hot;
use crate::dataset::{LesionBatch, LesionBatcher, LesionDataset};
use crate::model::LesionClassifier;
use crate::training::trainer::categorical_cross_entropy;
use crate::utils::error::{LesionError, Result};
use crate::utils::metrics::Metrics;

/// The outcome of one evaluation pass
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Mean categorical cross-entropy over all samples
    pub loss: f64,
    /// Fraction of samples whose argmax prediction matches the label
    pub accuracy: f64,
    /// Predicted class index per sample, in dataset order
    pub predictions: Vec<usize>,
    /// True class index per sample, decoded from the one-hot targets
    pub labels: Vec<usize>,
}

impl Evaluation {
    /// Derive full per-class metrics from the prediction/label sequences
    pub fn metrics(&self, num_classes: usize) -> Metrics {
        Metrics::from_predictions(&self.predictions, &self.labels, num_classes)
    }
}

/// Evaluate a model over an entire dataset in mini-batches
pub fn evaluate<B: Backend>(
    model: &LesionClassifier<B>,
    dataset: &LesionDataset,
    batch_size: usize,
    device: &B::Device,
) -> Result<Evaluation> {
    if dataset.items().is_empty() {
        return Err(LesionError::Dataset(
            "Cannot evaluate on an empty dataset".to_string(),
        ));
    }

    let batcher = LesionBatcher::new(dataset.num_classes());

    let mut loss_sum = 0.0f64;
    let mut predictions = Vec::with_capacity(dataset.items().len());
    let mut labels = Vec::with_capacity(dataset.items().len());

    for chunk in dataset.items().chunks(batch_size) {
        let batch: LesionBatch<B> = batcher.batch(chunk.to_vec(), device);
        let n = chunk.len();

        let logits = model.forward(batch.images);
        let loss = categorical_cross_entropy(logits.clone(), batch.targets.clone());
        loss_sum += loss.into_scalar().elem::<f64>() * n as f64;

        predictions.extend(argmax_rows(logits)?);

        let target_rows = batch
            .targets
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| LesionError::Model(format!("Failed to read target rows: {:?}", e)))?;
        labels.extend(target_rows.chunks(dataset.num_classes()).map(decode_one_hot));
    }

    let total = predictions.len();
    let correct = predictions
        .iter()
        .zip(labels.iter())
        .filter(|(p, l)| p == l)
        .count();

    let evaluation = Evaluation {
        loss: loss_sum / total as f64,
        accuracy: correct as f64 / total as f64,
        predictions,
        labels,
    };

    debug!(
        "Evaluated {} samples: loss {:.4}, accuracy {:.4}",
        total, evaluation.loss, evaluation.accuracy
    );

    Ok(evaluation)
}

/// Row-wise argmax of a `[batch, num_classes]` tensor
fn argmax_rows<B: Backend>(rows: Tensor<B, 2>) -> Result<Vec<usize>> {
    let indices = rows.argmax(1).squeeze::<1>(1);
    let data = indices.into_data().convert::<i64>();
    let values = data
        .to_vec::<i64>()
        .map_err(|e| LesionError::Model(format!("Failed to read argmax indices: {:?}", e)))?;
    Ok(values.into_iter().map(|v| v as usize).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;
    use crate::dataset::LesionImage;
    use crate::model::ModelConfig;
    use crate::{IMAGE_HEIGHT, IMAGE_WIDTH};
    use image::{ImageBuffer, Rgb};
    use std::path::PathBuf;

    fn tiny_dataset(n: usize, num_classes: usize) -> LesionDataset {
        let items = (0..n)
            .map(|i| LesionImage {
                pixels: ImageBuffer::from_pixel(
                    IMAGE_WIDTH,
                    IMAGE_HEIGHT,
                    Rgb([(i * 40) as u8; 3]),
                ),
                label: i % num_classes,
                path: PathBuf::from(format!("img_{}.jpg", i)),
            })
            .collect();
        LesionDataset::from_items(items, num_classes).unwrap()
    }

    #[test]
    fn test_evaluation_covers_every_sample() {
        let device = Default::default();
        let model = LesionClassifier::<DefaultBackend>::new(
            &ModelConfig::new().with_base_filters(4).with_hidden_size(16),
            &device,
        );
        let dataset = tiny_dataset(5, 9);

        let eval = evaluate(&model, &dataset, 2, &device).unwrap();
        assert_eq!(eval.predictions.len(), 5);
        assert_eq!(eval.labels.len(), 5);
        assert_eq!(eval.labels, vec![0, 1, 2, 3, 4]);
        assert!((0.0..=1.0).contains(&eval.accuracy));
        assert!(eval.loss.is_finite());
    }

    #[test]
    fn test_empty_dataset_is_an_error() {
        let device = Default::default();
        let model = LesionClassifier::<DefaultBackend>::new(
            &ModelConfig::new().with_base_filters(4).with_hidden_size(16),
            &device,
        );
        let dataset = LesionDataset::from_items(Vec::new(), 9).unwrap();

        assert!(evaluate(&model, &dataset, 2, &device).is_err());
    }

    #[test]
    fn test_metrics_dimensions() {
        let eval = Evaluation {
            loss: 0.5,
            accuracy: 0.5,
            predictions: vec![0, 1, 1, 0],
            labels: vec![0, 1, 0, 1],
        };
        let metrics = eval.metrics(2);
        assert_eq!(metrics.total_samples, 4);
        assert_eq!(metrics.correct_predictions, 2);
    }
}
