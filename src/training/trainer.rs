//! Supervised training loop
//!
//! Trains the classifier with Adam on augmented mini-batches, validating
//! after every epoch and reducing the learning rate on validation-loss
//! plateaus. Training always runs the configured number of epochs; there
//! is no early stopping.

use std::path::Path;

use burn::data::dataloader::batcher::Batcher;
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::activation::log_softmax;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::dataset::augmentation::Augmenter;
use crate::dataset::{AugmentingBatcher, LesionBatch, LesionDataset, LesionImage};
use crate::inference::evaluate;
use crate::model::{LesionClassifier, ModelConfig, TrainingConfig};
use crate::training::scheduler::ReduceLrOnPlateau;
use crate::utils::error::{LesionError, Result};
use crate::utils::logging::TrainingLogger;

/// Categorical cross-entropy between logits and one-hot targets
///
/// Mean over the batch of `-sum(targets * log_softmax(logits))`.
pub fn categorical_cross_entropy<B: Backend>(
    logits: Tensor<B, 2>,
    targets: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let log_probs = log_softmax(logits, 1);
    (targets * log_probs).sum_dim(1).neg().mean()
}

/// Metrics recorded for one training epoch
#[derive(Debug, Clone)]
pub struct EpochStats {
    /// Epoch index, starting at 0
    pub epoch: usize,
    /// Mean training loss over the epoch's batches
    pub train_loss: f64,
    /// Validation loss after the epoch
    pub val_loss: f64,
    /// Validation accuracy after the epoch
    pub val_accuracy: f64,
    /// Learning rate the epoch was trained with
    pub learning_rate: f64,
}

/// Per-epoch history of a completed training run
#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    /// Stats in epoch order
    pub epochs: Vec<EpochStats>,
}

impl TrainingHistory {
    /// Lowest validation loss seen across all epochs
    pub fn best_val_loss(&self) -> Option<f64> {
        self.epochs
            .iter()
            .map(|e| e.val_loss)
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Validation accuracy of the final epoch
    pub fn final_val_accuracy(&self) -> Option<f64> {
        self.epochs.last().map(|e| e.val_accuracy)
    }
}

/// Supervised trainer for the lesion classifier
pub struct Trainer<B: AutodiffBackend> {
    config: TrainingConfig,
    device: B::Device,
}

impl<B: AutodiffBackend> Trainer<B> {
    /// Create a trainer, validating the configuration up front
    pub fn new(config: TrainingConfig, device: B::Device) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, device })
    }

    /// Train a model to completion and return it with its history
    pub fn fit(
        &self,
        mut model: LesionClassifier<B>,
        train: &LesionDataset,
        val: &LesionDataset,
    ) -> Result<(LesionClassifier<B>, TrainingHistory)> {
        if train.items().is_empty() {
            return Err(LesionError::Training(
                "Training set is empty".to_string(),
            ));
        }
        if val.items().is_empty() {
            return Err(LesionError::Training(
                "Validation set is empty".to_string(),
            ));
        }

        info!(
            "Training for {} epochs, batch size {}, initial LR {:.2e}",
            self.config.epochs, self.config.batch_size, self.config.learning_rate
        );

        let mut optimizer = AdamConfig::new().init();
        let mut scheduler = ReduceLrOnPlateau::new(
            self.config.learning_rate,
            self.config.plateau_factor,
            self.config.plateau_patience,
            self.config.min_learning_rate,
        );

        let batcher = AugmentingBatcher::new(
            train.num_classes(),
            Augmenter::with_defaults(),
            self.config.seed,
        );
        let mut shuffle_rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        let mut logger = TrainingLogger::new(self.config.epochs);
        let mut history = TrainingHistory::default();

        for epoch in 0..self.config.epochs {
            logger.start_epoch(epoch);
            let learning_rate = scheduler.learning_rate();

            let mut indices: Vec<usize> = (0..train.items().len()).collect();
            indices.shuffle(&mut shuffle_rng);

            let mut loss_sum = 0.0f64;
            let mut batch_count = 0usize;

            for batch_indices in indices.chunks(self.config.batch_size) {
                let items: Vec<LesionImage> = batch_indices
                    .iter()
                    .map(|&i| train.items()[i].clone())
                    .collect();
                let batch: LesionBatch<B> = batcher.batch(items, &self.device);

                let logits = model.forward(batch.images);
                let loss = categorical_cross_entropy(logits, batch.targets);
                loss_sum += loss.clone().into_scalar().elem::<f64>();
                batch_count += 1;

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optimizer.step(learning_rate, model, grads);
            }

            let train_loss = loss_sum / batch_count as f64;

            let evaluation = evaluate(
                &model.valid(),
                val,
                self.config.batch_size,
                &self.device,
            )?;

            logger.end_epoch(
                train_loss,
                evaluation.loss,
                evaluation.accuracy,
                learning_rate,
            );
            history.epochs.push(EpochStats {
                epoch,
                train_loss,
                val_loss: evaluation.loss,
                val_accuracy: evaluation.accuracy,
                learning_rate,
            });

            scheduler.step(evaluation.loss);
        }

        if let Some(accuracy) = history.final_val_accuracy() {
            logger.log_complete(accuracy);
        }

        Ok((model, history))
    }
}

/// Persist a trained model's weights, overwriting any existing file
///
/// Weights are stored at full precision so a reloaded model reproduces
/// the original's outputs exactly. The recorder appends its own
/// extension, so `path` is the stem.
pub fn save_checkpoint<B: Backend, P: AsRef<Path>>(
    model: &LesionClassifier<B>,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    model
        .clone()
        .save_file(path, &NamedMpkFileRecorder::<FullPrecisionSettings>::new())
        .map_err(|e| LesionError::Model(format!("Failed to save model to {:?}: {}", path, e)))?;
    info!("Model saved to {:?}", path);
    Ok(())
}

/// Load persisted weights into a freshly constructed model
pub fn load_checkpoint<B: Backend, P: AsRef<Path>>(
    config: &ModelConfig,
    path: P,
    device: &B::Device,
) -> Result<LesionClassifier<B>> {
    let path = path.as_ref();
    let model = LesionClassifier::new(config, device)
        .load_file(path, &NamedMpkFileRecorder::<FullPrecisionSettings>::new(), device)
        .map_err(|e| {
            LesionError::Model(format!("Failed to load model from {:?}: {}", path, e))
        })?;
    info!("Model loaded from {:?}", path);
    Ok(model)
}
