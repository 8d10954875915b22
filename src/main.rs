//! ISIC skin-lesion classifier training binary
//!
//! Runs the full pipeline end to end: enumerate the train/test directory
//! trees, merge and re-split them 80/20, load every image into memory in
//! parallel, train the CNN with augmentation and plateau-based learning
//! rate decay, then save the model, reload it fresh, and verify the
//! reloaded copy scores the test set identically.

use std::path::PathBuf;

use anyhow::{Context, Result};
use burn::module::AutodiffModule;
use clap::Parser;
use colored::Colorize;
use tracing::{info, warn};

use isic_classifier::backend::{backend_name, default_device, DefaultBackend, TrainingBackend};
use isic_classifier::dataset::{train_test_split, LesionDataset, SampleTable, SplitConfig};
use isic_classifier::inference::evaluate;
use isic_classifier::model::{LesionClassifier, ModelConfig, TrainingConfig};
use isic_classifier::training::{load_checkpoint, save_checkpoint, Trainer};
use isic_classifier::utils::logging::{init_logging, LogConfig};
use isic_classifier::{NUM_CLASSES, TEST_FRACTION, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "isic-classifier",
    version = VERSION,
    about = "Train a CNN skin-lesion classifier on the ISIC dataset"
)]
struct Cli {
    /// Root of the training directory tree (one subdirectory per class)
    #[arg(long, default_value = "data/train")]
    train_dir: PathBuf,

    /// Root of the test directory tree (same class subdirectories)
    #[arg(long, default_value = "data/test")]
    test_dir: PathBuf,

    /// Number of training epochs
    #[arg(long, default_value_t = 50)]
    epochs: usize,

    /// Mini-batch size
    #[arg(long, default_value_t = 32)]
    batch_size: usize,

    /// Initial Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    learning_rate: f64,

    /// Seed for splitting, shuffling, and augmentation
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Output path stem for the saved model weights
    #[arg(long, default_value = "skin_lesion_model")]
    model_path: PathBuf,

    /// Optional record file with pretrained backbone weights
    #[arg(long)]
    backbone_weights: Option<PathBuf>,

    /// Write the final evaluation metrics to this path as JSON
    #[arg(long)]
    metrics_json: Option<PathBuf>,

    /// Enable debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn print_header(text: &str) {
    println!("\n{}", format!("=== {} ===", text).cyan().bold());
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    init_logging(&log_config).map_err(anyhow::Error::msg)?;

    println!(
        "{}",
        format!("ISIC Skin-Lesion Classifier v{}", VERSION).green().bold()
    );
    info!("Backend: {}", backend_name());

    let device = default_device();

    // Phase 1: enumerate both directory roots and pool them
    print_header("Dataset enumeration");
    let pool = SampleTable::from_dir(&cli.train_dir)
        .context("Failed to enumerate training directory")?
        .merge(SampleTable::from_dir(&cli.test_dir).context("Failed to enumerate test directory")?)
        .context("Train and test directories are inconsistent")?;
    pool.validate_class_count(NUM_CLASSES)
        .context("Unexpected class directory layout")?;
    pool.print_stats();
    let class_names = pool.class_names.clone();

    // Phase 2: deterministic 80/20 re-split of the combined pool
    print_header("Train/test split");
    let split_config = SplitConfig::new(TEST_FRACTION, cli.seed)?;
    let splits = train_test_split(pool.samples, &split_config)?;
    println!(
        "  Train: {} samples | Test: {} samples",
        splits.train.len(),
        splits.test.len()
    );

    // Phase 3: decode everything into memory in parallel
    print_header("Image loading");
    let train_set = LesionDataset::load_parallel(&splits.train, NUM_CLASSES)
        .context("Failed to load training images")?;
    let test_set = LesionDataset::load_parallel(&splits.test, NUM_CLASSES)
        .context("Failed to load test images")?;

    // Phase 4: build the model, optionally starting from saved backbone weights
    print_header("Model");
    let model_config = ModelConfig::new().with_num_classes(NUM_CLASSES);
    model_config.validate()?;
    let mut model = LesionClassifier::<TrainingBackend>::new(&model_config, &device);
    match &cli.backbone_weights {
        Some(path) if path.exists() => {
            model = model.with_pretrained_backbone(path, &device)?;
            info!("Initialized backbone from {:?}", path);
        }
        Some(path) => {
            warn!(
                "Backbone weights {:?} not found; training from scratch",
                path
            );
        }
        None => info!("Training from scratch"),
    }

    // Phase 5: train
    print_header("Training");
    let training_config = TrainingConfig::new()
        .with_epochs(cli.epochs)
        .with_batch_size(cli.batch_size)
        .with_learning_rate(cli.learning_rate)
        .with_seed(cli.seed);
    let trainer = Trainer::<TrainingBackend>::new(training_config, device.clone())?;
    let (model, history) = trainer.fit(model, &train_set, &test_set)?;

    if let Some(best) = history.best_val_loss() {
        println!("  Best validation loss: {:.4}", best);
    }

    // Phase 6: evaluate the trained model on the held-out test set
    print_header("Evaluation");
    let trained = model.valid();
    let evaluation = evaluate(&trained, &test_set, cli.batch_size, &device)?;
    println!(
        "  Test loss: {:.4} | Test accuracy: {}",
        evaluation.loss,
        format!("{:.2}%", evaluation.accuracy * 100.0).green().bold()
    );

    // Phase 7: persist, reload into a fresh model, and verify the scores
    print_header("Persistence check");
    save_checkpoint(&trained, &cli.model_path)?;
    let reloaded = load_checkpoint::<DefaultBackend, _>(&model_config, &cli.model_path, &device)
        .context("Failed to reload the saved model")?;

    let reloaded_eval = evaluate(&reloaded, &test_set, cli.batch_size, &device)?;
    println!(
        "  Reloaded model accuracy: {}",
        format!("{:.2}%", reloaded_eval.accuracy * 100.0)
            .green()
            .bold()
    );

    let agreement = evaluation
        .predictions
        .iter()
        .zip(reloaded_eval.predictions.iter())
        .filter(|(a, b)| a == b)
        .count() as f64
        / evaluation.predictions.len() as f64;
    println!("  Prediction agreement with in-memory model: {:.2}%", agreement * 100.0);

    // Phase 8: full per-class report
    print_header("Per-class metrics");
    let mut metrics = reloaded_eval.metrics(NUM_CLASSES);
    metrics.loss = Some(reloaded_eval.loss);
    metrics.print_report(&class_names);

    if let Some(path) = &cli.metrics_json {
        let json = serde_json::to_string_pretty(&metrics)
            .context("Failed to serialize metrics")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write metrics to {:?}", path))?;
        info!("Metrics written to {:?}", path);
    }

    println!("\n{}", "Done.".green().bold());
    Ok(())
}
