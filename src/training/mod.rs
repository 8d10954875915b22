//! Training loop, learning-rate scheduling, and checkpointing

pub mod scheduler;
pub mod trainer;

pub use scheduler::ReduceLrOnPlateau;
pub use trainer::{
    load_checkpoint, save_checkpoint, EpochStats, Trainer, TrainingHistory,
};
