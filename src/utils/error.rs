//! Error Handling Module
//!
//! Defines custom error types for the ISIC classifier library.
//! Uses thiserror for ergonomic error definitions.
//!
//! Every pipeline phase returns an explicit `Result` so the caller decides
//! whether to abort; nothing panics on bad input data.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for ISIC classifier operations
#[derive(Error, Debug)]
pub enum LesionError {
    /// Error loading or decoding an image
    #[error("Failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    /// Error with dataset enumeration or splitting
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Configuration error (e.g. class-count mismatch)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error with model persistence or loading
    #[error("Model error: {0}")]
    Model(String),

    /// Error during training
    #[error("Training error: {0}")]
    Training(String),

    /// A label outside the configured class range
    #[error("Label {label} out of range for {num_classes} classes")]
    LabelOutOfRange { label: usize, num_classes: usize },

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for ISIC classifier operations
pub type Result<T> = std::result::Result<T, LesionError>;
