//! Convolutional classifier architecture
//!
//! A convolutional feature extractor topped with a global-average-pooling
//! classification head: GAP -> dropout -> dense 512 (ReLU) -> dense over
//! the class count. The head is what gets trained from scratch; the
//! feature extractor can optionally start from previously saved weights.

use std::path::Path;

use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{
    AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig,
};
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d, Relu};
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::activation::softmax;

use crate::model::config::ModelConfig;
use crate::utils::error::{LesionError, Result};

/// One convolution stage: 3x3 conv (same padding), ReLU, 2x2 max pool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    activation: Relu,
    pool: MaxPool2d,
}

impl<B: Backend> ConvBlock<B> {
    fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        Self {
            conv: Conv2dConfig::new([in_channels, out_channels], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            activation: Relu::new(),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        }
    }

    /// Forward pass; halves spatial dimensions
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.activation.forward(x);
        self.pool.forward(x)
    }
}

/// Stack of convolution blocks with doubling channel widths
#[derive(Module, Debug)]
pub struct FeatureExtractor<B: Backend> {
    blocks: Vec<ConvBlock<B>>,
}

impl<B: Backend> FeatureExtractor<B> {
    fn new(base_filters: usize, device: &B::Device) -> Self {
        let widths = [
            base_filters,
            base_filters * 2,
            base_filters * 4,
            base_filters * 8,
        ];

        let mut blocks = Vec::with_capacity(widths.len());
        let mut in_channels = 3;
        for out_channels in widths {
            blocks.push(ConvBlock::new(in_channels, out_channels, device));
            in_channels = out_channels;
        }

        Self { blocks }
    }

    /// Channel width of the final block's output
    fn out_channels(base_filters: usize) -> usize {
        base_filters * 8
    }

    /// Forward pass through all blocks
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.blocks
            .iter()
            .fold(x, |x, block| block.forward(x))
    }
}

/// The full classifier: feature extractor plus dense head
#[derive(Module, Debug)]
pub struct LesionClassifier<B: Backend> {
    backbone: FeatureExtractor<B>,
    global_pool: AdaptiveAvgPool2d,
    dropout: Dropout,
    hidden: Linear<B>,
    activation: Relu,
    output: Linear<B>,
}

impl<B: Backend> LesionClassifier<B> {
    /// Build a fresh model from the configuration
    pub fn new(config: &ModelConfig, device: &B::Device) -> Self {
        let feature_dim = FeatureExtractor::<B>::out_channels(config.base_filters);

        Self {
            backbone: FeatureExtractor::new(config.base_filters, device),
            global_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            dropout: DropoutConfig::new(config.dropout).init(),
            hidden: LinearConfig::new(feature_dim, config.hidden_size).init(device),
            activation: Relu::new(),
            output: LinearConfig::new(config.hidden_size, config.num_classes).init(device),
        }
    }

    /// Replace the feature extractor with weights loaded from a record file
    ///
    /// The head keeps its fresh initialization; only the convolutional
    /// backbone is swapped out.
    pub fn with_pretrained_backbone<P: AsRef<Path>>(
        mut self,
        path: P,
        device: &B::Device,
    ) -> Result<Self> {
        let path = path.as_ref();
        self.backbone = self
            .backbone
            .load_file(path, &NamedMpkFileRecorder::<FullPrecisionSettings>::new(), device)
            .map_err(|e| {
                LesionError::Model(format!(
                    "Failed to load backbone weights from {:?}: {}",
                    path, e
                ))
            })?;
        Ok(self)
    }

    /// Forward pass producing raw logits `[batch, num_classes]`
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch_size, _, _, _] = images.dims();

        let features = self.backbone.forward(images);
        let pooled = self.global_pool.forward(features);
        let flat = pooled.reshape([batch_size as i32, -1]);

        let x = self.dropout.forward(flat);
        let x = self.hidden.forward(x);
        let x = self.activation.forward(x);
        self.output.forward(x)
    }

    /// Forward pass producing class probabilities
    pub fn forward_softmax(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        softmax(self.forward(images), 1)
    }
}
