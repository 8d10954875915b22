//! In-memory dataset and batchers
//!
//! Decodes every enumerated image into memory up front, in parallel, and
//! exposes the result both as a `burn` dataset and through batchers that
//! assemble normalized `[batch, 3, H, W]` tensors with one-hot targets.
//!
//! Loading is fail-fast: the first undecodable file aborts the whole load
//! with an error naming the offending path.

use std::path::PathBuf;
use std::sync::Mutex;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use image::imageops::FilterType;
use image::RgbImage;
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::info;

use crate::dataset::augmentation::Augmenter;
use crate::dataset::encode::{normalize_pixels, one_hot_batch};
use crate::dataset::loader::Sample;
use crate::utils::error::{LesionError, Result};
use crate::{IMAGE_HEIGHT, IMAGE_WIDTH};

/// A decoded, resized image held in memory with its label
#[derive(Debug, Clone)]
pub struct LesionImage {
    /// RGB pixel data at the model input resolution
    pub pixels: RgbImage,
    /// Class label index
    pub label: usize,
    /// Originating file path (kept for error reporting)
    pub path: PathBuf,
}

/// An in-memory dataset of decoded lesion images
#[derive(Debug)]
pub struct LesionDataset {
    items: Vec<LesionImage>,
    num_classes: usize,
}

impl LesionDataset {
    /// Decode all samples into memory in parallel
    ///
    /// Images are resized to `IMAGE_WIDTH x IMAGE_HEIGHT` regardless of
    /// their original aspect ratio. Output order matches input order.
    /// Every label must be in `[0, num_classes)`; constructing a dataset
    /// with an out-of-range label is an error, so the batchers can rely
    /// on labels being valid.
    pub fn load_parallel(samples: &[Sample], num_classes: usize) -> Result<Self> {
        for sample in samples {
            if sample.label >= num_classes {
                return Err(LesionError::LabelOutOfRange {
                    label: sample.label,
                    num_classes,
                });
            }
        }

        info!(
            "Loading {} images at {}x{} across {} threads",
            samples.len(),
            IMAGE_WIDTH,
            IMAGE_HEIGHT,
            rayon::current_num_threads()
        );

        let progress = ProgressBar::new(samples.len() as u64);
        progress.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} images ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
        );

        let items: Vec<LesionImage> = samples
            .par_iter()
            .map(|sample| {
                let decoded = image::open(&sample.path).map_err(|e| {
                    LesionError::ImageLoad(sample.path.clone(), e.to_string())
                })?;
                let resized = decoded
                    .resize_exact(IMAGE_WIDTH, IMAGE_HEIGHT, FilterType::Triangle)
                    .to_rgb8();
                progress.inc(1);
                Ok(LesionImage {
                    pixels: resized,
                    label: sample.label,
                    path: sample.path.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        progress.finish_and_clear();
        info!("Loaded {} images", items.len());

        Ok(Self { items, num_classes })
    }

    /// Wrap already-decoded images, validating every label
    pub fn from_items(items: Vec<LesionImage>, num_classes: usize) -> Result<Self> {
        for item in &items {
            if item.label >= num_classes {
                return Err(LesionError::LabelOutOfRange {
                    label: item.label,
                    num_classes,
                });
            }
        }
        Ok(Self { items, num_classes })
    }

    /// Number of classes this dataset's labels index into
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Borrow all items in order
    pub fn items(&self) -> &[LesionImage] {
        &self.items
    }
}

impl Dataset<LesionImage> for LesionDataset {
    fn get(&self, index: usize) -> Option<LesionImage> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// One training batch: normalized images and one-hot targets
#[derive(Debug, Clone)]
pub struct LesionBatch<B: Backend> {
    /// Images as `[batch, 3, height, width]`, values in `[0, 1]`
    pub images: Tensor<B, 4>,
    /// One-hot targets as `[batch, num_classes]`
    pub targets: Tensor<B, 2>,
}

/// Batcher that normalizes images and one-hot encodes labels
///
/// Used for validation and test batches; applies no augmentation.
#[derive(Clone)]
pub struct LesionBatcher {
    num_classes: usize,
}

impl LesionBatcher {
    /// Create a batcher for the given class count
    pub fn new(num_classes: usize) -> Self {
        Self { num_classes }
    }

    fn assemble<B: Backend>(
        &self,
        images: Vec<RgbImage>,
        labels: &[usize],
        device: &B::Device,
    ) -> LesionBatch<B> {
        let batch_size = images.len();
        let mut pixel_data =
            Vec::with_capacity(batch_size * 3 * (IMAGE_HEIGHT * IMAGE_WIDTH) as usize);

        // Interleaved HWC bytes to planar CHW floats
        for img in &images {
            let raw = normalize_pixels(img.as_raw());
            let plane = (IMAGE_HEIGHT * IMAGE_WIDTH) as usize;
            for c in 0..3 {
                for i in 0..plane {
                    pixel_data.push(raw[i * 3 + c]);
                }
            }
        }

        let images = Tensor::from_data(
            TensorData::new(
                pixel_data,
                [batch_size, 3, IMAGE_HEIGHT as usize, IMAGE_WIDTH as usize],
            ),
            device,
        );

        // Labels are validated at dataset construction
        let encoded = one_hot_batch(labels, self.num_classes).unwrap_or_else(|_| {
            vec![0.0; batch_size * self.num_classes]
        });
        let targets = Tensor::from_data(
            TensorData::new(encoded, [batch_size, self.num_classes]),
            device,
        );

        LesionBatch { images, targets }
    }
}

impl<B: Backend> Batcher<B, LesionImage, LesionBatch<B>> for LesionBatcher {
    fn batch(&self, items: Vec<LesionImage>, device: &B::Device) -> LesionBatch<B> {
        let labels: Vec<usize> = items.iter().map(|item| item.label).collect();
        let images: Vec<RgbImage> = items.into_iter().map(|item| item.pixels).collect();
        self.assemble(images, &labels, device)
    }
}

/// Batcher that augments each image before normalization
///
/// Wraps a [`LesionBatcher`] and applies a fresh random affine warp to
/// every image on every batch, so the model never sees the exact same
/// training image twice.
pub struct AugmentingBatcher {
    inner: LesionBatcher,
    augmenter: Augmenter,
    rng: Mutex<ChaCha8Rng>,
}

impl AugmentingBatcher {
    /// Create an augmenting batcher with a seeded RNG
    pub fn new(num_classes: usize, augmenter: Augmenter, seed: u64) -> Self {
        Self {
            inner: LesionBatcher::new(num_classes),
            augmenter,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl<B: Backend> Batcher<B, LesionImage, LesionBatch<B>> for AugmentingBatcher {
    fn batch(&self, items: Vec<LesionImage>, device: &B::Device) -> LesionBatch<B> {
        let labels: Vec<usize> = items.iter().map(|item| item.label).collect();

        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        let images: Vec<RgbImage> = items
            .iter()
            .map(|item| self.augmenter.augment(&item.pixels, &mut rng))
            .collect();
        drop(rng);

        self.inner.assemble(images, &labels, device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;
    use crate::dataset::augmentation::AugmentationConfig;
    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    fn write_image(dir: &TempDir, name: &str, shade: u8) -> PathBuf {
        let img: RgbImage = ImageBuffer::from_pixel(20, 30, Rgb([shade, shade, shade]));
        let path = dir.path().join(name);
        img.save(&path).unwrap();
        path
    }

    fn make_image(label: usize, shade: u8) -> LesionImage {
        LesionImage {
            pixels: ImageBuffer::from_pixel(IMAGE_WIDTH, IMAGE_HEIGHT, Rgb([shade, shade, shade])),
            label,
            path: PathBuf::from(format!("img_{}.jpg", shade)),
        }
    }

    #[test]
    fn test_parallel_load_preserves_order() {
        let dir = TempDir::new().unwrap();
        let samples: Vec<Sample> = (0..8)
            .map(|i| Sample {
                path: write_image(&dir, &format!("img_{}.png", i), (i * 30) as u8),
                label: i % 2,
                class_name: format!("class_{}", i % 2),
            })
            .collect();

        let dataset = LesionDataset::load_parallel(&samples, 2).unwrap();
        assert_eq!(dataset.len(), 8);

        for (i, item) in dataset.items().iter().enumerate() {
            assert_eq!(item.path, samples[i].path);
            assert_eq!(item.label, samples[i].label);
            // Resized to model input resolution
            assert_eq!(item.pixels.dimensions(), (IMAGE_WIDTH, IMAGE_HEIGHT));
            // Uniform shade survives resizing
            assert_eq!(item.pixels.get_pixel(0, 0)[0], (i * 30) as u8);
        }
    }

    #[test]
    fn test_from_items_rejects_out_of_range_label() {
        // A label of 5 with 2 classes must never reach a batcher, where it
        // would otherwise encode as an all-zero target row
        let err = LesionDataset::from_items(vec![make_image(5, 10)], 2).unwrap_err();
        assert!(matches!(
            err,
            LesionError::LabelOutOfRange {
                label: 5,
                num_classes: 2
            }
        ));
    }

    #[test]
    fn test_parallel_load_rejects_out_of_range_label() {
        let dir = TempDir::new().unwrap();
        let samples = vec![Sample {
            path: write_image(&dir, "img.png", 50),
            label: 9,
            class_name: "unknown".to_string(),
        }];

        let err = LesionDataset::load_parallel(&samples, 9).unwrap_err();
        assert!(matches!(err, LesionError::LabelOutOfRange { .. }));
    }

    #[test]
    fn test_parallel_load_fails_on_bad_file() {
        let dir = TempDir::new().unwrap();
        let bad_path = dir.path().join("broken.jpg");
        std::fs::write(&bad_path, b"this is not an image").unwrap();

        let samples = vec![Sample {
            path: bad_path,
            label: 0,
            class_name: "melanoma".to_string(),
        }];

        let err = LesionDataset::load_parallel(&samples, 2).unwrap_err();
        assert!(matches!(err, LesionError::ImageLoad(_, _)));
    }

    #[test]
    fn test_batcher_shapes_and_range() {
        let device = Default::default();
        let batcher = LesionBatcher::new(9);
        let items = vec![make_image(0, 0), make_image(3, 255)];

        let batch: LesionBatch<DefaultBackend> = batcher.batch(items, &device);

        assert_eq!(
            batch.images.dims(),
            [2, 3, IMAGE_HEIGHT as usize, IMAGE_WIDTH as usize]
        );
        assert_eq!(batch.targets.dims(), [2, 9]);

        let pixels = batch.images.to_data().to_vec::<f32>().unwrap();
        assert!(pixels.iter().all(|&v| (0.0..=1.0).contains(&v)));

        let targets = batch.targets.to_data().to_vec::<f32>().unwrap();
        assert_eq!(targets[0], 1.0); // label 0 of first item
        assert_eq!(targets[9 + 3], 1.0); // label 3 of second item
    }

    #[test]
    fn test_augmenting_batcher_keeps_shapes() {
        let device = Default::default();
        let batcher = AugmentingBatcher::new(9, Augmenter::with_defaults(), 42);
        let items = vec![make_image(1, 100), make_image(2, 200)];

        let batch: LesionBatch<DefaultBackend> = batcher.batch(items, &device);

        assert_eq!(
            batch.images.dims(),
            [2, 3, IMAGE_HEIGHT as usize, IMAGE_WIDTH as usize]
        );
        assert_eq!(batch.targets.dims(), [2, 9]);
    }

    #[test]
    fn test_no_op_augmentation_matches_plain_batcher() {
        let device = Default::default();
        let plain = LesionBatcher::new(9);
        let identity = AugmentingBatcher::new(
            9,
            Augmenter::new(AugmentationConfig::none()),
            42,
        );

        let items = vec![make_image(4, 77)];
        let a: LesionBatch<DefaultBackend> = plain.batch(items.clone(), &device);
        let b: LesionBatch<DefaultBackend> = identity.batch(items, &device);

        let pa = a.images.to_data().to_vec::<f32>().unwrap();
        let pb = b.images.to_data().to_vec::<f32>().unwrap();
        assert_eq!(pa, pb);
    }
}
