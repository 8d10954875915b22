//! Data Augmentation Module
//!
//! Applies random geometric perturbations to training images on the fly:
//! rotation, horizontal/vertical shifts, shear, zoom, and horizontal flip.
//! All geometric transforms are combined into a single affine warp applied
//! by inverse mapping with bilinear sampling; source coordinates outside
//! the image are clamped to the nearest edge pixel (nearest fill).
//!
//! Validation and test batches bypass this module entirely.

use image::{ImageBuffer, Rgb, RgbImage};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Configuration for random augmentation
#[derive(Clone, Debug)]
pub struct AugmentationConfig {
    /// Maximum rotation angle in degrees (applies ±rotation_degrees)
    pub rotation_degrees: f32,
    /// Maximum horizontal shift as a fraction of image width
    pub width_shift: f32,
    /// Maximum vertical shift as a fraction of image height
    pub height_shift: f32,
    /// Maximum shear angle in degrees
    pub shear_degrees: f32,
    /// Maximum zoom deviation (scale drawn from 1.0 ± zoom)
    pub zoom: f32,
    /// Probability of applying horizontal flip
    pub horizontal_flip_prob: f32,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            rotation_degrees: 20.0,
            width_shift: 0.2,
            height_shift: 0.2,
            shear_degrees: 0.2,
            zoom: 0.2,
            horizontal_flip_prob: 0.5,
        }
    }
}

impl AugmentationConfig {
    /// Disable all augmentations (for validation/inference)
    pub fn none() -> Self {
        Self {
            rotation_degrees: 0.0,
            width_shift: 0.0,
            height_shift: 0.0,
            shear_degrees: 0.0,
            zoom: 0.0,
            horizontal_flip_prob: 0.0,
        }
    }
}

/// Randomly sampled parameters for one affine warp
#[derive(Clone, Copy, Debug)]
struct AffineParams {
    angle_rad: f32,
    shift_x: f32,
    shift_y: f32,
    shear_rad: f32,
    scale: f32,
    flip: bool,
}

/// Image augmenter that applies random affine transformations
#[derive(Clone)]
pub struct Augmenter {
    config: AugmentationConfig,
}

impl Augmenter {
    /// Create a new augmenter with the given configuration
    pub fn new(config: AugmentationConfig) -> Self {
        Self { config }
    }

    /// Create an augmenter with default augmentation
    pub fn with_defaults() -> Self {
        Self::new(AugmentationConfig::default())
    }

    /// Apply one random augmentation to an image
    ///
    /// Output dimensions always equal input dimensions.
    pub fn augment(&self, img: &RgbImage, rng: &mut ChaCha8Rng) -> RgbImage {
        let params = self.sample_params(rng);
        self.warp(img, &params)
    }

    fn sample_params(&self, rng: &mut ChaCha8Rng) -> AffineParams {
        let c = &self.config;

        let range = |rng: &mut ChaCha8Rng, limit: f32| -> f32 {
            if limit > 0.0 {
                rng.gen_range(-limit..=limit)
            } else {
                0.0
            }
        };

        let scale = if c.zoom > 0.0 {
            1.0 + range(rng, c.zoom)
        } else {
            1.0
        };

        AffineParams {
            angle_rad: range(rng, c.rotation_degrees).to_radians(),
            shift_x: range(rng, c.width_shift),
            shift_y: range(rng, c.height_shift),
            shear_rad: range(rng, c.shear_degrees).to_radians(),
            scale,
            flip: rng.gen::<f32>() < c.horizontal_flip_prob,
        }
    }

    /// Apply an affine warp by inverse mapping around the image center
    fn warp(&self, img: &RgbImage, params: &AffineParams) -> RgbImage {
        let (width, height) = img.dimensions();
        let cx = width as f32 / 2.0;
        let cy = height as f32 / 2.0;

        let cos_a = params.angle_rad.cos();
        let sin_a = params.angle_rad.sin();
        let shear = params.shear_rad.tan();
        let inv_scale = 1.0 / params.scale;
        let tx = params.shift_x * width as f32;
        let ty = params.shift_y * height as f32;

        let mut output = ImageBuffer::new(width, height);

        for y in 0..height {
            for x in 0..width {
                let x_out = if params.flip {
                    (width - 1 - x) as f32
                } else {
                    x as f32
                };

                // Undo translation, then rotation+shear+scale, around center
                let dx = x_out - cx - tx;
                let dy = y as f32 - cy - ty;

                let rx = dx * cos_a + dy * sin_a;
                let ry = -dx * sin_a + dy * cos_a;

                let src_x = cx + (rx - shear * ry) * inv_scale;
                let src_y = cy + ry * inv_scale;

                output.put_pixel(x, y, bilinear_sample(img, src_x, src_y));
            }
        }

        output
    }
}

/// Sample a pixel with bilinear interpolation, clamping out-of-bounds
/// coordinates to the nearest edge pixel
fn bilinear_sample(img: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let (width, height) = img.dimensions();
    let max_x = width as f32 - 1.0;
    let max_y = height as f32 - 1.0;

    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = img.get_pixel(x0, y0);
    let p10 = img.get_pixel(x1, y0);
    let p01 = img.get_pixel(x0, y1);
    let p11 = img.get_pixel(x1, y1);

    let mut result = [0u8; 3];
    for c in 0..3 {
        let v = p00[c] as f32 * (1.0 - fx) * (1.0 - fy)
            + p10[c] as f32 * fx * (1.0 - fy)
            + p01[c] as f32 * (1.0 - fx) * fy
            + p11[c] as f32 * fx * fy;
        result[c] = v.round().clamp(0.0, 255.0) as u8;
    }

    Rgb(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn create_test_image(width: u32, height: u32) -> RgbImage {
        let mut img = ImageBuffer::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgb([(x * 3) as u8, (y * 3) as u8, 128]);
        }
        img
    }

    #[test]
    fn test_augment_preserves_dimensions() {
        let aug = Augmenter::with_defaults();
        let img = create_test_image(100, 75);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let result = aug.augment(&img, &mut rng);
        assert_eq!(result.dimensions(), (100, 75));
    }

    #[test]
    fn test_no_augmentation_is_identity() {
        let aug = Augmenter::new(AugmentationConfig::none());
        let img = create_test_image(32, 24);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let result = aug.augment(&img, &mut rng);
        assert_eq!(result.as_raw(), img.as_raw());
    }

    #[test]
    fn test_seeded_augmentation_is_reproducible() {
        let aug = Augmenter::with_defaults();
        let img = create_test_image(48, 36);

        let mut rng_a = ChaCha8Rng::seed_from_u64(99);
        let mut rng_b = ChaCha8Rng::seed_from_u64(99);

        let a = aug.augment(&img, &mut rng_a);
        let b = aug.augment(&img, &mut rng_b);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_flip_only_mirrors_image() {
        let config = AugmentationConfig {
            horizontal_flip_prob: 1.0,
            ..AugmentationConfig::none()
        };
        let aug = Augmenter::new(config);
        let img = create_test_image(10, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let flipped = aug.augment(&img, &mut rng);
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(flipped.get_pixel(x, y), img.get_pixel(9 - x, y));
            }
        }
    }

    #[test]
    fn test_bilinear_sample_clamps_to_edge() {
        let img = create_test_image(10, 10);

        // Far out of bounds resolves to the corner pixel
        let sampled = bilinear_sample(&img, -100.0, -100.0);
        assert_eq!(&sampled, img.get_pixel(0, 0));

        let sampled = bilinear_sample(&img, 100.0, 100.0);
        assert_eq!(&sampled, img.get_pixel(9, 9));
    }
}
