//! Normalization and label encoding
//!
//! Pixel intensities are scaled from the 8-bit integer range to `f32` in
//! `[0, 1]`; integer labels become one-hot vectors over the configured
//! class count. Labels outside the configured range are a hard error
//! rather than an out-of-bounds write.

use crate::utils::error::{LesionError, Result};

/// Scale 8-bit pixel values to `f32` in `[0, 1]`
pub fn normalize_pixels(pixels: &[u8]) -> Vec<f32> {
    pixels.iter().map(|&p| p as f32 / 255.0).collect()
}

/// One-hot encode a single label over `num_classes` classes
pub fn one_hot(label: usize, num_classes: usize) -> Result<Vec<f32>> {
    if label >= num_classes {
        return Err(LesionError::LabelOutOfRange { label, num_classes });
    }
    let mut v = vec![0.0f32; num_classes];
    v[label] = 1.0;
    Ok(v)
}

/// One-hot encode a batch of labels into one flat row-major buffer
///
/// Output length is `labels.len() * num_classes`; row `i` is the one-hot
/// vector for `labels[i]`.
pub fn one_hot_batch(labels: &[usize], num_classes: usize) -> Result<Vec<f32>> {
    let mut out = Vec::with_capacity(labels.len() * num_classes);
    for &label in labels {
        out.extend(one_hot(label, num_classes)?);
    }
    Ok(out)
}

/// Decode a one-hot (or softmax) row back to a class index by argmax
pub fn decode_one_hot(row: &[f32]) -> usize {
    row.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_range() {
        let normalized = normalize_pixels(&[0, 64, 128, 255]);

        for v in &normalized {
            assert!(*v >= 0.0 && *v <= 1.0);
        }
        assert_eq!(normalized[0], 0.0);
        assert_eq!(normalized[3], 1.0);
        assert!((normalized[2] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_one_hot_sums_to_one() {
        for label in 0..9 {
            let v = one_hot(label, 9).unwrap();
            assert_eq!(v.len(), 9);
            assert!((v.iter().sum::<f32>() - 1.0).abs() < 1e-6);
            assert_eq!(v[label], 1.0);
        }
    }

    #[test]
    fn test_one_hot_rejects_out_of_range() {
        let err = one_hot(9, 9).unwrap_err();
        assert!(matches!(
            err,
            crate::utils::error::LesionError::LabelOutOfRange {
                label: 9,
                num_classes: 9
            }
        ));
    }

    #[test]
    fn test_one_hot_batch_layout() {
        let encoded = one_hot_batch(&[2, 0], 3).unwrap();
        assert_eq!(encoded, vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_decode_round_trip() {
        for label in 0..9 {
            let v = one_hot(label, 9).unwrap();
            assert_eq!(decode_one_hot(&v), label);
        }
    }

    #[test]
    fn test_decode_on_softmax_row() {
        let row = vec![0.1, 0.05, 0.6, 0.25];
        assert_eq!(decode_one_hot(&row), 2);
    }
}
