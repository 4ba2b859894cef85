use rayon::prelude::*;

use renderfit_image::Image;

use crate::error::SimilarityError;

/// Weight of the silhouette-overlap (fuzzy Dice) term in the composite score.
pub const DICE_WEIGHT: f64 = 0.9;

/// Weight of the value-agreement term in the composite score.
pub const VALUE_WEIGHT: f64 = 0.1;

/// Laplace smoothing constant applied to the fuzzy Dice ratio.
///
/// Keeps the ratio defined (and close to 1) when both coverage masks are
/// empty, instead of producing 0/0.
pub const DICE_SMOOTHING: f64 = 1.0;

/// Map an 8-bit channel to the unit interval.
#[inline]
pub(crate) fn unit(v: u8) -> f64 {
    v as f64 / 255.0
}

/// Brightness of an RGBA pixel, the value channel of the HSV model.
#[inline]
pub(crate) fn pixel_value(pixel: &[u8]) -> f64 {
    unit(pixel[0].max(pixel[1]).max(pixel[2]))
}

pub(crate) fn check_sizes(
    rendered: &Image<u8, 4>,
    target: &Image<u8, 4>,
) -> Result<(), SimilarityError> {
    if rendered.size() != target.size() {
        return Err(SimilarityError::ImageSizeMismatch(
            rendered.height(),
            rendered.width(),
            target.height(),
            target.width(),
        ));
    }
    Ok(())
}

/// Partial sums accumulated over a subset of the pixels.
#[derive(Debug, Clone, Copy, Default)]
struct PixelSums {
    dice_numerator: f64,
    dice_denominator: f64,
    overlap_count: u64,
    value_sum: f64,
}

impl PixelSums {
    #[inline]
    fn accumulate(&mut self, rendered: &[u8], target: &[u8]) {
        let alpha_rendered = unit(rendered[3]);
        let alpha_target = unit(target[3]);

        self.dice_numerator += alpha_rendered * alpha_target;
        self.dice_denominator += alpha_rendered + alpha_target;

        // Present in the rendered image and in the target
        if alpha_rendered > 0.0 && alpha_target > 0.0 {
            self.overlap_count += 1;
            self.value_sum += 1.0 - (pixel_value(rendered) - pixel_value(target)).abs();
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.dice_numerator += other.dice_numerator;
        self.dice_denominator += other.dice_denominator;
        self.overlap_count += other.overlap_count;
        self.value_sum += other.value_sum;
        self
    }

    fn score(&self) -> f64 {
        composite_score(
            self.dice_numerator,
            self.dice_denominator,
            self.overlap_count,
            self.value_sum,
        )
    }
}

/// Final composite formula shared by all execution strategies.
///
/// The value-agreement term is the mean agreement over the overlap zone only;
/// with no overlap it contributes 0 by convention.
pub(crate) fn composite_score(
    dice_numerator: f64,
    dice_denominator: f64,
    overlap_count: u64,
    value_sum: f64,
) -> f64 {
    let dice_coefficient =
        (2.0 * dice_numerator + DICE_SMOOTHING) / (dice_denominator + DICE_SMOOTHING);

    let value_agreement = if overlap_count > 0 {
        value_sum / overlap_count as f64
    } else {
        0.0
    };

    DICE_WEIGHT * dice_coefficient + VALUE_WEIGHT * value_agreement
}

/// Compute the silhouette similarity between a rendered image and a target image.
///
/// Both images must be RGBA with the alpha channel expressing object coverage.
/// The score is a composite of a smoothed fuzzy Dice coefficient over the two
/// alpha masks and the mean brightness agreement over the overlap zone:
///
/// $ S = 0.9 \cdot \frac{2 \sum a_r a_t + 1}{\sum (a_r + a_t) + 1}
///     + 0.1 \cdot \frac{1}{|O|} \sum_{O} (1 - |v_r - v_t|) $
///
/// where the overlap zone `O` is the set of pixels with strictly positive
/// alpha in both images. A perfect match scores 1.0; two empty images score
/// close to 1 through the smoothing term; disjoint silhouettes score low but
/// stay finite.
///
/// # Arguments
///
/// * `rendered` - The rendered candidate image with shape (H, W, 4).
/// * `target` - The target image with shape (H, W, 4).
///
/// # Returns
///
/// The similarity score, higher is better.
///
/// # Errors
///
/// Returns an error if the two images have different sizes.
///
/// # Example
///
/// ```
/// use renderfit_image::{Image, ImageSize};
/// use renderfit_similarity::compute_similarity;
///
/// let size = ImageSize { width: 2, height: 1 };
/// let image = Image::<u8, 4>::new(size, vec![200, 200, 200, 255, 0, 0, 0, 0]).unwrap();
///
/// let score = compute_similarity(&image, &image).unwrap();
/// assert!((score - 1.0).abs() < 1e-9);
/// ```
pub fn compute_similarity(
    rendered: &Image<u8, 4>,
    target: &Image<u8, 4>,
) -> Result<f64, SimilarityError> {
    check_sizes(rendered, target)?;

    let mut sums = PixelSums::default();
    for (rendered_px, target_px) in rendered
        .as_slice()
        .chunks_exact(4)
        .zip(target.as_slice().chunks_exact(4))
    {
        sums.accumulate(rendered_px, target_px);
    }

    Ok(sums.score())
}

/// Compute the silhouette similarity with row-parallel accumulation.
///
/// Same semantics as [`compute_similarity`]; image rows are distributed over
/// the global rayon thread pool and each worker folds its rows into a local
/// partial sum before the final combine, so no shared state is written
/// concurrently.
///
/// # Errors
///
/// Returns an error if the two images have different sizes.
pub fn compute_similarity_rows(
    rendered: &Image<u8, 4>,
    target: &Image<u8, 4>,
) -> Result<f64, SimilarityError> {
    check_sizes(rendered, target)?;

    let row_stride = 4 * rendered.cols();
    let sums = rendered
        .as_slice()
        .par_chunks_exact(row_stride)
        .zip(target.as_slice().par_chunks_exact(row_stride))
        .map(|(rendered_row, target_row)| {
            let mut local = PixelSums::default();
            for (rendered_px, target_px) in rendered_row
                .chunks_exact(4)
                .zip(target_row.chunks_exact(4))
            {
                local.accumulate(rendered_px, target_px);
            }
            local
        })
        .reduce(PixelSums::default, PixelSums::merge);

    Ok(sums.score())
}

/// Compute the boolean-mask Dice coefficient between two coverage masks.
///
/// Each pixel is classified from the alpha channels: true positive when both
/// are opaque, false positive when only the rendered image is, false negative
/// when only the target is. The coefficient is `2*TP / (2*TP + FP + FN)` with
/// no smoothing term, so fully disjoint masks score exactly 0. When both
/// masks are empty the denominator vanishes and the result is 0 by
/// convention.
///
/// # Errors
///
/// Returns an error if the two images have different sizes.
pub fn mask_dice(rendered: &Image<u8, 4>, target: &Image<u8, 4>) -> Result<f64, SimilarityError> {
    check_sizes(rendered, target)?;

    let mut true_positives = 0u64;
    let mut false_positives = 0u64;
    let mut false_negatives = 0u64;

    for (rendered_px, target_px) in rendered
        .as_slice()
        .chunks_exact(4)
        .zip(target.as_slice().chunks_exact(4))
    {
        let in_rendered = rendered_px[3] > 0;
        let in_target = target_px[3] > 0;

        match (in_rendered, in_target) {
            (true, true) => true_positives += 1,
            (true, false) => false_positives += 1,
            (false, true) => false_negatives += 1,
            (false, false) => {}
        }
    }

    let denominator = 2 * true_positives + false_positives + false_negatives;
    if denominator == 0 {
        return Ok(0.0);
    }

    Ok(2.0 * true_positives as f64 / denominator as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use renderfit_image::{Image, ImageError, ImageSize};

    fn solid_image(size: ImageSize, rgb: u8, alpha: u8) -> Result<Image<u8, 4>, ImageError> {
        let mut data = Vec::with_capacity(size.width * size.height * 4);
        for _ in 0..size.width * size.height {
            data.extend_from_slice(&[rgb, rgb, rgb, alpha]);
        }
        Image::new(size, data)
    }

    /// Two half-covered images with disjoint opaque regions.
    fn disjoint_images(size: ImageSize) -> Result<(Image<u8, 4>, Image<u8, 4>), ImageError> {
        let mut left = Vec::with_capacity(size.width * size.height * 4);
        let mut right = Vec::with_capacity(size.width * size.height * 4);
        for _ in 0..size.height {
            for x in 0..size.width {
                if x < size.width / 2 {
                    left.extend_from_slice(&[200, 200, 200, 255]);
                    right.extend_from_slice(&[0, 0, 0, 0]);
                } else {
                    left.extend_from_slice(&[0, 0, 0, 0]);
                    right.extend_from_slice(&[200, 200, 200, 255]);
                }
            }
        }
        Ok((Image::new(size, left)?, Image::new(size, right)?))
    }

    #[test]
    fn test_identity_similarity() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 8,
            height: 6,
        };
        let image = solid_image(size, 180, 255)?;

        let score = compute_similarity(&image, &image)?;
        assert_relative_eq!(score, 1.0, epsilon = 1e-12);

        Ok(())
    }

    #[test]
    fn test_empty_images_are_defined() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 4,
            height: 4,
        };
        let empty = solid_image(size, 0, 0)?;

        let score = compute_similarity(&empty, &empty)?;
        assert!(score.is_finite());
        // dice term saturates through the smoothing constant, value term is 0
        assert_relative_eq!(score, DICE_WEIGHT, epsilon = 1e-12);

        Ok(())
    }

    #[test]
    fn test_disjoint_masks_floor() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 8,
            height: 4,
        };
        let (left, right) = disjoint_images(size)?;

        let fuzzy = compute_similarity(&left, &right)?;
        let boolean = mask_dice(&left, &right)?;

        assert_eq!(boolean, 0.0);
        assert!(fuzzy.is_finite());
        // the smoothed variant strictly exceeds the boolean score of 0
        assert!(fuzzy > 0.0);

        Ok(())
    }

    #[test]
    fn test_zero_overlap_value_term() -> Result<(), Box<dyn std::error::Error>> {
        // disjoint masks have an empty overlap zone, the value term must
        // contribute 0 instead of dividing by zero
        let size = ImageSize {
            width: 6,
            height: 2,
        };
        let (left, right) = disjoint_images(size)?;

        let score = compute_similarity(&left, &right)?;
        let expected_dice = (2.0 * 0.0 + DICE_SMOOTHING)
            / ((size.width * size.height) as f64 + DICE_SMOOTHING);
        assert_relative_eq!(score, DICE_WEIGHT * expected_dice, epsilon = 1e-12);

        Ok(())
    }

    #[test]
    fn test_mask_dice_identity_and_empty() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 4,
            height: 4,
        };
        let full = solid_image(size, 128, 255)?;
        let empty = solid_image(size, 0, 0)?;

        assert_relative_eq!(mask_dice(&full, &full)?, 1.0, epsilon = 1e-12);
        // both masks empty: defined as 0 by convention
        assert_eq!(mask_dice(&empty, &empty)?, 0.0);

        Ok(())
    }

    #[test]
    fn test_rows_matches_sequential() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 33,
            height: 17,
        };
        let mut data_a = Vec::with_capacity(size.width * size.height * 4);
        let mut data_b = Vec::with_capacity(size.width * size.height * 4);
        for i in 0..size.width * size.height {
            let v = (i * 37 % 256) as u8;
            let w = (i * 91 % 256) as u8;
            data_a.extend_from_slice(&[v, v / 2, v, if i % 3 == 0 { 0 } else { v }]);
            data_b.extend_from_slice(&[w, w, w / 3, if i % 5 == 0 { 0 } else { w }]);
        }
        let image_a = Image::new(size, data_a)?;
        let image_b = Image::new(size, data_b)?;

        let sequential = compute_similarity(&image_a, &image_b)?;
        let parallel = compute_similarity_rows(&image_a, &image_b)?;

        assert_relative_eq!(sequential, parallel, epsilon = 1e-9);

        Ok(())
    }

    #[test]
    fn test_size_mismatch() -> Result<(), Box<dyn std::error::Error>> {
        let image_a = solid_image(
            ImageSize {
                width: 4,
                height: 4,
            },
            0,
            0,
        )?;
        let image_b = solid_image(
            ImageSize {
                width: 5,
                height: 4,
            },
            0,
            0,
        )?;

        let result = compute_similarity(&image_a, &image_b);
        assert_eq!(
            result,
            Err(SimilarityError::ImageSizeMismatch(4, 4, 4, 5))
        );

        Ok(())
    }
}
