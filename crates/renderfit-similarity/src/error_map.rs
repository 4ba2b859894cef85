//! Per-pixel error visualizations for evaluating a calibration result.

use renderfit_image::{Image, ImageSize};

use crate::error::SimilarityError;
use crate::score::{check_sizes, pixel_value, unit, DICE_SMOOTHING};

/// Render the per-pixel fuzzy Dice agreement as a grayscale image.
///
/// Each output pixel is the smoothed Dice ratio of the two input alphas,
/// remapped so that full agreement is white and full disagreement is black.
/// The output is fully opaque.
///
/// # Errors
///
/// Returns an error if the two images have different sizes.
pub fn dice_error_map(
    rendered: &Image<u8, 4>,
    target: &Image<u8, 4>,
) -> Result<Image<u8, 4>, SimilarityError> {
    check_sizes(rendered, target)?;

    let mut data = Vec::with_capacity(rendered.numel());
    for (rendered_px, target_px) in rendered
        .as_slice()
        .chunks_exact(4)
        .zip(target.as_slice().chunks_exact(4))
    {
        let alpha_rendered = unit(rendered_px[3]);
        let alpha_target = unit(target_px[3]);

        let numerator = alpha_rendered * alpha_target;
        let denominator = alpha_rendered + alpha_target;
        let dice = (2.0 * numerator + DICE_SMOOTHING) / (denominator + DICE_SMOOTHING);

        let gray = (255.0 * 2.0 * (dice - 0.5)).clamp(0.0, 255.0) as u8;
        data.extend_from_slice(&[gray, gray, gray, 255]);
    }

    new_map(rendered.size(), data)
}

/// Render the binarized brightness agreement over the overlap zone.
///
/// Pixels covered in both inputs are compared after thresholding their value
/// channel at 0.5: agreement is white, disagreement black. Pixels outside the
/// overlap are fully transparent.
///
/// # Errors
///
/// Returns an error if the two images have different sizes.
pub fn overlap_error_map(
    rendered: &Image<u8, 4>,
    target: &Image<u8, 4>,
) -> Result<Image<u8, 4>, SimilarityError> {
    check_sizes(rendered, target)?;

    let mut data = Vec::with_capacity(rendered.numel());
    for (rendered_px, target_px) in rendered
        .as_slice()
        .chunks_exact(4)
        .zip(target.as_slice().chunks_exact(4))
    {
        let alpha_rendered = unit(rendered_px[3]);
        let alpha_target = unit(target_px[3]);

        // Present in the rendered image and in the target
        if alpha_rendered > 0.0 && alpha_target > 0.0 {
            let rendered_bit: f32 = if pixel_value(rendered_px) > 0.5 { 1.0 } else { 0.0 };
            let target_bit: f32 = if pixel_value(target_px) > 0.5 { 1.0 } else { 0.0 };

            let gray = (255.0 * (1.0 - (rendered_bit - target_bit).abs())) as u8;
            data.extend_from_slice(&[gray, gray, gray, 255]);
        } else {
            data.extend_from_slice(&[0, 0, 0, 0]);
        }
    }

    new_map(rendered.size(), data)
}

fn new_map(size: ImageSize, data: Vec<u8>) -> Result<Image<u8, 4>, SimilarityError> {
    // the buffer is built pixel by pixel from an input of the same size, so
    // the shape always matches
    Image::new(size, data).map_err(|_| {
        SimilarityError::ImageSizeMismatch(size.height, size.width, size.height, size.width)
    })
}
