//! Block-parallel similarity reduction over shared atomic counters.
//!
//! This is the execution model used on wide-parallel hardware: the image is
//! partitioned into fixed-size pixel blocks, one worker per block computes
//! local contributions to six counters and adds them atomically to a shared
//! counter block. The two Dice accumulators and the value-agreement sum are
//! continuous quantities, so they are encoded as fixed-point integers
//! (multiplied by a scale factor and rounded) because the reduction target
//! only supports atomic integer addition.

use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;

use renderfit_image::Image;

use crate::error::SimilarityError;
use crate::score::{check_sizes, composite_score, pixel_value, unit};

/// Edge length in pixels of the square blocks assigned to reduction workers.
pub const BLOCK_SIZE: usize = 4;

/// Default fixed-point scale factor, the number of decimals kept is log10 of it.
pub const DEFAULT_FIXED_POINT_SCALE: f64 = 100.0;

/// Decoded counter totals read back after a full-image reduction pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterTotals {
    /// Pixels covered in both the rendered image and the target.
    pub true_positive: u64,
    /// Pixels covered in the rendered image only.
    pub false_positive: u64,
    /// Pixels covered in the target only.
    pub false_negative: u64,
    /// Decoded fuzzy Dice numerator, sum of alpha products.
    pub dice_numerator: f64,
    /// Decoded fuzzy Dice denominator, sum of alpha sums.
    pub dice_denominator: f64,
    /// Decoded sum of brightness agreements over the overlap zone.
    pub value_sum: f64,
}

/// Local, single-worker contributions to the six counters.
///
/// The fractional members are already fixed-point encoded so the shared add
/// is a plain integer addition.
#[derive(Debug, Default)]
struct LocalCounts {
    true_positive: u64,
    false_positive: u64,
    false_negative: u64,
    dice_numerator_fixed: u64,
    dice_denominator_fixed: u64,
    value_sum_fixed: u64,
}

/// Shared accumulation state for the block-parallel similarity reduction.
///
/// The counter block is the only shared mutable resource of an evaluation:
/// it must be [`reset`](CounterBlock::reset) before each dispatch, written
/// only by the reduction workers while the dispatch is in flight, and read
/// back with [`totals`](CounterBlock::totals) only after all workers have
/// finished. [`compute_similarity_blocks`] enforces this sequence; reuse the
/// same block across evaluations rather than allocating per call.
#[derive(Debug)]
pub struct CounterBlock {
    true_positive: AtomicU64,
    false_positive: AtomicU64,
    false_negative: AtomicU64,
    dice_numerator_fixed: AtomicU64,
    dice_denominator_fixed: AtomicU64,
    value_sum_fixed: AtomicU64,
    scale: f64,
}

impl CounterBlock {
    /// Create a counter block with the default fixed-point scale.
    pub fn new() -> Self {
        Self::with_scale(DEFAULT_FIXED_POINT_SCALE)
    }

    /// Create a counter block with a custom fixed-point scale factor.
    ///
    /// Each accumulated fractional term is quantized with an error of at
    /// most `0.5 / scale`.
    pub fn with_scale(scale: f64) -> Self {
        Self {
            true_positive: AtomicU64::new(0),
            false_positive: AtomicU64::new(0),
            false_negative: AtomicU64::new(0),
            dice_numerator_fixed: AtomicU64::new(0),
            dice_denominator_fixed: AtomicU64::new(0),
            value_sum_fixed: AtomicU64::new(0),
            scale,
        }
    }

    /// The fixed-point scale factor used by the fractional counters.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Reset all six counters to zero.
    ///
    /// Must be called before every dispatch; the counters accumulate across
    /// calls otherwise.
    pub fn reset(&self) {
        self.true_positive.store(0, Ordering::Relaxed);
        self.false_positive.store(0, Ordering::Relaxed);
        self.false_negative.store(0, Ordering::Relaxed);
        self.dice_numerator_fixed.store(0, Ordering::Relaxed);
        self.dice_denominator_fixed.store(0, Ordering::Relaxed);
        self.value_sum_fixed.store(0, Ordering::Relaxed);
    }

    fn add(&self, local: &LocalCounts) {
        self.true_positive
            .fetch_add(local.true_positive, Ordering::Relaxed);
        self.false_positive
            .fetch_add(local.false_positive, Ordering::Relaxed);
        self.false_negative
            .fetch_add(local.false_negative, Ordering::Relaxed);
        self.dice_numerator_fixed
            .fetch_add(local.dice_numerator_fixed, Ordering::Relaxed);
        self.dice_denominator_fixed
            .fetch_add(local.dice_denominator_fixed, Ordering::Relaxed);
        self.value_sum_fixed
            .fetch_add(local.value_sum_fixed, Ordering::Relaxed);
    }

    /// Read back and decode the counter totals.
    ///
    /// Only meaningful after a dispatch has fully completed.
    pub fn totals(&self) -> CounterTotals {
        CounterTotals {
            true_positive: self.true_positive.load(Ordering::Relaxed),
            false_positive: self.false_positive.load(Ordering::Relaxed),
            false_negative: self.false_negative.load(Ordering::Relaxed),
            dice_numerator: self.dice_numerator_fixed.load(Ordering::Relaxed) as f64 / self.scale,
            dice_denominator: self.dice_denominator_fixed.load(Ordering::Relaxed) as f64
                / self.scale,
            value_sum: self.value_sum_fixed.load(Ordering::Relaxed) as f64 / self.scale,
        }
    }
}

impl Default for CounterBlock {
    fn default() -> Self {
        Self::new()
    }
}

/// Boolean-mask Dice coefficient from decoded totals, `2*TP / (2*TP + FP + FN)`.
///
/// No smoothing term; 0 when the denominator vanishes.
pub fn mask_dice_from_totals(totals: &CounterTotals) -> f64 {
    let denominator =
        2 * totals.true_positive + totals.false_positive + totals.false_negative;
    if denominator == 0 {
        return 0.0;
    }
    2.0 * totals.true_positive as f64 / denominator as f64
}

/// Composite similarity score from decoded totals.
///
/// Applies the same final formula as the sequential scan: smoothed fuzzy
/// Dice plus mean value agreement over the overlap, with the overlap count
/// doubling as the true-positive counter.
pub fn score_from_totals(totals: &CounterTotals) -> f64 {
    composite_score(
        totals.dice_numerator,
        totals.dice_denominator,
        totals.true_positive,
        totals.value_sum,
    )
}

/// Contributions of one block of pixels, fixed-point encoded per pixel.
fn block_counts(
    rendered: &[u8],
    target: &[u8],
    cols: usize,
    rows: usize,
    block_x: usize,
    block_y: usize,
    scale: f64,
) -> LocalCounts {
    let mut local = LocalCounts::default();

    let y_end = rows.min((block_y + 1) * BLOCK_SIZE);
    let x_end = cols.min((block_x + 1) * BLOCK_SIZE);

    for y in block_y * BLOCK_SIZE..y_end {
        for x in block_x * BLOCK_SIZE..x_end {
            let offset = (y * cols + x) * 4;
            let rendered_px = &rendered[offset..offset + 4];
            let target_px = &target[offset..offset + 4];

            let alpha_rendered = unit(rendered_px[3]);
            let alpha_target = unit(target_px[3]);

            let in_rendered = alpha_rendered > 0.0;
            let in_target = alpha_target > 0.0;

            match (in_rendered, in_target) {
                (true, true) => local.true_positive += 1,
                (true, false) => local.false_positive += 1,
                (false, true) => local.false_negative += 1,
                (false, false) => {}
            }

            local.dice_numerator_fixed +=
                (alpha_rendered * alpha_target * scale).round() as u64;
            local.dice_denominator_fixed +=
                ((alpha_rendered + alpha_target) * scale).round() as u64;

            if in_rendered && in_target {
                let agreement = 1.0 - (pixel_value(rendered_px) - pixel_value(target_px)).abs();
                local.value_sum_fixed += (agreement * scale).round() as u64;
            }
        }
    }

    local
}

/// Compute the silhouette similarity with the block-grid atomic reduction.
///
/// Same semantics as [`compute_similarity`](crate::compute_similarity) up to
/// fixed-point quantization of the fractional counters: the image is split
/// into [`BLOCK_SIZE`]² pixel blocks, one worker per block accumulates local
/// counts and adds them atomically into `counters`, and the composite score
/// is computed on the calling thread from the decoded totals once the
/// dispatch has completed.
///
/// The counter block is reset at the start of the call; the rayon dispatch
/// acts as the barrier between the write and read phases.
///
/// # Errors
///
/// Returns an error if the two images have different sizes.
pub fn compute_similarity_blocks(
    rendered: &Image<u8, 4>,
    target: &Image<u8, 4>,
    counters: &CounterBlock,
) -> Result<f64, SimilarityError> {
    check_sizes(rendered, target)?;

    counters.reset();

    let cols = rendered.cols();
    let rows = rendered.rows();
    let blocks_x = cols.div_ceil(BLOCK_SIZE).max(1);
    let blocks_y = rows.div_ceil(BLOCK_SIZE).max(1);

    let rendered_data = rendered.as_slice();
    let target_data = target.as_slice();
    let scale = counters.scale();

    (0..blocks_x * blocks_y).into_par_iter().for_each(|block| {
        let block_x = block % blocks_x;
        let block_y = block / blocks_x;
        let local = block_counts(
            rendered_data,
            target_data,
            cols,
            rows,
            block_x,
            block_y,
            scale,
        );
        counters.add(&local);
    });

    Ok(score_from_totals(&counters.totals()))
}
