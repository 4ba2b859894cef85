use renderfit_image::Image;

use crate::error::SimilarityError;
use crate::reduction::{compute_similarity_blocks, CounterBlock};
use crate::score::{compute_similarity, compute_similarity_rows};

/// Controls how a similarity evaluation is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimilarityStrategy {
    /// Run the pixel scan sequentially on the current thread.
    ///
    /// Useful for small images, debugging, or when the overhead of
    /// parallelization outweighs the benefits.
    #[default]
    Serial,

    /// Distribute image rows over the global rayon thread pool, with
    /// per-worker partial sums and a final combine.
    ParallelRows,

    /// Dispatch one worker per pixel block, accumulating into shared atomic
    /// counters with fixed-point encoding for the fractional terms.
    BlockReduction,
}

/// Owns the similarity execution strategy together with the shared counter
/// resource needed by the block reduction.
///
/// The counter block is allocated once and reused across evaluations; the
/// reset-dispatch-readback sequence of one evaluation never overlaps another
/// because [`compute`](SimilarityEngine::compute) completes synchronously.
#[derive(Debug, Default)]
pub struct SimilarityEngine {
    strategy: SimilarityStrategy,
    counters: CounterBlock,
}

impl SimilarityEngine {
    /// Create an engine with the given execution strategy.
    pub fn new(strategy: SimilarityStrategy) -> Self {
        Self {
            strategy,
            counters: CounterBlock::new(),
        }
    }

    /// The execution strategy used by this engine.
    pub fn strategy(&self) -> SimilarityStrategy {
        self.strategy
    }

    /// Compute the similarity between a rendered image and a target image
    /// with the configured strategy.
    ///
    /// Takes `&mut self` so two evaluations can never share the counter
    /// block concurrently.
    ///
    /// # Errors
    ///
    /// Returns an error if the two images have different sizes.
    pub fn compute(
        &mut self,
        rendered: &Image<u8, 4>,
        target: &Image<u8, 4>,
    ) -> Result<f64, SimilarityError> {
        match self.strategy {
            SimilarityStrategy::Serial => compute_similarity(rendered, target),
            SimilarityStrategy::ParallelRows => compute_similarity_rows(rendered, target),
            SimilarityStrategy::BlockReduction => {
                compute_similarity_blocks(rendered, target, &self.counters)
            }
        }
    }
}
