use renderfit_image::Image;
use renderfit_pose::{ObjectPose, Parameterization};
use renderfit_similarity::SimilarityStrategy;

use crate::error::OptimError;
use crate::objective::PoseObjective;
use crate::renderer::SilhouetteRenderer;
use crate::solver::{maximize_approximate, QuasiNewtonParams, StopReason};

/// Result of a full pose refinement run.
#[derive(Debug, Clone)]
pub struct PoseRefinement {
    /// The refined pose at the best similarity observed.
    pub pose: ObjectPose,
    /// Similarity score of the refined pose against the target.
    pub score: f64,
    /// Number of ascent iterations performed.
    pub num_iterations: usize,
    /// Total number of render-and-compare evaluations.
    pub num_evaluations: usize,
    /// Why the search stopped.
    pub stop_reason: StopReason,
}

/// Refine an initial pose guess against a target image.
///
/// Binds the target image and the renderer into an objective function,
/// encodes the initial pose into a normalized parameter vector, maximizes
/// the similarity with the approximate-derivative quasi-Newton driver and
/// decodes the best vector back into a pose.
///
/// Each objective evaluation is a blocking render-and-compare call; the
/// driver is synchronous and single-threaded, parallelism only happens
/// inside a similarity evaluation depending on `strategy`.
///
/// # Arguments
///
/// * `renderer` - The silhouette renderer for candidate poses.
/// * `target` - The target image to calibrate against.
/// * `initial_pose` - The starting guess; its quality decides which local
///   maximum the search settles in.
/// * `parameterization` - Which pose components to optimize.
/// * `strategy` - How similarity evaluations are executed.
/// * `params` - Search tuning parameters.
///
/// # Errors
///
/// Returns an error if the renderer fails or the rendered images do not
/// match the target size. Running out of iterations is not an error.
pub fn refine_pose<R: SilhouetteRenderer>(
    renderer: R,
    target: Image<u8, 4>,
    initial_pose: &ObjectPose,
    parameterization: Parameterization,
    strategy: SimilarityStrategy,
    params: &QuasiNewtonParams,
) -> Result<PoseRefinement, OptimError> {
    let mut objective = PoseObjective::new(renderer, target, parameterization, strategy);

    let initial = objective.initial_parameters(initial_pose);
    let result = maximize_approximate(|x| objective.evaluate(x), initial, params)?;

    let pose = parameterization.to_pose(&result.parameters)?;

    log::debug!(
        "refinement finished after {} iterations ({} evaluations) with score {}: {pose}",
        result.num_iterations,
        result.num_evaluations,
        result.score
    );

    Ok(PoseRefinement {
        pose,
        score: result.score,
        num_iterations: result.num_iterations,
        num_evaluations: result.num_evaluations,
        stop_reason: result.stop_reason,
    })
}
