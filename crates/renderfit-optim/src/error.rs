use renderfit_pose::PoseError;
use renderfit_similarity::SimilarityError;

use crate::renderer::RenderError;

/// Errors that can occur during pose optimization.
#[derive(thiserror::Error, Debug)]
pub enum OptimError {
    /// The renderer failed to produce an image.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The similarity metric rejected the rendered/target pair.
    #[error(transparent)]
    Similarity(#[from] SimilarityError),

    /// The pose parameterization rejected the parameter vector.
    #[error(transparent)]
    Pose(#[from] PoseError),

    /// The initial parameter vector is empty.
    #[error("initial parameter vector is empty")]
    EmptyParameterVector,
}
