use renderfit_image::{Image, ImageError};
use renderfit_pose::ObjectPose;

/// Errors produced by silhouette renderer implementations.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// The renderer backend failed to produce an image.
    #[error("renderer backend failed: {0}")]
    Backend(String),

    /// The renderer produced an invalid image buffer.
    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Narrow rendering capability consumed by the objective function.
///
/// Implementations draw the object under the given pose at a fixed
/// resolution with fixed intrinsic camera parameters, over a transparent
/// background: the alpha channel expresses object-vs-background coverage
/// and is the silhouette the similarity metric compares.
///
/// The optimizer may probe physically implausible poses well outside the
/// nominal ranges; implementations must tolerate them and return a
/// degenerate (typically all-transparent) image rather than fail.
pub trait SilhouetteRenderer {
    /// Render the object silhouette under the given pose.
    fn render_silhouette(&mut self, pose: &ObjectPose) -> Result<Image<u8, 4>, RenderError>;
}
