use renderfit_image::Image;
use renderfit_pose::{ObjectPose, Parameterization};
use renderfit_similarity::{SimilarityEngine, SimilarityStrategy};

use crate::error::OptimError;
use crate::renderer::SilhouetteRenderer;

/// The render-and-compare objective function.
///
/// Binds a fixed target image, a renderer, a parameterization and a
/// similarity engine at construction, then exposes a single evaluation
/// operator from a normalized parameter vector to a scalar score: decode the
/// pose, render its silhouette, compare against the target. Repeated calls
/// with the same vector return the same score, so a generic derivative-free
/// maximizer can treat it as a pure function.
pub struct PoseObjective<R> {
    renderer: R,
    target: Image<u8, 4>,
    parameterization: Parameterization,
    engine: SimilarityEngine,
}

impl<R: SilhouetteRenderer> PoseObjective<R> {
    /// Bind a renderer and a target image into an objective function.
    ///
    /// # Arguments
    ///
    /// * `renderer` - The silhouette renderer to evaluate candidate poses with.
    /// * `target` - The target image the renders are compared against.
    /// * `parameterization` - The active parameter vector layout.
    /// * `strategy` - How similarity evaluations are executed.
    pub fn new(
        renderer: R,
        target: Image<u8, 4>,
        parameterization: Parameterization,
        strategy: SimilarityStrategy,
    ) -> Self {
        Self {
            renderer,
            target,
            parameterization,
            engine: SimilarityEngine::new(strategy),
        }
    }

    /// The active parameterization.
    pub fn parameterization(&self) -> Parameterization {
        self.parameterization
    }

    /// Encode a pose into the initial parameter vector for the maximizer.
    pub fn initial_parameters(&self, pose: &ObjectPose) -> Vec<f64> {
        self.parameterization.to_parameters(pose)
    }

    /// Evaluate the objective at a parameter vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector length does not match the
    /// parameterization, the renderer fails, or the rendered image does not
    /// match the target size.
    pub fn evaluate(&mut self, parameters: &[f64]) -> Result<f64, OptimError> {
        let pose = self.parameterization.to_pose(parameters)?;

        let rendered = self.renderer.render_silhouette(&pose)?;
        let similarity = self.engine.compute(&rendered, &self.target)?;

        log::debug!("similarity {similarity} {pose}");

        Ok(similarity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use renderfit_image::{Image, ImageSize};
    use renderfit_pose::PoseError;

    use crate::renderer::RenderError;

    /// Renderer returning a precomputed image regardless of the pose.
    struct FixedRenderer {
        image: Image<u8, 4>,
    }

    impl SilhouetteRenderer for FixedRenderer {
        fn render_silhouette(
            &mut self,
            _pose: &ObjectPose,
        ) -> Result<Image<u8, 4>, RenderError> {
            Ok(self.image.clone())
        }
    }

    fn solid_image(size: ImageSize, alpha: u8) -> Image<u8, 4> {
        let data = (0..size.width * size.height)
            .flat_map(|_| [180, 180, 180, alpha])
            .collect::<Vec<_>>();
        Image::new(size, data).unwrap()
    }

    #[test]
    fn test_perfect_match_scores_one() -> Result<(), OptimError> {
        let size = ImageSize {
            width: 8,
            height: 6,
        };
        let image = solid_image(size, 255);

        let mut objective = PoseObjective::new(
            FixedRenderer {
                image: image.clone(),
            },
            image,
            Parameterization::Full,
            SimilarityStrategy::Serial,
        );

        let score = objective.evaluate(&[0.0; 6])?;
        assert_relative_eq!(score, 1.0, epsilon = 1e-12);

        Ok(())
    }

    #[test]
    fn test_repeated_evaluations_are_deterministic() -> Result<(), OptimError> {
        let size = ImageSize {
            width: 8,
            height: 6,
        };

        let mut objective = PoseObjective::new(
            FixedRenderer {
                image: solid_image(size, 128),
            },
            solid_image(size, 255),
            Parameterization::RotationOnly,
            SimilarityStrategy::BlockReduction,
        );

        let parameters = [0.1, -0.2, 0.05];
        let first = objective.evaluate(&parameters)?;
        let second = objective.evaluate(&parameters)?;
        assert_eq!(first, second);

        Ok(())
    }

    #[test]
    fn test_wrong_parameter_length_fails_fast() {
        let size = ImageSize {
            width: 4,
            height: 4,
        };

        let mut objective = PoseObjective::new(
            FixedRenderer {
                image: solid_image(size, 255),
            },
            solid_image(size, 255),
            Parameterization::Full,
            SimilarityStrategy::Serial,
        );

        let result = objective.evaluate(&[0.0; 3]);
        assert!(matches!(
            result,
            Err(OptimError::Pose(PoseError::InvalidParameterLength {
                expected: 6,
                got: 3
            }))
        ));
    }
}
