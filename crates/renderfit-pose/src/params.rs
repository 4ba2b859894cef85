use glam::DVec3;

use crate::error::PoseError;
use crate::pose::ObjectPose;

/// Selects which pose components the optimizer parameter vector covers.
///
/// The parameter vector is the only state the optimizer touches. Its layout
/// is fixed: `[tx, ty, tz, rx, ry, rz]` for the full variant and
/// `[rx, ry, rz]` for the rotation-only variant, all values normalized by
/// the pose ranges. Encoding and decoding use the same index order, so a
/// round trip through both is the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parameterization {
    /// Translation and rotation, six parameters.
    #[default]
    Full,

    /// Rotation only, three parameters, implicit zero translation.
    RotationOnly,
}

impl Parameterization {
    /// Number of parameters of this variant.
    pub fn dimension(&self) -> usize {
        match self {
            Parameterization::Full => 6,
            Parameterization::RotationOnly => 3,
        }
    }

    /// Flatten a pose into a normalized parameter vector.
    pub fn to_parameters(&self, pose: &ObjectPose) -> Vec<f64> {
        let rotation = pose.normalized_rotation();
        match self {
            Parameterization::Full => {
                let translation = pose.normalized_translation();
                vec![
                    translation.x,
                    translation.y,
                    translation.z,
                    rotation.x,
                    rotation.y,
                    rotation.z,
                ]
            }
            Parameterization::RotationOnly => vec![rotation.x, rotation.y, rotation.z],
        }
    }

    /// Decode a normalized parameter vector back into a pose.
    ///
    /// Out-of-range values (the optimizer may overshoot ±1) pass through
    /// untouched; only the vector length is validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the vector length does not match
    /// [`dimension`](Self::dimension); this is a programming-contract
    /// violation on the caller's side.
    pub fn to_pose(&self, parameters: &[f64]) -> Result<ObjectPose, PoseError> {
        if parameters.len() != self.dimension() {
            return Err(PoseError::InvalidParameterLength {
                expected: self.dimension(),
                got: parameters.len(),
            });
        }

        let mut pose = ObjectPose::default();
        match self {
            Parameterization::Full => {
                pose.set_normalized_translation(DVec3::new(
                    parameters[0],
                    parameters[1],
                    parameters[2],
                ));
                pose.set_normalized_rotation(DVec3::new(
                    parameters[3],
                    parameters[4],
                    parameters[5],
                ));
            }
            Parameterization::RotationOnly => {
                pose.set_normalized_rotation(DVec3::new(
                    parameters[0],
                    parameters[1],
                    parameters[2],
                ));
            }
        }

        Ok(pose)
    }
}
