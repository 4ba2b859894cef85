use glam::{DQuat, DVec3, EulerRot};

/// Rigid pose of the object relative to the camera origin.
///
/// The rotation is stored as Euler angles in degrees, applied in intrinsic
/// ZXY order (the orientation quaternion is `Rz * Rx * Ry`). Translation and
/// rotation are always kept in physical units (meters, degrees); the
/// normalized accessors exist only for the optimizer boundary, where every
/// dimension is divided by its fixed range so all parameters live on
/// comparable scales.
///
/// # Examples
///
/// ```
/// use glam::DVec3;
/// use renderfit_pose::ObjectPose;
///
/// let pose = ObjectPose::new(DVec3::new(0.1, 0.0, -0.05), DVec3::new(10.0, -5.0, 0.0));
/// let normalized = pose.normalized_translation();
/// assert_eq!(normalized.x, 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ObjectPose {
    /// 3D translation from the origin to the center of the object, in meters.
    pub translation: DVec3,
    /// Euler angles (intrinsic ZXY order) in degrees.
    pub rotation: DVec3,
}

impl ObjectPose {
    /// Per-axis translation range in meters used for normalization.
    pub const TRANSLATION_RANGE: DVec3 = DVec3::new(0.2, 0.2, 0.2);

    /// Per-axis rotation range in degrees used for normalization.
    pub const ROTATION_RANGE: DVec3 = DVec3::new(45.0, 45.0, 180.0);

    /// Create a pose from a translation and Euler angles.
    pub fn new(translation: DVec3, rotation: DVec3) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Create a rotation-only pose with zero translation.
    pub fn from_rotation(rotation: DVec3) -> Self {
        Self {
            translation: DVec3::ZERO,
            rotation,
        }
    }

    /// Translation divided component-wise by [`Self::TRANSLATION_RANGE`].
    pub fn normalized_translation(&self) -> DVec3 {
        self.translation / Self::TRANSLATION_RANGE
    }

    /// Rotation divided component-wise by [`Self::ROTATION_RANGE`].
    pub fn normalized_rotation(&self) -> DVec3 {
        self.rotation / Self::ROTATION_RANGE
    }

    /// Set the translation from its normalized representation.
    pub fn set_normalized_translation(&mut self, normalized: DVec3) {
        self.translation = normalized * Self::TRANSLATION_RANGE;
    }

    /// Set the rotation from its normalized representation.
    pub fn set_normalized_rotation(&mut self, normalized: DVec3) {
        self.rotation = normalized * Self::ROTATION_RANGE;
    }

    /// The orientation as a unit quaternion.
    pub fn to_quaternion(&self) -> DQuat {
        DQuat::from_euler(
            EulerRot::ZXY,
            self.rotation.z.to_radians(),
            self.rotation.x.to_radians(),
            self.rotation.y.to_radians(),
        )
    }
}

impl std::fmt::Display for ObjectPose {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "translation: {} rotation: {}",
            self.translation, self.rotation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalization_round_trip() {
        let mut pose = ObjectPose::default();
        pose.set_normalized_translation(DVec3::new(0.5, -0.25, 1.0));
        pose.set_normalized_rotation(DVec3::new(-1.0, 0.5, 0.25));

        assert_relative_eq!(pose.translation.x, 0.1);
        assert_relative_eq!(pose.translation.y, -0.05);
        assert_relative_eq!(pose.translation.z, 0.2);
        assert_relative_eq!(pose.rotation.x, -45.0);
        assert_relative_eq!(pose.rotation.y, 22.5);
        assert_relative_eq!(pose.rotation.z, 45.0);

        let normalized_translation = pose.normalized_translation();
        let normalized_rotation = pose.normalized_rotation();
        assert_relative_eq!(normalized_translation.x, 0.5);
        assert_relative_eq!(normalized_translation.y, -0.25);
        assert_relative_eq!(normalized_translation.z, 1.0);
        assert_relative_eq!(normalized_rotation.x, -1.0);
        assert_relative_eq!(normalized_rotation.y, 0.5);
        assert_relative_eq!(normalized_rotation.z, 0.25);
    }

    #[test]
    fn test_to_quaternion_axis_rotations() {
        // a pure z rotation maps to a rotation about the z axis
        let pose = ObjectPose::from_rotation(DVec3::new(0.0, 0.0, 90.0));
        let rotated = pose.to_quaternion() * DVec3::X;
        assert_relative_eq!(rotated.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rotated.y, 1.0, epsilon = 1e-12);

        // a pure x rotation maps to a rotation about the x axis
        let pose = ObjectPose::from_rotation(DVec3::new(90.0, 0.0, 0.0));
        let rotated = pose.to_quaternion() * DVec3::Y;
        assert_relative_eq!(rotated.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rotated.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_to_quaternion_zxy_order() {
        // intrinsic ZXY: the z rotation is applied last in the fixed frame
        let pose = ObjectPose::from_rotation(DVec3::new(90.0, 0.0, 90.0));
        let expected = DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2)
            * DQuat::from_rotation_x(std::f64::consts::FRAC_PI_2);
        let q = pose.to_quaternion();
        assert_relative_eq!(q.dot(expected).abs(), 1.0, epsilon = 1e-12);
    }
}
