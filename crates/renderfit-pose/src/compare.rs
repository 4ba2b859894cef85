//! Error metrics between two poses, used for evaluating a calibration
//! result against ground truth. These are not part of the optimization loop.

use crate::pose::ObjectPose;

/// Maximum absolute per-axis translation difference, in meters.
///
/// All three axes are compared independently.
pub fn max_translation_error(a: &ObjectPose, b: &ObjectPose) -> f64 {
    (a.translation - b.translation).abs().max_element()
}

/// Maximum absolute per-axis rotation difference, in degrees.
///
/// Compares the raw Euler angles axis by axis; use [`rotation_error`] for a
/// parameterization-independent distance.
pub fn max_rotation_error(a: &ObjectPose, b: &ObjectPose) -> f64 {
    (a.rotation - b.rotation).abs().max_element()
}

/// Euclidean distance between the two translations, in meters.
pub fn translation_error(a: &ObjectPose, b: &ObjectPose) -> f64 {
    a.translation.distance(b.translation)
}

/// Unsigned relative angle between the two orientations, in radians.
///
/// Computed through the unit-quaternion dot product,
/// `2 * acos(clamp(|qa . qb|, 0, 1))`. The absolute value resolves the
/// quaternion double cover (q and -q represent the same rotation) and the
/// clamp guards against dot products exceeding 1 in magnitude by a floating
/// point epsilon, which would make `acos` undefined. The result lies in
/// `[0, pi]`.
///
/// Reference: Huynh, D. Q. (2009). Metrics for 3D rotations: Comparison and
/// analysis. Journal of Mathematical Imaging and Vision, 35(2), 155-164.
pub fn rotation_error(a: &ObjectPose, b: &ObjectPose) -> f64 {
    let qa = a.to_quaternion().normalize();
    let qb = b.to_quaternion().normalize();

    let dot = qa.dot(qb).abs();

    2.0 * dot.clamp(0.0, 1.0).acos()
}
