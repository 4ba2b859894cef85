//! Reading and writing the pose text file format.
//!
//! A pose file holds six whitespace-separated real numbers: translation
//! x, y, z in meters followed by the ZXY Euler angles in degrees. Historical
//! files hold seven numbers, with the rotation stored as a quaternion
//! (w, x, y, z) that is converted to Euler angles on load.

use std::fs;
use std::path::Path;

use glam::{DQuat, DVec3, EulerRot};

use crate::error::PoseError;
use crate::pose::ObjectPose;

/// Read a pose from a text file.
///
/// Accepts the six-number Euler form and the historical seven-number
/// quaternion form.
///
/// # Arguments
///
/// * `path` - The path to the pose file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a token is not a number, or
/// the number of values is not 6 or 7.
pub fn read_pose(path: impl AsRef<Path>) -> Result<ObjectPose, PoseError> {
    let contents = fs::read_to_string(path)?;

    let values = contents
        .split_whitespace()
        .map(str::parse::<f64>)
        .collect::<Result<Vec<_>, _>>()?;

    let translation = match values.len() {
        6 | 7 => DVec3::new(values[0], values[1], values[2]),
        n => return Err(PoseError::InvalidPoseFile(n)),
    };

    let rotation = if values.len() == 6 {
        DVec3::new(values[3], values[4], values[5])
    } else {
        // historical variant: w, x, y, z quaternion
        let quaternion =
            DQuat::from_xyzw(values[4], values[5], values[6], values[3]).normalize();
        let (z, x, y) = quaternion.to_euler(EulerRot::ZXY);
        DVec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
    };

    Ok(ObjectPose::new(translation, rotation))
}

/// Write a pose to a text file.
///
/// One value per line, translation then rotation, in fixed-point notation
/// with 2 decimal digits.
///
/// # Arguments
///
/// * `pose` - The pose to write.
/// * `path` - The path to the pose file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_pose(pose: &ObjectPose, path: impl AsRef<Path>) -> Result<(), PoseError> {
    let contents = format!(
        "{:.2}\n{:.2}\n{:.2}\n{:.2}\n{:.2}\n{:.2}",
        pose.translation.x,
        pose.translation.y,
        pose.translation.z,
        pose.rotation.x,
        pose.rotation.y,
        pose.rotation.z,
    );

    fs::write(path, contents)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_save_and_read_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("pose.txt");

        let pose = ObjectPose::new(
            DVec3::new(0.05, -0.12, 0.2),
            DVec3::new(10.0, -5.0, 120.25),
        );
        save_pose(&pose, &path)?;

        let loaded = read_pose(&path)?;

        // the writer keeps 2 decimal digits
        for i in 0..3 {
            assert_relative_eq!(loaded.translation[i], pose.translation[i], epsilon = 5e-3);
            assert_relative_eq!(loaded.rotation[i], pose.rotation[i], epsilon = 5e-3);
        }

        Ok(())
    }

    #[test]
    fn test_read_quaternion_variant() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("pose.txt");

        // identity quaternion: w = 1, x = y = z = 0
        fs::write(&path, "0.10 0.20 0.30 1.0 0.0 0.0 0.0")?;

        let loaded = read_pose(&path)?;
        assert_relative_eq!(loaded.translation.x, 0.1);
        assert_relative_eq!(loaded.translation.y, 0.2);
        assert_relative_eq!(loaded.translation.z, 0.3);
        for i in 0..3 {
            assert_relative_eq!(loaded.rotation[i], 0.0, epsilon = 1e-9);
        }

        Ok(())
    }

    #[test]
    fn test_read_quaternion_z_rotation() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("pose.txt");

        // 90 degrees about z: w = cos(45deg), z = sin(45deg)
        let half = std::f64::consts::FRAC_PI_4;
        fs::write(
            &path,
            format!("0 0 0 {} 0 0 {}", half.cos(), half.sin()),
        )?;

        let loaded = read_pose(&path)?;
        assert_relative_eq!(loaded.rotation.z, 90.0, epsilon = 1e-6);
        assert_relative_eq!(loaded.rotation.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(loaded.rotation.y, 0.0, epsilon = 1e-6);

        Ok(())
    }

    #[test]
    fn test_read_invalid_token_count() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("pose.txt");
        fs::write(&path, "1 2 3 4")?;

        let result = read_pose(&path);
        assert!(matches!(result, Err(PoseError::InvalidPoseFile(4))));

        Ok(())
    }

    #[test]
    fn test_read_invalid_number() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("pose.txt");
        fs::write(&path, "1 2 3 4 5 banana")?;

        let result = read_pose(&path);
        assert!(matches!(result, Err(PoseError::InvalidNumber(_))));

        Ok(())
    }
}
