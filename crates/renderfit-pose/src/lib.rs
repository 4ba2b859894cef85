#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// object pose representation module.
pub mod pose;

/// optimizer parameter vector mapping module.
pub mod params;

/// pose comparison metrics module.
pub mod compare;

/// pose text file reading and writing module.
pub mod io;

mod error;

pub use crate::compare::{
    max_rotation_error, max_translation_error, rotation_error, translation_error,
};
pub use crate::error::PoseError;
pub use crate::io::{read_pose, save_pose};
pub use crate::params::Parameterization;
pub use crate::pose::ObjectPose;
