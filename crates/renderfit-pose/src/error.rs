/// Errors that can occur in the pose module.
#[derive(thiserror::Error, Debug)]
pub enum PoseError {
    /// The parameter vector length does not match the parameterization.
    #[error("parameter vector has length {got}, expected {expected}")]
    InvalidParameterLength {
        /// Length required by the active parameterization.
        expected: usize,
        /// Length of the vector that was passed.
        got: usize,
    },

    /// Error reading or writing a pose file.
    #[error("error reading or writing pose file")]
    Io(#[from] std::io::Error),

    /// A token of a pose file could not be parsed as a number.
    #[error("invalid number in pose file")]
    InvalidNumber(#[from] std::num::ParseFloatError),

    /// A pose file did not contain a supported number of values.
    #[error("pose file contains {0} values, expected 6 or 7")]
    InvalidPoseFile(usize),
}
