/// Errors that can occur while comparing two images.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SimilarityError {
    /// The two images to compare have different sizes.
    #[error("rendered image size ({0}x{1}) does not match target size ({2}x{3})")]
    ImageSizeMismatch(usize, usize, usize, usize),
}
