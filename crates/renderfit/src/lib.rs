#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use renderfit_image as image;

#[doc(inline)]
pub use renderfit_similarity as similarity;

#[doc(inline)]
pub use renderfit_pose as pose;

#[doc(inline)]
pub use renderfit_optim as optim;
