#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// silhouette renderer interface module.
pub mod renderer;

/// render-and-compare objective function module.
pub mod objective;

/// approximate-derivative quasi-Newton maximization module.
pub mod solver;

/// end-to-end pose refinement driver module.
pub mod refine;

mod error;

pub use crate::error::OptimError;
pub use crate::objective::PoseObjective;
pub use crate::refine::{refine_pose, PoseRefinement};
pub use crate::renderer::{RenderError, SilhouetteRenderer};
pub use crate::solver::{
    maximize_approximate, MaximizationResult, QuasiNewtonParams, StopReason,
};
