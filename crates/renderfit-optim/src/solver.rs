//! Derivative-free quasi-Newton maximization.
//!
//! The objective is a black box: it passes through a rasterizer, so no
//! analytic gradient exists. Gradients are estimated by central finite
//! differences and fed into a BFGS ascent with a backtracking line search.
//! Rasterization makes the objective non-smooth at silhouette edges, so the
//! search can settle in a local maximum; that is an accepted property of the
//! method, not a failure, and initial-guess quality decides the outcome.

use crate::error::OptimError;

/// Sufficient-increase coefficient of the backtracking line search.
const ARMIJO_C: f64 = 1e-4;

/// Maximum number of step halvings per line search.
const MAX_BACKTRACKS: usize = 30;

/// Minimum curvature product accepted for a BFGS update.
const CURVATURE_MIN: f64 = 1e-12;

/// Tuning parameters for the approximate-derivative quasi-Newton search.
#[derive(Debug, Clone)]
pub struct QuasiNewtonParams {
    /// Step scale the line search starts from at each iteration.
    pub initial_step: f64,
    /// Perturbation applied per dimension for the central-difference
    /// gradient estimate, in normalized parameter units.
    pub gradient_epsilon: f64,
    /// Maximum number of ascent iterations.
    pub max_iterations: usize,
    /// Stop when the objective improves by less than this between
    /// consecutive iterations.
    pub tolerance: f64,
}

impl Default for QuasiNewtonParams {
    fn default() -> Self {
        Self {
            initial_step: 1.0,
            gradient_epsilon: 0.1,
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The objective-delta stopping criterion was met, or no improving step
    /// remained along the search direction.
    Converged,
    /// The iteration budget ran out; the best iterate found so far is
    /// returned and this is not an error.
    MaxIterations,
}

/// Result of a maximization run.
#[derive(Debug, Clone)]
pub struct MaximizationResult {
    /// Parameter vector at the best objective value observed.
    pub parameters: Vec<f64>,
    /// Objective value at [`parameters`](Self::parameters).
    pub score: f64,
    /// Number of ascent iterations performed.
    pub num_iterations: usize,
    /// Total number of objective evaluations, including gradient probes.
    pub num_evaluations: usize,
    /// Why the search stopped.
    pub stop_reason: StopReason,
}

/// Maximize a black-box objective with BFGS ascent and approximate derivatives.
///
/// # Arguments
///
/// * `objective` - The function to maximize; called many times, including at
///   perturbed probe points for gradient estimation.
/// * `initial` - The starting parameter vector.
/// * `params` - Search tuning parameters.
///
/// # Returns
///
/// The best iterate found, with iteration/evaluation counts and the stop
/// reason.
///
/// # Errors
///
/// Returns an error if the initial vector is empty or any objective
/// evaluation fails.
pub fn maximize_approximate<F>(
    mut objective: F,
    initial: Vec<f64>,
    params: &QuasiNewtonParams,
) -> Result<MaximizationResult, OptimError>
where
    F: FnMut(&[f64]) -> Result<f64, OptimError>,
{
    let n = initial.len();
    if n == 0 {
        return Err(OptimError::EmptyParameterVector);
    }

    let mut num_evaluations = 0usize;

    let mut x = initial;
    num_evaluations += 1;
    let mut fx = objective(&x)?;
    let mut grad = gradient(
        &mut objective,
        &x,
        params.gradient_epsilon,
        &mut num_evaluations,
    )?;

    let mut inverse_hessian = identity(n);

    let mut num_iterations = 0usize;
    let mut stop_reason = StopReason::MaxIterations;

    for _ in 0..params.max_iterations {
        num_iterations += 1;

        // ascent direction from the running inverse Hessian approximation,
        // falling back to steepest ascent when the model loses positive
        // curvature along the gradient
        let mut direction = mat_vec(&inverse_hessian, &grad);
        let mut slope = dot(&grad, &direction);
        if slope <= 0.0 {
            direction.copy_from_slice(&grad);
            slope = dot(&grad, &grad);
        }
        if slope <= f64::EPSILON {
            // gradient numerically zero, nothing left to climb
            stop_reason = StopReason::Converged;
            break;
        }

        // backtracking line search with a sufficient-increase condition
        let mut step = params.initial_step;
        let mut accepted = None;
        for _ in 0..MAX_BACKTRACKS {
            let candidate = offset(&x, step, &direction);
            num_evaluations += 1;
            let score = objective(&candidate)?;
            if score >= fx + ARMIJO_C * step * slope {
                accepted = Some((candidate, score));
                break;
            }
            step *= 0.5;
        }

        let Some((x_next, f_next)) = accepted else {
            // no improving step along this direction
            stop_reason = StopReason::Converged;
            break;
        };

        let grad_next = gradient(
            &mut objective,
            &x_next,
            params.gradient_epsilon,
            &mut num_evaluations,
        )?;

        // BFGS update of the inverse Hessian; for maximization the curvature
        // pair is s = x_next - x and y = grad - grad_next
        let s = sub(&x_next, &x);
        let y = sub(&grad, &grad_next);
        let sy = dot(&s, &y);
        if sy > CURVATURE_MIN {
            bfgs_update(&mut inverse_hessian, &s, &y, sy);
        } else {
            // curvature information unusable, restart from the identity model
            inverse_hessian = identity(n);
        }

        let delta = (f_next - fx).abs();
        log::debug!("iteration {num_iterations} score {f_next} delta {delta}");

        x = x_next;
        fx = f_next;
        grad = grad_next;

        if delta < params.tolerance {
            stop_reason = StopReason::Converged;
            break;
        }
    }

    Ok(MaximizationResult {
        parameters: x,
        score: fx,
        num_iterations,
        num_evaluations,
        stop_reason,
    })
}

/// Central-difference gradient estimate.
fn gradient<F>(
    objective: &mut F,
    x: &[f64],
    epsilon: f64,
    num_evaluations: &mut usize,
) -> Result<Vec<f64>, OptimError>
where
    F: FnMut(&[f64]) -> Result<f64, OptimError>,
{
    let mut grad = vec![0.0; x.len()];
    let mut probe = x.to_vec();

    for i in 0..x.len() {
        probe[i] = x[i] + epsilon;
        *num_evaluations += 1;
        let f_plus = objective(&probe)?;

        probe[i] = x[i] - epsilon;
        *num_evaluations += 1;
        let f_minus = objective(&probe)?;

        probe[i] = x[i];
        grad[i] = (f_plus - f_minus) / (2.0 * epsilon);
    }

    Ok(grad)
}

fn identity(n: usize) -> Vec<Vec<f64>> {
    let mut matrix = vec![vec![0.0; n]; n];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    matrix
}

fn mat_vec(matrix: &[Vec<f64>], vector: &[f64]) -> Vec<f64> {
    matrix.iter().map(|row| dot(row, vector)).collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

fn sub(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b.iter()).map(|(x, y)| x - y).collect()
}

fn offset(x: &[f64], step: f64, direction: &[f64]) -> Vec<f64> {
    x.iter()
        .zip(direction.iter())
        .map(|(xi, di)| xi + step * di)
        .collect()
}

/// In-place BFGS update of the inverse Hessian approximation:
/// `H' = (I - rho s y^T) H (I - rho y s^T) + rho s s^T` with `rho = 1/(s.y)`,
/// expanded to avoid temporary matrices.
fn bfgs_update(inverse_hessian: &mut [Vec<f64>], s: &[f64], y: &[f64], sy: f64) {
    let n = s.len();
    let rho = 1.0 / sy;

    let hy = mat_vec(inverse_hessian, y);
    let yhy = dot(y, &hy);

    for i in 0..n {
        for j in 0..n {
            inverse_hessian[i][j] += -rho * (s[i] * hy[j] + hy[i] * s[j])
                + (rho * rho * yhy + rho) * s[i] * s[j];
        }
    }
}
