//! Finite-difference derivative approximations.
//!
//! These routines differentiate a compiled evaluator numerically: central
//! differences for the gradient, gradient differencing for the
//! Hessian-vector product. They back the shipped backends that cannot (or
//! choose not to) differentiate symbolically, mirroring the usual fallback
//! scheme of optimization libraries when analytic derivatives are absent.

use crate::error::{AutodiffError, Result};
use crate::types::Tensor;

/// Evaluator shape accepted by the finite-difference routines.
pub type EvalFn = dyn Fn(&[Tensor]) -> Result<f64>;

/// Default perturbation scale, `sqrt(machine epsilon)`.
pub fn default_step_scale() -> f64 {
    f64::EPSILON.sqrt()
}

/// Approximates the Euclidean gradient of `eval` at `point` by central
/// differences, one entry at a time.
///
/// The perturbation for an entry with value `x` is
/// `step_scale * (1 + |x|)`, so large entries are perturbed
/// proportionally while entries near zero still move by `step_scale`.
/// Returns one gradient tensor per positional slot, in slot order.
pub fn gradient_fd(eval: &EvalFn, point: &[Tensor], step_scale: f64) -> Result<Vec<Tensor>> {
    let mut work: Vec<Tensor> = point.to_vec();
    let mut gradients = Vec::with_capacity(point.len());

    for slot in 0..point.len() {
        let (nrows, ncols) = point[slot].shape();
        let mut gradient = Tensor::zeros(nrows, ncols);
        for j in 0..ncols {
            for i in 0..nrows {
                let x = point[slot][(i, j)];
                let h = step_scale * (1.0 + x.abs());

                work[slot][(i, j)] = x + h;
                let forward = eval(&work)?;
                work[slot][(i, j)] = x - h;
                let backward = eval(&work)?;
                work[slot][(i, j)] = x;

                gradient[(i, j)] = (forward - backward) / (2.0 * h);
            }
        }
        gradients.push(gradient);
    }
    Ok(gradients)
}

/// Approximates the Hessian-vector product of `eval` at `point` in the
/// given `direction` by differencing finite-difference gradients.
///
/// Uses a much coarser step along the direction (fourth root of machine
/// epsilon over the direction norm) than the inner gradients, since the
/// quotient amplifies gradient noise.
pub fn hessian_vector_fd(
    eval: &EvalFn,
    point: &[Tensor],
    direction: &[Tensor],
    step_scale: f64,
) -> Result<Vec<Tensor>> {
    if direction.len() != point.len() {
        return Err(AutodiffError::dimension_mismatch(
            format!("{} direction tensors", point.len()),
            direction.len(),
        ));
    }
    for (slot, (x, d)) in point.iter().zip(direction).enumerate() {
        if x.shape() != d.shape() {
            return Err(AutodiffError::dimension_mismatch(
                format!("{:?} for direction slot {slot}", x.shape()),
                format!("{:?}", d.shape()),
            ));
        }
    }

    let norm: f64 = direction
        .iter()
        .map(Tensor::norm_squared)
        .sum::<f64>()
        .sqrt();
    if norm < f64::EPSILON {
        return Ok(point
            .iter()
            .map(|x| Tensor::zeros(x.nrows(), x.ncols()))
            .collect());
    }

    let t = f64::EPSILON.powf(0.25) / norm;
    let shifted: Vec<Tensor> = point
        .iter()
        .zip(direction)
        .map(|(x, d)| x + d * t)
        .collect();

    let base = gradient_fd(eval, point, step_scale)?;
    let moved = gradient_fd(eval, &shifted, step_scale)?;

    Ok(moved
        .into_iter()
        .zip(base)
        .map(|(g_moved, g_base)| (g_moved - g_base) / t)
        .collect())
}
