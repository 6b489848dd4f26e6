//! Type aliases shared across the crate.
//!
//! Cost functions take an ordered list of positional tensor arguments and
//! return a scalar. Backends turn such functions into compiled evaluators
//! and derivative callables; the aliases below fix the shapes of those
//! callables once so that every backend speaks the same language.

use crate::error::Result;
use nalgebra::DMatrix;
use std::rc::Rc;

/// Type alias for tensors used throughout the crate.
///
/// Column vectors are represented as `n x 1` matrices.
pub type Tensor = DMatrix<f64>;

/// A raw user-supplied cost callable over positional tensor slots.
///
/// Shared (`Rc`) because backends capture it inside the compiled evaluator
/// and the derivative callables they produce.
pub type CostFn = Rc<dyn Fn(&[Tensor]) -> Result<f64>>;

/// A backend-produced compiled evaluator for a cost function.
pub type CompiledFn = Box<dyn Fn(&[Tensor]) -> Result<f64>>;

/// A backend-produced Euclidean gradient callable.
///
/// Returns one gradient tensor per positional slot, in slot order.
pub type GradientFn = Box<dyn Fn(&[Tensor]) -> Result<Vec<Tensor>>>;

/// A backend-produced Hessian-vector product callable.
///
/// Takes the evaluation point and a direction (one tensor per positional
/// slot each) and returns the product of the Hessian with the direction.
pub type HessianFn = Box<dyn Fn(&[Tensor], &[Tensor]) -> Result<Vec<Tensor>>>;
