//! Backend capability interface.
//!
//! A backend is a differentiation engine capable of compiling a cost
//! function and producing its gradient and Hessian-vector product. The
//! wrapper consumes backends polymorphically; which engine runs is decided
//! once, at decoration time, by the backend type named at the decorator
//! factory. There is no runtime backend discovery or fallback chain.
//!
//! Every [`DifferentiableFunction`](crate::function::DifferentiableFunction)
//! exclusively owns its backend instance; backends are never pooled or
//! shared between wrapped functions.

use crate::argspec::ArgSpec;
use crate::error::Result;
use crate::function::CostSource;
use crate::types::{CompiledFn, GradientFn, HessianFn};

/// Capability interface implemented by differentiation engines.
pub trait Backend {
    /// Display name, used in error messages and string representations.
    fn name(&self) -> &str;

    /// Whether the backend's runtime dependencies are present.
    fn is_available(&self) -> bool;

    /// Whether the backend can process the given cost source.
    fn is_compatible(&self, function: &CostSource, args: &ArgSpec) -> bool;

    /// Produces the compiled evaluator for the cost function.
    fn compile_function(&self, function: &CostSource, args: &ArgSpec) -> Result<CompiledFn>;

    /// Produces the Euclidean gradient callable.
    fn compute_gradient(&self, function: &CostSource, args: &ArgSpec) -> Result<GradientFn>;

    /// Produces the Hessian-vector product callable.
    fn compute_hessian(&self, function: &CostSource, args: &ArgSpec) -> Result<HessianFn>;
}

/// A backend that operates on eagerly built symbolic graphs.
///
/// Graph backends are constructed by the graph decorator factory, which
/// forwards user-supplied construction options to [`with_options`]
/// (`GraphBackend::with_options`).
pub trait GraphBackend: Backend + Sized {
    /// Backend construction options.
    type Options: Default;

    /// Constructs a fresh backend instance from options.
    fn with_options(options: Self::Options) -> Self;
}
