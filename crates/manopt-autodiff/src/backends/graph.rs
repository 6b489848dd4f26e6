//! Backend for symbolic expression graphs.
//!
//! Compatible with cost sources produced by the graph decorator over
//! [`Expr`] placeholders. Compilation binds positional tensors to the
//! placeholders in the flattened order of the argument specification and
//! evaluates the expression; derivatives reuse the finite-difference
//! routines over the compiled evaluator.

use crate::argspec::{flatten_arguments, ArgSpec};
use crate::backend::{Backend, GraphBackend};
use crate::error::{AutodiffError, Result};
use crate::function::CostSource;
use crate::graph::{Bindings, Expr, PlaceholderId};
use crate::numerical::{default_step_scale, gradient_fd, hessian_vector_fd};
use crate::types::{CompiledFn, GradientFn, HessianFn, Tensor};
use std::any::Any;
use std::rc::Rc;

/// Construction options for [`GraphEvalBackend`].
#[derive(Debug, Clone, Copy)]
pub struct GraphEvalOptions {
    /// Perturbation scale for finite-difference derivatives.
    pub step_scale: f64,
}

impl Default for GraphEvalOptions {
    fn default() -> Self {
        Self {
            step_scale: default_step_scale(),
        }
    }
}

/// Backend that evaluates [`Expr`] graphs.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphEvalBackend {
    options: GraphEvalOptions,
}

/// Extracts the placeholder ids of a specification's leaves, in flattened
/// order. `None` if any leaf is not an [`Expr`] placeholder.
fn placeholder_ids(args: &ArgSpec) -> Option<Vec<PlaceholderId>> {
    flatten_arguments(args)
        .iter()
        .map(|entry| {
            entry
                .as_placeholder()
                .and_then(|value| value.downcast_ref::<Expr>())
                .and_then(Expr::placeholder_id)
        })
        .collect()
}

/// Views type-erased decorator placeholders as expressions.
///
/// Convenience for build closures handed placeholders by the graph
/// decorator; fails with [`AutodiffError::InvalidSignature`] if an entry is
/// not an [`Expr`].
pub fn as_exprs(placeholders: &[Rc<dyn Any>]) -> Result<Vec<Expr>> {
    placeholders
        .iter()
        .map(|value| {
            value.downcast_ref::<Expr>().cloned().ok_or_else(|| {
                AutodiffError::invalid_signature(
                    "graph placeholders must be symbolic expressions",
                )
            })
        })
        .collect()
}

impl GraphEvalBackend {
    fn compiled_evaluator(&self, function: &CostSource, args: &ArgSpec) -> Result<CompiledFn> {
        let incompatible =
            || AutodiffError::backend_incompatible(self.name(), function.type_label());
        let expr = function
            .downcast_graph::<Expr>()
            .ok_or_else(&incompatible)?
            .clone();
        let ids = placeholder_ids(args).ok_or_else(&incompatible)?;

        Ok(Box::new(move |slots: &[Tensor]| {
            if slots.len() != ids.len() {
                return Err(AutodiffError::dimension_mismatch(
                    format!("{} positional arguments", ids.len()),
                    slots.len(),
                ));
            }
            let bindings: Bindings = ids
                .iter()
                .zip(slots)
                .map(|(id, slot)| (*id, slot.clone()))
                .collect();
            let value = expr.eval(&bindings)?;
            if value.shape() == (1, 1) {
                Ok(value[(0, 0)])
            } else {
                Err(AutodiffError::non_scalar_output(
                    value.nrows(),
                    value.ncols(),
                ))
            }
        }))
    }
}

impl Backend for GraphEvalBackend {
    fn name(&self) -> &str {
        "graph"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn is_compatible(&self, function: &CostSource, args: &ArgSpec) -> bool {
        function.downcast_graph::<Expr>().is_some() && placeholder_ids(args).is_some()
    }

    fn compile_function(&self, function: &CostSource, args: &ArgSpec) -> Result<CompiledFn> {
        self.compiled_evaluator(function, args)
    }

    fn compute_gradient(&self, function: &CostSource, args: &ArgSpec) -> Result<GradientFn> {
        let compiled = self.compiled_evaluator(function, args)?;
        let step_scale = self.options.step_scale;
        Ok(Box::new(move |slots| {
            gradient_fd(compiled.as_ref(), slots, step_scale)
        }))
    }

    fn compute_hessian(&self, function: &CostSource, args: &ArgSpec) -> Result<HessianFn> {
        let compiled = self.compiled_evaluator(function, args)?;
        let step_scale = self.options.step_scale;
        Ok(Box::new(move |slots, direction| {
            hessian_vector_fd(compiled.as_ref(), slots, direction, step_scale)
        }))
    }
}

impl GraphBackend for GraphEvalBackend {
    type Options = GraphEvalOptions;

    fn with_options(options: Self::Options) -> Self {
        Self { options }
    }
}
