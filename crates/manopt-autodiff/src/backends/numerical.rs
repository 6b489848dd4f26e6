//! Finite-difference backend for callable cost sources.
//!
//! The tracing-style workhorse when no AD engine is wired in: cost
//! evaluation forwards to the user callable, and derivatives come from the
//! central-difference routines in [`crate::numerical`].

use crate::argspec::ArgSpec;
use crate::backend::Backend;
use crate::error::{AutodiffError, Result};
use crate::function::CostSource;
use crate::numerical::{default_step_scale, gradient_fd, hessian_vector_fd};
use crate::types::{CompiledFn, CostFn, GradientFn, HessianFn};
use std::rc::Rc;

/// Backend that differentiates callables by central differences.
#[derive(Debug, Clone, Copy)]
pub struct NumericalBackend {
    step_scale: f64,
}

impl NumericalBackend {
    /// Creates a backend with a custom perturbation scale.
    pub fn with_step_scale(step_scale: f64) -> Self {
        Self { step_scale }
    }

    fn callable(&self, function: &CostSource) -> Result<CostFn> {
        function.as_callable().map(Rc::clone).ok_or_else(|| {
            AutodiffError::backend_incompatible(self.name(), function.type_label())
        })
    }
}

impl Default for NumericalBackend {
    fn default() -> Self {
        Self {
            step_scale: default_step_scale(),
        }
    }
}

impl Backend for NumericalBackend {
    fn name(&self) -> &str {
        "numerical"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn is_compatible(&self, function: &CostSource, _args: &ArgSpec) -> bool {
        function.as_callable().is_some()
    }

    fn compile_function(&self, function: &CostSource, _args: &ArgSpec) -> Result<CompiledFn> {
        let cost = self.callable(function)?;
        Ok(Box::new(move |slots| cost(slots)))
    }

    fn compute_gradient(&self, function: &CostSource, _args: &ArgSpec) -> Result<GradientFn> {
        let cost = self.callable(function)?;
        let step_scale = self.step_scale;
        Ok(Box::new(move |slots| {
            gradient_fd(cost.as_ref(), slots, step_scale)
        }))
    }

    fn compute_hessian(&self, function: &CostSource, _args: &ArgSpec) -> Result<HessianFn> {
        let cost = self.callable(function)?;
        let step_scale = self.step_scale;
        Ok(Box::new(move |slots, direction| {
            hessian_vector_fd(cost.as_ref(), slots, direction, step_scale)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::DifferentiableFunction;
    use crate::types::Tensor;
    use approx::assert_relative_eq;

    fn wrap_norm_squared() -> DifferentiableFunction {
        DifferentiableFunction::new(
            CostSource::callable(Rc::new(|slots: &[Tensor]| Ok(slots[0].norm_squared()))),
            ArgSpec::from_names(["x"]),
            Box::new(NumericalBackend::default()),
        )
        .unwrap()
    }

    #[test]
    fn test_gradient_of_norm_squared() {
        let function = wrap_norm_squared();
        let point = vec![Tensor::from_column_slice(3, 1, &[1.0, -2.0, 0.5])];

        let gradient = function.compute_gradient().unwrap();
        let gradients = gradient(&point).unwrap();

        // grad |x|^2 = 2x.
        for i in 0..3 {
            assert_relative_eq!(gradients[0][i], 2.0 * point[0][i], max_relative = 1e-6);
        }
    }

    #[test]
    fn test_hessian_vector_of_norm_squared() {
        let function = wrap_norm_squared();
        let point = vec![Tensor::from_column_slice(3, 1, &[1.0, -2.0, 0.5])];
        let direction = vec![Tensor::from_column_slice(3, 1, &[0.5, 0.0, -1.0])];

        let hessian = function.compute_hessian().unwrap();
        let product = hessian(&point, &direction).unwrap();

        // Hessian of |x|^2 is 2 I, so H v = 2v.
        for i in 0..3 {
            assert_relative_eq!(product[0][i], 2.0 * direction[0][i], epsilon = 1e-2);
        }
    }

    #[test]
    fn test_rejects_graph_sources() {
        let result = DifferentiableFunction::new(
            CostSource::graph(1_usize),
            ArgSpec::from_names(["x"]),
            Box::new(NumericalBackend::default()),
        );
        assert!(matches!(
            result,
            Err(AutodiffError::BackendIncompatible { .. })
        ));
    }
}
