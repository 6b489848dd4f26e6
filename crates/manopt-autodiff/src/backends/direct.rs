//! Plain-evaluation backend.
//!
//! Compiles a callable cost source by forwarding to it and declines every
//! derivative request. Useful when the optimizer only needs cost values,
//! or when the user supplies derivatives through other means.

use crate::argspec::ArgSpec;
use crate::backend::Backend;
use crate::error::{AutodiffError, Result};
use crate::function::CostSource;
use crate::types::{CompiledFn, GradientFn, HessianFn};
use std::rc::Rc;

/// Backend that evaluates callables as-is and provides no derivatives.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectBackend;

impl Backend for DirectBackend {
    fn name(&self) -> &str {
        "direct"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn is_compatible(&self, function: &CostSource, _args: &ArgSpec) -> bool {
        function.as_callable().is_some()
    }

    fn compile_function(&self, function: &CostSource, _args: &ArgSpec) -> Result<CompiledFn> {
        let cost = function.as_callable().ok_or_else(|| {
            AutodiffError::backend_incompatible(self.name(), function.type_label())
        })?;
        let cost = Rc::clone(cost);
        Ok(Box::new(move |slots| cost(slots)))
    }

    fn compute_gradient(&self, _function: &CostSource, _args: &ArgSpec) -> Result<GradientFn> {
        Err(AutodiffError::derivative_unavailable(
            self.name(),
            "gradient",
        ))
    }

    fn compute_hessian(&self, _function: &CostSource, _args: &ArgSpec) -> Result<HessianFn> {
        Err(AutodiffError::derivative_unavailable(self.name(), "Hessian"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::DifferentiableFunction;
    use crate::types::Tensor;

    fn wrap_sum() -> DifferentiableFunction {
        DifferentiableFunction::new(
            CostSource::callable(Rc::new(|slots: &[Tensor]| {
                Ok(slots.iter().map(Tensor::sum).sum())
            })),
            ArgSpec::from_names(["x"]),
            Box::new(DirectBackend),
        )
        .unwrap()
    }

    #[test]
    fn test_compiles_and_evaluates() {
        let function = wrap_sum();
        let value = function.call(&[Tensor::from_element(3, 1, 2.0)]).unwrap();
        assert_eq!(value, 6.0);
        assert_eq!(function.to_string(), "Function <direct>");
    }

    #[test]
    fn test_derivatives_unavailable() {
        let function = wrap_sum();
        assert!(matches!(
            function.compute_gradient(),
            Err(AutodiffError::DerivativeUnavailable { .. })
        ));
        assert!(matches!(
            function.compute_hessian(),
            Err(AutodiffError::DerivativeUnavailable { .. })
        ));
    }

    #[test]
    fn test_rejects_graph_sources() {
        let backend = DirectBackend;
        let source = CostSource::graph(42_usize);
        assert!(!backend.is_compatible(&source, &ArgSpec::default()));
    }
}
