//! Backend-agnostic wrapper around user-supplied cost functions.
//!
//! A [`DifferentiableFunction`] binds a cost source, an argument
//! specification, and one exclusively owned backend instance. It is
//! compiled eagerly at construction time, because the optimizer needs a
//! compiled evaluator immediately for cost evaluation, while gradients and
//! Hessians are realized lazily: only first-order methods pay for a
//! gradient, only second-order methods pay for a Hessian, and each is
//! requested from the backend at most once.

use crate::argspec::ArgSpec;
use crate::backend::Backend;
use crate::error::{AutodiffError, Result};
use crate::types::{CompiledFn, CostFn, GradientFn, HessianFn, Tensor};
use std::any::Any;
use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

/// What a differentiable function wraps.
///
/// Tracing backends evaluate a callable directly; graph backends work on a
/// symbolic graph object that the user's build closure returned. The graph
/// object is backend-specific, so it is stored type-erased together with
/// its concrete type name for diagnostics.
#[derive(Clone)]
pub enum CostSource {
    /// A callable evaluated directly on positional tensors.
    Callable(CostFn),
    /// A symbolic graph built once from placeholders.
    Graph {
        /// The type-erased graph object.
        object: Rc<dyn Any>,
        /// Concrete type name of the graph object.
        type_name: &'static str,
    },
}

impl CostSource {
    /// Wraps a raw cost callable.
    pub fn callable(cost: CostFn) -> Self {
        Self::Callable(cost)
    }

    /// Wraps a symbolic graph object, recording its concrete type name.
    pub fn graph<G: Any>(object: G) -> Self {
        Self::Graph {
            object: Rc::new(object),
            type_name: std::any::type_name::<G>(),
        }
    }

    /// Returns the callable, if this source is one.
    pub fn as_callable(&self) -> Option<&CostFn> {
        match self {
            Self::Callable(cost) => Some(cost),
            Self::Graph { .. } => None,
        }
    }

    /// Attempts to view the graph object as a concrete graph type.
    pub fn downcast_graph<G: Any>(&self) -> Option<&G> {
        match self {
            Self::Graph { object, .. } => object.downcast_ref::<G>(),
            Self::Callable(_) => None,
        }
    }

    /// A label for the runtime type of the source, used in error messages.
    pub fn type_label(&self) -> &str {
        match self {
            Self::Callable(_) => "callable",
            Self::Graph { type_name, .. } => type_name,
        }
    }
}

impl fmt::Debug for CostSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callable(_) => f.write_str("CostSource::Callable"),
            Self::Graph { type_name, .. } => {
                write!(f, "CostSource::Graph<{type_name}>")
            }
        }
    }
}

/// A cost function bound to a differentiation backend.
///
/// Construction validates the backend and compiles the function exactly
/// once; a partially constructed instance is never observable because
/// construction returns `Result`. The gradient and Hessian callables are
/// realized lazily through independent once-cells, so the backend's
/// derivative routines run at most once per instance.
pub struct DifferentiableFunction {
    function: CostSource,
    args: ArgSpec,
    backend: Box<dyn Backend>,
    compiled: CompiledFn,
    gradient: OnceCell<GradientFn>,
    hessian: OnceCell<HessianFn>,
}

impl DifferentiableFunction {
    /// Wraps `function` with `backend`, validating and compiling eagerly.
    ///
    /// # Errors
    ///
    /// - [`AutodiffError::BackendUnavailable`] if the backend reports its
    ///   runtime dependencies as missing. `compile_function` is not called.
    /// - [`AutodiffError::BackendIncompatible`] if the backend rejects the
    ///   cost source. `compile_function` is not called.
    /// - Any error produced by the backend's compilation itself.
    pub fn new(function: CostSource, args: ArgSpec, backend: Box<dyn Backend>) -> Result<Self> {
        if !backend.is_available() {
            return Err(AutodiffError::backend_unavailable(backend.name()));
        }
        if !backend.is_compatible(&function, &args) {
            return Err(AutodiffError::backend_incompatible(
                backend.name(),
                function.type_label(),
            ));
        }
        let compiled = backend.compile_function(&function, &args)?;
        Ok(Self {
            function,
            args,
            backend,
            compiled,
            gradient: OnceCell::new(),
            hessian: OnceCell::new(),
        })
    }

    /// Evaluates the cost function at the given positional arguments.
    ///
    /// Forwards to the compiled evaluator unchanged; no validation is
    /// performed beyond what the evaluator itself does.
    pub fn call(&self, args: &[Tensor]) -> Result<f64> {
        (self.compiled)(args)
    }

    /// Returns the gradient callable, requesting it from the backend on
    /// first use.
    ///
    /// Idempotent: subsequent calls return the same cached callable
    /// without touching the backend again.
    pub fn compute_gradient(&self) -> Result<&GradientFn> {
        match self.gradient.get() {
            Some(gradient) => Ok(gradient),
            None => {
                let gradient = self.backend.compute_gradient(&self.function, &self.args)?;
                Ok(self.gradient.get_or_init(|| gradient))
            }
        }
    }

    /// Returns the Hessian-vector product callable, requesting it from the
    /// backend on first use.
    ///
    /// Cached independently of the gradient.
    pub fn compute_hessian(&self) -> Result<&HessianFn> {
        match self.hessian.get() {
            Some(hessian) => Ok(hessian),
            None => {
                let hessian = self.backend.compute_hessian(&self.function, &self.args)?;
                Ok(self.hessian.get_or_init(|| hessian))
            }
        }
    }

    /// The argument specification this function was bound with.
    pub fn args(&self) -> &ArgSpec {
        &self.args
    }

    /// Display name of the owning backend.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }
}

impl fmt::Display for DifferentiableFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function <{}>", self.backend.name())
    }
}

impl fmt::Debug for DifferentiableFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DifferentiableFunction")
            .field("function", &self.function)
            .field("args", &self.args)
            .field("backend", &self.backend.name())
            .field("gradient_cached", &self.gradient.get().is_some())
            .field("hessian_cached", &self.hessian.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Backend that records how often each capability is exercised.
    struct RecordingBackend {
        available: bool,
        compatible: bool,
        compile_calls: Rc<Cell<usize>>,
        gradient_calls: Rc<Cell<usize>>,
        hessian_calls: Rc<Cell<usize>>,
    }

    impl RecordingBackend {
        fn new(available: bool, compatible: bool) -> Self {
            Self {
                available,
                compatible,
                compile_calls: Rc::new(Cell::new(0)),
                gradient_calls: Rc::new(Cell::new(0)),
                hessian_calls: Rc::new(Cell::new(0)),
            }
        }
    }

    impl Backend for RecordingBackend {
        fn name(&self) -> &str {
            "recording"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn is_compatible(&self, _function: &CostSource, _args: &ArgSpec) -> bool {
            self.compatible
        }

        fn compile_function(&self, function: &CostSource, _args: &ArgSpec) -> Result<CompiledFn> {
            self.compile_calls.set(self.compile_calls.get() + 1);
            let cost = Rc::clone(function.as_callable().expect("callable source"));
            Ok(Box::new(move |slots| cost(slots)))
        }

        fn compute_gradient(&self, _function: &CostSource, _args: &ArgSpec) -> Result<GradientFn> {
            self.gradient_calls.set(self.gradient_calls.get() + 1);
            Ok(Box::new(|slots| {
                Ok(slots.iter().map(|slot| slot.map(|v| 2.0 * v)).collect())
            }))
        }

        fn compute_hessian(&self, _function: &CostSource, _args: &ArgSpec) -> Result<HessianFn> {
            self.hessian_calls.set(self.hessian_calls.get() + 1);
            Ok(Box::new(|_slots, direction| {
                Ok(direction.iter().map(|d| d.map(|v| 2.0 * v)).collect())
            }))
        }
    }

    fn sum_cost() -> CostSource {
        CostSource::callable(Rc::new(|slots: &[Tensor]| {
            Ok(slots.iter().map(Tensor::sum).sum())
        }))
    }

    #[test]
    fn test_construction_compiles_once() {
        let backend = RecordingBackend::new(true, true);
        let compile_calls = Rc::clone(&backend.compile_calls);
        let function = DifferentiableFunction::new(
            sum_cost(),
            ArgSpec::from_names(["x"]),
            Box::new(backend),
        )
        .unwrap();

        assert_eq!(compile_calls.get(), 1);
        let value = function.call(&[Tensor::from_element(2, 1, 1.5)]).unwrap();
        assert_eq!(value, 3.0);
        // Calling does not recompile.
        assert_eq!(compile_calls.get(), 1);
    }

    #[test]
    fn test_unavailable_backend_rejected_before_compile() {
        let backend = RecordingBackend::new(false, true);
        let compile_calls = Rc::clone(&backend.compile_calls);
        let result = DifferentiableFunction::new(
            sum_cost(),
            ArgSpec::from_names(["x"]),
            Box::new(backend),
        );

        assert!(matches!(
            result,
            Err(AutodiffError::BackendUnavailable { .. })
        ));
        assert_eq!(compile_calls.get(), 0);
    }

    #[test]
    fn test_incompatible_backend_rejected_before_compile() {
        let backend = RecordingBackend::new(true, false);
        let compile_calls = Rc::clone(&backend.compile_calls);
        let result = DifferentiableFunction::new(
            sum_cost(),
            ArgSpec::from_names(["x"]),
            Box::new(backend),
        );

        match result {
            Err(AutodiffError::BackendIncompatible {
                backend,
                function_type,
            }) => {
                assert_eq!(backend, "recording");
                assert_eq!(function_type, "callable");
            }
            other => panic!("expected BackendIncompatible, got {other:?}"),
        }
        assert_eq!(compile_calls.get(), 0);
    }

    #[test]
    fn test_gradient_requested_once() {
        let backend = RecordingBackend::new(true, true);
        let gradient_calls = Rc::clone(&backend.gradient_calls);
        let function = DifferentiableFunction::new(
            sum_cost(),
            ArgSpec::from_names(["x"]),
            Box::new(backend),
        )
        .unwrap();

        let first = function.compute_gradient().unwrap() as *const GradientFn;
        let second = function.compute_gradient().unwrap() as *const GradientFn;
        assert_eq!(first, second);
        assert_eq!(gradient_calls.get(), 1);
    }

    #[test]
    fn test_hessian_cache_is_independent() {
        let backend = RecordingBackend::new(true, true);
        let gradient_calls = Rc::clone(&backend.gradient_calls);
        let hessian_calls = Rc::clone(&backend.hessian_calls);
        let function = DifferentiableFunction::new(
            sum_cost(),
            ArgSpec::from_names(["x"]),
            Box::new(backend),
        )
        .unwrap();

        function.compute_hessian().unwrap();
        function.compute_hessian().unwrap();
        assert_eq!(hessian_calls.get(), 1);
        // The gradient slot was never touched.
        assert_eq!(gradient_calls.get(), 0);

        function.compute_gradient().unwrap();
        assert_eq!(gradient_calls.get(), 1);
        assert_eq!(hessian_calls.get(), 1);
    }

    #[test]
    fn test_display_names_backend() {
        let backend = RecordingBackend::new(true, true);
        let function = DifferentiableFunction::new(
            sum_cost(),
            ArgSpec::from_names(["x"]),
            Box::new(backend),
        )
        .unwrap();

        assert_eq!(function.to_string(), "Function <recording>");
        assert_eq!(function.backend_name(), "recording");
    }

    #[test]
    fn test_graph_source_type_label() {
        #[derive(Debug)]
        struct FakeGraph;

        let source = CostSource::graph(FakeGraph);
        assert!(source.type_label().contains("FakeGraph"));
        assert!(source.downcast_graph::<FakeGraph>().is_some());
        assert!(source.as_callable().is_none());
    }
}
