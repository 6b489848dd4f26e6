//! Decorator factories for wrapping user cost functions.
//!
//! These are the construction surfaces external callers touch. Each call
//! wraps one function and constructs one fresh backend instance for it;
//! backends are never pooled or shared between wrapped functions.
//!
//! Two binding protocols exist:
//!
//! - **Tracing style** ([`make_tracing_function`],
//!   [`make_tracing_function_with_args`]): the wrapper keeps the callable
//!   and the backend binds arguments by name, either inferred from the
//!   callable's signature (bare form) or given explicitly with grouping
//!   (grouped form, for functions over product manifolds where one logical
//!   variable spans several positional slots).
//! - **Graph style** ([`make_graph_function`]): the user closure runs
//!   exactly once, at decoration time, over the flattened placeholders of
//!   the specification, and the symbolic graph it returns is what gets
//!   wrapped, not the closure itself.

use crate::argspec::{flatten_arguments, Arg, ArgSpec};
use crate::backend::{Backend, GraphBackend};
use crate::error::{AutodiffError, Result};
use crate::function::{CostSource, DifferentiableFunction};
use crate::signature::IntoCost;
use std::any::Any;
use std::rc::Rc;

/// Wraps a cost function, inferring the argument specification from its
/// signature.
///
/// The callable's declared parameter list becomes the specification, e.g.
/// a two-argument closure yields `("x", "y")`.
///
/// # Errors
///
/// [`AutodiffError::InvalidSignature`] if the callable does not declare a
/// fixed positional parameter list (the slice-based variadic form), plus
/// any construction error of [`DifferentiableFunction::new`].
pub fn make_tracing_function<B, F, Args>(function: F) -> Result<DifferentiableFunction>
where
    B: Backend + Default + 'static,
    F: IntoCost<Args>,
{
    let names = F::parameters().ok_or_else(|| {
        AutodiffError::invalid_signature(
            "cost function must only accept positional arguments; \
             use the grouped form for slice-based callables",
        )
    })?;
    DifferentiableFunction::new(
        CostSource::callable(function.into_cost()),
        ArgSpec::from_names(names),
        Box::new(B::default()),
    )
}

/// Wraps a cost function with an explicit argument specification.
///
/// The specification is bound verbatim, nesting included; no signature
/// inspection takes place. This is the form to use for variadic callables
/// and for conceptual variables that group several positional slots.
pub fn make_tracing_function_with_args<B, F, Args>(
    args: ArgSpec,
    function: F,
) -> Result<DifferentiableFunction>
where
    B: Backend + Default + 'static,
    F: IntoCost<Args>,
{
    DifferentiableFunction::new(
        CostSource::callable(function.into_cost()),
        args,
        Box::new(B::default()),
    )
}

/// Builds a symbolic graph from placeholders and wraps it.
///
/// Flattens the specification, invokes `build` exactly once with the
/// placeholder objects in flattened order, and wraps the returned graph in
/// a [`DifferentiableFunction`] over a backend constructed from `options`.
///
/// # Errors
///
/// [`AutodiffError::InvalidSignature`] if a specification leaf is not a
/// placeholder, plus any construction error of
/// [`DifferentiableFunction::new`].
pub fn make_graph_function<B, F, G>(
    args: ArgSpec,
    options: B::Options,
    build: F,
) -> Result<DifferentiableFunction>
where
    B: GraphBackend + 'static,
    F: FnOnce(&[Rc<dyn Any>]) -> G,
    G: Any,
{
    let placeholders: Vec<Rc<dyn Any>> = flatten_arguments(&args)
        .into_iter()
        .map(|entry| match entry {
            Arg::Placeholder(value) => Ok(value),
            Arg::Name(name) => Err(AutodiffError::invalid_signature(format!(
                "graph argument specifications must contain placeholders only, found name `{name}'"
            ))),
            Arg::Group(_) => unreachable!("flatten_arguments returns leaves"),
        })
        .collect::<Result<_>>()?;
    let graph = build(&placeholders);
    DifferentiableFunction::new(
        CostSource::graph(graph),
        args,
        Box::new(B::with_options(options)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::graph::as_exprs;
    use crate::backends::{DirectBackend, GraphEvalBackend, GraphEvalOptions, NumericalBackend};
    use crate::graph::Expr;
    use crate::types::Tensor;
    use std::cell::Cell;

    #[test]
    fn test_bare_form_infers_names() {
        let function =
            make_tracing_function::<DirectBackend, _, _>(|x: &Tensor, y: &Tensor| {
                x.sum() + y.sum()
            })
            .unwrap();

        assert_eq!(*function.args(), ArgSpec::from_names(["x", "y"]));
        let value = function
            .call(&[Tensor::from_element(1, 1, 2.0), Tensor::from_element(1, 1, 3.0)])
            .unwrap();
        assert_eq!(value, 5.0);
    }

    #[test]
    fn test_bare_form_rejects_variadic() {
        let result = make_tracing_function::<DirectBackend, _, _>(|slots: &[Tensor]| -> f64 {
            slots.iter().map(Tensor::sum).sum()
        });
        assert!(matches!(
            result,
            Err(AutodiffError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_grouped_form_binds_structure_verbatim() {
        let args = ArgSpec::new(vec![Arg::group(["x1", "x2"]), Arg::name("y")]);
        let function = make_tracing_function_with_args::<NumericalBackend, _, _>(
            args.clone(),
            |slots: &[Tensor]| -> f64 { slots.iter().map(Tensor::sum).sum() },
        )
        .unwrap();

        assert_eq!(*function.args(), args);
        assert_eq!(function.args().flat_len(), 3);
    }

    #[test]
    fn test_graph_form_builds_once_with_flat_placeholders() {
        let x1 = Expr::placeholder(2, 1);
        let x2 = Expr::placeholder(2, 1);
        let args = ArgSpec::new(vec![Arg::Group(vec![
            Arg::placeholder(x1),
            Arg::placeholder(x2),
        ])]);

        let builds = Cell::new(0_usize);
        let function = make_graph_function::<GraphEvalBackend, _, _>(
            args,
            GraphEvalOptions::default(),
            |placeholders| {
                builds.set(builds.get() + 1);
                assert_eq!(placeholders.len(), 2);
                let exprs = as_exprs(placeholders).unwrap();
                (&exprs[0].norm_squared() + &exprs[1].norm_squared()).sum()
            },
        )
        .unwrap();

        // The build closure ran exactly once, at decoration time.
        assert_eq!(builds.get(), 1);

        let value = function
            .call(&[
                Tensor::from_column_slice(2, 1, &[3.0, 4.0]),
                Tensor::from_column_slice(2, 1, &[1.0, 0.0]),
            ])
            .unwrap();
        assert_eq!(value, 26.0);
        assert_eq!(builds.get(), 1);
    }

    #[test]
    fn test_graph_form_rejects_named_leaves() {
        let result = make_graph_function::<GraphEvalBackend, _, _>(
            ArgSpec::from_names(["x"]),
            GraphEvalOptions::default(),
            |_| Expr::scalar(0.0),
        );
        assert!(matches!(
            result,
            Err(AutodiffError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_each_function_owns_its_backend() {
        // Two decorations of the same closure are independent instances.
        let cost = |x: &Tensor| x.sum();
        let first = make_tracing_function::<NumericalBackend, _, _>(cost).unwrap();
        let second = make_tracing_function::<NumericalBackend, _, _>(cost).unwrap();

        let point = vec![Tensor::from_element(2, 1, 1.0)];
        first.compute_gradient().unwrap();
        // The second instance's gradient slot is untouched by the first.
        let gradients = second.compute_gradient().unwrap()(&point).unwrap();
        assert_eq!(gradients.len(), 1);
    }
}
