//! Backend-agnostic differentiable cost functions for Riemannian
//! optimization.
//!
//! This crate wraps user-supplied numeric cost functions so that an
//! optimizer can request compiled evaluation, gradients, and
//! Hessian-vector products without knowing which differentiation engine
//! produced them.
//!
//! # Architecture
//!
//! The wrapper is built around three core pieces:
//!
//! 1. **`DifferentiableFunction`**: binds a cost source, an argument
//!    specification, and one exclusively owned backend; compiled eagerly,
//!    differentiated lazily with each derivative cached once
//! 2. **Decorator factories**: tracing style (name-based binding, bare or
//!    grouped) and graph style (eager build over flattened placeholders)
//! 3. **`Backend`**: the capability trait differentiation engines
//!    implement; selected per function at decoration time
//!
//! # Example
//!
//! ```
//! use manopt_autodiff::prelude::*;
//!
//! let function = make_tracing_function::<NumericalBackend, _, _>(
//!     |x: &Tensor| x.norm_squared(),
//! )?;
//!
//! let point = vec![Tensor::from_column_slice(3, 1, &[1.0, 2.0, 2.0])];
//! assert_eq!(function.call(&point)?, 9.0);
//!
//! let gradient = function.compute_gradient()?;
//! let gradients = gradient(&point)?;
//! assert_eq!(gradients.len(), 1);
//! # Ok::<(), manopt_autodiff::AutodiffError>(())
//! ```

pub mod argspec;
pub mod backend;
pub mod backends;
pub mod decorator;
pub mod error;
pub mod function;
pub mod graph;
pub mod numerical;
pub mod signature;
pub mod types;

// Re-export key types
pub use argspec::{flatten_arguments, Arg, ArgSpec};
pub use backend::{Backend, GraphBackend};
pub use backends::{DirectBackend, GraphEvalBackend, GraphEvalOptions, NumericalBackend};
pub use decorator::{
    make_graph_function, make_tracing_function, make_tracing_function_with_args,
};
pub use error::{AutodiffError, Result};
pub use function::{CostSource, DifferentiableFunction};
pub use graph::{Expr, PlaceholderId};
pub use signature::IntoCost;
pub use types::{CompiledFn, CostFn, GradientFn, HessianFn, Tensor};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::argspec::{flatten_arguments, Arg, ArgSpec};
    pub use crate::backend::{Backend, GraphBackend};
    pub use crate::backends::{
        DirectBackend, GraphEvalBackend, GraphEvalOptions, NumericalBackend,
    };
    pub use crate::decorator::{
        make_graph_function, make_tracing_function, make_tracing_function_with_args,
    };
    pub use crate::error::{AutodiffError, Result};
    pub use crate::function::{CostSource, DifferentiableFunction};
    pub use crate::graph::Expr;
    pub use crate::types::Tensor;
}
