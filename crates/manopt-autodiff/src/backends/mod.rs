//! Shipped backend implementations.
//!
//! - [`direct`]: plain evaluation, no derivatives.
//! - [`numerical`]: direct evaluation with finite-difference derivatives.
//! - [`graph`]: evaluation of symbolic expression graphs, with
//!   finite-difference derivatives over the compiled evaluator.
//!
//! None of these implements an automatic-differentiation algorithm; an AD
//! engine plugs in through the same [`Backend`](crate::backend::Backend)
//! trait.

pub mod direct;
pub mod graph;
pub mod numerical;

pub use direct::DirectBackend;
pub use graph::{GraphEvalBackend, GraphEvalOptions};
pub use numerical::NumericalBackend;
