//! Signature inspection for user cost callables.
//!
//! The bare decorator form needs to know a callable's fixed positional
//! parameter list to build the argument specification automatically. Rust
//! has no runtime reflection, so the parameter list is recovered through
//! the [`IntoCost`] trait instead: one implementation per supported closure
//! arity reports synthesized parameter names, while the slice-based form
//! `Fn(&[Tensor]) -> f64` is the crate's variadic signature and reports no
//! fixed parameter list at all, which makes the bare form reject it.
//!
//! The `Args` marker parameter only disambiguates the closure shapes; it
//! carries no data.

use crate::error::{AutodiffError, Result};
use crate::types::{CostFn, Tensor};
use std::rc::Rc;

/// Conversion from a user closure into a positional cost callable.
pub trait IntoCost<Args> {
    /// The callable's fixed positional parameter names, or `None` if the
    /// callable is variadic.
    fn parameters() -> Option<Vec<String>>;

    /// Adapts the closure to the uniform slot-based calling convention.
    ///
    /// The adapter checks the slot count at call time and surfaces a
    /// [`AutodiffError::DimensionMismatch`] on arity violations.
    fn into_cost(self) -> CostFn;
}

fn check_arity(expected: usize, slots: &[Tensor]) -> Result<()> {
    if slots.len() == expected {
        Ok(())
    } else {
        Err(AutodiffError::dimension_mismatch(
            format!("{expected} positional arguments"),
            slots.len(),
        ))
    }
}

impl<F> IntoCost<(Tensor,)> for F
where
    F: Fn(&Tensor) -> f64 + 'static,
{
    fn parameters() -> Option<Vec<String>> {
        Some(vec!["x".to_string()])
    }

    fn into_cost(self) -> CostFn {
        Rc::new(move |slots: &[Tensor]| {
            check_arity(1, slots)?;
            Ok(self(&slots[0]))
        })
    }
}

impl<F> IntoCost<(Tensor, Tensor)> for F
where
    F: Fn(&Tensor, &Tensor) -> f64 + 'static,
{
    fn parameters() -> Option<Vec<String>> {
        Some(vec!["x".to_string(), "y".to_string()])
    }

    fn into_cost(self) -> CostFn {
        Rc::new(move |slots: &[Tensor]| {
            check_arity(2, slots)?;
            Ok(self(&slots[0], &slots[1]))
        })
    }
}

impl<F> IntoCost<(Tensor, Tensor, Tensor)> for F
where
    F: Fn(&Tensor, &Tensor, &Tensor) -> f64 + 'static,
{
    fn parameters() -> Option<Vec<String>> {
        Some(vec!["x".to_string(), "y".to_string(), "z".to_string()])
    }

    fn into_cost(self) -> CostFn {
        Rc::new(move |slots: &[Tensor]| {
            check_arity(3, slots)?;
            Ok(self(&slots[0], &slots[1], &slots[2]))
        })
    }
}

impl<F> IntoCost<(Tensor, Tensor, Tensor, Tensor)> for F
where
    F: Fn(&Tensor, &Tensor, &Tensor, &Tensor) -> f64 + 'static,
{
    fn parameters() -> Option<Vec<String>> {
        Some(vec![
            "x".to_string(),
            "y".to_string(),
            "z".to_string(),
            "w".to_string(),
        ])
    }

    fn into_cost(self) -> CostFn {
        Rc::new(move |slots: &[Tensor]| {
            check_arity(4, slots)?;
            Ok(self(&slots[0], &slots[1], &slots[2], &slots[3]))
        })
    }
}

/// Variadic form: no fixed parameter list.
impl<F> IntoCost<Vec<Tensor>> for F
where
    F: Fn(&[Tensor]) -> f64 + 'static,
{
    fn parameters() -> Option<Vec<String>> {
        None
    }

    fn into_cost(self) -> CostFn {
        Rc::new(move |slots: &[Tensor]| Ok(self(slots)))
    }
}
