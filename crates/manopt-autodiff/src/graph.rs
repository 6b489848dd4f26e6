//! Symbolic expressions for graph-style cost functions.
//!
//! Graph backends do not trace the user's closure at every evaluation;
//! instead the closure runs exactly once, at decoration time, over
//! placeholder inputs, and returns an expression describing the
//! computation. The [`Expr`] type is that symbolic object: a small
//! immutable tree of tensor operations over placeholders and constants,
//! evaluated by binding tensors to placeholder ids.
//!
//! Expressions only know how to evaluate forward; differentiating a
//! graph-built cost is the owning backend's concern.

use crate::error::{AutodiffError, Result};
use crate::types::Tensor;
use std::collections::HashMap;
use std::fmt;
use std::ops;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Unique identifier for placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaceholderId(usize);

impl fmt::Display for PlaceholderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Placeholder{}", self.0)
    }
}

static NEXT_PLACEHOLDER_ID: AtomicUsize = AtomicUsize::new(0);

fn new_placeholder_id() -> PlaceholderId {
    PlaceholderId(NEXT_PLACEHOLDER_ID.fetch_add(1, Ordering::Relaxed))
}

/// Tensor bindings for placeholder evaluation.
pub type Bindings = HashMap<PlaceholderId, Tensor>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum UnaryOp {
    Negate,
    Transpose,
    Sum,
    NormSquared,
    Scale(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Subtract,
    MatMul,
    ComponentMul,
    Dot,
}

#[derive(Debug)]
enum ExprNode {
    Placeholder {
        id: PlaceholderId,
        rows: usize,
        cols: usize,
        name: Option<String>,
    },
    Constant(Tensor),
    Unary {
        op: UnaryOp,
        input: Expr,
    },
    Binary {
        op: BinaryOp,
        lhs: Expr,
        rhs: Expr,
    },
}

/// A symbolic tensor expression.
///
/// Cheap to clone; clones share the underlying tree.
#[derive(Debug, Clone)]
pub struct Expr {
    node: Rc<ExprNode>,
}

impl Expr {
    fn from_node(node: ExprNode) -> Self {
        Self {
            node: Rc::new(node),
        }
    }

    /// Creates a fresh placeholder for a tensor of the given shape.
    pub fn placeholder(rows: usize, cols: usize) -> Self {
        Self::from_node(ExprNode::Placeholder {
            id: new_placeholder_id(),
            rows,
            cols,
            name: None,
        })
    }

    /// Creates a fresh named placeholder.
    pub fn named_placeholder(rows: usize, cols: usize, name: impl Into<String>) -> Self {
        Self::from_node(ExprNode::Placeholder {
            id: new_placeholder_id(),
            rows,
            cols,
            name: Some(name.into()),
        })
    }

    /// Wraps a constant tensor.
    pub fn constant(value: Tensor) -> Self {
        Self::from_node(ExprNode::Constant(value))
    }

    /// Wraps a scalar constant as a `1x1` tensor.
    pub fn scalar(value: f64) -> Self {
        Self::constant(Tensor::from_element(1, 1, value))
    }

    /// The placeholder id, if this expression is a placeholder.
    pub fn placeholder_id(&self) -> Option<PlaceholderId> {
        match self.node.as_ref() {
            ExprNode::Placeholder { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// The declared shape, if this expression is a placeholder.
    pub fn placeholder_shape(&self) -> Option<(usize, usize)> {
        match self.node.as_ref() {
            ExprNode::Placeholder { rows, cols, .. } => Some((*rows, *cols)),
            _ => None,
        }
    }

    /// Matrix transpose.
    pub fn transpose(&self) -> Self {
        Self::from_node(ExprNode::Unary {
            op: UnaryOp::Transpose,
            input: self.clone(),
        })
    }

    /// Sum of all entries, as a `1x1` tensor.
    pub fn sum(&self) -> Self {
        Self::from_node(ExprNode::Unary {
            op: UnaryOp::Sum,
            input: self.clone(),
        })
    }

    /// Squared Frobenius norm, as a `1x1` tensor.
    pub fn norm_squared(&self) -> Self {
        Self::from_node(ExprNode::Unary {
            op: UnaryOp::NormSquared,
            input: self.clone(),
        })
    }

    /// Multiplication by a scalar constant.
    pub fn scale(&self, factor: f64) -> Self {
        Self::from_node(ExprNode::Unary {
            op: UnaryOp::Scale(factor),
            input: self.clone(),
        })
    }

    /// Element-wise product.
    pub fn component_mul(&self, other: &Self) -> Self {
        Self::from_node(ExprNode::Binary {
            op: BinaryOp::ComponentMul,
            lhs: self.clone(),
            rhs: other.clone(),
        })
    }

    /// Matrix product.
    pub fn matmul(&self, other: &Self) -> Self {
        Self::from_node(ExprNode::Binary {
            op: BinaryOp::MatMul,
            lhs: self.clone(),
            rhs: other.clone(),
        })
    }

    /// Inner product of two same-shaped tensors, as a `1x1` tensor.
    pub fn dot(&self, other: &Self) -> Self {
        Self::from_node(ExprNode::Binary {
            op: BinaryOp::Dot,
            lhs: self.clone(),
            rhs: other.clone(),
        })
    }

    /// Evaluates the expression under the given placeholder bindings.
    ///
    /// # Errors
    ///
    /// - [`AutodiffError::UnboundPlaceholder`] if a placeholder has no
    ///   bound tensor.
    /// - [`AutodiffError::DimensionMismatch`] if a binding or an operand
    ///   pair has an incompatible shape.
    pub fn eval(&self, bindings: &Bindings) -> Result<Tensor> {
        match self.node.as_ref() {
            ExprNode::Placeholder {
                id,
                rows,
                cols,
                name,
            } => {
                let value = bindings.get(id).ok_or_else(|| {
                    AutodiffError::unbound_placeholder(
                        name.clone().unwrap_or_else(|| id.to_string()),
                    )
                })?;
                if value.shape() != (*rows, *cols) {
                    return Err(AutodiffError::dimension_mismatch(
                        format!("({rows}, {cols})"),
                        format!("{:?}", value.shape()),
                    ));
                }
                Ok(value.clone())
            }
            ExprNode::Constant(value) => Ok(value.clone()),
            ExprNode::Unary { op, input } => {
                let value = input.eval(bindings)?;
                Ok(match op {
                    UnaryOp::Negate => -value,
                    UnaryOp::Transpose => value.transpose(),
                    UnaryOp::Sum => Tensor::from_element(1, 1, value.sum()),
                    UnaryOp::NormSquared => Tensor::from_element(1, 1, value.norm_squared()),
                    UnaryOp::Scale(factor) => value * *factor,
                })
            }
            ExprNode::Binary { op, lhs, rhs } => {
                let left = lhs.eval(bindings)?;
                let right = rhs.eval(bindings)?;
                match op {
                    BinaryOp::Add | BinaryOp::Subtract | BinaryOp::ComponentMul | BinaryOp::Dot
                        if left.shape() != right.shape() =>
                    {
                        Err(AutodiffError::dimension_mismatch(
                            format!("{:?}", left.shape()),
                            format!("{:?}", right.shape()),
                        ))
                    }
                    BinaryOp::MatMul if left.ncols() != right.nrows() => {
                        Err(AutodiffError::dimension_mismatch(
                            format!("inner dimension {}", left.ncols()),
                            right.nrows(),
                        ))
                    }
                    BinaryOp::Add => Ok(left + right),
                    BinaryOp::Subtract => Ok(left - right),
                    BinaryOp::MatMul => Ok(left * right),
                    BinaryOp::ComponentMul => Ok(left.component_mul(&right)),
                    BinaryOp::Dot => Ok(Tensor::from_element(
                        1,
                        1,
                        left.component_mul(&right).sum(),
                    )),
                }
            }
        }
    }
}

impl ops::Add for &Expr {
    type Output = Expr;

    fn add(self, rhs: &Expr) -> Expr {
        Expr::from_node(ExprNode::Binary {
            op: BinaryOp::Add,
            lhs: self.clone(),
            rhs: rhs.clone(),
        })
    }
}

impl ops::Sub for &Expr {
    type Output = Expr;

    fn sub(self, rhs: &Expr) -> Expr {
        Expr::from_node(ExprNode::Binary {
            op: BinaryOp::Subtract,
            lhs: self.clone(),
            rhs: rhs.clone(),
        })
    }
}

/// Matrix product, consistent with `nalgebra`'s `*`.
impl ops::Mul for &Expr {
    type Output = Expr;

    fn mul(self, rhs: &Expr) -> Expr {
        self.matmul(rhs)
    }
}

impl ops::Mul<f64> for &Expr {
    type Output = Expr;

    fn mul(self, factor: f64) -> Expr {
        self.scale(factor)
    }
}

impl ops::Neg for &Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::from_node(ExprNode::Unary {
            op: UnaryOp::Negate,
            input: self.clone(),
        })
    }
}
