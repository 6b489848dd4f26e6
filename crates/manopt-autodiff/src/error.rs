//! Error types for differentiable function construction and evaluation.
//!
//! All wrapper-level errors are raised synchronously while a function is
//! being decorated or constructed. The only errors deferred to call time
//! are those produced by the compiled callables themselves (dimension
//! mismatches, unbound placeholders, non-scalar outputs), which the
//! wrapper forwards without interception.

use thiserror::Error;

/// Errors that can occur when wrapping or evaluating a cost function.
#[derive(Debug, Clone, Error)]
pub enum AutodiffError {
    /// The requested backend's runtime dependency is not present.
    ///
    /// Fatal and surfaced at decoration/construction time; never retried.
    #[error("Backend `{backend}' is not available")]
    BackendUnavailable {
        /// Display name of the backend
        backend: String,
    },

    /// The backend cannot process the given cost function.
    ///
    /// This error occurs when a backend is handed a cost source of a kind
    /// it does not understand, e.g. a graph backend given a plain callable.
    #[error("Backend `{backend}' is not compatible with cost function of type `{function_type}'")]
    BackendIncompatible {
        /// Display name of the backend
        backend: String,
        /// Runtime type of the cost function
        function_type: String,
    },

    /// A decorator was applied to a callable with an unsupported signature.
    ///
    /// The argument specification model only supports a fixed, ordered,
    /// purely positional parameter list.
    #[error("Invalid cost function signature: {reason}")]
    InvalidSignature {
        /// Description of what is wrong with the signature
        reason: String,
    },

    /// The backend compiles functions but cannot produce the requested
    /// derivative.
    #[error("Backend `{backend}' does not provide {derivative} computation")]
    DerivativeUnavailable {
        /// Display name of the backend
        backend: String,
        /// Name of the missing derivative ("gradient" or "Hessian")
        derivative: String,
    },

    /// Dimension mismatch between expected and supplied arguments.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions or arity
        expected: String,
        /// Actual dimensions or arity
        actual: String,
    },

    /// A graph placeholder was evaluated without a bound value.
    #[error("No value bound for placeholder `{name}'")]
    UnboundPlaceholder {
        /// Name or index of the unbound placeholder
        name: String,
    },

    /// A compiled cost function produced a non-scalar output.
    #[error("Cost function output must be a scalar, got a {rows}x{cols} tensor")]
    NonScalarOutput {
        /// Number of rows of the output
        rows: usize,
        /// Number of columns of the output
        cols: usize,
    },
}

impl AutodiffError {
    /// Create a `BackendUnavailable` error for the named backend.
    pub fn backend_unavailable<S: Into<String>>(backend: S) -> Self {
        Self::BackendUnavailable {
            backend: backend.into(),
        }
    }

    /// Create a `BackendIncompatible` error naming the backend and the
    /// runtime type of the rejected cost function.
    pub fn backend_incompatible<S1, S2>(backend: S1, function_type: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self::BackendIncompatible {
            backend: backend.into(),
            function_type: function_type.into(),
        }
    }

    /// Create an `InvalidSignature` error with a custom reason.
    pub fn invalid_signature<S: Into<String>>(reason: S) -> Self {
        Self::InvalidSignature {
            reason: reason.into(),
        }
    }

    /// Create a `DerivativeUnavailable` error.
    pub fn derivative_unavailable<S1, S2>(backend: S1, derivative: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self::DerivativeUnavailable {
            backend: backend.into(),
            derivative: derivative.into(),
        }
    }

    /// Create a `DimensionMismatch` error.
    pub fn dimension_mismatch<S1, S2>(expected: S1, actual: S2) -> Self
    where
        S1: std::fmt::Display,
        S2: std::fmt::Display,
    {
        Self::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an `UnboundPlaceholder` error.
    pub fn unbound_placeholder<S: std::fmt::Display>(name: S) -> Self {
        Self::UnboundPlaceholder {
            name: name.to_string(),
        }
    }

    /// Create a `NonScalarOutput` error for the given output shape.
    pub fn non_scalar_output(rows: usize, cols: usize) -> Self {
        Self::NonScalarOutput { rows, cols }
    }
}

/// Result type alias for operations that can produce `AutodiffError`.
pub type Result<T> = std::result::Result<T, AutodiffError>;
