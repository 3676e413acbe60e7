//! Error types for the polysmooth crate.

use thiserror::Error;

/// Main error type for polysmooth operations.
///
/// Localized topology problems (a non-manifold face, a crease tag naming a
/// missing edge) are *not* errors: they are reported on the warning channel
/// and the offending element is skipped. Only conditions that prevent
/// producing a consistent result surface here.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to create a topology refiner.
    #[error("Failed to create topology refiner")]
    CreateTopologyRefinerFailed,

    /// Stencil evaluation failed.
    #[error("Stencil evaluation failed")]
    EvalStencilsFailed,

    /// Invalid topology descriptor.
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// A parameter was outside its documented domain.
    #[error("Parameter {name} out of range: {value}")]
    ParameterOutOfRange { name: &'static str, value: i64 },

    /// Index out of bounds.
    #[error("Index {index} out of bounds (max: {max})")]
    IndexOutOfBounds { index: usize, max: usize },

    /// Invalid buffer size.
    #[error("Invalid buffer size: expected {expected}, got {actual}")]
    InvalidBufferSize { expected: usize, actual: usize },

    /// Inconsistent internal buffer sizing discovered mid-request.
    #[error("Internal buffer inconsistency: {0}")]
    InternalInconsistency(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
