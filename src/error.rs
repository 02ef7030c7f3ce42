//! Error types for iso-surface extraction.

use thiserror::Error;

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors that abort an extraction.
///
/// Rank-deficient QEFs and non-manifold edges are recovered locally and only
/// show up in [`ExtractStats`](crate::ExtractStats).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractError {
    /// Grid resolution must be positive and at most [`MAX_RESOLUTION`](crate::MAX_RESOLUTION).
    #[error("invalid grid resolution {0}: must be in 1..=1024")]
    InvalidResolution(i64),

    /// A cube with mixed corner signs produced no edge crossings.
    #[error("cube {cube} is active but has no crossing edges")]
    DegenerateCube {
        /// Linear cube index.
        cube: usize,
    },

    /// A field callback returned a batch of the wrong length.
    #[error("{field} callback returned {actual} values for {expected} points")]
    BatchSize {
        /// Which callback misbehaved.
        field: &'static str,
        /// Number of points passed in.
        expected: usize,
        /// Number of values returned.
        actual: usize,
    },

    /// A field callback returned NaN or infinity.
    #[error("{field} callback returned a non-finite value at index {index}")]
    NonFiniteSample {
        /// Which callback misbehaved.
        field: &'static str,
        /// Index into the batch.
        index: usize,
    },
}
