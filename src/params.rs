//! Extraction parameters.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How rank-deficient QEFs are regularized in gradient mode.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum QefRegularization {
    /// Pseudo-inverse about the crossing centroid. Singular values of `AᵀA`
    /// at or below the cutoff are dropped. Normals are unit length, so the
    /// cutoff is relative to one plane's contribution.
    TruncatedSvd { singular_value_cutoff: f32 },

    /// Isotropic probabilistic planes (Trettner & Kobbelt). Always
    /// nonsingular.
    Probabilistic {
        /// Position uncertainty as a fraction of the voxel size. Isotropic
        /// position noise only raises the residual ([`Qef::error`]); it never
        /// moves the minimizer.
        ///
        /// [`Qef::error`]: crate::Qef::error
        position_stddev: f32,
        /// Normal uncertainty. Larger values pull the vertex toward the
        /// crossing points.
        normal_stddev: f32,
    },
}

impl Default for QefRegularization {
    fn default() -> Self {
        Self::TruncatedSvd {
            singular_value_cutoff: 0.1,
        }
    }
}

/// How each dual quad is cut into two triangles.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum QuadSplit {
    /// Pick the split whose triangle normals agree best with the field normal
    /// at the shared edge (the worse of the two triangles decides). Near-ties
    /// fall back to [`QuadSplit::ShortestDiagonal`].
    #[default]
    GradientAligned,
    /// Split along the shorter diagonal.
    ShortestDiagonal,
    /// Always split along the diagonal through the edge's own cube.
    Fixed,
}

/// Parameters for [`extract_surface`](crate::extract_surface).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExtractParams {
    /// Gradient mode only.
    pub regularization: QefRegularization,

    pub quad_split: QuadSplit,

    /// Clamp gradient-mode vertices to their cube.
    pub clamp_to_cell: bool,

    /// Score difference below which [`QuadSplit::GradientAligned`] treats the
    /// two splits as equal.
    pub split_tie_tolerance: f32,
}

impl Default for ExtractParams {
    fn default() -> Self {
        Self {
            regularization: QefRegularization::default(),
            quad_split: QuadSplit::default(),
            clamp_to_cell: true,
            split_tie_tolerance: 1e-4,
        }
    }
}

impl ExtractParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_regularization(mut self, regularization: QefRegularization) -> Self {
        self.regularization = regularization;
        self
    }

    #[must_use]
    pub const fn with_quad_split(mut self, quad_split: QuadSplit) -> Self {
        self.quad_split = quad_split;
        self
    }

    #[must_use]
    pub const fn with_clamp_to_cell(mut self, clamp: bool) -> Self {
        self.clamp_to_cell = clamp;
        self
    }

    #[must_use]
    pub const fn with_split_tie_tolerance(mut self, tolerance: f32) -> Self {
        self.split_tie_tolerance = tolerance;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let params = ExtractParams::default();
        assert_eq!(
            params.regularization,
            QefRegularization::TruncatedSvd {
                singular_value_cutoff: 0.1
            }
        );
        assert_eq!(params.quad_split, QuadSplit::GradientAligned);
        assert!(params.clamp_to_cell);
    }

    #[test]
    fn builder_overrides() {
        let params = ExtractParams::new()
            .with_quad_split(QuadSplit::Fixed)
            .with_clamp_to_cell(false)
            .with_split_tie_tolerance(0.5);
        assert_eq!(params.quad_split, QuadSplit::Fixed);
        assert!(!params.clamp_to_cell);
        assert_eq!(params.split_tie_tolerance, 0.5);
    }
}
