//! Callback boundary for externally supplied signed distance fields.
//!
//! The extractor never evaluates geometry itself. It hands batches of points
//! to a [`ScalarField`] (and optionally a [`GradientField`]) and only checks
//! that what comes back has the right shape and is finite.

use crate::error::{ExtractError, ExtractResult};
use glam::Vec3A;

/// Maps a batch of points to signed distances.
///
/// Implementations must be deterministic and return exactly one value per
/// point. Negative values are inside the surface.
pub trait ScalarField: Sync {
    fn sample(&self, points: &[Vec3A]) -> Vec<f32>;
}

/// Maps a batch of points to SDF gradients.
///
/// Gradients need not be normalized.
pub trait GradientField: Sync {
    fn sample_gradients(&self, points: &[Vec3A]) -> Vec<Vec3A>;
}

impl<F> ScalarField for F
where
    F: Fn(&[Vec3A]) -> Vec<f32> + Sync,
{
    fn sample(&self, points: &[Vec3A]) -> Vec<f32> {
        self(points)
    }
}

impl<F> GradientField for F
where
    F: Fn(&[Vec3A]) -> Vec<Vec3A> + Sync,
{
    fn sample_gradients(&self, points: &[Vec3A]) -> Vec<Vec3A> {
        self(points)
    }
}

/// Adapts a per-point function into a batched field.
#[derive(Clone, Copy, Debug)]
pub struct Pointwise<F>(pub F);

impl<F> ScalarField for Pointwise<F>
where
    F: Fn(Vec3A) -> f32 + Sync,
{
    fn sample(&self, points: &[Vec3A]) -> Vec<f32> {
        points.iter().map(|&p| (self.0)(p)).collect()
    }
}

impl<F> GradientField for Pointwise<F>
where
    F: Fn(Vec3A) -> Vec3A + Sync,
{
    fn sample_gradients(&self, points: &[Vec3A]) -> Vec<Vec3A> {
        points.iter().map(|&p| (self.0)(p)).collect()
    }
}

/// Gradient of a [`ScalarField`] by central differencing.
///
/// Needs 6 field samples per point, all issued as one batch.
#[derive(Clone, Copy, Debug)]
pub struct CentralDifference<S> {
    pub field: S,
    /// Distance between the two taps on each axis.
    pub delta: f32,
}

impl<S> CentralDifference<S> {
    pub fn new(field: S, delta: f32) -> Self {
        Self { field, delta }
    }
}

impl<S: ScalarField> GradientField for CentralDifference<S> {
    fn sample_gradients(&self, points: &[Vec3A]) -> Vec<Vec3A> {
        let h = 0.5 * self.delta;
        let taps = [Vec3A::X * h, Vec3A::Y * h, Vec3A::Z * h];

        let mut stencil = Vec::with_capacity(points.len() * 6);
        for &p in points {
            for t in taps {
                stencil.push(p + t);
                stencil.push(p - t);
            }
        }

        let d = self.field.sample(&stencil);
        if d.len() != stencil.len() {
            // Let the caller's shape check report the bad batch.
            return Vec::new();
        }
        d.chunks_exact(6)
            .map(|s| Vec3A::new(s[0] - s[1], s[2] - s[3], s[4] - s[5]) / self.delta)
            .collect()
    }
}

pub(crate) fn check_scalars(field: &'static str, expected: usize, values: &[f32]) -> ExtractResult<()> {
    if values.len() != expected {
        return Err(ExtractError::BatchSize {
            field,
            expected,
            actual: values.len(),
        });
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(ExtractError::NonFiniteSample { field, index });
    }
    Ok(())
}

pub(crate) fn check_vectors(
    field: &'static str,
    expected: usize,
    values: &[Vec3A],
) -> ExtractResult<()> {
    if values.len() != expected {
        return Err(ExtractError::BatchSize {
            field,
            expected,
            actual: values.len(),
        });
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(ExtractError::NonFiniteSample { field, index });
    }
    Ok(())
}
