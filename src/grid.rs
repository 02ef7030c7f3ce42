use crate::{
    error::{ExtractError, ExtractResult},
    field::{check_scalars, ScalarField},
    tables::CUBE_CORNER_OFFSETS,
};
use glam::Vec3A;
use ilattice::extent::Extent;

/// Largest supported resolution. Keeps every vertex index within `u32`.
pub const MAX_RESOLUTION: u32 = 1024;

/// A regular cube lattice over an axis-aligned domain.
///
/// Vertices are stored X-fastest: `i + (R+1) * (j + (R+1) * k)`. Cubes use the
/// same layout with `R` per axis, and list their corners in Z order (see
/// [`CUBE_CORNER_OFFSETS`]).
#[derive(Clone, Debug)]
pub struct VoxelGrid {
    resolution: u32,
    domain: Extent<Vec3A>,
    vertices: Vec<Vec3A>,
    cubes: Vec<[u32; 8]>,
}

impl VoxelGrid {
    /// The default domain, `[-1, 1]^3`.
    pub fn default_domain() -> Extent<Vec3A> {
        Extent::from_min_and_shape(Vec3A::splat(-1.0), Vec3A::splat(2.0))
    }

    /// Builds an `R^3` grid over `[-1, 1]^3`.
    pub fn new(resolution: i64) -> ExtractResult<Self> {
        Self::with_domain(resolution, Self::default_domain())
    }

    pub fn with_domain(resolution: i64, domain: Extent<Vec3A>) -> ExtractResult<Self> {
        if resolution <= 0 || resolution > i64::from(MAX_RESOLUTION) {
            return Err(ExtractError::InvalidResolution(resolution));
        }
        let r = resolution as u32;
        let n = r + 1;

        let step = domain.shape / r as f32;
        let mut vertices = Vec::with_capacity((n * n * n) as usize);
        for k in 0..n {
            for j in 0..n {
                for i in 0..n {
                    vertices.push(domain.minimum + step * Vec3A::new(i as f32, j as f32, k as f32));
                }
            }
        }

        let mut cubes = Vec::with_capacity((r * r * r) as usize);
        for z in 0..r {
            for y in 0..r {
                for x in 0..r {
                    cubes.push(
                        CUBE_CORNER_OFFSETS
                            .map(|[dx, dy, dz]| linearize(n, [x + dx, y + dy, z + dz])),
                    );
                }
            }
        }

        Ok(Self {
            resolution: r,
            domain,
            vertices,
            cubes,
        })
    }

    #[inline]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    #[inline]
    pub fn domain(&self) -> &Extent<Vec3A> {
        &self.domain
    }

    /// Edge length of one voxel along each axis.
    #[inline]
    pub fn voxel_size(&self) -> Vec3A {
        self.domain.shape / self.resolution as f32
    }

    #[inline]
    pub fn vertices(&self) -> &[Vec3A] {
        &self.vertices
    }

    #[inline]
    pub fn cubes(&self) -> &[[u32; 8]] {
        &self.cubes
    }

    #[inline]
    pub fn num_cubes(&self) -> usize {
        self.cubes.len()
    }

    #[inline]
    pub fn vertex_index(&self, coords: [u32; 3]) -> u32 {
        linearize(self.resolution + 1, coords)
    }

    #[inline]
    pub fn vertex_coords(&self, index: u32) -> [u32; 3] {
        delinearize(self.resolution + 1, index)
    }

    #[inline]
    pub fn cube_index(&self, coords: [u32; 3]) -> u32 {
        linearize(self.resolution, coords)
    }

    #[inline]
    pub fn cube_coords(&self, index: u32) -> [u32; 3] {
        delinearize(self.resolution, index)
    }

    /// Evaluates `field` at every vertex in a single batch.
    pub fn sample(&self, field: &impl ScalarField) -> ExtractResult<Vec<f32>> {
        let values = field.sample(&self.vertices);
        check_scalars("sdf", self.vertices.len(), &values)?;
        Ok(values)
    }

    /// The 8 corner samples of `cube`.
    #[inline]
    pub fn cube_samples(&self, samples: &[f32], cube: usize) -> [f32; 8] {
        self.cubes[cube].map(|v| samples[v as usize])
    }

    #[inline]
    pub fn cube_corners(&self, cube: usize) -> [Vec3A; 8] {
        self.cubes[cube].map(|v| self.vertices[v as usize])
    }

    /// Axis-aligned bounds of `cube`.
    pub fn cube_extent(&self, cube: usize) -> Extent<Vec3A> {
        let corners = &self.cubes[cube];
        let min = self.vertices[corners[0] as usize];
        let max = self.vertices[corners[7] as usize];
        Extent::from_min_and_shape(min, max - min)
    }

    /// Gradient of the sampled field at a lattice vertex, estimated with
    /// central differences (one-sided on the domain boundary).
    pub fn lattice_gradient(&self, samples: &[f32], coords: [u32; 3]) -> Vec3A {
        let step = self.voxel_size();
        let mut grad = [0.0; 3];
        for (axis, g) in grad.iter_mut().enumerate() {
            let lo = coords[axis].saturating_sub(1);
            let hi = (coords[axis] + 1).min(self.resolution);
            let mut c_lo = coords;
            let mut c_hi = coords;
            c_lo[axis] = lo;
            c_hi[axis] = hi;
            let d_lo = samples[self.vertex_index(c_lo) as usize];
            let d_hi = samples[self.vertex_index(c_hi) as usize];
            *g = (d_hi - d_lo) / ((hi - lo) as f32 * step[axis]);
        }
        Vec3A::from(grad)
    }
}

#[inline]
fn linearize(stride: u32, [x, y, z]: [u32; 3]) -> u32 {
    x + stride * (y + stride * z)
}

#[inline]
fn delinearize(stride: u32, index: u32) -> [u32; 3] {
    let x = index % stride;
    let yz = index / stride;
    [x, yz % stride, yz / stride]
}
