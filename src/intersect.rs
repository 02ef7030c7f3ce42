use crate::{
    classify::is_outside,
    grid::VoxelGrid,
    tables::{CUBE_EDGES, CUBE_EDGE_AXIS},
};
use glam::Vec3A;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub const NULL_CROSSING: u32 = u32::MAX;

/// Where the surface crosses the edge `p0 -> p1`, by linear interpolation of
/// the endpoint samples.
///
/// The interpolant is clamped to the edge so that nearly-equal samples can't
/// throw the point off the segment.
#[inline]
pub fn edge_crossing(p0: Vec3A, p1: Vec3A, v0: f32, v1: f32) -> Vec3A {
    let denom = v0 - v1;
    let t = if denom == 0.0 {
        0.5
    } else {
        (v0 / denom).clamp(0.0, 1.0)
    };
    p0 + t * (p1 - p0)
}

/// A lattice edge, named by its lower vertex and axis.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GridEdge {
    pub vertex: u32,
    pub axis: u8,
}

/// Every sign-changing lattice edge of a sampled grid and its crossing point.
///
/// Crossings are shared by the (up to 4) cubes around an edge, so each one is
/// computed once. Slots are assigned in lattice order: by lower vertex, then
/// axis.
#[derive(Clone, Debug, Default)]
pub struct EdgeCrossings {
    // `3 * vertex + axis` -> slot
    slots: Vec<u32>,
    edges: Vec<GridEdge>,
    positions: Vec<Vec3A>,
    normals: Vec<Vec3A>,
}

impl EdgeCrossings {
    pub fn compute(grid: &VoxelGrid, samples: &[f32]) -> Self {
        let num_vertices = grid.vertices().len();
        let find = |v: usize| vertex_crossings(grid, samples, v);
        #[cfg(feature = "parallel")]
        let found: Vec<[Option<Vec3A>; 3]> =
            (0..num_vertices).into_par_iter().map(find).collect();
        #[cfg(not(feature = "parallel"))]
        let found: Vec<[Option<Vec3A>; 3]> = (0..num_vertices).map(find).collect();

        let mut me = Self {
            slots: vec![NULL_CROSSING; 3 * num_vertices],
            ..Default::default()
        };
        for (v, axes) in found.into_iter().enumerate() {
            for (axis, crossing) in axes.into_iter().enumerate() {
                let Some(p) = crossing else { continue };
                me.slots[3 * v + axis] = me.positions.len() as u32;
                me.edges.push(GridEdge {
                    vertex: v as u32,
                    axis: axis as u8,
                });
                me.positions.push(p);
            }
        }

        me
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn edges(&self) -> &[GridEdge] {
        &self.edges
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3A] {
        &self.positions
    }

    /// Unit normals per crossing. Empty until [`Self::set_gradients`].
    #[inline]
    pub fn normals(&self) -> &[Vec3A] {
        &self.normals
    }

    #[inline]
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    /// Stores normalized gradients. A zero gradient stays zero and so
    /// contributes no plane to the QEF.
    pub fn set_gradients(&mut self, gradients: &[Vec3A]) {
        debug_assert_eq!(gradients.len(), self.positions.len());
        self.normals = gradients.iter().map(|g| g.normalize_or_zero()).collect();
    }

    #[inline]
    pub fn slot(&self, vertex: u32, axis: usize) -> Option<u32> {
        let s = self.slots[3 * vertex as usize + axis];
        (s != NULL_CROSSING).then_some(s)
    }

    /// Crossing slot of cube edge `edge` (an index into [`CUBE_EDGES`]).
    #[inline]
    pub fn cube_edge_slot(&self, cube_vertices: &[u32; 8], edge: usize) -> Option<u32> {
        let [c0, _] = CUBE_EDGES[edge];
        self.slot(cube_vertices[c0 as usize], CUBE_EDGE_AXIS[edge])
    }
}

/// Crossings on the three lattice edges leaving vertex `v` in the + direction.
fn vertex_crossings(grid: &VoxelGrid, samples: &[f32], v: usize) -> [Option<Vec3A>; 3] {
    let vertices = grid.vertices();
    let coords = grid.vertex_coords(v as u32);
    let (p0, d0) = (vertices[v], samples[v]);
    std::array::from_fn(|axis| {
        if coords[axis] == grid.resolution() {
            return None;
        }
        let mut next = coords;
        next[axis] += 1;
        let w = grid.vertex_index(next) as usize;
        let d1 = samples[w];
        (is_outside(d0) != is_outside(d1)).then(|| edge_crossing(p0, vertices[w], d0, d1))
    })
}
