use crate::{
    grid::VoxelGrid,
    intersect::EdgeCrossings,
    mesh::{MeshVertexId, NULL_MESH_VERTEX_ID},
    params::{ExtractParams, QuadSplit},
    tables::ORTHOGONAL_AXES,
};
use glam::Vec3A;

/// Which diagonal of a dual quad becomes the shared triangle edge.
///
/// Quad corners are numbered by the cube they come from, relative to the
/// cube `q` whose minimal corner starts the lattice edge:
///
/// ```text
///   0: q          2: q - c
///   1: q - b      3: q - b - c
/// ```
///
/// where `(a, b, c)` is the edge axis followed by its two orthogonal axes in
/// right-handed order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Diagonal {
    /// `0 - 3`, through the edge's own cube.
    Own,
    /// `1 - 2`.
    Cross,
}

impl Diagonal {
    /// The two triangles of this split, as quad corner indices, wound
    /// counter-clockwise around `+a` (or clockwise if `flip`).
    pub fn triangles(self, flip: bool) -> [[usize; 3]; 2] {
        let tris = match self {
            Self::Own => [[0, 1, 3], [0, 3, 2]],
            Self::Cross => [[1, 3, 2], [1, 2, 0]],
        };
        if flip {
            tris.map(|[i, j, k]| [i, k, j])
        } else {
            tris
        }
    }
}

/// Counters from one face building pass.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FaceStats {
    pub quads: usize,
    /// Crossing edges on the domain boundary, which have fewer than 4 cubes.
    pub boundary_edges: usize,
    pub degenerate_triangles: usize,
}

/// Connects the dual vertices around every interior sign-changing lattice
/// edge.
///
/// `cube_vertex` maps each cube to its dual vertex, or
/// [`NULL_MESH_VERTEX_ID`] if inactive. Triangles face toward positive SDF.
pub fn build_faces(
    grid: &VoxelGrid,
    samples: &[f32],
    crossings: &EdgeCrossings,
    cube_vertex: &[MeshVertexId],
    positions: &[Vec3A],
    params: &ExtractParams,
) -> (Vec<[MeshVertexId; 3]>, FaceStats) {
    let r = grid.resolution();
    let mut stats = FaceStats::default();
    let mut triangles = Vec::with_capacity(2 * crossings.len());

    for (slot, edge) in crossings.edges().iter().enumerate() {
        let a = edge.axis as usize;
        let [b, c] = ORTHOGONAL_AXES[a];
        let start = grid.vertex_coords(edge.vertex);
        if start[b] == 0 || start[b] == r || start[c] == 0 || start[c] == r {
            stats.boundary_edges += 1;
            continue;
        }

        let mut quad_cubes = [start; 4];
        quad_cubes[1][b] -= 1;
        quad_cubes[2][c] -= 1;
        quad_cubes[3][b] -= 1;
        quad_cubes[3][c] -= 1;
        let quad = quad_cubes.map(|q| cube_vertex[grid.cube_index(q) as usize]);
        if quad.contains(&NULL_MESH_VERTEX_ID) {
            // Unreachable: every cube around a crossing edge is active.
            continue;
        }
        stats.quads += 1;

        let mut end = start;
        end[a] += 1;
        let d0 = samples[edge.vertex as usize];
        let d1 = samples[grid.vertex_index(end) as usize];
        // Outward is toward the positive end of the edge.
        let flip = d0 >= 0.0;

        let quad_positions = quad.map(|v| positions[v as usize]);
        let diagonal = match params.quad_split {
            QuadSplit::Fixed => Diagonal::Own,
            QuadSplit::ShortestDiagonal => shortest_diagonal(&quad_positions),
            QuadSplit::GradientAligned => {
                let normal = if crossings.has_normals() {
                    crossings.normals()[slot]
                } else {
                    let t = (d0 / (d0 - d1)).clamp(0.0, 1.0);
                    grid.lattice_gradient(samples, start)
                        .lerp(grid.lattice_gradient(samples, end), t)
                        .normalize_or_zero()
                };
                gradient_aligned_diagonal(
                    &quad_positions,
                    normal,
                    flip,
                    params.split_tie_tolerance,
                )
            }
        };

        for tri in diagonal.triangles(flip) {
            let tri = tri.map(|i| quad[i]);
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                stats.degenerate_triangles += 1;
                continue;
            }
            triangles.push(tri);
        }
    }

    (triangles, stats)
}

/// Splits along the shorter diagonal, preferring [`Diagonal::Own`] on ties.
pub fn shortest_diagonal(quad: &[Vec3A; 4]) -> Diagonal {
    if quad[1].distance_squared(quad[2]) < quad[0].distance_squared(quad[3]) {
        Diagonal::Cross
    } else {
        Diagonal::Own
    }
}

/// Picks the split whose less-aligned triangle agrees best with `normal`.
///
/// Each split is scored by `min(n · t̂)` over its two unit triangle normals.
/// Scores closer than `tie_tolerance` (or a zero `normal`) fall back to
/// [`shortest_diagonal`].
pub fn gradient_aligned_diagonal(
    quad: &[Vec3A; 4],
    normal: Vec3A,
    flip: bool,
    tie_tolerance: f32,
) -> Diagonal {
    if normal == Vec3A::ZERO {
        return shortest_diagonal(quad);
    }

    let score = |diagonal: Diagonal| {
        diagonal
            .triangles(flip)
            .map(|[i, j, k]| {
                let n = (quad[j] - quad[i]).cross(quad[k] - quad[i]);
                normal.dot(n.normalize_or_zero())
            })
            .into_iter()
            .fold(f32::INFINITY, f32::min)
    };

    let own = score(Diagonal::Own);
    let cross = score(Diagonal::Cross);
    if (own - cross).abs() < tie_tolerance {
        shortest_diagonal(quad)
    } else if own > cross {
        Diagonal::Own
    } else {
        Diagonal::Cross
    }
}
