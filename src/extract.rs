use crate::{
    classify::SignMask,
    error::ExtractResult,
    faces::build_faces,
    field::{check_scalars, check_vectors, GradientField, ScalarField},
    grid::VoxelGrid,
    intersect::EdgeCrossings,
    mesh::{IsoMesh, MeshVertexId, NULL_MESH_VERTEX_ID},
    params::ExtractParams,
    solve::{solve_dual_vertex, DualVertex},
};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Per-cube record kept for debugging and visualization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubeInfo {
    pub mask: SignMask,
    /// [`NULL_MESH_VERTEX_ID`] for inactive cubes.
    pub vertex: MeshVertexId,
    pub num_crossings: u8,
    pub qef_rank: u8,
}

impl CubeInfo {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.vertex != NULL_MESH_VERTEX_ID
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ExtractStats {
    pub active_cubes: usize,
    pub edge_crossings: usize,
    /// Gradient mode cubes whose QEF had fewer than 3 independent planes.
    pub rank_deficient_cubes: usize,
    pub quads: usize,
    /// Crossing edges on the domain boundary, left open.
    pub boundary_edges: usize,
    /// Mesh edges used by more than two triangles.
    pub non_manifold_edges: usize,
}

#[derive(Clone, Debug, Default)]
pub struct Extraction {
    pub mesh: IsoMesh,
    /// One record per grid cube, in cube order.
    pub cubes: Vec<CubeInfo>,
    pub stats: ExtractStats,
}

/// Samples `field` over the grid, then runs [`extract_surface`].
pub fn extract_from_field(
    grid: &VoxelGrid,
    field: &impl ScalarField,
    gradient: Option<&dyn GradientField>,
    params: &ExtractParams,
) -> ExtractResult<Extraction> {
    let samples = grid.sample(field)?;
    extract_surface(grid, &samples, gradient, params)
}

/// Extracts the zero iso-surface of `samples` (one per grid vertex).
///
/// Without `gradient`, each dual vertex is the centroid of its cube's edge
/// crossings. With `gradient`, the callback is evaluated once, in a single
/// batch, at every edge crossing and each dual vertex minimizes the QEF of
/// the resulting tangent planes.
///
/// Output is deterministic: vertices are numbered in cube order and
/// triangles in lattice edge order.
pub fn extract_surface(
    grid: &VoxelGrid,
    samples: &[f32],
    gradient: Option<&dyn GradientField>,
    params: &ExtractParams,
) -> ExtractResult<Extraction> {
    check_scalars("sdf", grid.vertices().len(), samples)?;

    info!(
        resolution = grid.resolution(),
        gradient = gradient.is_some(),
        "Extracting iso-surface"
    );

    let classify = |cube: usize| SignMask::from_samples(&grid.cube_samples(samples, cube));
    #[cfg(feature = "parallel")]
    let masks: Vec<SignMask> = (0..grid.num_cubes()).into_par_iter().map(classify).collect();
    #[cfg(not(feature = "parallel"))]
    let masks: Vec<SignMask> = (0..grid.num_cubes()).map(classify).collect();

    let mut crossings = EdgeCrossings::compute(grid, samples);
    if let Some(gradient) = gradient {
        if !crossings.is_empty() {
            let gradients = gradient.sample_gradients(crossings.positions());
            check_vectors("gradient", crossings.len(), &gradients)?;
            crossings.set_gradients(&gradients);
        }
    }
    debug!(edge_crossings = crossings.len(), "Computed edge crossings");

    // Barrier: every dual vertex exists before any face is built.
    let solve = |(cube, &mask): (usize, &SignMask)| -> ExtractResult<Option<DualVertex>> {
        if !mask.is_active() {
            return Ok(None);
        }
        solve_dual_vertex(grid, &crossings, cube, mask, params).map(Some)
    };
    #[cfg(feature = "parallel")]
    let dual_vertices: Vec<Option<DualVertex>> = masks
        .par_iter()
        .enumerate()
        .map(solve)
        .collect::<ExtractResult<_>>()?;
    #[cfg(not(feature = "parallel"))]
    let dual_vertices: Vec<Option<DualVertex>> = masks
        .iter()
        .enumerate()
        .map(solve)
        .collect::<ExtractResult<_>>()?;

    let mut stats = ExtractStats {
        edge_crossings: crossings.len(),
        ..Default::default()
    };
    let mut positions = Vec::new();
    let mut cube_vertex = vec![NULL_MESH_VERTEX_ID; masks.len()];
    let mut cubes = Vec::with_capacity(masks.len());
    for ((&mask, dual), id) in masks.iter().zip(&dual_vertices).zip(&mut cube_vertex) {
        let info = match dual {
            Some(v) => {
                *id = positions.len() as MeshVertexId;
                positions.push(v.position);
                stats.active_cubes += 1;
                if crossings.has_normals() && v.qef_rank < 3 {
                    stats.rank_deficient_cubes += 1;
                }
                CubeInfo {
                    mask,
                    vertex: *id,
                    num_crossings: v.num_crossings,
                    qef_rank: v.qef_rank,
                }
            }
            None => CubeInfo {
                mask,
                vertex: NULL_MESH_VERTEX_ID,
                num_crossings: 0,
                qef_rank: 0,
            },
        };
        cubes.push(info);
    }
    debug!(
        active_cubes = stats.active_cubes,
        rank_deficient_cubes = stats.rank_deficient_cubes,
        "Placed dual vertices"
    );

    let (triangles, face_stats) =
        build_faces(grid, samples, &crossings, &cube_vertex, &positions, params);
    stats.quads = face_stats.quads;
    stats.boundary_edges = face_stats.boundary_edges;

    let mesh = IsoMesh {
        positions,
        triangles,
    };
    stats.non_manifold_edges = mesh.num_non_manifold_edges();
    if stats.non_manifold_edges > 0 {
        warn!(
            non_manifold_edges = stats.non_manifold_edges,
            "Iso-surface has non-manifold edges"
        );
    }

    info!(
        vertices = mesh.num_vertices(),
        triangles = mesh.num_triangles(),
        "Iso-surface extracted"
    );

    Ok(Extraction { mesh, cubes, stats })
}
