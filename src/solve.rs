use crate::{
    classify::SignMask,
    error::{ExtractError, ExtractResult},
    grid::VoxelGrid,
    intersect::EdgeCrossings,
    params::{ExtractParams, QefRegularization},
    qef::Qef,
};
use glam::Vec3A;

/// Dual vertex of one active cube.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DualVertex {
    pub position: Vec3A,
    pub num_crossings: u8,
    /// Rank of the QEF after regularization. Always 0 without gradients.
    pub qef_rank: u8,
}

/// Places the dual vertex of `cube`.
///
/// Without crossing normals this is the centroid of the crossing points. With
/// normals it minimizes the QEF of the crossings' tangent planes, regularized
/// per [`ExtractParams::regularization`].
pub fn solve_dual_vertex(
    grid: &VoxelGrid,
    crossings: &EdgeCrossings,
    cube: usize,
    mask: SignMask,
    params: &ExtractParams,
) -> ExtractResult<DualVertex> {
    let cube_vertices = &grid.cubes()[cube];

    let mut slots = [0u32; 12];
    let mut num_crossings = 0;
    for edge in mask.crossing_edges() {
        if let Some(slot) = crossings.cube_edge_slot(cube_vertices, edge) {
            slots[num_crossings] = slot;
            num_crossings += 1;
        }
    }
    if num_crossings == 0 {
        return Err(ExtractError::DegenerateCube { cube });
    }
    let slots = &slots[..num_crossings];

    let positions = crossings.positions();
    let mass_point = slots
        .iter()
        .map(|&s| positions[s as usize])
        .sum::<Vec3A>()
        / num_crossings as f32;

    if !crossings.has_normals() {
        return Ok(DualVertex {
            position: mass_point,
            num_crossings: num_crossings as u8,
            qef_rank: 0,
        });
    }

    let normals = crossings.normals();
    let planes = slots
        .iter()
        .map(|&s| (positions[s as usize], normals[s as usize]));

    let (mut position, qef_rank) = match params.regularization {
        QefRegularization::TruncatedSvd {
            singular_value_cutoff,
        } => {
            let mut qef = Qef::default();
            for (p, n) in planes {
                qef += Qef::plane(p, n);
            }
            let solution = qef.truncated_minimizer(mass_point, singular_value_cutoff);
            (solution.position, solution.rank)
        }
        QefRegularization::Probabilistic {
            position_stddev,
            normal_stddev,
        } => {
            let stddev_p = position_stddev * grid.voxel_size().max_element();
            let mut qef = Qef::default();
            for (p, n) in planes {
                qef += Qef::isometric_probabilistic_plane(p, n, stddev_p, normal_stddev);
            }
            (qef.minimizer(), 3)
        }
    };

    if params.clamp_to_cell {
        let extent = grid.cube_extent(cube);
        position = position.clamp(extent.minimum, extent.minimum + extent.shape);
    }

    Ok(DualVertex {
        position,
        num_crossings: num_crossings as u8,
        qef_rank,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        field::Pointwise,
        sdf_primitives::{cube, cube_gradient},
    };

    fn setup(
        resolution: i64,
        sdf: impl Fn(Vec3A) -> f32 + Sync,
        gradient: Option<fn(Vec3A) -> Vec3A>,
    ) -> (VoxelGrid, Vec<f32>, EdgeCrossings) {
        let grid = VoxelGrid::new(resolution).unwrap();
        let samples = grid.sample(&Pointwise(sdf)).unwrap();
        let mut crossings = EdgeCrossings::compute(&grid, &samples);
        if let Some(g) = gradient {
            let grads: Vec<Vec3A> = crossings.positions().iter().map(|&p| g(p)).collect();
            crossings.set_gradients(&grads);
        }
        (grid, samples, crossings)
    }

    fn solve(
        grid: &VoxelGrid,
        samples: &[f32],
        crossings: &EdgeCrossings,
        coords: [u32; 3],
        params: &ExtractParams,
    ) -> DualVertex {
        let cube = grid.cube_index(coords) as usize;
        let mask = SignMask::from_samples(&grid.cube_samples(samples, cube));
        assert!(mask.is_active());
        solve_dual_vertex(grid, crossings, cube, mask, params).unwrap()
    }

    fn box_sdf(p: Vec3A) -> f32 {
        cube(Vec3A::splat(0.5), p)
    }

    fn box_gradient(p: Vec3A) -> Vec3A {
        cube_gradient(Vec3A::splat(0.5), p)
    }

    #[test]
    fn centroid_of_plane_crossings() {
        let (grid, samples, crossings) = setup(2, |p: Vec3A| p.y - 0.25, None);
        let v = solve(&grid, &samples, &crossings, [1, 1, 0], &ExtractParams::default());
        assert_eq!(v.num_crossings, 4);
        assert_eq!(v.qef_rank, 0);
        assert!((v.position - Vec3A::new(0.5, 0.25, -0.5)).length() < 1e-6);
    }

    #[test]
    fn qef_recovers_box_corner() {
        let (grid, samples, crossings) = setup(16, box_sdf, Some(box_gradient));
        // Cube [0.375, 0.5]^3 touches the (+, +, +) corner.
        let v = solve(&grid, &samples, &crossings, [11, 11, 11], &ExtractParams::default());
        assert_eq!(v.qef_rank, 3);
        assert!((v.position - Vec3A::splat(0.5)).length() < 1e-4, "{}", v.position);
    }

    #[test]
    fn qef_recovers_box_edge() {
        let (grid, samples, crossings) = setup(16, box_sdf, Some(box_gradient));
        let v = solve(&grid, &samples, &crossings, [11, 11, 8], &ExtractParams::default());
        assert_eq!(v.qef_rank, 2);
        let expected = Vec3A::new(0.5, 0.5, 0.0625);
        assert!((v.position - expected).length() < 1e-4, "{}", v.position);
    }

    #[test]
    fn centroid_rounds_box_corner() {
        let (grid, samples, crossings) = setup(16, box_sdf, None);
        let v = solve(&grid, &samples, &crossings, [11, 11, 11], &ExtractParams::default());
        assert_eq!(v.num_crossings, 3);
        assert!(v.position.max_element() < 0.45, "{}", v.position);
    }

    #[test]
    fn probabilistic_regularization_stays_near_corner() {
        let (grid, samples, crossings) = setup(16, box_sdf, Some(box_gradient));
        let params = ExtractParams::default().with_regularization(QefRegularization::Probabilistic {
            position_stddev: 0.05,
            normal_stddev: 0.05,
        });
        let v = solve(&grid, &samples, &crossings, [11, 11, 11], &params);
        assert!((v.position - Vec3A::splat(0.5)).length() < 0.02, "{}", v.position);
    }

    #[test]
    fn probabilistic_position_stddev_does_not_move_vertex() {
        let (grid, samples, crossings) = setup(16, box_sdf, Some(box_gradient));
        let with_stddev = |position_stddev| {
            ExtractParams::default().with_regularization(QefRegularization::Probabilistic {
                position_stddev,
                normal_stddev: 0.05,
            })
        };
        let a = solve(&grid, &samples, &crossings, [11, 11, 8], &with_stddev(0.0));
        let b = solve(&grid, &samples, &crossings, [11, 11, 8], &with_stddev(0.5));
        assert_eq!(a.position, b.position);
    }

    #[test]
    fn clamps_into_cell() {
        // Tilted normals whose planes meet at y = -1, below the cube.
        let (grid, samples, mut crossings) = setup(4, |p: Vec3A| p.x - 0.1, None);
        let tilted: Vec<Vec3A> = crossings
            .positions()
            .iter()
            .map(|p| Vec3A::new(1.0, if p.y < -0.25 { 0.6 } else { 0.3 }, 0.0))
            .collect();
        crossings.set_gradients(&tilted);

        let strict = ExtractParams::default().with_regularization(QefRegularization::TruncatedSvd {
            singular_value_cutoff: 1e-3,
        });
        let free = solve(&grid, &samples, &crossings, [2, 1, 1], &strict.clone().with_clamp_to_cell(false));
        assert!((free.position.y + 1.0).abs() < 1e-3, "{}", free.position);

        let clamped = solve(&grid, &samples, &crossings, [2, 1, 1], &strict);
        let extent = grid.cube_extent(grid.cube_index([2, 1, 1]) as usize);
        let max = extent.minimum + extent.shape;
        assert!(clamped.position.cmpge(extent.minimum).all() && clamped.position.cmple(max).all());
        assert_eq!(clamped.position.y, -0.5);
    }

    #[test]
    fn active_cube_without_crossings_is_degenerate() {
        let (grid, _, crossings) = setup(2, |_| 1.0, None);
        let err = solve_dual_vertex(&grid, &crossings, 3, SignMask(0b1), &ExtractParams::default())
            .unwrap_err();
        assert_eq!(err, ExtractError::DegenerateCube { cube: 3 });
    }
}
