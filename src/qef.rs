use glam::Vec3A;
use nalgebra::{Matrix3, Vector3, SVD};
use std::ops::{Add, AddAssign};

const SVD_MAX_ITERATIONS: usize = 64;

/// Quadric Error Function
///
/// `x^T A x - 2 b^T x + c`
///
/// Accumulated from tangent planes at edge crossings. For plain planes, `A`
/// is `Σ n nᵀ`, `b` is `Σ (n·p) n` and `c` is `Σ (n·p)²`, i.e. the normal
/// equations `AᵀA x = Aᵀb` of the least-squares plane fit.
///
/// Two minimizers are provided:
///
/// - [`Qef::truncated_minimizer`] solves relative to a mass point with an SVD
///   pseudo-inverse, dropping singular values below a cutoff. Directions the
///   planes don't constrain stay at the mass point.
/// - [`Qef::minimizer`] inverts `A` directly. Only use it on quadrics that are
///   guaranteed nonsingular, such as sums of
///   [`Qef::isometric_probabilistic_plane`] (see "Fast and Robust QEF
///   Minimization using Probabilistic Quadrics" by Trettner and Kobbelt).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Qef {
    a00: f32,
    a01: f32,
    a02: f32,
    a11: f32,
    a12: f32,
    a22: f32,

    b: Vec3A,

    c: f32,
}

/// Result of a regularized QEF solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QefSolution {
    pub position: Vec3A,
    /// Number of singular values kept. Less than 3 means some direction was
    /// unconstrained and fell back to the mass point.
    pub rank: u8,
}

impl Qef {
    pub fn from_coefficients(a_cols: [[f32; 3]; 3], b: Vec3A, c: f32) -> Self {
        Self {
            // Keep one triangle of the symmetric matrix.
            a00: a_cols[0][0],
            a01: a_cols[0][1],
            a02: a_cols[0][2],
            a11: a_cols[1][1],
            a12: a_cols[1][2],
            a22: a_cols[2][2],
            b,
            c,
        }
    }

    /// Residual L2 error. `x^T A x - 2 b^T x + c`
    pub fn error(&self, p: Vec3A) -> f32 {
        p.dot(self.mul_a(p)) - 2.0 * p.dot(self.b) + self.c
    }

    #[inline]
    fn mul_a(&self, p: Vec3A) -> Vec3A {
        Vec3A::new(
            self.a00 * p[0] + self.a01 * p[1] + self.a02 * p[2],
            self.a01 * p[0] + self.a11 * p[1] + self.a12 * p[2],
            self.a02 * p[0] + self.a12 * p[1] + self.a22 * p[2],
        )
    }

    fn matrix(&self) -> Matrix3<f32> {
        Matrix3::new(
            self.a00, self.a01, self.a02, //
            self.a01, self.a11, self.a12, //
            self.a02, self.a12, self.a22,
        )
    }

    /// Minimizes the QEF, keeping unconstrained directions at `mass_point`.
    ///
    /// Solves `A (x - m) = b - A m` with the pseudo-inverse of `A`, treating
    /// singular values `<= cutoff` as zero. If the SVD fails to converge the
    /// mass point is returned with rank 0.
    pub fn truncated_minimizer(&self, mass_point: Vec3A, cutoff: f32) -> QefSolution {
        let rhs = self.b - self.mul_a(mass_point);
        let svd = SVD::try_new(self.matrix(), true, true, f32::EPSILON, SVD_MAX_ITERATIONS);
        let Some(svd) = svd else {
            return QefSolution {
                position: mass_point,
                rank: 0,
            };
        };
        let rank = svd.singular_values.iter().filter(|&&s| s > cutoff).count() as u8;
        let offset = svd
            .solve(&Vector3::new(rhs.x, rhs.y, rhs.z), cutoff)
            .map(|x| Vec3A::new(x[0], x[1], x[2]))
            .unwrap_or(Vec3A::ZERO);

        QefSolution {
            position: mass_point + offset,
            rank,
        }
    }

    pub fn minimizer(&self) -> Vec3A {
        let a = self.a00;
        let b = self.a01;
        let c = self.a02;
        let d = self.a11;
        let e = self.a12;
        let f = self.a22;

        let ad = a * d;
        let ae = a * e;
        let af = a * f;
        let bc = b * c;
        let be = b * e;
        let bf = b * f;
        let df = d * f;
        let ce = c * e;
        let cd = c * d;

        let be_cd = be - cd;
        let bc_ae = bc - ae;
        let ce_bf = ce - bf;

        let denom = 1.0 / (a * df + 2.0 * b * ce - ae * e - bf * b - cd * c);

        let nom0 = self.b.dot(Vec3A::new(df - e * e, ce_bf, be_cd));
        let nom1 = self.b.dot(Vec3A::new(ce_bf, af - c * c, bc_ae));
        let nom2 = self.b.dot(Vec3A::new(be_cd, bc_ae, ad - b * b));

        denom * Vec3A::new(nom0, nom1, nom2)
    }

    /// The plane through `p` with unit normal `n`.
    pub fn plane(p: Vec3A, n: Vec3A) -> Self {
        let d = p.dot(n);
        Self::from_coefficients(self_outer_product(n.into()), d * n, d * d)
    }

    pub fn isometric_probabilistic_plane(
        mean_p: Vec3A,
        mean_n: Vec3A,
        stddev_p: f32,
        stddev_n: f32,
    ) -> Self {
        let sp2 = stddev_p * stddev_p;
        let sn2 = stddev_n * stddev_n;
        let d = mean_p.dot(mean_n);

        let mut a = self_outer_product(mean_n.to_array());
        a[0][0] += sn2;
        a[1][1] += sn2;
        a[2][2] += sn2;

        let b = mean_n * d + mean_p * sn2;
        let c = d * d + sn2 * mean_p.dot(mean_p) + sp2 * mean_n.dot(mean_n) + 3.0 * sp2 * sn2;

        Self::from_coefficients(a, b, c)
    }
}

impl Add for Qef {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign for Qef {
    fn add_assign(&mut self, rhs: Self) {
        self.a00 += rhs.a00;
        self.a01 += rhs.a01;
        self.a02 += rhs.a02;
        self.a11 += rhs.a11;
        self.a12 += rhs.a12;
        self.a22 += rhs.a22;
        self.b += rhs.b;
        self.c += rhs.c;
    }
}

fn self_outer_product([a, b, c]: [f32; 3]) -> [[f32; 3]; 3] {
    [
        [a * a, a * b, a * c],
        [a * b, b * b, b * c],
        [a * c, b * c, c * c],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3A, b: Vec3A) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn three_planes_meet_at_corner() {
        let corner = Vec3A::new(0.5, -0.25, 0.75);
        let qef = Qef::plane(corner + Vec3A::new(0.0, 0.1, 0.2), Vec3A::X)
            + Qef::plane(corner + Vec3A::new(0.3, 0.0, -0.1), Vec3A::Y)
            + Qef::plane(corner + Vec3A::new(-0.2, 0.1, 0.0), Vec3A::Z);

        let sol = qef.truncated_minimizer(Vec3A::ZERO, 0.1);
        assert_eq!(sol.rank, 3);
        assert!(close(sol.position, corner), "{}", sol.position);
        assert!(qef.error(sol.position).abs() < 1e-5);
    }

    #[test]
    fn two_planes_keep_edge_direction_at_mass_point() {
        let mut qef = Qef::default();
        qef += Qef::plane(Vec3A::new(0.5, 0.0, 0.1), Vec3A::X);
        qef += Qef::plane(Vec3A::new(0.0, 0.5, 0.3), Vec3A::Y);

        let mass_point = Vec3A::new(0.4, 0.4, 0.2);
        let sol = qef.truncated_minimizer(mass_point, 0.1);
        assert_eq!(sol.rank, 2);
        assert!(close(sol.position, Vec3A::new(0.5, 0.5, 0.2)), "{}", sol.position);
    }

    #[test]
    fn flat_patch_projects_mass_point_onto_plane() {
        let n = Vec3A::new(1.0, 1.0, 0.0).normalize();
        let mut qef = Qef::default();
        for p in [Vec3A::new(1.0, 0.0, 0.0), Vec3A::new(0.0, 1.0, 0.5)] {
            qef += Qef::plane(p, n);
        }
        let mass_point = Vec3A::new(0.2, 0.2, 0.25);
        let sol = qef.truncated_minimizer(mass_point, 0.1);
        assert_eq!(sol.rank, 1);
        assert!(close(sol.position, Vec3A::new(0.5, 0.5, 0.25)), "{}", sol.position);
    }

    #[test]
    fn empty_qef_returns_mass_point() {
        let sol = Qef::default().truncated_minimizer(Vec3A::ONE, 0.1);
        assert_eq!(sol.rank, 0);
        assert_eq!(sol.position, Vec3A::ONE);
    }

    #[test]
    fn nearly_parallel_planes_are_truncated() {
        let n0 = Vec3A::Y;
        let n1 = Vec3A::new(0.01, 1.0, 0.0).normalize();
        let qef = Qef::plane(Vec3A::new(0.0, 0.3, 0.0), n0)
            + Qef::plane(Vec3A::new(1.0, 0.3, 0.0), n1);
        let mass_point = Vec3A::new(0.5, 0.0, 0.0);
        let sol = qef.truncated_minimizer(mass_point, 0.1);
        assert_eq!(sol.rank, 1);
        // Stays near the mass point along X instead of shooting off to the
        // far-away intersection line of the two planes.
        assert!((sol.position.x - 0.5).abs() < 0.01, "{}", sol.position);
        assert!((sol.position.y - 0.3).abs() < 0.01, "{}", sol.position);
    }

    #[test]
    fn probabilistic_planes_are_nonsingular() {
        let p = Vec3A::new(0.2, 0.3, 0.4);
        let qef = Qef::isometric_probabilistic_plane(p, Vec3A::Z, 0.01, 0.01);
        let x = qef.minimizer();
        assert!(x.is_finite());
        assert!((x.z - 0.4).abs() < 1e-3, "{x}");
    }

    #[test]
    fn position_stddev_only_shifts_the_error() {
        let planes = [
            (Vec3A::new(0.5, 0.1, 0.2), Vec3A::X),
            (Vec3A::new(0.1, 0.5, 0.3), Vec3A::Y),
        ];
        let sum = |stddev_p| {
            planes.iter().fold(Qef::default(), |q, &(p, n)| {
                q + Qef::isometric_probabilistic_plane(p, n, stddev_p, 0.05)
            })
        };
        let tight = sum(0.0);
        let loose = sum(0.1);

        let x = tight.minimizer();
        assert_eq!(x, loose.minimizer());
        assert!(loose.error(x) > tight.error(x));
    }
}
