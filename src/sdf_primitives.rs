//! Analytic signed distance functions and their gradients.
//!
//! Handy as test fields and as the pointwise callbacks behind
//! [`Pointwise`](crate::Pointwise).

use glam::{Vec2, Vec3A, Vec3Swizzles};

pub fn sphere(r: f32, p: Vec3A) -> f32 {
    p.length() - r
}

pub fn sphere_gradient(p: Vec3A) -> Vec3A {
    p.normalize_or_zero()
}

pub fn plane(o: Vec3A, n: Vec3A, p: Vec3A) -> f32 {
    (p - o).dot(n)
}

pub fn torus(t: Vec2, p: Vec3A) -> f32 {
    let q = Vec2::new(p.xz().length() - t.x, p.y);
    q.length() - t.y
}

pub fn torus_gradient(t: Vec2, p: Vec3A) -> Vec3A {
    let xz = p.xz();
    let ring = xz.normalize_or_zero();
    let q = Vec2::new(xz.length() - t.x, p.y).normalize_or_zero();
    Vec3A::new(q.x * ring.x, q.y, q.x * ring.y)
}

/// Axis-aligned box with half extents `b`.
pub fn cube(b: Vec3A, p: Vec3A) -> f32 {
    let q = p.abs() - b;
    q.max(Vec3A::ZERO).length() + q.max_element().min(0.0)
}

/// On the surface and inside, the normal of the nearest face (ties go to
/// the lowest axis).
pub fn cube_gradient(b: Vec3A, p: Vec3A) -> Vec3A {
    let q = p.abs() - b;
    let outside = q.max(Vec3A::ZERO);
    if outside.cmpgt(Vec3A::ZERO).any() {
        return outside.normalize() * p.signum();
    }
    let mut axis = 0;
    for i in 1..3 {
        if q[i] > q[axis] {
            axis = i;
        }
    }
    let mut g = Vec3A::ZERO;
    g[axis] = p[axis].signum();
    g
}

/// A bound rather than an exact distance, but with exact planar faces.
pub fn octahedron(p: Vec3A, s: f32) -> f32 {
    let p = p.abs();
    (p.x + p.y + p.z - s) * 0.57735027
}

pub fn octahedron_gradient(p: Vec3A) -> Vec3A {
    p.signum() * 0.57735027
}
