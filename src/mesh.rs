use glam::Vec3A;
use std::collections::HashMap;

pub type MeshVertexId = u32;
pub const NULL_MESH_VERTEX_ID: MeshVertexId = MeshVertexId::MAX;

/// Triangle mesh of dual vertices.
///
/// Every position is the dual vertex of one active cube and every triangle
/// index refers into `positions`. Triangles wind counter-clockwise when seen
/// from the outside (positive SDF).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IsoMesh {
    pub positions: Vec<Vec3A>,
    pub triangles: Vec<[MeshVertexId; 3]>,
}

impl IsoMesh {
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Triangle indices as one flat list, 3 per triangle.
    pub fn indices(&self) -> Vec<u32> {
        self.triangles.iter().flatten().copied().collect()
    }

    /// Unnormalized face normal (twice the area).
    pub fn triangle_normal(&self, t: usize) -> Vec3A {
        let p = self.triangles[t].map(|v| self.positions[v as usize]);
        (p[1] - p[0]).cross(p[2] - p[0])
    }

    /// Number of triangles using each undirected edge.
    pub fn edge_use_counts(&self) -> HashMap<(MeshVertexId, MeshVertexId), u32> {
        let mut counts = HashMap::with_capacity(self.triangles.len() * 3 / 2);
        for tri in &self.triangles {
            for i in 0..3 {
                let (a, b) = (tri[i], tri[(i + 1) % 3]);
                *counts.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Edges shared by more than two triangles.
    pub fn num_non_manifold_edges(&self) -> usize {
        self.edge_use_counts().values().filter(|&&n| n > 2).count()
    }

    /// True if every edge is shared by exactly two triangles.
    pub fn is_closed_manifold(&self) -> bool {
        !self.is_empty() && self.edge_use_counts().values().all(|&n| n == 2)
    }

    /// Enclosed volume by the divergence theorem. Positive when the mesh is
    /// closed and wound outward.
    pub fn signed_volume(&self) -> f32 {
        self.triangles
            .iter()
            .map(|t| {
                let [a, b, c] = t.map(|v| self.positions[v as usize]);
                a.dot(b.cross(c))
            })
            .sum::<f32>()
            / 6.0
    }
}
