#![warn(missing_docs)]

//! Triangle mesh container for the sphereseg clipping library.
//!
//! Meshes are stored as flat `f32` position and `u32` index buffers, the
//! layout produced by most tessellators and file loaders. The [`obj`]
//! module reads meshes from Wavefront OBJ and writes polylines back out.

pub mod error;
pub mod obj;

pub use error::{MeshError, Result};

use serde::{Deserialize, Serialize};
use sphereseg_math::{BoundingBox, Point3};

/// Indexed triangle soup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    /// Flat array of vertex positions: `[x0, y0, z0, x1, y1, z1, ...]`.
    pub vertices: Vec<f32>,
    /// Flat array of triangle indices: `[i0, i1, i2, ...]`.
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from positions and triangles.
    pub fn from_triangles(points: &[Point3], triangles: &[[u32; 3]]) -> Self {
        let mut mesh = Self::new();
        for p in points {
            mesh.push_vertex(p);
        }
        for t in triangles {
            mesh.indices.extend_from_slice(t);
        }
        mesh
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    /// True if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append a vertex, returning its index.
    pub fn push_vertex(&mut self, p: &Point3) -> u32 {
        let idx = self.num_vertices() as u32;
        self.vertices
            .extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
        idx
    }

    /// Append a triangle.
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Position of vertex `i`.
    pub fn vertex(&self, i: usize) -> Point3 {
        Point3::new(
            self.vertices[i * 3] as f64,
            self.vertices[i * 3 + 1] as f64,
            self.vertices[i * 3 + 2] as f64,
        )
    }

    /// Vertex indices of triangle `i`.
    pub fn triangle(&self, i: usize) -> [u32; 3] {
        [
            self.indices[i * 3],
            self.indices[i * 3 + 1],
            self.indices[i * 3 + 2],
        ]
    }

    /// Iterate over all vertex positions.
    pub fn positions(&self) -> impl Iterator<Item = Point3> + '_ {
        self.vertices
            .chunks_exact(3)
            .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
    }

    /// Iterate over all triangles.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Merge another mesh into this one.
    pub fn merge(&mut self, other: &TriangleMesh) {
        let offset = self.num_vertices() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices
            .extend(other.indices.iter().map(|&i| i + offset));
    }

    /// Axis-aligned bounds of the vertices, `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let mut bbox = BoundingBox::empty();
        for p in self.positions() {
            bbox.expand(&p);
        }
        bbox.is_valid().then_some(bbox)
    }

    /// Check buffer lengths and index ranges.
    pub fn validate(&self) -> Result<()> {
        if self.vertices.len() % 3 != 0 {
            return Err(MeshError::Malformed(format!(
                "vertex buffer length {} is not a multiple of 3",
                self.vertices.len()
            )));
        }
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::Malformed(format!(
                "index buffer length {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        let count = self.num_vertices();
        if let Some(&bad) = self.indices.iter().find(|&&i| i as usize >= count) {
            return Err(MeshError::IndexOutOfRange {
                index: bad,
                vertex_count: count,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_quad() -> TriangleMesh {
        TriangleMesh::from_triangles(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_counts() {
        let mesh = make_quad();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_triangles(), 2);
        assert_eq!(mesh.triangle(1), [0, 2, 3]);
        assert_relative_eq!(mesh.vertex(2).y, 1.0);
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut mesh = make_quad();
        mesh.merge(&make_quad());
        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.triangle(2), [4, 5, 6]);
    }

    #[test]
    fn test_bounds() {
        let bbox = make_quad().bounds().unwrap();
        assert_relative_eq!(bbox.max.x, 1.0);
        assert_relative_eq!(bbox.max.z, 0.0);
        assert!(TriangleMesh::new().bounds().is_none());
    }

    #[test]
    fn test_validate_rejects_bad_index() {
        let mut mesh = make_quad();
        assert!(mesh.validate().is_ok());
        mesh.push_triangle(0, 1, 9);
        assert!(matches!(
            mesh.validate(),
            Err(MeshError::IndexOutOfRange { index: 9, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_ragged_buffers() {
        let mut mesh = make_quad();
        mesh.vertices.push(0.0);
        assert!(matches!(mesh.validate(), Err(MeshError::Malformed(_))));
    }
}
