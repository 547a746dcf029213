//! Mesh data model and Wavefront OBJ ingestion.
//!
//! Ingestion runs in three phases: a line scan that fills the
//! [`VertexPool`] and collects raw [`FaceCorner`]s, a resolve pass that
//! expands corners into unwelded per-corner buffers, and (when the source
//! has no usable normals) per-vertex normal synthesis.

/// Resumable ingestion job and observer callbacks.
pub mod ingest;
/// Per-vertex normal synthesis for meshes without `vn` records.
pub mod normals;
/// Line scanner filling the vertex pool and collecting face corners.
pub mod parser;
/// Expansion of face corners into unwelded per-corner buffers.
pub mod resolve;

use glam::Vec3;

pub use ingest::{
    ingest, ingest_str, IngestJob, IngestStatus, LoadObserver, NoopObserver,
};

/// Flat attribute pools filled during the scan.
///
/// Indices in the source are 1-based; accessors here take 0-based indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexPool {
    /// Positions, three floats per vertex.
    pub positions: Vec<f32>,
    /// Normals, three floats per entry.
    pub normals: Vec<f32>,
    /// Texture coordinates, two floats per entry (V already flipped).
    pub tex_coords: Vec<f32>,
}

impl VertexPool {
    /// Number of positions in the pool.
    #[must_use]
    pub fn position_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of normals in the pool.
    #[must_use]
    pub fn normal_count(&self) -> usize {
        self.normals.len() / 3
    }

    /// Number of texture coordinates in the pool.
    #[must_use]
    pub fn tex_coord_count(&self) -> usize {
        self.tex_coords.len() / 2
    }

    /// Position at a 0-based index.
    #[must_use]
    pub fn position(&self, index: usize) -> Option<[f32; 3]> {
        triple(&self.positions, index)
    }

    /// Normal at a 0-based index.
    #[must_use]
    pub fn normal(&self, index: usize) -> Option<[f32; 3]> {
        triple(&self.normals, index)
    }

    /// Texture coordinate at a 0-based index.
    #[must_use]
    pub fn tex_coord(&self, index: usize) -> Option<[f32; 2]> {
        let base = index.checked_mul(2)?;
        let uv = self.tex_coords.get(base..base + 2)?;
        Some([uv[0], uv[1]])
    }

    /// Center positions on their centroid and scale uniformly so the
    /// largest absolute coordinate equals `extent`.
    ///
    /// Does nothing for an empty pool or one whose points all coincide.
    pub fn normalize(&mut self, extent: f32) {
        let count = self.position_count();
        if count == 0 {
            return;
        }

        let sum = self
            .positions
            .chunks_exact(3)
            .fold(Vec3::ZERO, |acc, p| acc + Vec3::new(p[0], p[1], p[2]));
        let centroid = sum / count as f32;

        let mut max_abs = 0.0f32;
        for p in self.positions.chunks_exact_mut(3) {
            p[0] -= centroid.x;
            p[1] -= centroid.y;
            p[2] -= centroid.z;
            max_abs = max_abs.max(p[0].abs()).max(p[1].abs()).max(p[2].abs());
        }

        if max_abs > 0.0 {
            let scale = extent / max_abs;
            for v in &mut self.positions {
                *v *= scale;
            }
        }
    }
}

fn triple(values: &[f32], index: usize) -> Option<[f32; 3]> {
    let base = index.checked_mul(3)?;
    let v = values.get(base..base + 3)?;
    Some([v[0], v[1], v[2]])
}

/// One vertex-use within a face, as written in the source.
///
/// Indices are 1-based and absolute (relative negative references are
/// converted while scanning). They are not bounds-checked until resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceCorner {
    /// Position index.
    pub position: i64,
    /// Texture-coordinate index, if the token had one.
    pub tex_coord: Option<i64>,
    /// Normal index, if the token had one.
    pub normal: Option<i64>,
}

/// Surface parameters applied to a freshly loaded mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshMaterial {
    /// Linear RGB base color used when no texture is bound.
    pub base_color: [f32; 3],
    /// Render both faces of every triangle.
    pub double_sided: bool,
    /// Metalness in `[0, 1]`.
    pub metallic: f32,
    /// Roughness in `[0, 1]`.
    pub roughness: f32,
}

impl Default for MeshMaterial {
    fn default() -> Self {
        Self {
            base_color: [0.75, 0.75, 0.75],
            double_sided: true,
            metallic: 0.0,
            roughness: 0.6,
        }
    }
}

/// Counters gathered while ingesting one model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Lines scanned.
    pub lines: usize,
    /// `v` records.
    pub positions: usize,
    /// `vn` records.
    pub normals: usize,
    /// `vt` records.
    pub tex_coords: usize,
    /// `f` records.
    pub faces: usize,
    /// `f` records with more than three corners (not triangulated).
    pub polygon_faces: usize,
    /// Face corners collected across all `f` records.
    pub corners: usize,
    /// Corners whose position index was out of range and were skipped.
    pub dropped_corners: usize,
    /// Texture or normal references that were out of range and skipped.
    pub dropped_attributes: usize,
    /// Whether normals were synthesized instead of read from the source.
    pub synthesized_normals: bool,
    /// Corners whose normal was synthesized because the source gave them
    /// none while other corners had one.
    pub filled_normals: usize,
    /// Material libraries named by `mtllib` records.
    pub material_libraries: Vec<String>,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Bounds {
    /// Box center.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Radius of the sphere enclosing the box.
    #[must_use]
    pub fn radius(&self) -> f32 {
        (self.max - self.min).length() * 0.5
    }
}

/// Ingestion output: unwelded, corner-aligned triangle buffers.
///
/// Every corner carries its own position (and normal / UV when present);
/// shared source vertices are duplicated per face.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderableMesh {
    /// Positions, three floats per corner.
    pub positions: Vec<f32>,
    /// Normals, three floats per corner. Synthesized when the source has
    /// none.
    pub normals: Vec<f32>,
    /// Texture coordinates, two floats per corner. Empty when the source
    /// has none.
    pub tex_coords: Vec<f32>,
    /// Default surface parameters.
    pub material: MeshMaterial,
    /// Ingestion counters.
    pub report: IngestReport,
}

impl RenderableMesh {
    /// Number of corners (vertices) in the position buffer.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of complete triangles in the position buffer.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    /// Whether a UV buffer is present.
    #[must_use]
    pub fn has_tex_coords(&self) -> bool {
        !self.tex_coords.is_empty()
    }

    /// Bounding box of all positions, or `None` for an empty mesh.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        let mut iter = self
            .positions
            .chunks_exact(3)
            .map(|p| Vec3::new(p[0], p[1], p[2]));
        let first = iter.next()?;
        let (min, max) =
            iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Bounds { min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_accessors_are_zero_based() {
        let pool = VertexPool {
            positions: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            normals: vec![0.0, 1.0, 0.0],
            tex_coords: vec![0.25, 0.75],
        };
        assert_eq!(pool.position(1), Some([4.0, 5.0, 6.0]));
        assert_eq!(pool.position(2), None);
        assert_eq!(pool.normal(0), Some([0.0, 1.0, 0.0]));
        assert_eq!(pool.tex_coord(0), Some([0.25, 0.75]));
        assert_eq!(pool.tex_coord(1), None);
    }

    #[test]
    fn normalize_centers_and_scales() {
        let mut pool = VertexPool {
            positions: vec![0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 4.0, 0.0],
            ..Default::default()
        };
        pool.normalize(2.0);

        let count = pool.position_count() as f32;
        let mut centroid = Vec3::ZERO;
        let mut max_abs = 0.0f32;
        for p in pool.positions.chunks_exact(3) {
            centroid += Vec3::new(p[0], p[1], p[2]) / count;
            max_abs = max_abs.max(p[0].abs()).max(p[1].abs()).max(p[2].abs());
        }
        assert!(centroid.length() < 1e-5);
        assert!((max_abs - 2.0).abs() < 1e-5);
    }

    #[test]
    fn normalize_ignores_degenerate_pool() {
        let mut pool = VertexPool {
            positions: vec![3.0, 3.0, 3.0],
            ..Default::default()
        };
        pool.normalize(2.0);
        assert_eq!(pool.positions, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn bounds_cover_all_positions() {
        let mesh = RenderableMesh {
            positions: vec![-1.0, 0.0, 2.0, 3.0, -4.0, 0.5],
            ..Default::default()
        };
        let b = mesh.bounds().unwrap();
        assert_eq!(b.min, Vec3::new(-1.0, -4.0, 0.5));
        assert_eq!(b.max, Vec3::new(3.0, 0.0, 2.0));
        assert_eq!(b.center(), Vec3::new(1.0, -2.0, 1.25));
        assert!(RenderableMesh::default().bounds().is_none());
    }
}
