use super::{FaceCorner, VertexPool};

/// Corner-aligned buffers produced by the resolve pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedBuffers {
    /// Positions, three floats per kept corner.
    pub positions: Vec<f32>,
    /// Normals, three floats per kept corner. Corners without a valid
    /// source normal hold zeros and are flagged in `normal_present`. Empty
    /// when no corner has one.
    pub normals: Vec<f32>,
    /// Whether each kept corner's normal came from the source.
    pub normal_present: Vec<bool>,
    /// Texture coordinates, two floats per kept corner. Corners without a
    /// valid source UV get `(0, 0)`. Empty when no corner has one.
    pub tex_coords: Vec<f32>,
    /// 0-based pool position index of every kept corner.
    pub sources: Vec<usize>,
    /// Corners skipped because their position index was out of range.
    pub dropped_corners: usize,
    /// Texture/normal references skipped because they were out of range.
    pub dropped_attributes: usize,
}

/// Incremental expansion of raw face corners into unwelded buffers.
///
/// Corners are consumed in groups of three, one group per triangle. A
/// corner whose position index does not resolve is skipped entirely,
/// which leaves the following corners shifted within their triangles.
/// That leniency matches what the viewer has always done and is counted
/// in [`ResolvedBuffers::dropped_corners`].
#[derive(Debug)]
pub struct Resolver {
    corners: Vec<FaceCorner>,
    cursor: usize,
    out: ResolvedBuffers,
    any_normal: bool,
    any_tex_coord: bool,
}

impl Resolver {
    /// Prepare to resolve the given corners.
    #[must_use]
    pub fn new(corners: Vec<FaceCorner>) -> Self {
        let capacity = corners.len();
        Self {
            corners,
            cursor: 0,
            out: ResolvedBuffers {
                positions: Vec::with_capacity(capacity * 3),
                normals: Vec::with_capacity(capacity * 3),
                normal_present: Vec::with_capacity(capacity),
                tex_coords: Vec::with_capacity(capacity * 2),
                sources: Vec::with_capacity(capacity),
                ..Default::default()
            },
            any_normal: false,
            any_tex_coord: false,
        }
    }

    /// Triangle groups in total (a trailing partial group counts as one).
    #[must_use]
    pub fn total_groups(&self) -> usize {
        self.corners.len().div_ceil(3)
    }

    /// Triangle groups resolved so far.
    #[must_use]
    pub fn groups_done(&self) -> usize {
        self.cursor.div_ceil(3)
    }

    /// Whether every corner has been visited.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cursor >= self.corners.len()
    }

    /// Resolve up to `max_groups` triangle groups. Returns how many groups
    /// were processed.
    pub fn resolve_groups(&mut self, pool: &VertexPool, max_groups: usize) -> usize {
        let end = self
            .cursor
            .saturating_add(max_groups.saturating_mul(3))
            .min(self.corners.len());
        let start_groups = self.groups_done();

        for corner in &self.corners[self.cursor..end] {
            let (uv, normal) = resolve_corner(pool, corner, &mut self.out);
            self.any_tex_coord |= uv;
            self.any_normal |= normal;
        }
        self.cursor = end;
        self.groups_done() - start_groups
    }

    /// Take the resolved buffers. Attribute buffers that no corner
    /// filled are emptied.
    #[must_use]
    pub fn finish(mut self) -> ResolvedBuffers {
        if !self.any_tex_coord {
            self.out.tex_coords = Vec::new();
        }
        if !self.any_normal {
            self.out.normals = Vec::new();
            self.out.normal_present = Vec::new();
        }
        self.out
    }
}

/// Resolve every corner in one go.
#[must_use]
pub fn resolve_all(pool: &VertexPool, corners: Vec<FaceCorner>) -> ResolvedBuffers {
    let mut resolver = Resolver::new(corners);
    let _ = resolver.resolve_groups(pool, usize::MAX);
    resolver.finish()
}

/// Append one corner. Returns whether it carried a valid UV and normal.
fn resolve_corner(
    pool: &VertexPool,
    corner: &FaceCorner,
    out: &mut ResolvedBuffers,
) -> (bool, bool) {
    let Some(position) = zero_based(corner.position, pool.position_count())
        .and_then(|index| Some((index, pool.position(index)?)))
    else {
        out.dropped_corners += 1;
        return (false, false);
    };
    out.positions.extend_from_slice(&position.1);
    out.sources.push(position.0);

    let uv = corner.tex_coord.and_then(|raw| {
        let uv = zero_based(raw, pool.tex_coord_count())
            .and_then(|i| pool.tex_coord(i));
        out.dropped_attributes += usize::from(uv.is_none());
        uv
    });
    out.tex_coords.extend_from_slice(&uv.unwrap_or([0.0, 0.0]));

    let normal = corner.normal.and_then(|raw| {
        let normal =
            zero_based(raw, pool.normal_count()).and_then(|i| pool.normal(i));
        out.dropped_attributes += usize::from(normal.is_none());
        normal
    });
    out.normals.extend_from_slice(&normal.unwrap_or([0.0; 3]));
    out.normal_present.push(normal.is_some());

    (uv.is_some(), normal.is_some())
}

/// 1-based source index to a bounds-checked 0-based index.
fn zero_based(index: i64, count: usize) -> Option<usize> {
    let index = usize::try_from(index.checked_sub(1)?).ok()?;
    (index < count).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner(position: i64) -> FaceCorner {
        FaceCorner {
            position,
            tex_coord: None,
            normal: None,
        }
    }

    fn pool() -> VertexPool {
        VertexPool {
            positions: vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0,
            ],
            normals: vec![0.0, 0.0, 1.0],
            tex_coords: vec![0.5, 0.5],
        }
    }

    #[test]
    fn zero_based_bounds() {
        assert_eq!(zero_based(1, 3), Some(0));
        assert_eq!(zero_based(3, 3), Some(2));
        assert_eq!(zero_based(4, 3), None);
        assert_eq!(zero_based(0, 3), None);
        assert_eq!(zero_based(-2, 3), None);
    }

    #[test]
    fn expands_corners_in_order() {
        let out = resolve_all(&pool(), vec![corner(1), corner(2), corner(3)]);
        assert_eq!(
            out.positions,
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        );
        assert_eq!(out.sources, vec![0, 1, 2]);
        assert_eq!(out.dropped_corners, 0);
    }

    #[test]
    fn out_of_range_corner_is_skipped() {
        let out = resolve_all(&pool(), vec![corner(1), corner(2), corner(99)]);
        assert_eq!(out.positions.len(), 6);
        assert_ne!(out.positions.len() % 9, 0);
        assert_eq!(out.dropped_corners, 1);
    }

    #[test]
    fn bad_attribute_references_keep_the_corner_aligned() {
        let c = FaceCorner {
            position: 4,
            tex_coord: Some(1),
            normal: Some(5),
        };
        let out = resolve_all(&pool(), vec![c]);
        assert_eq!(out.positions, vec![1.0, 1.0, 0.0]);
        assert_eq!(out.tex_coords, vec![0.5, 0.5]);
        assert!(out.normals.is_empty());
        assert_eq!(out.dropped_attributes, 1);
    }

    #[test]
    fn mixed_attribute_corners_stay_aligned() {
        let plain = corner(1);
        let full = FaceCorner {
            position: 2,
            tex_coord: Some(1),
            normal: Some(1),
        };
        let out = resolve_all(&pool(), vec![plain, full, plain]);
        assert_eq!(out.normals.len(), out.positions.len());
        assert_eq!(out.tex_coords.len() / 2, out.positions.len() / 3);
        assert_eq!(out.normal_present, vec![false, true, false]);
        assert_eq!(&out.normals[3..6], &[0.0, 0.0, 1.0]);
        assert_eq!(&out.tex_coords[..2], &[0.0, 0.0]);
        assert_eq!(&out.tex_coords[2..4], &[0.5, 0.5]);
    }

    #[test]
    fn incremental_matches_single_pass() {
        let corners: Vec<FaceCorner> =
            (0..12).map(|i| corner(i % 4 + 1)).collect();
        let mut resolver = Resolver::new(corners.clone());
        assert_eq!(resolver.total_groups(), 4);
        let mut steps = 0;
        while !resolver.is_done() {
            assert_eq!(resolver.resolve_groups(&pool(), 1), 1);
            steps += 1;
        }
        assert_eq!(steps, 4);
        assert_eq!(resolver.finish(), resolve_all(&pool(), corners));
    }
}
