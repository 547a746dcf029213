use glam::Vec3;

/// Synthesize one unit normal per corner.
///
/// Face normals follow right-hand winding, `(b - a) × (c - a)`, and are
/// accumulated unnormalized (so larger triangles weigh more) onto the
/// pool position each corner came from. Corners that share a source
/// position therefore get the same smooth normal. Degenerate sums fall
/// back to the corner's own face normal, then to `+Y`.
///
/// `positions` holds three floats per corner and `sources` the 0-based
/// pool index of each corner; `pool_size` bounds those indices.
#[must_use]
pub fn synthesize(positions: &[f32], sources: &[usize], pool_size: usize) -> Vec<f32> {
    let corner_count = sources.len().min(positions.len() / 3);
    let corner = |i: usize| {
        Vec3::new(positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2])
    };

    let mut accumulated = vec![Vec3::ZERO; pool_size];
    let mut face_normals = vec![Vec3::ZERO; corner_count];
    for tri in 0..corner_count / 3 {
        let base = tri * 3;
        let (a, b, c) = (corner(base), corner(base + 1), corner(base + 2));
        let face = (b - a).cross(c - a);
        for i in base..base + 3 {
            face_normals[i] = face;
            if let Some(slot) = accumulated.get_mut(sources[i]) {
                *slot += face;
            }
        }
    }

    let mut normals = Vec::with_capacity(corner_count * 3);
    for (i, &source) in sources.iter().take(corner_count).enumerate() {
        let smooth = accumulated.get(source).copied().unwrap_or(Vec3::ZERO);
        let n = smooth
            .try_normalize()
            .or_else(|| face_normals[i].try_normalize())
            .unwrap_or(Vec3::Y);
        normals.extend_from_slice(&n.to_array());
    }
    normals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lengths(normals: &[f32]) -> Vec<f32> {
        normals
            .chunks_exact(3)
            .map(|n| Vec3::new(n[0], n[1], n[2]).length())
            .collect()
    }

    #[test]
    fn counter_clockwise_triangle_faces_plus_z() {
        let positions = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let normals = synthesize(&positions, &[0, 1, 2], 3);
        for n in normals.chunks_exact(3) {
            assert!((n[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn shared_vertex_averages_neighbouring_faces() {
        // Two triangles folded along the shared edge 0-1.
        let positions = [
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
            1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0,
        ];
        let sources = [0, 1, 2, 1, 0, 3];
        let normals = synthesize(&positions, &sources, 4);
        assert_eq!(normals.len(), 18);

        // Corner 0 (source 0) mixes +Z and +Y faces.
        let n0 = Vec3::new(normals[0], normals[1], normals[2]);
        assert!(n0.y > 0.1 && n0.z > 0.1);
        // Corner 4 shares source 0 and must match.
        let n4 = Vec3::new(normals[12], normals[13], normals[14]);
        assert!((n0 - n4).length() < 1e-6);
    }

    #[test]
    fn every_normal_is_unit_length_even_when_degenerate() {
        let positions = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 5.0, 5.0, 5.0];
        let normals = synthesize(&positions, &[0, 0, 0, 1], 2);
        for len in lengths(&normals) {
            assert!((len - 1.0).abs() < 1e-5);
        }
    }
}
