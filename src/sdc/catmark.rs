//! Catmull-Clark stencil mask weights.
//!
//! These are the raw per-rule weights; the stencil builder in
//! [`far`](crate::far) expands face-centroid contributions into
//! parent-level vertex weights so that every stencil references the parent
//! level only.

/// Edge-point face weight next to a triangle with the smooth-triangle
/// rule enabled (PRman-compatible).
pub const SMOOTH_TRI_EDGE_WEIGHT: f32 = 0.470;

/// Face-point weight: the centroid of an `arity`-sided face.
#[inline]
pub fn face_point_weight(arity: usize) -> f32 {
    1.0 / arity as f32
}

/// Per-face weight of the smooth edge-point mask, given whether each
/// incident face is a triangle and whether the smooth-triangle rule is in
/// effect. The default weight is 1/4 per face.
///
/// Both faces receive the same weight; the endpoint weights are adjusted
/// to keep the mask a partition of unity.
pub fn edge_point_face_weight(
    smooth_triangles: bool,
    face0_is_triangle: bool,
    face1_is_triangle: bool,
) -> f32 {
    if !smooth_triangles {
        return 0.25;
    }
    match (face0_is_triangle, face1_is_triangle) {
        (true, true) => SMOOTH_TRI_EDGE_WEIGHT * 0.5,
        (true, false) | (false, true) => (SMOOTH_TRI_EDGE_WEIGHT + 0.25) * 0.5,
        (false, false) => 0.25,
    }
}

/// Per-endpoint weight of the smooth edge-point mask complementing
/// [`edge_point_face_weight`].
#[inline]
pub fn edge_point_vertex_weight(face_weight: f32) -> f32 {
    0.5 - face_weight
}

/// Weights of the smooth vertex-point mask for a vertex of the given
/// valence: `(own, neighbor, face_centroid)` where each of the `valence`
/// neighbors and each of the `valence` incident face centroids receives
/// the respective weight.
#[inline]
pub fn smooth_vertex_weights(valence: usize) -> (f32, f32, f32) {
    let n = valence as f32;
    ((n - 2.0) / n, 1.0 / (n * n), 1.0 / (n * n))
}

/// Own-vertex weight of the crease vertex-point mask.
pub const CREASE_VERTEX_WEIGHT: f32 = 0.75;

/// Weight of each of the two crease-edge endpoints in the crease
/// vertex-point mask.
pub const CREASE_ENDPOINT_WEIGHT: f32 = 0.125;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_mask_is_partition_of_unity() {
        for &(t0, t1) in &[(false, false), (true, false), (true, true)] {
            let fw = edge_point_face_weight(true, t0, t1);
            let vw = edge_point_vertex_weight(fw);
            assert!((2.0 * fw + 2.0 * vw - 1.0).abs() < 1e-6);
        }
        assert_eq!(edge_point_face_weight(false, true, true), 0.25);
    }

    #[test]
    fn smooth_vertex_mask_is_partition_of_unity() {
        for valence in 3..8 {
            let (own, neighbor, face) = smooth_vertex_weights(valence);
            let sum = own + valence as f32 * (neighbor + face);
            assert!((sum - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn crease_mask_is_partition_of_unity() {
        assert!((CREASE_VERTEX_WEIGHT + 2.0 * CREASE_ENDPOINT_WEIGHT - 1.0).abs() < 1e-6);
    }
}
