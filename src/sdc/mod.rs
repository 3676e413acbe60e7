//! Subdivision core: scheme options, sharpness semantics and creasing.
//!
//! Sharpness values range from 0 (smooth) to [`SHARPNESS_INFINITE`] (10, a
//! number chosen for historical reasons): a crease at 10 or more is
//! infinitely sharp and never decays; anything below decays by one unit
//! per refinement level, so a semi-sharp crease transitions into the
//! smooth rule after `ceil(sharpness)` levels.

pub mod catmark;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Sharpness of a smooth edge or vertex.
pub const SHARPNESS_SMOOTH: f32 = 0.0;

/// Sharpness at or above which a crease is infinitely sharp and no longer
/// decays across refinement levels.
pub const SHARPNESS_INFINITE: f32 = 10.0;

/// `true` if the sharpness affects the subdivision rule at all.
#[inline]
pub fn is_sharp(sharpness: f32) -> bool {
    sharpness > SHARPNESS_SMOOTH
}

/// `true` if the sharpness is infinite (never decays).
#[inline]
pub fn is_infinitely_sharp(sharpness: f32) -> bool {
    sharpness >= SHARPNESS_INFINITE
}

/// Controls how boundary edges and vertices are interpolated.
///
/// The numeric values match the host's serialized enum and must not
/// change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum BoundaryInterpolation {
    /// No boundary interpolation: boundary vertices keep their position.
    #[default]
    None = 0,
    /// Boundary edges are subdivided as infinitely sharp creases; boundary
    /// vertices (corners included) are smoothed along the boundary curve.
    EdgeOnly = 1,
    /// Like [`EdgeOnly`](Self::EdgeOnly), but a vertex with exactly one
    /// incident face (a corner) is held sharp.
    EdgeAndCorner = 2,
    /// Every boundary vertex is held sharp.
    AlwaysSharp = 3,
}

impl BoundaryInterpolation {
    /// Convert a host-serialized value, falling back to [`None`](Self::None)
    /// (with an error logged) when the value is out of range.
    pub fn from_host(value: u8) -> Self {
        Self::try_from(value).unwrap_or_else(|_| {
            log::error!("invalid boundary interpolation value {value}, falling back to None");
            Self::None
        })
    }
}

/// Controls how boundaries and seams are treated for face-varying data.
///
/// Same host values as [`BoundaryInterpolation`], applied to the
/// face-varying channel: `None` means bilinear interpolation of the
/// channel everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum FaceVaryingInterpolation {
    /// Bilinear interpolation of the channel everywhere.
    #[default]
    None = 0,
    /// Smooth channel interior; seams and boundaries subdivide as sharp
    /// creases, corners included in the crease rule.
    EdgeOnly = 1,
    /// Like [`EdgeOnly`](Self::EdgeOnly), but face-varying corners (a
    /// value used by a single face) are held.
    EdgeAndCorner = 2,
    /// Smooth channel interior only; every value on a seam or boundary is
    /// held.
    AlwaysSharp = 3,
}

impl FaceVaryingInterpolation {
    /// Convert a host-serialized value, falling back to [`None`](Self::None)
    /// (with an error logged) when the value is out of range.
    pub fn from_host(value: u8) -> Self {
        Self::try_from(value).unwrap_or_else(|_| {
            log::error!(
                "invalid face-varying interpolation value {value}, falling back to None"
            );
            Self::None
        })
    }
}

/// Method used to subdivide semi-sharp crease sharpness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum CreasingMethod {
    /// Subtract one unit per level, uniformly along the crease.
    #[default]
    Uniform = 0,
    /// Chaikin's curve-subdivision weighting: improves the appearance of
    /// multi-edge creases with varying weight.
    Chaikin = 1,
}

/// Face-point rule variant for triangular faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum TriangleSubdivision {
    /// The standard Catmull-Clark rules applied uniformly.
    #[default]
    CatmullClark = 0,
    /// Alternate edge-point weighting next to triangles, empirically
    /// determined to make triangles subdivide more smoothly.
    Smooth = 1,
}

/// Subdivision rule in effect at a vertex, determined by its own
/// sharpness and the number of sharp incident edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// No sharp features: the smooth vertex-point mask.
    Smooth,
    /// One sharp incident edge: still the smooth mask.
    Dart,
    /// Exactly two sharp incident edges: averaged along the crease.
    Crease,
    /// Sharp vertex or more than two sharp incident edges: held in place.
    Corner,
}

/// Classify a vertex by its sharpness and the number of sharp incident
/// edges.
pub fn vertex_rule(vertex_sharpness: f32, sharp_edge_count: usize) -> Rule {
    if is_sharp(vertex_sharpness) {
        return Rule::Corner;
    }
    match sharp_edge_count {
        0 => Rule::Smooth,
        1 => Rule::Dart,
        2 => Rule::Crease,
        _ => Rule::Corner,
    }
}

/// Uniform per-level sharpness decay; infinite sharpness never decays.
#[inline]
pub fn decayed_sharpness(sharpness: f32) -> f32 {
    if is_infinitely_sharp(sharpness) {
        sharpness
    } else {
        (sharpness - 1.0).max(0.0)
    }
}

/// Child sharpness of a crease edge at one of its end vertices under
/// [`CreasingMethod::Chaikin`].
///
/// `adjacent` holds the sharpness of the *other* crease edges incident to
/// that end vertex; the child edge is weighted 3:1 toward its parent
/// before the one-unit decay.
pub fn chaikin_child_sharpness(parent: f32, adjacent: &[f32]) -> f32 {
    if is_infinitely_sharp(parent) {
        return parent;
    }
    if adjacent.is_empty() {
        return decayed_sharpness(parent);
    }
    let neighbor_average = adjacent.iter().sum::<f32>() / adjacent.len() as f32;
    (0.25 * (3.0 * parent + neighbor_average) - 1.0).max(0.0)
}

/// Transitional weight in `[0, 1]` blending the smooth mask toward the
/// sharp mask when the participating sharpness values are fractional.
///
/// The weight is the average of the sharpness values clamped to 1, over
/// the values that are sharp at all; 0 if none are.
pub fn fractional_weight(vertex_sharpness: f32, edge_sharpness: &[f32]) -> f32 {
    let mut sum = 0.0f32;
    let mut count = 0usize;
    if is_sharp(vertex_sharpness) {
        sum += vertex_sharpness.min(1.0);
        count += 1;
    }
    for &s in edge_sharpness {
        if is_sharp(s) {
            sum += s.min(1.0);
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_decay_clamps_at_zero_and_holds_infinite() {
        assert_eq!(decayed_sharpness(2.5), 1.5);
        assert_eq!(decayed_sharpness(0.5), 0.0);
        assert_eq!(decayed_sharpness(SHARPNESS_INFINITE), SHARPNESS_INFINITE);
    }

    #[test]
    fn chaikin_weights_parent_three_to_one() {
        // Isolated crease edge falls back to uniform decay.
        assert_eq!(chaikin_child_sharpness(3.0, &[]), 2.0);
        // Multi-edge crease with varying weights pulls toward the
        // neighbor average.
        let child = chaikin_child_sharpness(4.0, &[2.0]);
        assert!((child - (0.25 * (12.0 + 2.0) - 1.0)).abs() < 1e-6);
    }

    #[test]
    fn rule_classification() {
        assert_eq!(vertex_rule(0.0, 0), Rule::Smooth);
        assert_eq!(vertex_rule(0.0, 1), Rule::Dart);
        assert_eq!(vertex_rule(0.0, 2), Rule::Crease);
        assert_eq!(vertex_rule(0.0, 3), Rule::Corner);
        assert_eq!(vertex_rule(1.0, 0), Rule::Corner);
    }

    #[test]
    fn host_values_round_trip_and_fall_back() {
        assert_eq!(
            BoundaryInterpolation::from_host(2),
            BoundaryInterpolation::EdgeAndCorner
        );
        assert_eq!(
            BoundaryInterpolation::from_host(17),
            BoundaryInterpolation::None
        );
        assert_eq!(
            FaceVaryingInterpolation::from_host(3),
            FaceVaryingInterpolation::AlwaysSharp
        );
        assert_eq!(
            FaceVaryingInterpolation::from_host(255),
            FaceVaryingInterpolation::None
        );
    }

    #[test]
    fn fractional_weight_averages_clamped() {
        assert_eq!(fractional_weight(0.0, &[0.0, 0.0]), 0.0);
        assert!((fractional_weight(0.0, &[0.5, 1.5]) - 0.75).abs() < 1e-6);
        assert_eq!(fractional_weight(2.0, &[]), 1.0);
    }
}
