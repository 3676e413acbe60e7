//! Topology refinement hierarchy.

use crate::error::{Error, Result};
use crate::hbr::HbrMesh;
use crate::sdc::{
    BoundaryInterpolation, CreasingMethod, FaceVaryingInterpolation, TriangleSubdivision,
};

use super::TopologyLevel;

/// Options controlling the subdivision rules of a [`TopologyRefiner`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TopologyRefinerOptions {
    pub boundary_interpolation: BoundaryInterpolation,
    pub face_varying_interpolation: FaceVaryingInterpolation,
    /// Propagate the boundary-corner treatment to face-varying corners
    /// (values referenced by more than one face at a vertex are held).
    pub face_varying_propagate_corners: bool,
    pub creasing_method: CreasingMethod,
    pub triangle_subdivision: TriangleSubdivision,
}

/// Options for [`TopologyRefiner::refine_uniform()`].
#[derive(Clone, Copy, Debug)]
pub struct UniformRefinementOptions {
    /// Number of quad-split iterations applied to the base level.
    pub refinement_level: usize,
}

impl Default for UniformRefinementOptions {
    fn default() -> Self {
        Self {
            refinement_level: 4,
        }
    }
}

/// Stores the refined topology levels of a base mesh.
///
/// Construction captures the base level from a finished [`HbrMesh`];
/// [`refine_uniform()`](Self::refine_uniform) then appends one
/// [`TopologyLevel`] per quad-split iteration. The refiner is the input to
/// the stencil builders in this module.
#[derive(Debug)]
pub struct TopologyRefiner {
    options: TopologyRefinerOptions,
    levels: Vec<TopologyLevel>,
    face_varying_width: usize,
}

impl TopologyRefiner {
    /// Capture the base level of `mesh`.
    ///
    /// Fails with [`Error::CreateTopologyRefinerFailed`] when the mesh has
    /// no faces left after validation dropped the degenerate ones.
    pub fn new(mesh: &HbrMesh, options: TopologyRefinerOptions) -> Result<Self> {
        if mesh.face_count() == 0 {
            return Err(Error::CreateTopologyRefinerFailed);
        }
        Ok(Self {
            options,
            levels: vec![TopologyLevel::from_hbr(mesh)],
            face_varying_width: mesh.face_varying().width(),
        })
    }

    #[inline]
    pub fn options(&self) -> &TopologyRefinerOptions {
        &self.options
    }

    /// Number of refinements applied (0 before
    /// [`refine_uniform()`](Self::refine_uniform)).
    #[inline]
    pub fn refinement_levels(&self) -> usize {
        self.levels.len() - 1
    }

    /// Access one level of the hierarchy; level 0 is the base mesh.
    #[inline]
    pub fn level(&self, level: usize) -> Option<&TopologyLevel> {
        self.levels.get(level)
    }

    /// The finest level.
    #[inline]
    pub fn max_level(&self) -> &TopologyLevel {
        // Invariant: `levels` is never empty.
        &self.levels[self.levels.len() - 1]
    }

    /// All levels, coarse to fine.
    #[inline]
    pub(crate) fn levels(&self) -> &[TopologyLevel] {
        &self.levels
    }

    /// Total number of vertices summed over all levels.
    pub fn vertex_total_count(&self) -> usize {
        self.levels.iter().map(TopologyLevel::vertex_count).sum()
    }

    /// Total number of faces summed over all levels.
    pub fn face_total_count(&self) -> usize {
        self.levels.iter().map(TopologyLevel::face_count).sum()
    }

    /// Total number of face-varying values summed over all levels.
    pub fn face_varying_value_total_count(&self) -> usize {
        self.levels
            .iter()
            .map(TopologyLevel::face_varying_value_count)
            .sum()
    }

    /// Width in floats of the face-varying channel (0 when absent).
    #[inline]
    pub fn face_varying_channel_width(&self) -> usize {
        self.face_varying_width
    }

    /// Refine the base level uniformly `refinement_level` times.
    ///
    /// Replaces any previous refinement.
    pub fn refine_uniform(&mut self, refinement_options: UniformRefinementOptions) {
        self.levels.truncate(1);
        for _ in 0..refinement_options.refinement_level {
            let child = self.max_level().refine(self.options.creasing_method);
            self.levels.push(child);
        }
    }
}
