//! # polysmooth
//!
//! Uniform [Catmull-Clark](https://en.wikipedia.org/wiki/Catmull%E2%80%93Clark_subdivision_surface)
//! subdivision surface refinement for arbitrary polygon meshes, including
//! semi-sharp creases, boundary interpolation rules, face-varying data
//! (UV sets and color sets with seam handling) and per-patch-type GPU
//! shader dispatch.
//!
//! The crate is organized the way subdivision libraries traditionally are:
//!
//! * [`hbr`] – a transient half-edge representation built from raw polygon
//!   soup. It validates manifoldness, assigns ptex indices and carries
//!   crease tags and packed face-varying records. It lives only for the
//!   duration of one refinement request.
//! * [`sdc`] – the subdivision core: sharpness semantics, creasing methods
//!   and the Catmull-Clark stencil masks.
//! * [`far`] – "feature-adaptive representation": the
//!   [`TopologyRefiner`](far::TopologyRefiner) turns the half-edge mesh
//!   into a hierarchy of uniformly refined topology levels, and the
//!   [`StencilTable`](far::StencilTable) captures, per level, every refined
//!   point as a weighted combination of its parent-level points.
//! * [`osd`] – evaluation and drawing support: a CPU vertex buffer, the
//!   stencil evaluator, and the patch-type draw registry.
//!
//! The top-level entry point is [`smooth_mesh`], which refines a
//! [`PolygonMesh`] end to end the way a host DCC's smooth-mesh node would:
//!
//! ```
//! use polysmooth::{smooth_mesh, PolygonMesh, PolySmoothOptions};
//!
//! let cube = PolygonMesh::new(
//!     vec![
//!         [-0.5, -0.5, 0.5], [0.5, -0.5, 0.5], [-0.5, 0.5, 0.5], [0.5, 0.5, 0.5],
//!         [-0.5, 0.5, -0.5], [0.5, 0.5, -0.5], [-0.5, -0.5, -0.5], [0.5, -0.5, -0.5],
//!     ],
//!     vec![4; 6],
//!     vec![
//!         0, 1, 3, 2, 2, 3, 5, 4, 4, 5, 7, 6, 6, 7, 1, 0, 1, 7, 5, 3, 6, 0, 2, 4,
//!     ],
//! );
//!
//! let options = PolySmoothOptions {
//!     subdivision_levels: 2,
//!     ..Default::default()
//! };
//!
//! let refined = smooth_mesh(&cube, &options).unwrap();
//! assert_eq!(refined.face_count(), 6 * 16);
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod hbr;
pub mod sdc;
pub mod far;
pub mod osd;

pub mod polygon_mesh;
pub use polygon_mesh::{
    ColorRepresentation, ColorSet, ComponentGroup, ComponentType, EdgeCrease, PolygonMesh, UvSet,
    VertexCrease,
};

pub mod poly_smooth;
pub use poly_smooth::{smooth_mesh, PolySmoothOptions};

/// A vertex, edge, face or face-varying value index in the topology.
///
/// Base-level vertex indices are identity-mapped to the input mesh's vertex
/// indices; refined levels occupy contiguous index ranges following their
/// parent level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Index(pub u32);

/// Sentinel for "no index" (absent opposite half-edge, unset mapping).
pub(crate) const INVALID_INDEX: u32 = u32::MAX;

impl From<u32> for Index {
    fn from(value: u32) -> Self {
        Index(value)
    }
}

impl From<Index> for u32 {
    fn from(index: Index) -> Self {
        index.0
    }
}

impl From<usize> for Index {
    fn from(value: usize) -> Self {
        Index(value as u32)
    }
}

impl From<Index> for usize {
    fn from(index: Index) -> Self {
        index.0 as usize
    }
}
