//! Transient half-edge mesh representation.
//!
//! `hbr` ("hierarchical boundary representation") is the mutable staging
//! area for one refinement request: the [Topology
//! Builder](HbrMesh::add_face) assembles a half-edge mesh from raw polygon
//! soup, crease tags are applied onto it, and face-varying records are
//! packed alongside. Once a
//! [`TopologyRefiner`](crate::far::TopologyRefiner) has been created from
//! it, the half-edge mesh has served its purpose and is dropped — nothing
//! here survives across requests.
//!
//! The structure is an arena of vertex/half-edge/face records addressed by
//! plain indices. Twin ("opposite") relations are index fields with a
//! sentinel for absence; a half-edge without an opposite lies on a mesh
//! boundary.

pub mod mesh;
pub use mesh::*;

pub mod face_varying;
pub use face_varying::*;
