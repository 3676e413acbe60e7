//! # Feature Adaptive Representation
//! `far` is the refinement layer: it consumes the validated half-edge
//! mesh from [`hbr`](crate::hbr), refines its topology uniformly and
//! turns each refined vertex (and face-varying value) into a stencil over
//! its parent level. The resulting [`StencilTable`] is what the
//! [`osd`](crate::osd) evaluators consume.

pub mod stencil_table;
pub use stencil_table::*;

pub mod topology_level;
pub use topology_level::TopologyLevel;

pub mod topology_refiner;
pub use topology_refiner::*;
