//! # OpenSubdiv-style evaluation layer
//! `osd` makes [`far`](crate::far) structures consumable by concrete
//! backends. The CPU path owns flat float buffers and applies stencil
//! tables to them level by level; the draw path assembles per-patch-type
//! shader source configurations for a caller-supplied compiler.
//!
//! Evaluators do not own vertex buffers: clients fill a
//! [`CpuVertexBuffer`] with the coarse data, hand it to
//! [`evaluate_stencils()`] together with the matching
//! [`StencilTable`](crate::far::StencilTable), and read the refined
//! results back out of the same buffer.

pub mod buffer_descriptor;
pub use buffer_descriptor::*;

pub mod cpu_evaluator;
pub use cpu_evaluator::*;

pub mod cpu_vertex_buffer;
pub use cpu_vertex_buffer::*;

pub mod draw_registry;
pub use draw_registry::*;
