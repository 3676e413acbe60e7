//! CPU stencil evaluation.

use crate::error::{Error, Result};
use crate::far::StencilTable;
use crate::osd::{BufferDescriptor, CpuVertexBuffer};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Apply `stencil_table` to `buffer` in place.
///
/// The buffer's first [`control_vertex_count()`](StencilTable::control_vertex_count)
/// elements must hold the coarse data; one refined element per stencil is
/// written after them, in stencil order. Levels are evaluated strictly in
/// sequence since every level's stencils read the previous level's
/// results; within a level, elements are independent (and evaluated in
/// parallel with the `rayon` feature enabled).
pub fn evaluate_stencils(
    buffer: &mut CpuVertexBuffer,
    desc: BufferDescriptor,
    stencil_table: &StencilTable,
) -> Result<()> {
    if !desc.is_valid() || desc.stride != buffer.elements_len() {
        return Err(Error::EvalStencilsFailed);
    }
    let total = stencil_table.control_vertex_count() + stencil_table.len();
    if buffer.vertices_len() < total {
        return Err(Error::InvalidBufferSize {
            expected: total * desc.stride,
            actual: buffer.vertices_len() * desc.stride,
        });
    }

    let stride = desc.stride;
    let mut evaluated = stencil_table.control_vertex_count();
    let mut first_stencil = 0usize;
    let data = buffer.bind_cpu_buffer_mut();

    for &level_size in stencil_table.level_sizes() {
        let level_size = level_size as usize;
        let (done, rest) = data.split_at_mut(evaluated * stride);
        let done = &*done;

        let apply = |element: (usize, &mut [f32])| {
            let (i, chunk) = element;
            let stencil = first_stencil + i;
            let first = stencil_table.offsets()[stencil] as usize;
            let last = first + stencil_table.sizes()[stencil] as usize;
            let indices = &stencil_table.control_indices()[first..last];
            let weights = &stencil_table.weights()[first..last];

            let dst = &mut chunk[desc.offset..desc.offset + desc.length];
            dst.fill(0.0);
            for (&index, &weight) in indices.iter().zip(weights) {
                let src = &done[index as usize * stride + desc.offset..][..desc.length];
                for (d, &s) in dst.iter_mut().zip(src) {
                    *d += s * weight;
                }
            }
        };

        #[cfg(feature = "rayon")]
        rest.par_chunks_mut(stride)
            .take(level_size)
            .enumerate()
            .for_each(apply);
        #[cfg(not(feature = "rayon"))]
        rest.chunks_mut(stride)
            .take(level_size)
            .enumerate()
            .for_each(apply);

        evaluated += level_size;
        first_stencil += level_size;
    }
    Ok(())
}
