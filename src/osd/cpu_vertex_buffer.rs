//! CPU-side vertex buffer.

use crate::error::{Error, Result};

/// Concrete vertex buffer for CPU subdivision.
///
/// Holds `vertices_len` elements of `elements_len` floats each, zero
/// initialized. An instance of this buffer can be passed to
/// [`evaluate_stencils()`](crate::osd::cpu_evaluator::evaluate_stencils()).
#[derive(Debug)]
pub struct CpuVertexBuffer {
    elements_len: usize,
    vertices_len: usize,
    data: Vec<f32>,
}

impl CpuVertexBuffer {
    #[inline]
    pub fn new(elements_len: usize, vertices_len: usize) -> CpuVertexBuffer {
        CpuVertexBuffer {
            elements_len,
            vertices_len,
            data: vec![0.0; elements_len * vertices_len],
        }
    }

    /// Returns how many elements are defined in this vertex buffer.
    #[inline]
    pub fn elements_len(&self) -> usize {
        self.elements_len
    }

    /// Returns how many vertices are allocated in this vertex buffer.
    #[inline]
    pub fn vertices_len(&self) -> usize {
        self.vertices_len
    }

    /// Get the contents of this vertex buffer as a slice of [`f32`].
    #[inline]
    pub fn bind_cpu_buffer(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub(crate) fn bind_cpu_buffer_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Copy `vertices_len` elements from `src` into the buffer starting
    /// at element `start_vertex`. This is how client code provides the
    /// coarse data before evaluation.
    pub fn update_data(
        &mut self,
        src: &[f32],
        start_vertex: usize,
        vertices_len: usize,
    ) -> Result<()> {
        let elements_len = self.elements_len;
        let floats = vertices_len * elements_len;
        if src.len() < floats {
            return Err(Error::InvalidBufferSize {
                expected: floats,
                actual: src.len(),
            });
        }
        let first = start_vertex * elements_len;
        let last = first + floats;
        if last > self.data.len() {
            return Err(Error::IndexOutOfBounds {
                index: start_vertex + vertices_len,
                max: self.vertices_len,
            });
        }
        self.data[first..last].copy_from_slice(&src[..floats]);
        Ok(())
    }
}
