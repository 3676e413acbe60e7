//! Layout description for interleaved vertex buffers.

/// Describes where one primitive variable lives inside each element of an
/// interleaved buffer: `offset` floats into the element, `length` floats
/// of data, `stride` floats between consecutive elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferDescriptor {
    pub offset: usize,
    pub length: usize,
    pub stride: usize,
}

impl BufferDescriptor {
    #[inline]
    pub fn new(offset: usize, length: usize, stride: usize) -> Self {
        Self {
            offset,
            length,
            stride,
        }
    }

    /// A tightly packed buffer of `length`-float elements.
    #[inline]
    pub fn packed(length: usize) -> Self {
        Self {
            offset: 0,
            length,
            stride: length,
        }
    }

    /// `true` when the described range fits inside one element.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.length > 0 && self.offset + self.length <= self.stride
    }
}
