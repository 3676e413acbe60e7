//! The host-facing polygon mesh exchange format.
//!
//! [`PolygonMesh`] is the plain-data surface between the host application's
//! native mesh structures and the refinement pipeline: a flat vertex/face
//! description plus the named per-face-corner attribute sets (UVs, colors),
//! crease tags and component groups the host wants carried through
//! subdivision. The pipeline consumes one and produces a new one; it never
//! mutates its input.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Declared channel arity of a color set.
///
/// The numeric values are the channel counts; hosts that serialize the
/// representation numerically can convert with `try_from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ColorRepresentation {
    /// Single alpha channel.
    Alpha = 1,
    /// Three color channels, no alpha.
    Rgb = 3,
    /// Full four-channel color.
    Rgba = 4,
}

impl ColorRepresentation {
    /// Number of float channels this representation occupies in a packed
    /// face-varying record.
    #[inline]
    pub fn channel_count(&self) -> usize {
        u8::from(*self) as usize
    }
}

/// A named UV set with one (u, v) pair per face corner, in face order.
#[derive(Debug, Clone, PartialEq)]
pub struct UvSet {
    pub name: String,
    pub u: Vec<f32>,
    pub v: Vec<f32>,
}

/// A named color set with one RGBA value per face corner, in face order.
///
/// Colors are always stored expanded to four channels; `representation`
/// records how many of them the host considers meaningful.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSet {
    pub name: String,
    pub representation: ColorRepresentation,
    /// Whether the host clamps this set's values to `[0, 1]`.
    pub clamped: bool,
    pub colors: Vec<[f32; 4]>,
}

/// A crease tag on the undirected edge between two named vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCrease {
    pub vertices: [u32; 2],
    pub sharpness: f32,
}

/// A crease (corner) tag on a single vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexCrease {
    pub vertex: u32,
    pub sharpness: f32,
}

/// Geometric entity type of a component group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ComponentType {
    Vertex = 0,
    Edge = 1,
    Polygon = 2,
}

/// An indexed component group (e.g. a per-face shading assignment).
///
/// Only [`ComponentType::Polygon`] groups are propagated through
/// refinement; other types are skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentGroup {
    pub id: u32,
    pub component_type: ComponentType,
    pub elements: Vec<u32>,
}

/// A polygon mesh in the host exchange format.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonMesh {
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Number of corners for each face.
    pub face_vertex_counts: Vec<u32>,
    /// Flat list of vertex indices for all faces, in face order.
    pub face_vertex_indices: Vec<u32>,
    /// Named UV sets, each with one entry per face corner.
    pub uv_sets: Vec<UvSet>,
    /// Named color sets, each with one entry per face corner.
    pub color_sets: Vec<ColorSet>,
    /// Edge crease tags.
    pub crease_edges: Vec<EdgeCrease>,
    /// Vertex crease tags.
    pub crease_vertices: Vec<VertexCrease>,
    /// Component groups to carry through refinement.
    pub groups: Vec<ComponentGroup>,
}

impl PolygonMesh {
    /// Create a mesh from raw topology, without attribute sets.
    pub fn new(
        positions: Vec<[f32; 3]>,
        face_vertex_counts: Vec<u32>,
        face_vertex_indices: Vec<u32>,
    ) -> Self {
        Self {
            positions,
            face_vertex_counts,
            face_vertex_indices,
            ..Default::default()
        }
    }

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of faces.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.face_vertex_counts.len()
    }

    /// Total number of face corners (the length every per-face-corner
    /// attribute array must have).
    #[inline]
    pub fn face_corner_count(&self) -> usize {
        self.face_vertex_indices.len()
    }

    /// The vertex positions as a flat `f32` slice, for feeding a vertex
    /// buffer.
    #[inline]
    pub fn raw_points(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Iterate over faces as slices of vertex indices.
    pub fn faces(&self) -> impl Iterator<Item = &[u32]> {
        let mut offset = 0usize;
        self.face_vertex_counts.iter().map(move |&n| {
            let face = &self.face_vertex_indices[offset..offset + n as usize];
            offset += n as usize;
            face
        })
    }
}
