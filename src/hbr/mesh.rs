//! Arena-based half-edge mesh construction and crease tagging.

use std::collections::HashMap;

use itertools::Itertools;
use log::warn;

use super::face_varying::FaceVaryingTable;
use crate::polygon_mesh::{EdgeCrease, VertexCrease};
use crate::{Index, INVALID_INDEX};

/// A directed edge within one face.
///
/// `opposite` points at the twin half-edge of the adjacent face, or
/// [`INVALID_INDEX`] on a mesh boundary. Sharpness is stored on both
/// directions of an undirected edge.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge {
    pub origin: u32,
    pub destination: u32,
    pub face: u32,
    pub(crate) opposite: u32,
    pub sharpness: f32,
}

impl HalfEdge {
    /// The twin half-edge, if the edge is interior.
    #[inline]
    pub fn opposite(&self) -> Option<Index> {
        (self.opposite != INVALID_INDEX).then_some(Index(self.opposite))
    }

    /// `true` if this half-edge has no twin (lies on a boundary).
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.opposite == INVALID_INDEX
    }
}

#[derive(Debug, Clone, Copy)]
struct Face {
    first_corner: u32,
    corner_count: u32,
    ptex_index: u32,
}

/// A half-edge mesh under construction, addressed by stable integer
/// indices.
///
/// Vertices are created up front as stubs, identity-mapped to the input
/// mesh's vertex indices — the ptex addressing convention downstream
/// depends on this 1:1 mapping. Faces are inserted one at a time and
/// validated against the manifoldness rules before insertion; a face that
/// fails validation is skipped with a warning, contributes zero ptex
/// indices, and never aborts the build.
#[derive(Debug)]
pub struct HbrMesh {
    vertex_sharpness: Vec<f32>,
    faces: Vec<Face>,
    face_vertex_indices: Vec<u32>,
    half_edges: Vec<HalfEdge>,
    /// Directed (origin, destination) → half-edge index.
    edge_map: HashMap<(u32, u32), u32>,
    ptex_index_count: u32,
    fvar: FaceVaryingTable,
}

impl HbrMesh {
    /// Create a mesh with `vertex_count` stub vertices and a face-varying
    /// record width of `fvar_width` floats (0 disables face-varying data).
    pub fn new(vertex_count: usize, fvar_width: usize) -> Self {
        Self {
            vertex_sharpness: vec![0.0; vertex_count],
            faces: Vec::new(),
            face_vertex_indices: Vec::new(),
            half_edges: Vec::new(),
            edge_map: HashMap::new(),
            ptex_index_count: 0,
            fvar: FaceVaryingTable::new(vertex_count, fvar_width),
        }
    }

    /// Number of (stub) vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_sharpness.len()
    }

    /// Number of successfully inserted faces.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Total ptex indices consumed so far: 1 per quad, n per n-gon, 0 per
    /// skipped face (which still reserves its — empty — position in the
    /// running count).
    #[inline]
    pub fn ptex_index_count(&self) -> usize {
        self.ptex_index_count as usize
    }

    /// The first ptex index assigned to a face.
    #[inline]
    pub fn face_ptex_index(&self, face: Index) -> u32 {
        self.faces[usize::from(face)].ptex_index
    }

    /// The vertex indices around a face.
    #[inline]
    pub fn face_vertices(&self, face: Index) -> &[u32] {
        let face = &self.faces[usize::from(face)];
        let first = face.first_corner as usize;
        &self.face_vertex_indices[first..first + face.corner_count as usize]
    }

    /// All face corners, flat, in insertion order.
    #[inline]
    pub fn face_vertex_indices(&self) -> &[u32] {
        &self.face_vertex_indices
    }

    /// Corner counts for all inserted faces.
    pub fn face_vertex_counts(&self) -> impl Iterator<Item = u32> + '_ {
        self.faces.iter().map(|face| face.corner_count)
    }

    /// All half-edges, one per inserted face corner.
    #[inline]
    pub fn half_edges(&self) -> &[HalfEdge] {
        &self.half_edges
    }

    /// Per-vertex sharpness values.
    #[inline]
    pub fn vertex_sharpness(&self) -> &[f32] {
        &self.vertex_sharpness
    }

    /// The packed face-varying records.
    #[inline]
    pub fn face_varying(&self) -> &FaceVaryingTable {
        &self.fvar
    }

    /// Find the half-edge directed `origin → destination`.
    #[inline]
    pub fn find_half_edge(&self, origin: u32, destination: u32) -> Option<Index> {
        self.edge_map.get(&(origin, destination)).map(|&e| Index(e))
    }

    /// Validate and insert one face.
    ///
    /// `fvar_values` holds the packed face-varying record for each corner,
    /// `corner_count × fvar_width` floats total (empty when the width is
    /// 0). Returns the new face index, or `None` if the face was rejected.
    ///
    /// A face is rejected when any of its edges references a nonexistent
    /// vertex, connects a vertex to itself, would make an edge incident to
    /// more than two faces, or repeats an already-present directed edge
    /// (an incident face with flipped winding). Rejected faces reserve an
    /// empty ptex range and are otherwise excluded entirely.
    pub fn add_face(&mut self, corners: &[u32], fvar_values: &[f32]) -> Option<Index> {
        let n = corners.len();
        if n < 3 {
            warn!("skipping face: fewer than 3 vertices");
            return None;
        }
        debug_assert_eq!(fvar_values.len(), n * self.fvar.width());

        for (&origin, &destination) in corners.iter().circular_tuple_windows() {
            if origin as usize >= self.vertex_count() || destination as usize >= self.vertex_count()
            {
                warn!("skipping face: an edge references a nonexistent vertex");
                return None;
            }
            if origin == destination {
                warn!("skipping face: an edge connects a vertex to itself");
                return None;
            }
            // A twin that already has its own twin means a third face on
            // this undirected edge.
            if let Some(&twin) = self.edge_map.get(&(destination, origin)) {
                if self.half_edges[twin as usize].opposite != INVALID_INDEX {
                    warn!("skipping face: non-manifold edge incident to more than 2 faces");
                    return None;
                }
            }
            if self.edge_map.contains_key(&(origin, destination)) {
                warn!(
                    "skipping face: edge ({origin}, {destination}) specified more than once, \
                     an incident face is likely flipped"
                );
                return None;
            }
        }

        let face_index = self.faces.len() as u32;
        let first_corner = self.face_vertex_indices.len() as u32;
        self.faces.push(Face {
            first_corner,
            corner_count: n as u32,
            ptex_index: self.ptex_index_count,
        });
        // Quads consume a single ptex index, all other arities one per
        // corner.
        self.ptex_index_count += if n == 4 { 1 } else { n as u32 };

        for (&origin, &destination) in corners.iter().circular_tuple_windows() {
            let half_edge = self.half_edges.len() as u32;
            let opposite = self
                .edge_map
                .get(&(destination, origin))
                .copied()
                .unwrap_or(INVALID_INDEX);
            self.half_edges.push(HalfEdge {
                origin,
                destination,
                face: face_index,
                opposite,
                sharpness: 0.0,
            });
            if opposite != INVALID_INDEX {
                self.half_edges[opposite as usize].opposite = half_edge;
            }
            self.edge_map.insert((origin, destination), half_edge);
        }

        self.face_vertex_indices.extend_from_slice(corners);
        if self.fvar.width() > 0 {
            for (j, &vertex) in corners.iter().enumerate() {
                let item = &fvar_values[j * self.fvar.width()..(j + 1) * self.fvar.width()];
                self.fvar.attach_corner(vertex, item);
            }
        }
        Some(Index(face_index))
    }

    /// Apply edge crease tags.
    ///
    /// Each tag names an undirected edge by its two vertices; the edge is
    /// looked up in either direction. A tag naming a missing edge warns
    /// and is a no-op. Returns the maximum sharpness applied.
    pub fn apply_crease_edges(&mut self, creases: &[EdgeCrease]) -> f32 {
        let mut max_sharpness = 0.0f32;
        for crease in creases {
            let [a, b] = crease.vertices;
            let half_edge = self
                .find_half_edge(a, b)
                .or_else(|| self.find_half_edge(b, a));
            let Some(half_edge) = half_edge else {
                warn!("cannot find edge for crease tag ({a}, {b})");
                continue;
            };
            let sharpness = crease.sharpness.max(0.0);
            let index = usize::from(half_edge);
            self.half_edges[index].sharpness = sharpness;
            let opposite = self.half_edges[index].opposite;
            if opposite != INVALID_INDEX {
                self.half_edges[opposite as usize].sharpness = sharpness;
            }
            max_sharpness = max_sharpness.max(sharpness);
        }
        max_sharpness
    }

    /// Apply vertex crease (corner) tags.
    ///
    /// A tag naming a nonexistent vertex warns and is a no-op. Returns the
    /// maximum sharpness applied.
    pub fn apply_crease_vertices(&mut self, creases: &[VertexCrease]) -> f32 {
        let mut max_sharpness = 0.0f32;
        for crease in creases {
            let Some(slot) = self.vertex_sharpness.get_mut(crease.vertex as usize) else {
                warn!("cannot find vertex for corner tag ({})", crease.vertex);
                continue;
            };
            *slot = crease.sharpness.max(0.0);
            max_sharpness = max_sharpness.max(*slot);
        }
        max_sharpness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_pair() -> HbrMesh {
        // Two quads sharing the edge (1, 2).
        let mut mesh = HbrMesh::new(6, 0);
        assert!(mesh.add_face(&[0, 1, 2, 3], &[]).is_some());
        assert!(mesh.add_face(&[1, 4, 5, 2], &[]).is_some());
        mesh
    }

    #[test]
    fn shared_edge_links_opposites() {
        let mesh = quad_pair();
        let forward = mesh.find_half_edge(1, 2).unwrap();
        let backward = mesh.find_half_edge(2, 1).unwrap();
        assert_eq!(
            mesh.half_edges()[usize::from(forward)].opposite().unwrap(),
            backward
        );
    }

    #[test]
    fn third_face_on_edge_is_rejected() {
        let mut mesh = quad_pair();
        let before = mesh.ptex_index_count();
        assert!(mesh.add_face(&[2, 1, 0, 5], &[]).is_none());
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.ptex_index_count(), before);
    }

    #[test]
    fn flipped_winding_is_rejected() {
        let mut mesh = HbrMesh::new(4, 0);
        assert!(mesh.add_face(&[0, 1, 2], &[]).is_some());
        // Same direction (0, 1) again: the second face is wound the wrong
        // way around.
        assert!(mesh.add_face(&[0, 1, 3], &[]).is_none());
    }

    #[test]
    fn self_loop_and_dangling_vertex_are_rejected() {
        let mut mesh = HbrMesh::new(3, 0);
        assert!(mesh.add_face(&[0, 0, 1], &[]).is_none());
        assert!(mesh.add_face(&[0, 1, 7], &[]).is_none());
        assert_eq!(mesh.face_count(), 0);
    }

    #[test]
    fn ptex_indexing_quads_and_ngons() {
        let mut mesh = HbrMesh::new(7, 0);
        mesh.add_face(&[0, 1, 2, 3], &[]); // quad: 1 index
        mesh.add_face(&[3, 2, 4], &[]); // triangle: 3 indices
        let pentagon = mesh.add_face(&[2, 1, 5, 6, 4], &[]).unwrap();
        assert_eq!(mesh.face_ptex_index(pentagon), 4);
        assert_eq!(mesh.ptex_index_count(), 9);
    }

    #[test]
    fn crease_tags_apply_and_report_max() {
        let mut mesh = quad_pair();
        let max = mesh.apply_crease_edges(&[
            EdgeCrease {
                vertices: [2, 1],
                sharpness: 3.5,
            },
            EdgeCrease {
                vertices: [0, 5],
                sharpness: 9.0,
            }, // no such edge: warn + no-op
        ]);
        assert_eq!(max, 3.5);
        let e = mesh.find_half_edge(1, 2).unwrap();
        assert_eq!(mesh.half_edges()[usize::from(e)].sharpness, 3.5);

        let max = mesh.apply_crease_vertices(&[VertexCrease {
            vertex: 1,
            sharpness: 2.0,
        }]);
        assert_eq!(max, 2.0);
        assert_eq!(mesh.vertex_sharpness()[1], 2.0);
    }
}
