//! Per-level refined topology.
//!
//! A [`TopologyLevel`] owns the complete connectivity of one refinement
//! level: faces, edges, vertices, their adjacency, sharpness tags and
//! (optionally) the face-varying value indices per face corner. Levels are
//! created and owned by a [`TopologyRefiner`](super::TopologyRefiner);
//! level 0 is derived from the half-edge mesh, every further level from a
//! uniform Catmull-Clark quad split of its parent.
//!
//! Vertices of each level occupy a contiguous global index range
//! immediately following the previous level's, exposed through
//! [`first_vertex_offset()`](TopologyLevel::first_vertex_offset) — this is
//! what allows O(1) slicing of a flat results buffer by level. Within a
//! level, child vertices are ordered face points first, then edge points,
//! then vertex points.

use std::collections::HashMap;

use crate::hbr::HbrMesh;
use crate::sdc::{self, CreasingMethod};
use crate::{Index, INVALID_INDEX};

/// Provenance of one refined face-varying value, used to build the
/// face-varying stencil set.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FvarSource {
    /// Average of a parent face's corner values.
    Face(u32),
    /// Value at a parent edge's midpoint; `side_face` is the incident
    /// parent face this value belongs to, or [`INVALID_INDEX`] when the
    /// channel is continuous across the edge and both sides share it.
    Edge { edge: u32, side_face: u32 },
    /// Refinement of one parent value at a parent vertex.
    Vertex { vertex: u32, parent_value: u32 },
}

/// Face-varying topology of one level.
#[derive(Debug, Default)]
pub(crate) struct FvarLevel {
    pub first_value_offset: u32,
    pub value_count: u32,
    /// Per face corner (parallel to `face_vertices`), the local value id.
    pub face_values: Vec<u32>,
    /// Per local value, where it came from. Empty at level 0.
    pub sources: Vec<FvarSource>,
}

/// Complete topology of one refinement level.
#[derive(Debug, Default)]
pub struct TopologyLevel {
    pub(crate) first_vertex_offset: u32,
    pub(crate) vertex_count: u32,
    /// Prefix offsets into `face_vertices`, length `face_count + 1`.
    pub(crate) face_offsets: Vec<u32>,
    pub(crate) face_vertices: Vec<u32>,
    /// Per face corner, the edge from that corner to the next.
    pub(crate) face_edges: Vec<u32>,
    pub(crate) edge_vertices: Vec<[u32; 2]>,
    pub(crate) edge_sharpness: Vec<f32>,
    /// Incident faces per edge; `[f, INVALID_INDEX]` on a boundary.
    pub(crate) edge_faces: Vec<[u32; 2]>,
    pub(crate) vertex_sharpness: Vec<f32>,
    pub(crate) vertex_edge_offsets: Vec<u32>,
    pub(crate) vertex_edges: Vec<u32>,
    pub(crate) vertex_face_offsets: Vec<u32>,
    pub(crate) vertex_faces: Vec<u32>,
    pub(crate) fvar: Option<FvarLevel>,
}

/// ### Inventory and per-component access
impl TopologyLevel {
    /// Number of vertices in this level.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count as usize
    }

    /// Number of faces in this level.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.face_offsets.len().saturating_sub(1)
    }

    /// Number of edges in this level.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge_vertices.len()
    }

    /// Total number of face corners in this level.
    #[inline]
    pub fn face_vertex_count(&self) -> usize {
        self.face_vertices.len()
    }

    /// Global index of this level's first vertex in the flat, all-levels
    /// vertex ordering.
    #[inline]
    pub fn first_vertex_offset(&self) -> usize {
        self.first_vertex_offset as usize
    }

    /// The vertices incident to a face, in winding order.
    pub fn face_vertices(&self, face: Index) -> Option<&[u32]> {
        let face = usize::from(face);
        if face >= self.face_count() {
            return None;
        }
        let first = self.face_offsets[face] as usize;
        let last = self.face_offsets[face + 1] as usize;
        Some(&self.face_vertices[first..last])
    }

    /// Iterate over all faces as slices of vertex indices.
    pub fn face_vertices_iter(&self) -> impl Iterator<Item = &[u32]> {
        (0..self.face_count()).map(|f| self.face_vertices(f.into()).unwrap_or(&[]))
    }

    /// The edges incident to a face, in winding order.
    pub fn face_edges(&self, face: Index) -> Option<&[u32]> {
        let face = usize::from(face);
        if face >= self.face_count() {
            return None;
        }
        let first = self.face_offsets[face] as usize;
        let last = self.face_offsets[face + 1] as usize;
        Some(&self.face_edges[first..last])
    }

    /// The two vertices of an edge.
    #[inline]
    pub fn edge_vertices(&self, edge: Index) -> Option<[u32; 2]> {
        self.edge_vertices.get(usize::from(edge)).copied()
    }

    /// Sharpness tagged on an edge at this level.
    #[inline]
    pub fn edge_sharpness(&self, edge: Index) -> f32 {
        self.edge_sharpness[usize::from(edge)]
    }

    /// Sharpness tagged on a vertex at this level.
    #[inline]
    pub fn vertex_sharpness(&self, vertex: Index) -> f32 {
        self.vertex_sharpness[usize::from(vertex)]
    }

    /// `true` if the edge has exactly one incident face.
    #[inline]
    pub fn is_edge_boundary(&self, edge: Index) -> bool {
        self.edge_faces[usize::from(edge)][1] == INVALID_INDEX
    }

    /// `true` if any edge incident to the vertex is a boundary edge.
    pub fn is_vertex_boundary(&self, vertex: Index) -> bool {
        self.vertex_edges(vertex)
            .iter()
            .any(|&e| self.is_edge_boundary(Index(e)))
    }

    /// The edges incident to a vertex.
    #[inline]
    pub fn vertex_edges(&self, vertex: Index) -> &[u32] {
        let v = usize::from(vertex);
        let first = self.vertex_edge_offsets[v] as usize;
        let last = self.vertex_edge_offsets[v + 1] as usize;
        &self.vertex_edges[first..last]
    }

    /// The faces incident to a vertex.
    #[inline]
    pub fn vertex_faces(&self, vertex: Index) -> &[u32] {
        let v = usize::from(vertex);
        let first = self.vertex_face_offsets[v] as usize;
        let last = self.vertex_face_offsets[v + 1] as usize;
        &self.vertex_faces[first..last]
    }
}

/// ### Face-varying data access
impl TopologyLevel {
    /// Number of distinct face-varying values in this level (0 when no
    /// channel is present).
    #[inline]
    pub fn face_varying_value_count(&self) -> usize {
        self.fvar.as_ref().map_or(0, |fv| fv.value_count as usize)
    }

    /// Global index of this level's first face-varying value.
    #[inline]
    pub fn face_varying_first_value_offset(&self) -> usize {
        self.fvar
            .as_ref()
            .map_or(0, |fv| fv.first_value_offset as usize)
    }

    /// The face-varying value indices at a face's corners.
    pub fn face_varying_values_on_face(&self, face: Index) -> Option<&[u32]> {
        let fvar = self.fvar.as_ref()?;
        let face = usize::from(face);
        if face >= self.face_count() {
            return None;
        }
        let first = self.face_offsets[face] as usize;
        let last = self.face_offsets[face + 1] as usize;
        Some(&fvar.face_values[first..last])
    }

    /// The face-varying value a face uses at a given vertex.
    pub(crate) fn corner_value(&self, face: u32, vertex: u32) -> u32 {
        let Some(fvar) = self.fvar.as_ref() else {
            return INVALID_INDEX;
        };
        let first = self.face_offsets[face as usize] as usize;
        let last = self.face_offsets[face as usize + 1] as usize;
        for corner in first..last {
            if self.face_vertices[corner] == vertex {
                return fvar.face_values[corner];
            }
        }
        INVALID_INDEX
    }

    /// `true` if the face-varying channel is continuous across an
    /// interior edge: both incident faces reference the same value at both
    /// endpoints.
    pub(crate) fn is_edge_fvar_continuous(&self, edge: u32) -> bool {
        let [f0, f1] = self.edge_faces[edge as usize];
        if f1 == INVALID_INDEX {
            return false;
        }
        let [a, b] = self.edge_vertices[edge as usize];
        self.corner_value(f0, a) == self.corner_value(f1, a)
            && self.corner_value(f0, b) == self.corner_value(f1, b)
    }

    /// The distinct face-varying values attached to a vertex, in face
    /// order.
    pub(crate) fn vertex_values(&self, vertex: u32) -> Vec<u32> {
        let mut values = Vec::new();
        for &face in self.vertex_faces(Index(vertex)) {
            let value = self.corner_value(face, vertex);
            if !values.contains(&value) {
                values.push(value);
            }
        }
        values
    }
}

/// Builds `face_edges`, `edge_vertices` and `edge_faces` from face lists.
fn build_edges(
    face_offsets: &[u32],
    face_vertices: &[u32],
) -> (Vec<u32>, Vec<[u32; 2]>, Vec<[u32; 2]>) {
    let mut face_edges = vec![INVALID_INDEX; face_vertices.len()];
    let mut edge_vertices: Vec<[u32; 2]> = Vec::new();
    let mut edge_faces: Vec<[u32; 2]> = Vec::new();
    let mut edge_map: HashMap<(u32, u32), u32> = HashMap::new();

    for face in 0..face_offsets.len() - 1 {
        let first = face_offsets[face] as usize;
        let last = face_offsets[face + 1] as usize;
        let n = last - first;
        for i in 0..n {
            let a = face_vertices[first + i];
            let b = face_vertices[first + (i + 1) % n];
            let key = (a.min(b), a.max(b));
            let edge = *edge_map.entry(key).or_insert_with(|| {
                edge_vertices.push([a, b]);
                edge_faces.push([INVALID_INDEX; 2]);
                (edge_vertices.len() - 1) as u32
            });
            let sides = &mut edge_faces[edge as usize];
            if sides[0] == INVALID_INDEX {
                sides[0] = face as u32;
            } else {
                sides[1] = face as u32;
            }
            face_edges[first + i] = edge;
        }
    }
    (face_edges, edge_vertices, edge_faces)
}

/// Builds vertex→edge and vertex→face adjacency as offset/flat pairs.
fn build_vertex_adjacency(
    vertex_count: usize,
    face_offsets: &[u32],
    face_vertices: &[u32],
    edge_vertices: &[[u32; 2]],
) -> (Vec<u32>, Vec<u32>, Vec<u32>, Vec<u32>) {
    let mut edge_counts = vec![0u32; vertex_count + 1];
    for &[a, b] in edge_vertices {
        edge_counts[a as usize + 1] += 1;
        edge_counts[b as usize + 1] += 1;
    }
    for i in 1..edge_counts.len() {
        edge_counts[i] += edge_counts[i - 1];
    }
    let vertex_edge_offsets = edge_counts;
    let mut cursor = vertex_edge_offsets.clone();
    let mut vertex_edges = vec![0u32; *vertex_edge_offsets.last().unwrap_or(&0) as usize];
    for (edge, &[a, b]) in edge_vertices.iter().enumerate() {
        for v in [a, b] {
            vertex_edges[cursor[v as usize] as usize] = edge as u32;
            cursor[v as usize] += 1;
        }
    }

    let mut face_counts = vec![0u32; vertex_count + 1];
    for &v in face_vertices {
        face_counts[v as usize + 1] += 1;
    }
    for i in 1..face_counts.len() {
        face_counts[i] += face_counts[i - 1];
    }
    let vertex_face_offsets = face_counts;
    let mut cursor = vertex_face_offsets.clone();
    let mut vertex_faces = vec![0u32; *vertex_face_offsets.last().unwrap_or(&0) as usize];
    for face in 0..face_offsets.len() - 1 {
        let first = face_offsets[face] as usize;
        let last = face_offsets[face + 1] as usize;
        for &v in &face_vertices[first..last] {
            vertex_faces[cursor[v as usize] as usize] = face as u32;
            cursor[v as usize] += 1;
        }
    }
    (
        vertex_edge_offsets,
        vertex_edges,
        vertex_face_offsets,
        vertex_faces,
    )
}

impl TopologyLevel {
    /// Build level 0 from a finished half-edge mesh.
    pub(crate) fn from_hbr(mesh: &HbrMesh) -> Self {
        let mut face_offsets = Vec::with_capacity(mesh.face_count() + 1);
        face_offsets.push(0u32);
        let mut total = 0u32;
        for count in mesh.face_vertex_counts() {
            total += count;
            face_offsets.push(total);
        }
        let face_vertices = mesh.face_vertex_indices().to_vec();

        let (face_edges, edge_vertices, edge_faces) = build_edges(&face_offsets, &face_vertices);

        // Edge sharpness comes off the half-edge tags.
        let edge_sharpness = edge_vertices
            .iter()
            .map(|&[a, b]| {
                mesh.find_half_edge(a, b)
                    .or_else(|| mesh.find_half_edge(b, a))
                    .map_or(0.0, |he| mesh.half_edges()[usize::from(he)].sharpness)
            })
            .collect();

        let vertex_count = mesh.vertex_count();
        let (vertex_edge_offsets, vertex_edges, vertex_face_offsets, vertex_faces) =
            build_vertex_adjacency(vertex_count, &face_offsets, &face_vertices, &edge_vertices);

        let fvar = (mesh.face_varying().width() > 0).then(|| FvarLevel {
            first_value_offset: 0,
            value_count: mesh.face_varying().record_count() as u32,
            face_values: mesh.face_varying().corner_records().to_vec(),
            sources: Vec::new(),
        });

        Self {
            first_vertex_offset: 0,
            vertex_count: vertex_count as u32,
            face_offsets,
            face_vertices,
            face_edges,
            edge_vertices,
            edge_sharpness,
            edge_faces,
            vertex_sharpness: mesh.vertex_sharpness().to_vec(),
            vertex_edge_offsets,
            vertex_edges,
            vertex_face_offsets,
            vertex_faces,
            fvar,
        }
    }

    /// Uniformly quad-split this level into its child level.
    ///
    /// Child vertices are ordered face points, edge points, vertex points;
    /// child faces are emitted parent-face-major, corner-major, so parent
    /// face `f`'s `i`-th child is the quad anchored at its `i`-th corner.
    pub(crate) fn refine(&self, creasing_method: CreasingMethod) -> Self {
        let face_count = self.face_count() as u32;
        let edge_count = self.edge_count() as u32;
        let parent_vertex_count = self.vertex_count;

        let face_point = |f: u32| f;
        let edge_point = |e: u32| face_count + e;
        let vertex_point = |v: u32| face_count + edge_count + v;
        let child_vertex_count = face_count + edge_count + parent_vertex_count;

        // Child connectivity.
        let mut face_offsets = Vec::with_capacity(self.face_vertices.len() + 1);
        face_offsets.push(0u32);
        let mut face_vertices = Vec::with_capacity(self.face_vertices.len() * 4);
        for face in 0..face_count {
            let corners = self.face_vertices(Index(face)).unwrap_or(&[]);
            let edges = self.face_edges(Index(face)).unwrap_or(&[]);
            let n = corners.len();
            for i in 0..n {
                let prev = (i + n - 1) % n;
                face_vertices.extend_from_slice(&[
                    vertex_point(corners[i]),
                    edge_point(edges[i]),
                    face_point(face),
                    edge_point(edges[prev]),
                ]);
                face_offsets.push(face_vertices.len() as u32);
            }
        }

        let (face_edges, edge_vertices, edge_faces) = build_edges(&face_offsets, &face_vertices);

        // Child sharpness: only the sub-edges of parent edges inherit
        // (decayed) sharpness, everything else starts smooth.
        let edge_sharpness = edge_vertices
            .iter()
            .map(|&[a, b]| {
                let (low, high) = (a.min(b), a.max(b));
                let is_edge_sub = low >= face_count
                    && low < face_count + edge_count
                    && high >= face_count + edge_count;
                if !is_edge_sub {
                    return 0.0;
                }
                let parent_edge = low - face_count;
                let end_vertex = high - face_count - edge_count;
                let sharpness = self.edge_sharpness[parent_edge as usize];
                if !sdc::is_sharp(sharpness) {
                    return 0.0;
                }
                match creasing_method {
                    CreasingMethod::Uniform => sdc::decayed_sharpness(sharpness),
                    CreasingMethod::Chaikin => {
                        let adjacent: Vec<f32> = self
                            .vertex_edges(Index(end_vertex))
                            .iter()
                            .filter(|&&e| e != parent_edge)
                            .map(|&e| self.edge_sharpness[e as usize])
                            .filter(|&s| sdc::is_sharp(s))
                            .collect();
                        sdc::chaikin_child_sharpness(sharpness, &adjacent)
                    }
                }
            })
            .collect();

        let mut vertex_sharpness = vec![0.0f32; child_vertex_count as usize];
        for v in 0..parent_vertex_count {
            vertex_sharpness[vertex_point(v) as usize] =
                sdc::decayed_sharpness(self.vertex_sharpness[v as usize]);
        }

        let (vertex_edge_offsets, vertex_edges, vertex_face_offsets, vertex_faces) =
            build_vertex_adjacency(
                child_vertex_count as usize,
                &face_offsets,
                &face_vertices,
                &edge_vertices,
            );

        let fvar = self.fvar.as_ref().map(|parent_fvar| {
            self.refine_fvar(parent_fvar, &face_offsets)
        });

        Self {
            first_vertex_offset: self.first_vertex_offset + parent_vertex_count,
            vertex_count: child_vertex_count,
            face_offsets,
            face_vertices,
            face_edges,
            edge_vertices,
            edge_sharpness,
            edge_faces,
            vertex_sharpness,
            vertex_edge_offsets,
            vertex_edges,
            vertex_face_offsets,
            vertex_faces,
            fvar,
        }
    }

    /// Derive the child level's face-varying values.
    ///
    /// Value identity is purely topological: one value per parent face,
    /// one per parent edge side (shared when the channel is continuous
    /// across the edge), one per distinct parent value at each vertex.
    /// The interpolation weights are chosen later by the stencil builder.
    fn refine_fvar(&self, parent: &FvarLevel, child_face_offsets: &[u32]) -> FvarLevel {
        let face_count = self.face_count() as u32;
        let edge_count = self.edge_count() as u32;

        let mut sources: Vec<FvarSource> = Vec::new();

        // One value per parent face, ids 0..face_count.
        for face in 0..face_count {
            sources.push(FvarSource::Face(face));
        }

        // Edge values: shared when continuous, per side otherwise.
        let mut shared_edge_value: HashMap<u32, u32> = HashMap::new();
        let mut side_edge_value: HashMap<(u32, u32), u32> = HashMap::new();
        for edge in 0..edge_count {
            if self.is_edge_fvar_continuous(edge) {
                shared_edge_value.insert(edge, sources.len() as u32);
                sources.push(FvarSource::Edge {
                    edge,
                    side_face: INVALID_INDEX,
                });
            } else {
                for face in self.edge_faces[edge as usize] {
                    if face != INVALID_INDEX {
                        side_edge_value.insert((edge, face), sources.len() as u32);
                        sources.push(FvarSource::Edge {
                            edge,
                            side_face: face,
                        });
                    }
                }
            }
        }

        // Vertex values: one child per distinct parent value at a vertex,
        // created in face-corner order.
        let mut vertex_value: HashMap<(u32, u32), u32> = HashMap::new();
        for face in 0..face_count {
            let first = self.face_offsets[face as usize] as usize;
            let last = self.face_offsets[face as usize + 1] as usize;
            for corner in first..last {
                let key = (self.face_vertices[corner], parent.face_values[corner]);
                let next = sources.len() as u32;
                vertex_value.entry(key).or_insert_with(|| {
                    sources.push(FvarSource::Vertex {
                        vertex: key.0,
                        parent_value: key.1,
                    });
                    next
                });
            }
        }

        let edge_value = |edge: u32, face: u32| -> u32 {
            shared_edge_value
                .get(&edge)
                .or_else(|| side_edge_value.get(&(edge, face)))
                .copied()
                .unwrap_or(INVALID_INDEX)
        };

        // Child corner values, mirroring the child-face emission order.
        let mut face_values = Vec::with_capacity(child_face_offsets.len() * 4);
        for face in 0..face_count {
            let first = self.face_offsets[face as usize] as usize;
            let last = self.face_offsets[face as usize + 1] as usize;
            let corners = &self.face_vertices[first..last];
            let edges = &self.face_edges[first..last];
            let values = &parent.face_values[first..last];
            let n = corners.len();
            for i in 0..n {
                let prev = (i + n - 1) % n;
                face_values.extend_from_slice(&[
                    vertex_value[&(corners[i], values[i])],
                    edge_value(edges[i], face),
                    face,
                    edge_value(edges[prev], face),
                ]);
            }
        }

        FvarLevel {
            first_value_offset: parent.first_value_offset + parent.value_count,
            value_count: sources.len() as u32,
            face_values,
            sources,
        }
    }
}
