//! Table of subdivision stencils.
//!
//! Every refined vertex is a linear blend of vertices of its parent
//! level. A stencil stores the participating control indices and blending
//! weights; the table holds one stencil per refined vertex (or refined
//! face-varying value), ordered strictly coarse-to-fine so a single flat
//! results buffer can be filled level by level. Control indices are global
//! across levels: stencils of level `n` reference the buffer range of
//! level `n - 1` and nothing finer.
//!
//! Face-centroid contributions of the Catmull-Clark masks are expanded
//! into the parent level's vertices when a stencil is built, so no stencil
//! ever references a vertex of its own level.

use crate::error::{Error, Result};
use crate::sdc::{self, catmark, BoundaryInterpolation, FaceVaryingInterpolation, Rule,
    TriangleSubdivision};
use crate::far::topology_level::{FvarSource, TopologyLevel};
use crate::far::TopologyRefiner;
use crate::{Index, INVALID_INDEX};

/// Gives read access to a single stencil in a [`StencilTable`].
pub struct Stencil<'a> {
    indices: &'a [u32],
    weights: &'a [f32],
}

impl<'a> Stencil<'a> {
    /// Returns the indices of the control vertices.
    pub fn indices(&self) -> &'a [u32] {
        self.indices
    }

    /// Returns the stencil interpolation weights.
    pub fn weights(&self) -> &'a [f32] {
        self.weights
    }
}

/// Selects which data the stencils of a table interpolate.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterpolationMode {
    /// Vertex positions, full Catmull-Clark masks.
    Vertex = 0,
    /// Varying data, bilinear masks over the same topology.
    Varying,
    /// The packed face-varying channel, seam-aware masks.
    FaceVarying,
}

/// Options controlling [`StencilTable::new()`].
#[derive(Clone, Copy, Debug)]
pub struct StencilTableOptions {
    pub interpolation_mode: InterpolationMode,
    /// Refinement levels beyond this are ignored.
    pub max_level: usize,
}

impl Default for StencilTableOptions {
    fn default() -> Self {
        Self {
            interpolation_mode: InterpolationMode::Vertex,
            max_level: 10,
        }
    }
}

/// Container for stencil data.
#[derive(Debug, Default)]
pub struct StencilTable {
    control_vertex_count: usize,
    sizes: Vec<u32>,
    offsets: Vec<u32>,
    control_indices: Vec<u32>,
    weights: Vec<f32>,
    /// Number of stencils per refined level, coarse to fine. Evaluation
    /// must complete a level before starting the next.
    level_sizes: Vec<u32>,
}

impl StencilTable {
    /// Build the stencils for all refined levels of `refiner`.
    pub fn new(refiner: &TopologyRefiner, options: StencilTableOptions) -> Result<StencilTable> {
        let levels = refiner.levels();
        if options.interpolation_mode == InterpolationMode::FaceVarying
            && refiner.face_varying_channel_width() == 0
        {
            return Err(Error::CreateTopologyRefinerFailed);
        }

        let mut table = StencilTable {
            control_vertex_count: match options.interpolation_mode {
                InterpolationMode::FaceVarying => levels[0].face_varying_value_count(),
                _ => levels[0].vertex_count(),
            },
            ..Default::default()
        };

        let last = refiner.refinement_levels().min(options.max_level);
        for level in 1..=last {
            let parent = &levels[level - 1];
            let child = &levels[level];
            let first_stencil = table.sizes.len();
            match options.interpolation_mode {
                InterpolationMode::Vertex => {
                    build_vertex_level(refiner, parent, child, &mut table)
                }
                InterpolationMode::Varying => build_varying_level(parent, child, &mut table),
                InterpolationMode::FaceVarying => {
                    build_face_varying_level(refiner, parent, child, &mut table)?
                }
            }
            table
                .level_sizes
                .push((table.sizes.len() - first_stencil) as u32);
        }
        Ok(table)
    }

    /// Returns the number of stencils in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        0 == self.len()
    }

    /// Returns the number of control vertices (or face-varying values) of
    /// the base level. Stencil `i` produces destination element
    /// `control_vertex_count() + i`.
    #[inline]
    pub fn control_vertex_count(&self) -> usize {
        self.control_vertex_count
    }

    /// Returns the stencil at index `i` in the table.
    #[inline]
    pub fn stencil(&self, i: Index) -> Option<Stencil<'_>> {
        let i = usize::from(i);
        if self.len() <= i {
            None
        } else {
            let first = self.offsets[i] as usize;
            let last = first + self.sizes[i] as usize;
            Some(Stencil {
                indices: &self.control_indices[first..last],
                weights: &self.weights[first..last],
            })
        }
    }

    /// Returns the number of control vertices of each stencil in the table.
    #[inline]
    pub fn sizes(&self) -> &[u32] {
        &self.sizes
    }

    /// Returns the offset to a given stencil.
    #[inline]
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// Returns the indices of the control vertices.
    #[inline]
    pub fn control_indices(&self) -> &[u32] {
        &self.control_indices
    }

    /// Returns the stencil interpolation weights.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Number of stencils per refined level, coarse to fine.
    #[inline]
    pub fn level_sizes(&self) -> &[u32] {
        &self.level_sizes
    }

    fn push(&mut self, stencil: &Accumulator) {
        self.sizes.push(stencil.indices.len() as u32);
        self.offsets.push(self.control_indices.len() as u32);
        self.control_indices.extend_from_slice(&stencil.indices);
        self.weights.extend_from_slice(&stencil.weights);
    }
}

/// Merges repeated control indices while a mask is accumulated.
#[derive(Default)]
struct Accumulator {
    indices: Vec<u32>,
    weights: Vec<f32>,
}

impl Accumulator {
    fn clear(&mut self) {
        self.indices.clear();
        self.weights.clear();
    }

    fn add(&mut self, index: u32, weight: f32) {
        match self.indices.iter().position(|&i| i == index) {
            Some(at) => self.weights[at] += weight,
            None => {
                self.indices.push(index);
                self.weights.push(weight);
            }
        }
    }

    fn add_scaled(&mut self, other: &Accumulator, scale: f32) {
        for (&index, &weight) in other.indices.iter().zip(&other.weights) {
            self.add(index, weight * scale);
        }
    }
}

/// Adds the centroid of a parent face, expanded into that face's
/// vertices, scaled by `scale`.
fn add_face_centroid(acc: &mut Accumulator, parent: &TopologyLevel, face: u32, scale: f32) {
    let corners = parent.face_vertices(Index(face)).unwrap_or(&[]);
    let weight = scale * catmark::face_point_weight(corners.len());
    let base = parent.first_vertex_offset() as u32;
    for &v in corners {
        acc.add(base + v, weight);
    }
}

fn is_triangle(parent: &TopologyLevel, face: u32) -> bool {
    parent
        .face_vertices(Index(face))
        .map_or(false, |corners| corners.len() == 3)
}

/// Effective sharpness of a parent edge for the vertex interpolation
/// rules: boundary edges subdivide as infinite creases unless boundary
/// interpolation is disabled entirely.
fn effective_edge_sharpness(
    parent: &TopologyLevel,
    edge: u32,
    boundary: BoundaryInterpolation,
) -> f32 {
    if parent.is_edge_boundary(Index(edge)) && boundary != BoundaryInterpolation::None {
        sdc::SHARPNESS_INFINITE
    } else {
        parent.edge_sharpness(Index(edge))
    }
}

fn build_vertex_level(
    refiner: &TopologyRefiner,
    parent: &TopologyLevel,
    child: &TopologyLevel,
    table: &mut StencilTable,
) {
    let options = refiner.options();
    let boundary = options.boundary_interpolation;
    let smooth_triangles = options.triangle_subdivision == TriangleSubdivision::Smooth;
    let base = parent.first_vertex_offset() as u32;
    let mut acc = Accumulator::default();
    let mut smooth = Accumulator::default();

    debug_assert_eq!(
        child.vertex_count(),
        parent.face_count() + parent.edge_count() + parent.vertex_count()
    );

    // Face points: the face centroid.
    for face in 0..parent.face_count() as u32 {
        acc.clear();
        add_face_centroid(&mut acc, parent, face, 1.0);
        table.push(&acc);
    }

    // Edge points.
    for edge in 0..parent.edge_count() as u32 {
        acc.clear();
        let [a, b] = parent.edge_vertices(Index(edge)).unwrap_or([0, 0]);
        let [f0, f1] = parent.edge_faces[edge as usize];
        let sharpness = effective_edge_sharpness(parent, edge, boundary);
        let crease_weight = if f1 == INVALID_INDEX {
            // A boundary edge point is its midpoint under every mode.
            1.0
        } else {
            sdc::fractional_weight(0.0, &[sharpness])
        };
        if crease_weight < 1.0 {
            let face_weight = catmark::edge_point_face_weight(
                smooth_triangles,
                is_triangle(parent, f0),
                is_triangle(parent, f1),
            );
            let vertex_weight = catmark::edge_point_vertex_weight(face_weight);
            let scale = 1.0 - crease_weight;
            acc.add(base + a, scale * vertex_weight);
            acc.add(base + b, scale * vertex_weight);
            add_face_centroid(&mut acc, parent, f0, scale * face_weight);
            add_face_centroid(&mut acc, parent, f1, scale * face_weight);
        }
        if crease_weight > 0.0 {
            acc.add(base + a, crease_weight * 0.5);
            acc.add(base + b, crease_weight * 0.5);
        }
        table.push(&acc);
    }

    // Vertex points.
    for vertex in 0..parent.vertex_count() as u32 {
        acc.clear();
        let is_boundary = parent.is_vertex_boundary(Index(vertex));

        if boundary == BoundaryInterpolation::None && is_boundary {
            acc.add(base + vertex, 1.0);
            table.push(&acc);
            continue;
        }

        let incident_edges = parent.vertex_edges(Index(vertex));
        let incident_faces = parent.vertex_faces(Index(vertex));

        // A vertex no valid face references has no neighborhood to
        // smooth over; it keeps its position.
        if incident_edges.is_empty() {
            acc.add(base + vertex, 1.0);
            table.push(&acc);
            continue;
        }

        let mut vertex_sharpness = parent.vertex_sharpness(Index(vertex));
        let corner_held = match boundary {
            BoundaryInterpolation::AlwaysSharp => is_boundary,
            BoundaryInterpolation::EdgeAndCorner => is_boundary && incident_faces.len() == 1,
            _ => false,
        };
        if corner_held {
            vertex_sharpness = sdc::SHARPNESS_INFINITE;
        }

        let edge_sharpness: Vec<f32> = incident_edges
            .iter()
            .map(|&e| effective_edge_sharpness(parent, e, boundary))
            .collect();
        let sharp_edges: Vec<usize> = edge_sharpness
            .iter()
            .enumerate()
            .filter(|(_, &s)| sdc::is_sharp(s))
            .map(|(i, _)| i)
            .collect();

        let rule = sdc::vertex_rule(vertex_sharpness, sharp_edges.len());

        // The smooth mask, shared by the fractional blend below.
        smooth.clear();
        if !matches!(rule, Rule::Corner) || !sdc::is_infinitely_sharp(vertex_sharpness) {
            let valence = incident_edges.len();
            let (own, neighbor, face) = catmark::smooth_vertex_weights(valence);
            smooth.add(base + vertex, own);
            for &e in incident_edges {
                let [a, b] = parent.edge_vertices(Index(e)).unwrap_or([0, 0]);
                let other = if a == vertex { b } else { a };
                smooth.add(base + other, neighbor);
            }
            for &f in incident_faces {
                add_face_centroid(&mut smooth, parent, f, face);
            }
        }

        match rule {
            Rule::Smooth | Rule::Dart => acc.add_scaled(&smooth, 1.0),
            Rule::Crease => {
                let participating = [
                    edge_sharpness[sharp_edges[0]],
                    edge_sharpness[sharp_edges[1]],
                ];
                let t = sdc::fractional_weight(vertex_sharpness, &participating);
                acc.add(base + vertex, t * catmark::CREASE_VERTEX_WEIGHT);
                for &at in &sharp_edges {
                    let [a, b] = parent
                        .edge_vertices(Index(incident_edges[at]))
                        .unwrap_or([0, 0]);
                    let other = if a == vertex { b } else { a };
                    acc.add(base + other, t * catmark::CREASE_ENDPOINT_WEIGHT);
                }
                if t < 1.0 {
                    acc.add_scaled(&smooth, 1.0 - t);
                }
            }
            Rule::Corner => {
                let participating: Vec<f32> =
                    sharp_edges.iter().map(|&at| edge_sharpness[at]).collect();
                let t = sdc::fractional_weight(vertex_sharpness, &participating);
                acc.add(base + vertex, t);
                if t < 1.0 {
                    // The complement is the mask of the rule left once the
                    // fractional sharpness has decayed away. On a boundary
                    // vertex that is the crease mask along the boundary,
                    // never the open-fan smooth mask.
                    let persistent: Vec<usize> = sharp_edges
                        .iter()
                        .copied()
                        .filter(|&at| edge_sharpness[at] >= 1.0)
                        .collect();
                    let persistent_sharpness = if vertex_sharpness >= 1.0 {
                        vertex_sharpness
                    } else {
                        0.0
                    };
                    match sdc::vertex_rule(persistent_sharpness, persistent.len()) {
                        Rule::Corner => acc.add(base + vertex, 1.0 - t),
                        Rule::Crease => {
                            acc.add(
                                base + vertex,
                                (1.0 - t) * catmark::CREASE_VERTEX_WEIGHT,
                            );
                            for &at in &persistent {
                                let [a, b] = parent
                                    .edge_vertices(Index(incident_edges[at]))
                                    .unwrap_or([0, 0]);
                                let other = if a == vertex { b } else { a };
                                acc.add(
                                    base + other,
                                    (1.0 - t) * catmark::CREASE_ENDPOINT_WEIGHT,
                                );
                            }
                        }
                        Rule::Smooth | Rule::Dart => acc.add_scaled(&smooth, 1.0 - t),
                    }
                }
            }
        }
        table.push(&acc);
    }
}

/// Bilinear masks: centroid, midpoint, identity.
fn build_varying_level(parent: &TopologyLevel, child: &TopologyLevel, table: &mut StencilTable) {
    let base = parent.first_vertex_offset() as u32;
    let mut acc = Accumulator::default();
    debug_assert_eq!(
        child.vertex_count(),
        parent.face_count() + parent.edge_count() + parent.vertex_count()
    );

    for face in 0..parent.face_count() as u32 {
        acc.clear();
        add_face_centroid(&mut acc, parent, face, 1.0);
        table.push(&acc);
    }
    for edge in 0..parent.edge_count() as u32 {
        acc.clear();
        let [a, b] = parent.edge_vertices(Index(edge)).unwrap_or([0, 0]);
        acc.add(base + a, 0.5);
        acc.add(base + b, 0.5);
        table.push(&acc);
    }
    for vertex in 0..parent.vertex_count() as u32 {
        acc.clear();
        acc.add(base + vertex, 1.0);
        table.push(&acc);
    }
}

/// Adds the average of a parent face's corner values.
fn add_face_value_average(acc: &mut Accumulator, parent: &TopologyLevel, face: u32, scale: f32) {
    let values = parent
        .face_varying_values_on_face(Index(face))
        .unwrap_or(&[]);
    let base = parent.face_varying_first_value_offset() as u32;
    let weight = scale / values.len() as f32;
    for &value in values {
        acc.add(base + value, weight);
    }
}

/// `true` when the channel must subdivide an edge as a sharp crease: the
/// channel is discontinuous across it (seams and boundaries included) or
/// the edge itself carries geometric sharpness.
fn is_fvar_edge_sharp(parent: &TopologyLevel, edge: u32) -> bool {
    !parent.is_edge_fvar_continuous(edge) || sdc::is_sharp(parent.edge_sharpness(Index(edge)))
}

fn build_face_varying_level(
    refiner: &TopologyRefiner,
    parent: &TopologyLevel,
    child: &TopologyLevel,
    table: &mut StencilTable,
) -> Result<()> {
    let options = refiner.options();
    let mode = options.face_varying_interpolation;
    let base = parent.face_varying_first_value_offset() as u32;
    let mut acc = Accumulator::default();
    let mut smooth = Accumulator::default();

    let child_fvar = child.fvar.as_ref().ok_or(Error::InternalInconsistency(
        "refined level is missing its face-varying channel".into(),
    ))?;

    for source in &child_fvar.sources {
        acc.clear();
        match *source {
            FvarSource::Face(face) => {
                add_face_value_average(&mut acc, parent, face, 1.0);
            }
            FvarSource::Edge { edge, side_face } => {
                let [a, b] = parent.edge_vertices(Index(edge)).unwrap_or([0, 0]);
                let side = if side_face == INVALID_INDEX {
                    parent.edge_faces[edge as usize][0]
                } else {
                    side_face
                };
                let value_a = parent.corner_value(side, a);
                let value_b = parent.corner_value(side, b);
                let bilinear = mode == FaceVaryingInterpolation::None;
                if bilinear || is_fvar_edge_sharp(parent, edge) {
                    acc.add(base + value_a, 0.5);
                    acc.add(base + value_b, 0.5);
                } else {
                    let [f0, f1] = parent.edge_faces[edge as usize];
                    let face_weight = catmark::edge_point_face_weight(
                        options.triangle_subdivision == TriangleSubdivision::Smooth,
                        is_triangle(parent, f0),
                        is_triangle(parent, f1),
                    );
                    let vertex_weight = catmark::edge_point_vertex_weight(face_weight);
                    acc.add(base + value_a, vertex_weight);
                    acc.add(base + value_b, vertex_weight);
                    add_face_value_average(&mut acc, parent, f0, face_weight);
                    add_face_value_average(&mut acc, parent, f1, face_weight);
                }
            }
            FvarSource::Vertex {
                vertex,
                parent_value,
            } => {
                build_fvar_vertex_stencil(
                    refiner, parent, vertex, parent_value, base, &mut acc, &mut smooth,
                );
            }
        }
        table.push(&acc);
    }
    Ok(())
}

/// Stencil for the refinement of one face-varying value at a vertex.
fn build_fvar_vertex_stencil(
    refiner: &TopologyRefiner,
    parent: &TopologyLevel,
    vertex: u32,
    parent_value: u32,
    base: u32,
    acc: &mut Accumulator,
    smooth: &mut Accumulator,
) {
    let options = refiner.options();
    let mode = options.face_varying_interpolation;
    let own = base + parent_value;

    if mode == FaceVaryingInterpolation::None {
        acc.add(own, 1.0);
        return;
    }

    let incident_faces = parent.vertex_faces(Index(vertex));
    let fan: Vec<u32> = incident_faces
        .iter()
        .copied()
        .filter(|&f| parent.corner_value(f, vertex) == parent_value)
        .collect();
    let split = fan.len() != incident_faces.len();

    // Corner-style holds before any rule classification.
    let held = match mode {
        FaceVaryingInterpolation::EdgeAndCorner => fan.len() == 1,
        FaceVaryingInterpolation::AlwaysSharp => {
            split || parent.is_vertex_boundary(Index(vertex))
        }
        _ => false,
    } || (options.face_varying_propagate_corners && split);
    if held {
        acc.add(own, 1.0);
        return;
    }

    // Edges incident to the vertex that border the fan.
    let fan_edges: Vec<u32> = parent
        .vertex_edges(Index(vertex))
        .iter()
        .copied()
        .filter(|&e| {
            parent.edge_faces[e as usize]
                .iter()
                .any(|&f| f != INVALID_INDEX && fan.contains(&f))
        })
        .collect();
    let sharp_edges: Vec<u32> = fan_edges
        .iter()
        .copied()
        .filter(|&e| is_fvar_edge_sharp(parent, e))
        .collect();

    let vertex_sharpness = parent.vertex_sharpness(Index(vertex));
    let rule = sdc::vertex_rule(vertex_sharpness, sharp_edges.len());

    // The value a fan face uses at the other end of an edge.
    let neighbor_value = |edge: u32| -> u32 {
        let [a, b] = parent.edge_vertices(Index(edge)).unwrap_or([0, 0]);
        let other = if a == vertex { b } else { a };
        let face = parent.edge_faces[edge as usize]
            .iter()
            .copied()
            .find(|&f| f != INVALID_INDEX && fan.contains(&f))
            .unwrap_or(parent.edge_faces[edge as usize][0]);
        parent.corner_value(face, other)
    };

    match rule {
        Rule::Smooth | Rule::Dart => {
            let valence = fan_edges.len();
            let (own_weight, neighbor, face) = catmark::smooth_vertex_weights(valence);
            acc.add(own, own_weight);
            for &e in &fan_edges {
                acc.add(base + neighbor_value(e), neighbor);
            }
            for &f in &fan {
                add_face_value_average(acc, parent, f, face);
            }
        }
        Rule::Crease => {
            smooth.clear();
            let valence = fan_edges.len();
            let (own_weight, neighbor, face) = catmark::smooth_vertex_weights(valence);
            smooth.add(own, own_weight);
            for &e in &fan_edges {
                smooth.add(base + neighbor_value(e), neighbor);
            }
            for &f in &fan {
                add_face_value_average(smooth, parent, f, face);
            }

            let participating: Vec<f32> = sharp_edges
                .iter()
                .map(|&e| {
                    if parent.is_edge_fvar_continuous(e) {
                        parent.edge_sharpness(Index(e))
                    } else {
                        sdc::SHARPNESS_INFINITE
                    }
                })
                .collect();
            let t = sdc::fractional_weight(vertex_sharpness, &participating);
            acc.add(own, t * catmark::CREASE_VERTEX_WEIGHT);
            for &e in &sharp_edges {
                acc.add(base + neighbor_value(e), t * catmark::CREASE_ENDPOINT_WEIGHT);
            }
            if t < 1.0 {
                acc.add_scaled(smooth, 1.0 - t);
            }
        }
        Rule::Corner => {
            acc.add(own, 1.0);
        }
    }
}
