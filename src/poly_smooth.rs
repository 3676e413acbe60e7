//! End-to-end polygon mesh smoothing.
//!
//! [`smooth_mesh`] is the node-level driver: it funnels a host
//! [`PolygonMesh`] through half-edge construction, crease tagging, uniform
//! refinement and stencil evaluation, then re-exports the finest level as
//! a new [`PolygonMesh`] with its UV and color sets reconstructed (seams
//! preserved) and its polygon groups mapped onto the refined faces.

use log::warn;

use crate::error::Result;
use crate::far::{
    InterpolationMode, StencilTable, StencilTableOptions, TopologyRefiner, TopologyRefinerOptions,
    UniformRefinementOptions,
};
use crate::hbr::{ChannelLayout, HbrMesh};
use crate::osd::{evaluate_stencils, BufferDescriptor, CpuVertexBuffer};
use crate::polygon_mesh::{
    ColorRepresentation, ColorSet, ComponentGroup, ComponentType, PolygonMesh, UvSet,
};
use crate::sdc::{
    BoundaryInterpolation, CreasingMethod, FaceVaryingInterpolation, TriangleSubdivision,
};

/// Highest accepted subdivision level; higher requests are clamped.
pub const MAX_SUBDIVISION_LEVELS: u32 = 10;

/// Options of one smoothing request, mirroring the host node's attributes.
#[derive(Clone, Copy, Debug)]
pub struct PolySmoothOptions {
    /// Disabled smoothing passes the input through untouched.
    pub enabled: bool,
    /// Number of uniform refinement iterations, clamped to
    /// [`MAX_SUBDIVISION_LEVELS`]; 0 passes the input through.
    pub subdivision_levels: u32,
    pub vertex_boundary: BoundaryInterpolation,
    pub face_varying_boundary: FaceVaryingInterpolation,
    pub face_varying_propagate_corners: bool,
    /// Use the alternate edge weighting next to triangles.
    pub smooth_triangles: bool,
    pub creasing_method: CreasingMethod,
}

impl Default for PolySmoothOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            subdivision_levels: 2,
            vertex_boundary: BoundaryInterpolation::EdgeOnly,
            face_varying_boundary: FaceVaryingInterpolation::None,
            face_varying_propagate_corners: false,
            smooth_triangles: true,
            creasing_method: CreasingMethod::Uniform,
        }
    }
}

/// Refine `mesh` uniformly by `options.subdivision_levels` levels.
///
/// Faces failing the manifoldness checks are dropped (with a warning)
/// rather than failing the request; a mesh with no valid faces at all is
/// an error. When smoothing is disabled or the level is 0 the input is
/// returned unchanged.
pub fn smooth_mesh(mesh: &PolygonMesh, options: &PolySmoothOptions) -> Result<PolygonMesh> {
    let mut levels = options.subdivision_levels;
    if levels > MAX_SUBDIVISION_LEVELS {
        warn!("subdivision level {levels} clamped to {MAX_SUBDIVISION_LEVELS}");
        levels = MAX_SUBDIVISION_LEVELS;
    }
    if !options.enabled || levels == 0 {
        return Ok(mesh.clone());
    }

    let layout = ChannelLayout::from_mesh(mesh);
    let fvar_width = layout.total_width();

    // Half-edge construction and crease tagging.
    let mut hbr = HbrMesh::new(mesh.vertex_count(), fvar_width);
    let mut record = vec![0.0f32; fvar_width];
    let mut face_records = Vec::new();
    let mut corner = 0usize;
    for face in mesh.faces() {
        face_records.clear();
        if fvar_width > 0 {
            for i in 0..face.len() {
                layout.pack_corner(mesh, corner + i, &mut record);
                face_records.extend_from_slice(&record);
            }
        }
        corner += face.len();
        hbr.add_face(face, &face_records);
    }
    let max_edge_sharpness = hbr.apply_crease_edges(&mesh.crease_edges);
    let max_vertex_sharpness = hbr.apply_crease_vertices(&mesh.crease_vertices);
    log::debug!(
        "tagged creases up to sharpness {:.2}",
        max_edge_sharpness.max(max_vertex_sharpness)
    );

    // Uniform refinement.
    let refiner_options = TopologyRefinerOptions {
        boundary_interpolation: options.vertex_boundary,
        face_varying_interpolation: options.face_varying_boundary,
        face_varying_propagate_corners: options.face_varying_propagate_corners,
        creasing_method: options.creasing_method,
        triangle_subdivision: if options.smooth_triangles {
            TriangleSubdivision::Smooth
        } else {
            TriangleSubdivision::CatmullClark
        },
    };
    let mut refiner = TopologyRefiner::new(&hbr, refiner_options)?;
    refiner.refine_uniform(UniformRefinementOptions {
        refinement_level: levels as usize,
    });

    // Vertex positions.
    let stencils = StencilTable::new(&refiner, StencilTableOptions::default())?;
    let mut positions = CpuVertexBuffer::new(3, refiner.vertex_total_count());
    positions.update_data(mesh.raw_points(), 0, mesh.vertex_count())?;
    evaluate_stencils(&mut positions, BufferDescriptor::packed(3), &stencils)?;

    // Face-varying channel.
    let fvar_buffer = if fvar_width > 0 {
        let fvar_stencils = StencilTable::new(
            &refiner,
            StencilTableOptions {
                interpolation_mode: InterpolationMode::FaceVarying,
                ..Default::default()
            },
        )?;
        let mut buffer =
            CpuVertexBuffer::new(fvar_width, refiner.face_varying_value_total_count());
        buffer.update_data(
            hbr.face_varying().values(),
            0,
            hbr.face_varying().record_count(),
        )?;
        evaluate_stencils(&mut buffer, BufferDescriptor::packed(fvar_width), &fvar_stencils)?;
        Some(buffer)
    } else {
        None
    };

    Ok(export_level(
        mesh,
        &refiner,
        &layout,
        &positions,
        fvar_buffer.as_ref(),
        levels,
    ))
}

/// Re-export the finest refined level as a host mesh.
fn export_level(
    input: &PolygonMesh,
    refiner: &TopologyRefiner,
    layout: &ChannelLayout,
    positions: &CpuVertexBuffer,
    fvar_buffer: Option<&CpuVertexBuffer>,
    levels: u32,
) -> PolygonMesh {
    let level = refiner.max_level();

    let first = level.first_vertex_offset() * 3;
    let refined_positions: Vec<[f32; 3]> = positions.bind_cpu_buffer()
        [first..first + level.vertex_count() * 3]
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();

    let mut output = PolygonMesh::new(
        refined_positions,
        vec![4; level.face_count()],
        level.face_vertices.clone(),
    );

    if let Some(buffer) = fvar_buffer {
        let width = layout.total_width();
        let value_base = level.face_varying_first_value_offset();
        let corner_count = level.face_vertex_count();

        // The refined record for one face corner.
        let corner_record = |corner: usize| -> &[f32] {
            let fvar = level.fvar.as_ref();
            let value = fvar.map_or(0, |fv| fv.face_values[corner]) as usize;
            let start = (value_base + value) * width;
            &buffer.bind_cpu_buffer()[start..start + width]
        };

        for (set, input_set) in input.uv_sets.iter().enumerate() {
            let offset = layout.uv_offset(set);
            let mut u = Vec::with_capacity(corner_count);
            let mut v = Vec::with_capacity(corner_count);
            for corner in 0..corner_count {
                let record = corner_record(corner);
                u.push(record[offset]);
                v.push(record[offset + 1]);
            }
            output.uv_sets.push(UvSet {
                name: input_set.name.clone(),
                u,
                v,
            });
        }

        for (set, input_set) in input.color_sets.iter().enumerate() {
            let offset = layout.color_offset(set);
            let colors = (0..corner_count)
                .map(|corner| {
                    let record = corner_record(corner);
                    match input_set.representation {
                        ColorRepresentation::Alpha => [0.0, 0.0, 0.0, record[offset]],
                        ColorRepresentation::Rgb => {
                            [record[offset], record[offset + 1], record[offset + 2], 1.0]
                        }
                        ColorRepresentation::Rgba => [
                            record[offset],
                            record[offset + 1],
                            record[offset + 2],
                            record[offset + 3],
                        ],
                    }
                })
                .collect();
            output.color_sets.push(ColorSet {
                name: input_set.name.clone(),
                representation: input_set.representation,
                clamped: input_set.clamped,
                colors,
            });
        }
    }

    // Polygon groups map onto the refined faces with a fixed multiplier:
    // parent face `f` owns refined faces `[f * 4^levels, (f + 1) * 4^levels)`.
    let multiplier = 4u64.pow(levels);
    for group in &input.groups {
        if group.component_type != ComponentType::Polygon {
            continue;
        }
        let elements = group
            .elements
            .iter()
            .flat_map(|&face| {
                let first = face as u64 * multiplier;
                (first..first + multiplier).map(|f| f as u32)
            })
            .collect();
        output.groups.push(ComponentGroup {
            id: group.id,
            component_type: ComponentType::Polygon,
            elements,
        });
    }

    output
}
