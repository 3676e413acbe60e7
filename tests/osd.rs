//! CPU stencil evaluation against hand-computed Catmull-Clark values.

use polysmooth::far::{
    InterpolationMode, StencilTable, StencilTableOptions, TopologyRefiner,
    UniformRefinementOptions,
};
use polysmooth::hbr::HbrMesh;
use polysmooth::osd::{evaluate_stencils, BufferDescriptor, CpuVertexBuffer};

const CUBE_POSITIONS: [[f32; 3]; 8] = [
    [-0.5, -0.5, 0.5],
    [0.5, -0.5, 0.5],
    [-0.5, 0.5, 0.5],
    [0.5, 0.5, 0.5],
    [-0.5, 0.5, -0.5],
    [0.5, 0.5, -0.5],
    [-0.5, -0.5, -0.5],
    [0.5, -0.5, -0.5],
];

const CUBE_FACES: [[u32; 4]; 6] = [
    [0, 1, 3, 2],
    [2, 3, 5, 4],
    [4, 5, 7, 6],
    [6, 7, 1, 0],
    [1, 7, 5, 3],
    [6, 0, 2, 4],
];

fn evaluated_cube(levels: usize) -> (TopologyRefiner, CpuVertexBuffer) {
    let mut mesh = HbrMesh::new(8, 0);
    for face in CUBE_FACES {
        mesh.add_face(&face, &[]);
    }
    let mut refiner = TopologyRefiner::new(&mesh, Default::default()).expect("refiner");
    refiner.refine_uniform(UniformRefinementOptions {
        refinement_level: levels,
    });
    let table = StencilTable::new(&refiner, StencilTableOptions::default()).expect("stencils");

    let mut buffer = CpuVertexBuffer::new(3, refiner.vertex_total_count());
    let flat: Vec<f32> = CUBE_POSITIONS.iter().flatten().copied().collect();
    buffer.update_data(&flat, 0, 8).expect("update");
    evaluate_stencils(&mut buffer, BufferDescriptor::packed(3), &table).expect("evaluate");
    (refiner, buffer)
}

fn vertex(buffer: &CpuVertexBuffer, global: usize) -> [f32; 3] {
    let data = buffer.bind_cpu_buffer();
    [data[global * 3], data[global * 3 + 1], data[global * 3 + 2]]
}

fn assert_close(actual: [f32; 3], expected: [f32; 3]) {
    for (a, e) in actual.iter().zip(&expected) {
        assert!((a - e).abs() < 1e-5, "{actual:?} != {expected:?}");
    }
}

#[test]
fn face_point_is_the_centroid() {
    let (refiner, buffer) = evaluated_cube(1);
    let base = refiner.level(1).expect("level").first_vertex_offset();
    // Face 0 spans the z = 0.5 side.
    assert_close(vertex(&buffer, base), [0.0, 0.0, 0.5]);
}

#[test]
fn interior_edge_point_blends_endpoints_and_centroids() {
    let (refiner, buffer) = evaluated_cube(1);
    let level0 = refiner.level(0).expect("level");
    let base = refiner.level(1).expect("level").first_vertex_offset();

    // The first edge created is (0, 1), shared by faces 0 and 3.
    let edge = 0usize;
    let [a, b] = level0.edge_vertices((edge as u32).into()).expect("edge");
    assert_eq!([a, b], [0, 1]);

    // 1/4 (a + b) + 1/4 (centroid of each incident face).
    let expected = [0.0, -0.375, 0.375];
    assert_close(vertex(&buffer, base + level0.face_count() + edge), expected);
}

#[test]
fn smooth_vertex_point_matches_the_closed_form() {
    let (refiner, buffer) = evaluated_cube(1);
    let level0 = refiner.level(0).expect("level");
    let base = refiner.level(1).expect("level").first_vertex_offset();

    // Every cube corner has valence 3; the Catmull-Clark vertex point
    // lands at 5/9 of the corner position.
    let first_vertex_point = base + level0.face_count() + level0.edge_count();
    for (v, position) in CUBE_POSITIONS.iter().enumerate() {
        let expected = [
            position[0] * 5.0 / 9.0,
            position[1] * 5.0 / 9.0,
            position[2] * 5.0 / 9.0,
        ];
        assert_close(vertex(&buffer, first_vertex_point + v), expected);
    }
}

#[test]
fn varying_interpolation_pins_vertex_points() {
    let mut mesh = HbrMesh::new(8, 0);
    for face in CUBE_FACES {
        mesh.add_face(&face, &[]);
    }
    let mut refiner = TopologyRefiner::new(&mesh, Default::default()).expect("refiner");
    refiner.refine_uniform(UniformRefinementOptions {
        refinement_level: 1,
    });
    let table = StencilTable::new(
        &refiner,
        StencilTableOptions {
            interpolation_mode: InterpolationMode::Varying,
            ..Default::default()
        },
    )
    .expect("stencils");

    let mut buffer = CpuVertexBuffer::new(3, refiner.vertex_total_count());
    let flat: Vec<f32> = CUBE_POSITIONS.iter().flatten().copied().collect();
    buffer.update_data(&flat, 0, 8).expect("update");
    evaluate_stencils(&mut buffer, BufferDescriptor::packed(3), &table).expect("evaluate");

    let level0 = refiner.level(0).expect("level");
    let base = refiner.level(1).expect("level").first_vertex_offset();
    let first_vertex_point = base + level0.face_count() + level0.edge_count();
    for (v, &position) in CUBE_POSITIONS.iter().enumerate() {
        assert_close(vertex(&buffer, first_vertex_point + v), position);
    }
}

#[test]
fn mismatched_descriptor_is_rejected() {
    let mut mesh = HbrMesh::new(8, 0);
    for face in CUBE_FACES {
        mesh.add_face(&face, &[]);
    }
    let mut refiner = TopologyRefiner::new(&mesh, Default::default()).expect("refiner");
    refiner.refine_uniform(UniformRefinementOptions {
        refinement_level: 1,
    });
    let table = StencilTable::new(&refiner, StencilTableOptions::default()).expect("stencils");
    let mut buffer = CpuVertexBuffer::new(3, refiner.vertex_total_count());
    // Descriptor stride disagrees with the buffer layout.
    let result = evaluate_stencils(&mut buffer, BufferDescriptor::new(0, 4, 4), &table);
    assert!(result.is_err());
}
