//! Refinement hierarchy and stencil table behavior.

use polysmooth::far::{
    StencilTable, StencilTableOptions, TopologyRefiner, TopologyRefinerOptions,
    UniformRefinementOptions,
};
use polysmooth::hbr::HbrMesh;
use polysmooth::polygon_mesh::EdgeCrease;
use polysmooth::sdc::{BoundaryInterpolation, CreasingMethod};

fn cube_mesh() -> HbrMesh {
    let mut mesh = HbrMesh::new(8, 0);
    for face in [
        [0u32, 1, 3, 2],
        [2, 3, 5, 4],
        [4, 5, 7, 6],
        [6, 7, 1, 0],
        [1, 7, 5, 3],
        [6, 0, 2, 4],
    ] {
        assert!(mesh.add_face(&face, &[]).is_some());
    }
    mesh
}

/// A 2x2 grid of quads: an open boundary with a corner at each end.
fn grid_mesh() -> HbrMesh {
    let mut mesh = HbrMesh::new(9, 0);
    for face in [[0u32, 1, 4, 3], [1, 2, 5, 4], [3, 4, 7, 6], [4, 5, 8, 7]] {
        assert!(mesh.add_face(&face, &[]).is_some());
    }
    mesh
}

fn refined(mesh: &HbrMesh, options: TopologyRefinerOptions, levels: usize) -> TopologyRefiner {
    let mut refiner = TopologyRefiner::new(mesh, options).expect("refiner");
    refiner.refine_uniform(UniformRefinementOptions {
        refinement_level: levels,
    });
    refiner
}

#[test]
fn cube_level_inventories() {
    let refiner = refined(&cube_mesh(), Default::default(), 2);

    let expected = [(8, 6, 12), (26, 24, 48), (98, 96, 192)];
    for (level, &(vertices, faces, edges)) in expected.iter().enumerate() {
        let level = refiner.level(level).expect("level");
        assert_eq!(level.vertex_count(), vertices);
        assert_eq!(level.face_count(), faces);
        assert_eq!(level.edge_count(), edges);
    }
    assert_eq!(refiner.vertex_total_count(), 8 + 26 + 98);
    assert_eq!(refiner.face_total_count(), 6 + 24 + 96);
}

#[test]
fn every_stencil_is_a_partition_of_unity() {
    let mut mesh = cube_mesh();
    mesh.apply_crease_edges(&[
        EdgeCrease {
            vertices: [0, 1],
            sharpness: 2.5,
        },
        EdgeCrease {
            vertices: [1, 3],
            sharpness: 0.4,
        },
    ]);
    let refiner = refined(&mesh, Default::default(), 3);
    let table = StencilTable::new(&refiner, StencilTableOptions::default()).expect("stencils");

    assert_eq!(table.len(), refiner.vertex_total_count() - 8);
    for i in 0..table.len() {
        let stencil = table.stencil(i.into()).expect("stencil");
        let sum: f32 = stencil.weights().iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "stencil {i} sums to {sum}");
        assert_eq!(stencil.indices().len(), stencil.weights().len());
    }
}

#[test]
fn boundary_stencils_are_partitions_of_unity() {
    // Semi-sharp creases touching the boundary, under every boundary
    // interpolation mode.
    for mode in [
        BoundaryInterpolation::None,
        BoundaryInterpolation::EdgeOnly,
        BoundaryInterpolation::EdgeAndCorner,
        BoundaryInterpolation::AlwaysSharp,
    ] {
        let mut mesh = grid_mesh();
        mesh.apply_crease_edges(&[
            EdgeCrease {
                vertices: [1, 4],
                sharpness: 0.5,
            },
            EdgeCrease {
                vertices: [4, 5],
                sharpness: 2.5,
            },
        ]);
        let refiner = refined(
            &mesh,
            TopologyRefinerOptions {
                boundary_interpolation: mode,
                ..Default::default()
            },
            2,
        );
        let table = StencilTable::new(&refiner, StencilTableOptions::default()).expect("stencils");
        for i in 0..table.len() {
            let stencil = table.stencil(i.into()).expect("stencil");
            let sum: f32 = stencil.weights().iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "{mode:?}: stencil {i} sums to {sum}");
        }
    }
}

#[test]
fn fractional_corner_on_a_boundary_blends_toward_the_boundary_crease() {
    // Vertex 1 sits on the boundary between two infinitely sharp boundary
    // edges and one semi-sharp interior edge: a transitional corner. Its
    // mask must blend toward the crease along the boundary, staying a
    // partition of unity.
    let mut mesh = grid_mesh();
    mesh.apply_crease_edges(&[EdgeCrease {
        vertices: [1, 4],
        sharpness: 0.5,
    }]);
    let refiner = refined(
        &mesh,
        TopologyRefinerOptions {
            boundary_interpolation: BoundaryInterpolation::EdgeOnly,
            ..Default::default()
        },
        1,
    );
    let level = refiner.level(0).expect("level");
    let table = StencilTable::new(&refiner, StencilTableOptions::default()).expect("stencils");

    // Vertex points follow the 4 face points and 12 edge points.
    let stencil = table
        .stencil((level.face_count() + level.edge_count() + 1).into())
        .expect("stencil");
    let sum: f32 = stencil.weights().iter().sum();
    assert!((sum - 1.0).abs() < 1e-6, "weights sum to {sum}");

    // t = (1 + 1 + 0.5) / 3; own weight t + (1 - t) * 0.75, the boundary
    // neighbors 0 and 2 get (1 - t) * 0.125 each.
    let t = 5.0 / 6.0;
    let mut weights: Vec<(u32, f32)> = stencil
        .indices()
        .iter()
        .copied()
        .zip(stencil.weights().iter().copied())
        .collect();
    weights.sort_by_key(|&(index, _)| index);
    assert_eq!(weights.len(), 3);
    assert_eq!(weights[0].0, 0);
    assert_eq!(weights[1].0, 1);
    assert_eq!(weights[2].0, 2);
    assert!((weights[1].1 - (t + (1.0 - t) * 0.75)).abs() < 1e-6);
    assert!((weights[0].1 - (1.0 - t) * 0.125).abs() < 1e-6);
    assert!((weights[2].1 - (1.0 - t) * 0.125).abs() < 1e-6);
}

#[test]
fn stencil_levels_are_strictly_ordered() {
    let refiner = refined(&cube_mesh(), Default::default(), 3);
    let table = StencilTable::new(&refiner, StencilTableOptions::default()).expect("stencils");

    assert_eq!(table.level_sizes().len(), 3);
    let mut stencil = 0usize;
    for level in 1..=3 {
        let parent = refiner.level(level - 1).expect("level");
        let first = parent.first_vertex_offset() as u32;
        let last = first + parent.vertex_count() as u32;
        for _ in 0..table.level_sizes()[level - 1] {
            let s = table.stencil(stencil.into()).expect("stencil");
            assert!(
                s.indices().iter().all(|&i| i >= first && i < last),
                "stencil {stencil} escapes its parent level"
            );
            stencil += 1;
        }
    }
    assert_eq!(stencil, table.len());
}

#[test]
fn semi_sharp_crease_decays_to_smooth() {
    let mut mesh = cube_mesh();
    mesh.apply_crease_edges(&[EdgeCrease {
        vertices: [0, 1],
        sharpness: 2.0,
    }]);
    let refiner = refined(&mesh, Default::default(), 3);

    let sharp_edges = |level: usize| -> usize {
        let level = refiner.level(level).expect("level");
        (0..level.edge_count())
            .filter(|&e| level.edge_sharpness((e as u32).into()) > 0.0)
            .count()
    };
    assert_eq!(sharp_edges(0), 1);
    // The crease splits in two and decays by one unit per level.
    assert_eq!(sharp_edges(1), 2);
    assert_eq!(sharp_edges(2), 0);
    assert_eq!(sharp_edges(3), 0);
}

#[test]
fn infinite_crease_never_decays() {
    let mut mesh = cube_mesh();
    mesh.apply_crease_edges(&[EdgeCrease {
        vertices: [0, 1],
        sharpness: polysmooth::sdc::SHARPNESS_INFINITE,
    }]);
    let refiner = refined(&mesh, Default::default(), 3);
    let level = refiner.level(3).expect("level");
    let sharp = (0..level.edge_count())
        .filter(|&e| level.edge_sharpness((e as u32).into()) >= polysmooth::sdc::SHARPNESS_INFINITE)
        .count();
    // One sub-edge per refinement split.
    assert_eq!(sharp, 8);
}

#[test]
fn chaikin_varies_sharpness_along_a_crease() {
    // A crease of two edges with different sharpness meeting at vertex 1.
    let mut mesh = cube_mesh();
    mesh.apply_crease_edges(&[
        EdgeCrease {
            vertices: [0, 1],
            sharpness: 4.0,
        },
        EdgeCrease {
            vertices: [1, 3],
            sharpness: 2.0,
        },
    ]);
    let refiner = refined(
        &mesh,
        TopologyRefinerOptions {
            creasing_method: CreasingMethod::Chaikin,
            ..Default::default()
        },
        1,
    );
    let level = refiner.level(1).expect("level");
    let mut sharpness: Vec<f32> = (0..level.edge_count())
        .map(|e| level.edge_sharpness((e as u32).into()))
        .filter(|&s| s > 0.0)
        .collect();
    sharpness.sort_by(|a, b| a.partial_cmp(b).unwrap());
    // Sub-edges toward the junction blend both parent weights, the far
    // ends decay uniformly.
    assert_eq!(sharpness.len(), 4);
    assert!((sharpness[0] - 1.0).abs() < 1e-6); // far end of the 2.0 edge
    assert!((sharpness[1] - (0.25 * (3.0 * 2.0 + 4.0) - 1.0)).abs() < 1e-6);
    assert!((sharpness[2] - (0.25 * (3.0 * 4.0 + 2.0) - 1.0)).abs() < 1e-6);
    assert!((sharpness[3] - 3.0).abs() < 1e-6); // far end of the 4.0 edge
}
