use mesh_tria::prelude::*;

fn two_cell_line() -> LineTriangulation {
    let mut tria = LineTriangulation::new();
    subdivided_hyper_cube(&mut tria, 2, 0.0, 1.0).unwrap();
    tria
}

#[test]
fn refine_one_cell_of_a_two_cell_line() {
    let mut tria = two_cell_line();
    tria.cell_mut(CellId::new(0, 0)).unwrap().set_refine_flag().unwrap();
    tria.execute_coarsening_and_refinement().unwrap();

    assert_eq!(tria.n_active_cells(), 3);
    assert_eq!(tria.n_levels(), 2);
    assert_eq!(tria.n_used_vertices(), 4);

    let mut dofs = DoFHandler::new(&tria);
    dofs.set_fe(&FiniteElementData::new("vertex", [1, 0, 0, 0]));
    dofs.distribute_dofs().unwrap();
    assert_eq!(dofs.n_dofs(), 4);

    let parent = tria.cell(CellId::new(0, 0)).unwrap();
    let left = parent.child(0).unwrap();
    let right = parent.child(1).unwrap();
    let left_dofs = dofs.get_dof_indices(&left).unwrap();
    let right_dofs = dofs.get_dof_indices(&right).unwrap();
    assert_eq!(left_dofs[1], right_dofs[0]);
    assert_eq!(left.vertex(1).unwrap(), [0.25]);
}

#[test]
fn refine_square_once() {
    let mut tria = QuadTriangulation::new();
    hyper_cube(&mut tria, 0.0, 1.0).unwrap();
    tria.refine_global(1).unwrap();
    assert_eq!(tria.n_active_cells(), 4);
    assert_eq!(tria.n_total_cells(), 5);
    assert_eq!(tria.n_used_vertices(), 9);
    assert_eq!(tria.n_lines(), 16);
    assert_eq!(tria.n_active_lines(), 12);
}

#[test]
fn refine_cube_once() {
    let mut tria = HexTriangulation::new();
    hyper_cube(&mut tria, 0.0, 1.0).unwrap();
    tria.refine_global(1).unwrap();
    assert_eq!(tria.n_active_cells(), 8);
    assert_eq!(tria.n_used_vertices(), 27);
    assert_eq!(tria.n_lines(), 66);
    assert_eq!(tria.n_active_lines(), 54);
    assert_eq!(tria.n_quads(), 42);
    assert_eq!(tria.n_active_quads(), 36);
    assert_eq!(tria.n_hexes(), 9);
}

#[test]
fn children_tile_their_parent() {
    let mut tria = QuadTriangulation::new();
    subdivided_hyper_rectangle(&mut tria, [2, 1], [0.0, 0.0], [2.0, 1.0]).unwrap();
    tria.refine_global(1).unwrap();
    for parent in tria.cells_on_level(0) {
        let total: f64 = (0..4)
            .map(|c| parent.child(c).unwrap().measure().unwrap())
            .sum();
        assert!((total - parent.measure().unwrap()).abs() < 1e-12);
        for c in 0..4 {
            let child = parent.child(c).unwrap();
            assert_eq!(child.parent().unwrap(), Some(parent));
            assert_eq!(child.vertex(c).unwrap(), parent.vertex(c).unwrap());
        }
    }
}

#[test]
fn shared_faces_are_reused_between_siblings() {
    let mut tria = HexTriangulation::new();
    subdivided_hyper_cube(&mut tria, 2, 0.0, 1.0).unwrap();
    assert_eq!(tria.n_quads(), 36);
    tria.refine_global(1).unwrap();
    assert_eq!(tria.n_active_cells(), 64);
    assert_eq!(tria.n_used_vertices(), 125);
    // three directions, five planes of 4x4 faces each
    assert_eq!(tria.n_active_quads(), 3 * 5 * 16);
    assert_eq!(tria.max_level_jump(), 0);
}

#[test]
fn refinement_respects_max_level() {
    let mut tria = QuadTriangulation::with_options(TriangulationOptions {
        max_level: Some(1),
        ..TriangulationOptions::default()
    });
    hyper_cube(&mut tria, 0.0, 1.0).unwrap();
    tria.refine_global(3).unwrap();
    assert_eq!(tria.n_levels(), 2);
    assert_eq!(tria.n_active_cells(), 4);
}
