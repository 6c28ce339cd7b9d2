use mesh_tria::prelude::*;

#[derive(Debug, PartialEq)]
struct Shape {
    active: usize,
    levels: usize,
    vertices: usize,
    lines: usize,
    quads: usize,
}

fn shape<const DIM: usize>(tria: &Triangulation<DIM>) -> Shape {
    Shape {
        active: tria.n_active_cells(),
        levels: tria.n_levels(),
        vertices: tria.n_used_vertices(),
        lines: tria.n_lines(),
        quads: tria.n_quads(),
    }
}

fn flag_children_for_coarsening<const DIM: usize>(tria: &mut Triangulation<DIM>, parent: CellId) {
    let base = tria.cell(parent).unwrap().child_index(0).unwrap();
    for c in 0..GeometryInfo::<DIM>::CHILDREN_PER_CELL {
        tria.cell_mut(CellId::new(parent.level + 1, base + c))
            .unwrap()
            .set_coarsen_flag()
            .unwrap();
    }
}

fn round_trip<const DIM: usize>(n: usize) {
    let mut tria = Triangulation::<DIM>::new();
    subdivided_hyper_cube(&mut tria, n, 0.0, 1.0).unwrap();
    let before = shape(&tria);
    let target = CellId::new(0, 0);

    tria.cell_mut(target).unwrap().set_refine_flag().unwrap();
    tria.execute_coarsening_and_refinement().unwrap();
    assert!(tria.cell(target).unwrap().has_children().unwrap());
    assert_ne!(shape(&tria), before);

    flag_children_for_coarsening(&mut tria, target);
    tria.execute_coarsening_and_refinement().unwrap();
    assert!(tria.cell(target).unwrap().is_active().unwrap());
    assert_eq!(shape(&tria), before);
    tria.validate_invariants().unwrap();
}

#[test]
fn round_trip_restores_the_coarse_mesh() {
    round_trip::<1>(3);
    round_trip::<2>(2);
    round_trip::<3>(2);
}

#[test]
fn incomplete_sibling_groups_stay() {
    let mut tria = QuadTriangulation::new();
    hyper_cube(&mut tria, 0.0, 1.0).unwrap();
    tria.refine_global(1).unwrap();
    for i in 0..3 {
        tria.cell_mut(CellId::new(1, i)).unwrap().set_coarsen_flag().unwrap();
    }
    tria.execute_coarsening_and_refinement().unwrap();
    assert_eq!(tria.n_active_cells(), 4);
    assert!(tria.save_coarsen_flags().iter().all(|&f| !f));
}

#[test]
fn coarse_cells_cannot_be_coarsened() {
    let mut tria = QuadTriangulation::new();
    subdivided_hyper_cube(&mut tria, 2, 0.0, 1.0).unwrap();
    for i in 0..4 {
        tria.cell_mut(CellId::new(0, i)).unwrap().set_coarsen_flag().unwrap();
    }
    assert!(tria.prepare_coarsening_and_refinement().unwrap());
    tria.execute_coarsening_and_refinement().unwrap();
    assert_eq!(tria.n_active_cells(), 4);
    assert_eq!(tria.n_levels(), 1);
}

#[test]
fn freed_slots_are_reused() {
    let mut tria = QuadTriangulation::new();
    subdivided_hyper_cube(&mut tria, 2, 0.0, 1.0).unwrap();
    tria.cell_mut(CellId::new(0, 3)).unwrap().set_refine_flag().unwrap();
    tria.execute_coarsening_and_refinement().unwrap();
    let vertex_slots = tria.n_vertices();

    flag_children_for_coarsening(&mut tria, CellId::new(0, 3));
    tria.execute_coarsening_and_refinement().unwrap();
    tria.cell_mut(CellId::new(0, 0)).unwrap().set_refine_flag().unwrap();
    tria.execute_coarsening_and_refinement().unwrap();

    assert_eq!(tria.n_vertices(), vertex_slots);
    assert_eq!(tria.n_raw_cells(1).unwrap(), 4);
    assert_eq!(tria.cell(CellId::new(0, 0)).unwrap().child_index(0).unwrap(), 0);
}
