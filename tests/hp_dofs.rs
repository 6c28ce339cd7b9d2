use mesh_tria::prelude::*;

fn collection() -> FeCollection {
    let mut fes = FeCollection::new();
    fes.push(&FiniteElementData::lagrange(1).unwrap());
    fes.push(&FiniteElementData::lagrange(2).unwrap());
    fes
}

#[test]
fn line_with_mixed_degrees() {
    let mut tria = LineTriangulation::new();
    subdivided_hyper_cube(&mut tria, 2, 0.0, 1.0).unwrap();
    let mut dofs = hp::DoFHandler::new(&tria);
    dofs.set_fe_collection(collection());
    dofs.set_active_fe_index(CellId::new(0, 1), 1).unwrap();
    dofs.distribute_dofs().unwrap();

    assert_eq!(dofs.n_dofs(), 5);
    assert_eq!(dofs.cell_dof_indices(CellId::new(0, 0)).unwrap(), vec![0, 1]);
    assert_eq!(dofs.cell_dof_indices(CellId::new(0, 1)).unwrap(), vec![2, 3, 4]);
    assert_eq!(dofs.n_conflicting_entities(), 1);
}

#[test]
fn square_with_mixed_degrees() {
    let mut tria = QuadTriangulation::new();
    subdivided_hyper_rectangle(&mut tria, [2, 1], [0.0, 0.0], [2.0, 1.0]).unwrap();
    let mut dofs = hp::DoFHandler::new(&tria);
    dofs.set_fe_collection(collection());
    dofs.set_active_fe_index(CellId::new(0, 1), 1).unwrap();
    dofs.distribute_dofs().unwrap();

    // Q1 cell: 4, Q2 cell: 9 on its own
    assert_eq!(dofs.n_dofs(), 13);
    // the two shared vertices; the shared line carries Q2 dofs only
    assert_eq!(dofs.n_conflicting_entities(), 2);
    assert_eq!(dofs.cell_dof_indices(CellId::new(0, 1)).unwrap().len(), 9);
}

#[test]
fn active_fe_index_needs_a_valid_element() {
    let mut tria = QuadTriangulation::new();
    hyper_cube(&mut tria, 0.0, 1.0).unwrap();
    let mut dofs = hp::DoFHandler::new(&tria);
    assert!(matches!(
        dofs.set_active_fe_index(CellId::new(0, 0), 0),
        Err(MeshTriaError::IndexOutOfRange { .. })
    ));
    assert_eq!(dofs.distribute_dofs(), Err(MeshTriaError::NoFiniteElement));
    dofs.set_fe_collection(collection());
    dofs.set_active_fe_index(CellId::new(0, 0), 1).unwrap();
    assert_eq!(dofs.active_fe_index(CellId::new(0, 0)).unwrap(), 1);
    assert_eq!(
        dofs.cell_dof_indices(CellId::new(0, 0)),
        Err(MeshTriaError::NotDistributed)
    );
}

#[test]
fn renumbering_keeps_lists_consistent() {
    let mut tria = LineTriangulation::new();
    subdivided_hyper_cube(&mut tria, 2, 0.0, 1.0).unwrap();
    let mut dofs = hp::DoFHandler::new(&tria);
    dofs.set_fe_collection(collection());
    dofs.set_active_fe_index(CellId::new(0, 1), 1).unwrap();
    dofs.distribute_dofs().unwrap();
    dofs.renumber(&[4, 3, 2, 1, 0]).unwrap();
    assert_eq!(dofs.cell_dof_indices(CellId::new(0, 0)).unwrap(), vec![4, 3]);
    assert_eq!(dofs.cell_dof_indices(CellId::new(0, 1)).unwrap(), vec![2, 1, 0]);
}
