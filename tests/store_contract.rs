use mesh_tria::prelude::*;
use mesh_tria::tria::store::MeshStore;

#[test]
fn slots_grow_and_shrink_from_the_end() {
    let mut store = MeshStore::<2>::new();
    assert_eq!(store.allocate_level(), 0);
    store.reserve(0, EntityKind::Quad, 4).unwrap();
    assert_eq!(store.level(0).unwrap().len(), 4);
    store.mark_used(0, EntityKind::Quad, 1).unwrap();
    store.reserve(0, EntityKind::Quad, 0).unwrap();
    // slot 1 is used, so only slots 2 and 3 go away
    assert_eq!(store.level(0).unwrap().len(), 2);
    assert!(store.objects(0, EntityKind::Quad).unwrap().is_used(1).unwrap());
    assert!(!store.objects(0, EntityKind::Quad).unwrap().is_used(0).unwrap());
}

#[test]
fn release_rules() {
    let mut store = MeshStore::<2>::new();
    store.allocate_level();
    store.reserve(0, EntityKind::Line, 6).unwrap();
    for i in 0..3 {
        store.mark_used(0, EntityKind::Line, i).unwrap();
    }
    store.set_children(0, EntityKind::Line, 0, 1).unwrap();
    assert!(matches!(
        store.release(0, EntityKind::Line, 0),
        Err(MeshTriaError::ReleaseWithChildren(_))
    ));
    store.release(0, EntityKind::Line, 1).unwrap();
    assert!(matches!(
        store.release(0, EntityKind::Line, 1),
        Err(MeshTriaError::UnusedEntity(_))
    ));
    store.clear_children(0, EntityKind::Line, 0).unwrap();
    store.release(0, EntityKind::Line, 0).unwrap();
    assert_eq!(store.objects(0, EntityKind::Line).unwrap().n_used(), 1);
    assert!(store.mark_used(0, EntityKind::Line, 6).is_err());
}

#[test]
fn kinds_outside_the_dimension_are_rejected() {
    let mut store = MeshStore::<2>::new();
    store.allocate_level();
    assert_eq!(
        store.reserve(0, EntityKind::Hex, 1),
        Err(MeshTriaError::KindNotInDimension {
            kind: EntityKind::Hex,
            dim: 2
        })
    );
    assert!(matches!(
        store.set_children(0, EntityKind::Vertex, 0, 0),
        Err(MeshTriaError::Unsupported { .. })
    ));
    assert!(matches!(
        store.level(3),
        Err(MeshTriaError::LevelOutOfRange { level: 3, n_levels: 1 })
    ));
}

#[test]
fn vertices_and_neighbors() {
    let mut store = MeshStore::<2>::new();
    store.allocate_level();
    let a = store.add_vertex([0.0, 1.0]);
    let b = store.add_vertex([2.0, 1.0]);
    assert_eq!(store.vertex(b).unwrap(), [2.0, 1.0]);
    store.release(0, EntityKind::Vertex, a).unwrap();
    assert!(matches!(store.vertex(a), Err(MeshTriaError::UnusedEntity(_))));
    assert_eq!(store.add_vertex([5.0, 5.0]), a);
    assert_eq!(store.n_used_vertices(), 2);

    store.reserve(0, EntityKind::Quad, 2).unwrap();
    store.mark_used(0, EntityKind::Quad, 0).unwrap();
    store.mark_used(0, EntityKind::Quad, 1).unwrap();
    store.set_neighbor(0, 0, 1, Some(CellId::new(0, 1))).unwrap();
    assert_eq!(store.neighbor(0, 0, 1).unwrap(), Some(CellId::new(0, 1)));
    assert_eq!(store.neighbor(0, 0, 0).unwrap(), None);
    assert!(store.set_neighbor(0, 0, 4, None).is_err());
    assert!(store.set_neighbor(0, 0, 1, Some(CellId::new(0, 7))).is_err());
}

#[test]
fn triangulation_store_satisfies_invariants() {
    let mut tria = HexTriangulation::new();
    subdivided_hyper_cube(&mut tria, 2, 0.0, 1.0).unwrap();
    tria.refine_global(1).unwrap();
    tria.store().validate_invariants().unwrap();
    tria.validate_invariants().unwrap();
    assert_eq!(tria.store().n_levels(), 2);
}

#[test]
fn malformed_coarse_meshes_are_rejected() {
    let mut tria = QuadTriangulation::new();
    let vertices = vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
    assert!(matches!(
        tria.create_triangulation(vertices.clone(), &[CellData::new([0, 1, 2])]),
        Err(MeshTriaError::InvalidCoarseCell { .. })
    ));
    assert!(matches!(
        tria.create_triangulation(vertices.clone(), &[CellData::new([0, 1, 2, 9])]),
        Err(MeshTriaError::InvalidCoarseCell { .. })
    ));
    assert!(tria.is_empty());
    tria.create_triangulation(vertices.clone(), &[CellData::new([0, 1, 2, 3])])
        .unwrap();
    assert_eq!(
        tria.create_triangulation(vertices, &[CellData::new([0, 1, 2, 3])]),
        Err(MeshTriaError::NonEmptyTriangulation)
    );
    tria.clear();
    assert!(tria.is_empty());
}
