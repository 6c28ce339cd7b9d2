use mesh_tria::prelude::*;

fn coarse() -> QuadTriangulation {
    let mut tria = QuadTriangulation::new();
    subdivided_hyper_cube(&mut tria, 2, 0.0, 1.0).unwrap();
    tria
}

#[test]
fn replayed_flags_reproduce_the_mesh() {
    let mut original = coarse();
    original.cell_mut(CellId::new(0, 1)).unwrap().set_refine_flag().unwrap();
    original.cell_mut(CellId::new(0, 2)).unwrap().set_refine_flag().unwrap();
    let saved = original.save_flags();
    let json = serde_json::to_string(&saved).unwrap();
    original.execute_coarsening_and_refinement().unwrap();

    let mut replay = coarse();
    let restored: RefinementFlags = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, saved);
    replay.load_flags(&restored).unwrap();
    replay.execute_coarsening_and_refinement().unwrap();

    assert_eq!(replay.n_active_cells(), original.n_active_cells());
    assert_eq!(replay.n_used_vertices(), original.n_used_vertices());
    let centers = |t: &QuadTriangulation| -> Vec<[f64; 2]> {
        t.active_cells().map(|c| c.center().unwrap()).collect()
    };
    assert_eq!(centers(&replay), centers(&original));
}

#[test]
fn length_mismatch_is_rejected() {
    let mut tria = coarse();
    assert_eq!(
        tria.load_refine_flags(&[true; 3]),
        Err(MeshTriaError::FlagLengthMismatch {
            expected: 4,
            found: 3
        })
    );
    assert!(tria.load_user_flags(&[false; 5]).is_err());
}

#[test]
fn conflicting_flags_are_rejected() {
    let mut tria = coarse();
    tria.cell_mut(CellId::new(0, 3)).unwrap().set_coarsen_flag().unwrap();
    assert_eq!(
        tria.load_refine_flags(&[false, false, false, true]),
        Err(MeshTriaError::ConflictingFlags { level: 0, index: 3 })
    );
    let both = RefinementFlags {
        refine: vec![true, false, false, false],
        coarsen: vec![true, false, false, false],
    };
    assert_eq!(
        tria.load_flags(&both),
        Err(MeshTriaError::ConflictingFlags { level: 0, index: 0 })
    );
    // nothing was applied
    assert_eq!(tria.save_refine_flags(), vec![false; 4]);
}

#[test]
fn user_flags_round_trip() {
    let mut tria = coarse();
    tria.refine_global(1).unwrap();
    let n_slots = 4 + 16;
    let mut flags = vec![false; n_slots];
    flags[5] = true;
    flags[19] = true;
    tria.load_user_flags(&flags).unwrap();
    assert_eq!(tria.save_user_flags(), flags);
    assert!(tria.cell(CellId::new(1, 1)).unwrap().user_flag().unwrap());
    tria.clear_user_flags();
    assert!(tria.save_user_flags().iter().all(|&f| !f));
}
