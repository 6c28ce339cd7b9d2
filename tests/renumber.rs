use mesh_tria::dofs::renumber::{cuthill_mckee, cuthill_mckee_order};
use mesh_tria::dofs::tools::bandwidth;
use mesh_tria::prelude::*;
use proptest::prelude::*;

fn assert_permutation(order: &[usize], n: usize) {
    let mut sorted = order.to_vec();
    sorted.sort_unstable();
    assert_eq!(sorted, (0..n).collect::<Vec<_>>());
}

#[test]
fn cuthill_mckee_narrows_a_long_strip() {
    let mut tria = QuadTriangulation::new();
    subdivided_hyper_rectangle(&mut tria, [1, 12], [0.0, 0.0], [1.0, 12.0]).unwrap();
    let mut dofs = DoFHandler::new(&tria);
    dofs.set_fe(&FiniteElementData::lagrange(2).unwrap());
    dofs.distribute_dofs().unwrap();
    let n = dofs.n_dofs();
    // interleave both halves of the numbering to spread couplings apart
    let scrambled: Vec<usize> = (0..n)
        .map(|k| if k % 2 == 0 { k / 2 } else { (n + 1) / 2 + k / 2 })
        .collect();
    dofs.renumber(&scrambled).unwrap();
    let before = bandwidth(&dof_couplings(&dofs).unwrap());

    cuthill_mckee(&mut dofs, false).unwrap();
    assert_eq!(dofs.n_dofs(), n);
    let after = bandwidth(&dof_couplings(&dofs).unwrap());
    assert!(after < before, "bandwidth {before} became {after}");

    cuthill_mckee(&mut dofs, true).unwrap();
    let reversed = bandwidth(&dof_couplings(&dofs).unwrap());
    assert!(reversed < before);
}

#[test]
fn every_dof_keeps_one_number() {
    let mut tria = HexTriangulation::new();
    hyper_cube(&mut tria, 0.0, 1.0).unwrap();
    tria.refine_global(1).unwrap();
    let mut dofs = DoFHandler::new(&tria);
    dofs.set_fe(&FiniteElementData::lagrange(2).unwrap());
    dofs.distribute_dofs().unwrap();
    let order = cuthill_mckee_order(&dof_couplings(&dofs).unwrap());
    assert_permutation(&order, dofs.n_dofs());
}

#[test]
fn hp_handlers_can_be_renumbered() {
    let mut tria = LineTriangulation::new();
    subdivided_hyper_cube(&mut tria, 4, 0.0, 1.0).unwrap();
    let mut dofs = hp::DoFHandler::new(&tria);
    let mut fes = FeCollection::new();
    fes.push(&FiniteElementData::lagrange(1).unwrap());
    fes.push(&FiniteElementData::lagrange(3).unwrap());
    dofs.set_fe_collection(fes);
    dofs.set_active_fe_index(CellId::new(0, 2), 1).unwrap();
    dofs.distribute_dofs().unwrap();
    cuthill_mckee(&mut dofs, true).unwrap();
    let mut all: Vec<usize> = (0..4)
        .flat_map(|i| dofs.cell_dof_indices(CellId::new(0, i)).unwrap())
        .collect();
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), dofs.n_dofs());
}

proptest! {
    #[test]
    fn renumbering_is_a_relabeling(seed in prop::collection::vec(any::<u32>(), 7)) {
        let mut tria = LineTriangulation::new();
        subdivided_hyper_cube(&mut tria, 6, 0.0, 1.0).unwrap();
        let mut dofs = DoFHandler::new(&tria);
        dofs.set_fe(&FiniteElementData::new("vertex", [1, 0, 0, 0]));
        dofs.distribute_dofs().unwrap();

        let mut keyed: Vec<(u32, usize)> = seed.into_iter().zip(0..7).collect();
        keyed.sort_unstable();
        let mut new_numbers = vec![0; 7];
        for (position, (_, old)) in keyed.into_iter().enumerate() {
            new_numbers[old] = position;
        }
        let before: Vec<Vec<usize>> = (0..6)
            .map(|i| dofs.cell_dof_indices(CellId::new(0, i)).unwrap())
            .collect();
        dofs.renumber(&new_numbers).unwrap();
        prop_assert_eq!(dofs.n_dofs(), 7);
        for i in 0..6 {
            let after = dofs.cell_dof_indices(CellId::new(0, i)).unwrap();
            let expected: Vec<usize> = before[i].iter().map(|&d| new_numbers[d]).collect();
            prop_assert_eq!(&after, &expected);
            if i + 1 < 6 {
                let next = dofs.cell_dof_indices(CellId::new(0, i + 1)).unwrap();
                prop_assert_eq!(after[1], next[0]);
            }
        }
    }
}
