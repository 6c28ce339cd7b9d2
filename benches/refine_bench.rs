use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use mesh_tria::prelude::*;

fn bench_refine_global(c: &mut Criterion) {
    let mut group = c.benchmark_group("refine_global");

    for &times in &[3usize, 5] {
        group.bench_with_input(BenchmarkId::new("quad", times), &times, |b, &times| {
            b.iter(|| {
                let mut tria = QuadTriangulation::new();
                hyper_cube(&mut tria, 0.0, 1.0).unwrap();
                tria.refine_global(times).unwrap();
                black_box(tria.n_active_cells());
            });
        });
    }

    // one refinement of increasingly fine meshes; time should grow linearly
    for &n in &[32usize, 64, 128] {
        let mut coarse = QuadTriangulation::new();
        subdivided_hyper_cube(&mut coarse, n, 0.0, 1.0).unwrap();
        group.bench_with_input(BenchmarkId::new("once_quad_grid", n), &coarse, |b, coarse| {
            b.iter(|| {
                let mut tria = coarse.clone();
                tria.refine_global(1).unwrap();
                black_box(tria.n_used_vertices());
            });
        });
    }

    group.bench_function("hex_2", |b| {
        b.iter(|| {
            let mut tria = HexTriangulation::new();
            hyper_cube(&mut tria, 0.0, 1.0).unwrap();
            tria.refine_global(2).unwrap();
            black_box(tria.n_active_cells());
        });
    });

    group.finish();
}

fn bench_local_refinement(c: &mut Criterion) {
    c.bench_function("corner_refinement_quad", |b| {
        b.iter(|| {
            let mut tria = QuadTriangulation::new();
            subdivided_hyper_cube(&mut tria, 4, 0.0, 1.0).unwrap();
            for _ in 0..6 {
                let mut cell = tria.cell(CellId::new(0, 0)).unwrap();
                while cell.has_children().unwrap() {
                    cell = cell.child(0).unwrap();
                }
                let id = cell.id();
                tria.cell_mut(id).unwrap().set_refine_flag().unwrap();
                tria.execute_coarsening_and_refinement().unwrap();
            }
            black_box(tria.n_active_cells());
        });
    });
}

fn bench_distribute_dofs(c: &mut Criterion) {
    let mut tria = QuadTriangulation::new();
    hyper_cube(&mut tria, 0.0, 1.0).unwrap();
    tria.refine_global(5).unwrap();
    let fe = FiniteElementData::lagrange(2).unwrap();

    c.bench_function("distribute_q2_quad_5", |b| {
        b.iter(|| {
            let mut dofs = DoFHandler::new(&tria);
            dofs.set_fe(&fe);
            dofs.distribute_dofs().unwrap();
            black_box(dofs.n_dofs());
        });
    });
}

criterion_group!(
    benches,
    bench_refine_global,
    bench_local_refinement,
    bench_distribute_dofs
);
criterion_main!(benches);
