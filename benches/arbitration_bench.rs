// benches/arbitration_bench.rs
// Cell actor round-trip latency
//
// - Acquire then Leave on an uncontended cell
// - Acquire refused by an occupied cell
// - Displacement of a wild occupant to a free neighbor

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use grid_arbiter::grid::{Dimensions, Grid, Identity, Occupant, Position, Response};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

fn normal(id: usize) -> Occupant {
    Occupant::Normal {
        identity: Identity::new(id, 'A'),
    }
}

fn bench_acquire_leave(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("acquire_leave");

    for side in [3usize, 15, 45] {
        let runtime = rt.block_on(async { Grid::spawn(Dimensions::new(side, side), 16) });
        let grid = runtime.grid().clone();
        let target = Position::new(side / 2, side / 2);

        group.bench_with_input(BenchmarkId::new("empty_cell", side), &side, |b, _| {
            b.iter(|| {
                rt.block_on(async {
                    let response = grid.cell(target).acquire(normal(1)).await;
                    grid.cell(target).leave(1);
                    black_box(response)
                })
            })
        });

        rt.block_on(runtime.shutdown());
    }

    group.finish();
}

fn bench_refused(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let runtime = rt.block_on(async { Grid::spawn(Dimensions::new(15, 15), 16) });
    let grid = runtime.grid().clone();
    let target = Position::new(7, 7);
    assert_eq!(
        rt.block_on(grid.cell(target).acquire(normal(1))),
        Response::Success
    );

    c.bench_function("acquire_occupied", |b| {
        b.iter(|| rt.block_on(async { black_box(grid.cell(target).acquire(normal(2)).await) }))
    });

    rt.block_on(runtime.shutdown());
}

fn bench_displacement(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let runtime = rt.block_on(async { Grid::spawn(Dimensions::new(15, 15), 16) });
    let grid = runtime.grid().clone();
    let target = Position::new(7, 7);

    c.bench_function("displace_wild", |b| {
        b.iter(|| {
            rt.block_on(async {
                let (relocations, mut inbox) = mpsc::channel(4);
                let wild = Occupant::Wild {
                    identity: Identity::new(2, '0'),
                    relocations,
                };
                grid.cell(target).acquire(wild).await;

                let response = grid.cell(target).acquire(normal(1)).await;
                if let Some(relocation) = inbox.recv().await {
                    grid.cell(relocation.position).leave(2);
                }
                grid.cell(target).leave(1);
                black_box(response)
            })
        })
    });

    rt.block_on(runtime.shutdown());
}

criterion_group!(benches, bench_acquire_leave, bench_refused, bench_displacement);
criterion_main!(benches);
