use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use crew_core::{solve, Instance};
use solver_bnb::BnbSolver;
use types::{ConstraintParams, SolveParams, Task, WorkerId};

fn flight_day() -> Vec<Task> {
    [
        ("F101", 6.0, 3.5, 1),
        ("F102", 7.0, 3.5, 1),
        ("F203", 10.5, 2.5, 2),
        ("F204", 13.0, 3.0, 2),
        ("F305", 13.0, 5.0, 1),
        ("F108", 12.0, 2.0, 1),
        ("F109", 14.0, 2.5, 2),
        ("F112", 9.0, 2.0, 1),
        ("F505", 15.0, 3.0, 1),
        ("F601", 6.0, 1.0, 1),
        ("F602", 7.5, 4.0, 2),
        ("F701", 11.0, 3.0, 1),
        ("F702", 15.0, 3.0, 2),
        ("F801", 8.0, 2.0, 1),
        ("F802", 10.5, 2.5, 2),
        ("F803", 10.0, 2.0, 1),
        ("F901", 13.0, 3.0, 1),
        ("F902", 16.5, 1.5, 2),
    ]
    .into_iter()
    .map(|(id, s, d, p)| Task::new(id, s, d, p))
    .collect()
}

fn bench_flight_day(c: &mut Criterion) {
    let mut group = c.benchmark_group("flight_day");
    // Six crews forces a full infeasibility proof; nine is settled by the warm start.
    for crews in [6usize, 7, 9] {
        let workers = (1..=crews).map(|i| WorkerId(format!("C{i:02}"))).collect();
        let inst = Instance::build(flight_day(), workers, ConstraintParams::default())
            .expect("valid instance");
        let params = SolveParams::default();
        group.bench_with_input(BenchmarkId::from_parameter(crews), &inst, |b, inst| {
            b.iter(|| solve(&BnbSolver::new(), black_box(inst), &params).expect("solve"))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_flight_day);
criterion_main!(benches);
