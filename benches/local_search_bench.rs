//! Criterion benchmarks for the local search engine.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vrp_search::local_search::perturb::PerturbationParams;
use vrp_search::local_search::space::{compute_neighbours, NeighbourhoodParams};
use vrp_search::local_search::LocalSearch;
use vrp_search::measure::{Cost, Distance, Duration, Load};
use vrp_search::{
    Client, CostEvaluator, Depot, Matrix, ProblemData, RandomNumberGenerator, Solution,
    VehicleType,
};

/// Pseudo-random scattered instance with rounded Euclidean distances.
fn scattered_instance(num_clients: usize) -> ProblemData {
    let mut rng = RandomNumberGenerator::new(12345);
    let mut coords = vec![(0i64, 0i64)];
    for _ in 0..num_clients {
        let x = rng.randint(200) as i64 - 100;
        let y = rng.randint(200) as i64 - 100;
        coords.push((x, y));
    }

    let size = coords.len();
    let mut raw = Vec::with_capacity(size * size);
    for &(x1, y1) in &coords {
        for &(x2, y2) in &coords {
            let dx = (x1 - x2) as f64;
            let dy = (y1 - y2) as f64;
            raw.push((dx * dx + dy * dy).sqrt().round() as i64);
        }
    }

    let clients = coords[1..]
        .iter()
        .map(|&(x, y)| Client {
            x: x.into(),
            y: y.into(),
            delivery: vec![Load::new(1 + rng.randint(3) as i64)],
            pickup: vec![Load::new(0)],
            ..Client::default()
        })
        .collect();

    let vehicle = VehicleType {
        num_available: num_clients / 8 + 1,
        capacity: vec![Load::new(20)],
        ..VehicleType::default()
    };

    ProblemData::new(
        clients,
        vec![Depot::default()],
        vec![vehicle],
        vec![Matrix::from_data(
            size,
            raw.iter().map(|&d| Distance::new(d)).collect(),
        )],
        vec![Matrix::from_data(
            size,
            raw.iter().map(|&d| Duration::new(d)).collect(),
        )],
        vec![],
        vec![],
    )
    .unwrap()
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("local_search");

    for &num_clients in &[25, 50, 100] {
        let data = scattered_instance(num_clients);
        let neighbours = compute_neighbours(&data, NeighbourhoodParams::default());
        let cost_evaluator =
            CostEvaluator::new(vec![Cost::new(20)], Cost::new(6), Cost::new(6)).unwrap();

        let mut rng = RandomNumberGenerator::new(42);
        let initial = Solution::random(&data, &mut rng);

        group.bench_with_input(
            BenchmarkId::new("run", num_clients),
            &num_clients,
            |bencher, _| {
                bencher.iter(|| {
                    let mut search = LocalSearch::new(
                        &data,
                        neighbours.clone(),
                        PerturbationParams::default(),
                        42,
                    );
                    search.add_default_operators();
                    black_box(search.run(&initial, &cost_evaluator, true))
                });
            },
        );
    }

    group.finish();
}

fn bench_neighbours(c: &mut Criterion) {
    let data = scattered_instance(100);

    c.bench_function("compute_neighbours_100", |bencher| {
        bencher.iter(|| black_box(compute_neighbours(&data, NeighbourhoodParams::default())));
    });
}

criterion_group!(benches, bench_search, bench_neighbours);
criterion_main!(benches);
